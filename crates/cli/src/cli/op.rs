use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncReadExt;

use agebox::state::AppState;
use common::prelude::{HostError, HostValue, Kind, Module, Promise};

/// Why an exported call did not produce a usable value
#[derive(Debug, thiserror::Error)]
pub enum CallFailed {
    #[error(transparent)]
    Rejected(#[from] HostError),
    #[error("call did not settle within {} seconds", .0.as_secs())]
    TimedOut(Duration),
    /// Only the kind is kept; the value may hold key material
    #[error("call resolved to {0}, expected {1}")]
    UnexpectedResult(Kind, &'static str),
}

#[derive(Debug)]
pub struct OpContext {
    /// The loaded age module every op calls into
    pub module: Module,
    /// Optional custom config path (defaults to ~/.agebox)
    pub config_path: Option<PathBuf>,
    /// How long to wait for a call to settle
    pub timeout: Duration,
}

impl OpContext {
    pub fn new(state: &AppState, config_path: Option<PathBuf>, timeout_secs: Option<u64>) -> Self {
        let module = Module::load(state.config.bridge.clone(), |module| {
            tracing::debug!(exports = ?module.exports().collect::<Vec<_>>(), "module ready");
        });
        let timeout =
            Duration::from_secs(timeout_secs.unwrap_or(state.config.timeout_secs));
        Self {
            module,
            config_path,
            timeout,
        }
    }

    /// Call an export and wait for it to settle, up to the configured timeout.
    ///
    /// The bridge itself has no timeout; this is the host's own deadline.
    /// A call that times out keeps running on its worker until it settles.
    pub async fn call(&self, name: &str, args: Vec<HostValue>) -> Result<HostValue, CallFailed> {
        let promise: Promise = self.module.invoke(name, args);
        let call_id = promise.call_id();
        match tokio::time::timeout(self.timeout, promise).await {
            Ok(settled) => Ok(settled?),
            Err(_) => {
                tracing::warn!(call = %call_id, export = name, "call timed out");
                Err(CallFailed::TimedOut(self.timeout))
            }
        }
    }

    /// Like [`OpContext::call`], for exports that resolve to a string.
    pub async fn call_for_string(
        &self,
        name: &str,
        args: Vec<HostValue>,
    ) -> Result<String, CallFailed> {
        match self.call(name, args).await? {
            HostValue::String(s) => Ok(s),
            other => Err(CallFailed::UnexpectedResult(other.kind(), "a string")),
        }
    }
}

/// Read all of a file, or stdin when no path is given.
pub async fn read_input(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path).await,
        None => {
            let mut input = String::new();
            tokio::io::stdin().read_to_string(&mut input).await?;
            Ok(input)
        }
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::cli::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::cli::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::cli::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_context() -> OpContext {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::load(Some(dir.path().to_path_buf())).unwrap();
        OpContext::new(&state, None, Some(5))
    }

    #[tokio::test]
    async fn test_call_for_string_checks_shape() {
        let ctx = test_context();
        let err = ctx
            .call_for_string("generateIdentity", vec![])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CallFailed::UnexpectedResult(Kind::Array, "a string")
        ));
        let message = err.to_string();
        assert_eq!(message, "call resolved to array, expected a string");
        assert!(!message.contains("AGE-SECRET-KEY-"));
    }

    #[tokio::test]
    async fn test_rejection_is_passed_through() {
        let ctx = test_context();
        let err = ctx.call("decrypt", vec![]).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "ArityError: expected 2 arguments, got 0"
        );
    }

    #[tokio::test]
    async fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.txt");
        std::fs::write(&path, "from a file").unwrap();
        assert_eq!(read_input(Some(&path)).await.unwrap(), "from a file");
    }
}
