use clap::Args;

use crate::cli::op::CallFailed;
use common::prelude::HostValue;

/// Call any export with JSON arguments, the way a script host would
#[derive(Args, Debug, Clone)]
pub struct Call {
    /// Export name, e.g. `encrypt`
    pub export: String,

    /// Arguments as a JSON array, e.g. '["hello", ["age1..."]]'
    #[arg(default_value = "[]")]
    pub args: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("arguments are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("arguments must be a JSON array")]
    NotAnArray,
    #[error(transparent)]
    Call(#[from] CallFailed),
}

/// Turn a JSON array into positional host arguments.
pub fn parse_args(json: &str) -> Result<Vec<HostValue>, CallError> {
    match serde_json::from_str::<serde_json::Value>(json)? {
        serde_json::Value::Array(items) => Ok(items.into_iter().map(HostValue::from).collect()),
        _ => Err(CallError::NotAnArray),
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Call {
    type Error = CallError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let args = parse_args(&self.args)?;
        let value = ctx.call(&self.export, args).await?;
        Ok(serde_json::to_string_pretty(&value.to_json())?)
    }
}
