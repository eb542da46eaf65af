use std::path::{Path, PathBuf};

use clap::Args;

use crate::cli::op::{read_input, CallFailed};
use common::module::DECRYPT;
use common::prelude::HostValue;

#[derive(Args, Debug, Clone)]
pub struct Decrypt {
    /// Identity file holding an AGE-SECRET-KEY-1... line
    #[arg(short = 'k', long = "identity")]
    pub identity: PathBuf,

    /// Read armored ciphertext from this file instead of stdin
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error("failed to read identity file {0}: {1}")]
    IdentityFile(PathBuf, std::io::Error),
    #[error("identity file {0} contains no identity")]
    NoIdentity(PathBuf),
    #[error("failed to read ciphertext: {0}")]
    Input(std::io::Error),
    #[error(transparent)]
    Call(#[from] CallFailed),
}

/// The first line that is neither blank nor a `#` comment.
pub fn identity_from_key_file(contents: &str) -> Option<&str> {
    contents
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
}

async fn load_identity(path: &Path) -> Result<String, DecryptError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DecryptError::IdentityFile(path.to_path_buf(), e))?;
    identity_from_key_file(&contents)
        .map(str::to_string)
        .ok_or_else(|| DecryptError::NoIdentity(path.to_path_buf()))
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Decrypt {
    type Error = DecryptError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let identity = load_identity(&self.identity).await?;
        let armored = read_input(self.input.as_deref())
            .await
            .map_err(DecryptError::Input)?;
        let args = vec![HostValue::String(armored), HostValue::String(identity)];
        Ok(ctx.call_for_string(DECRYPT, args).await?)
    }
}
