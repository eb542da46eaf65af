use std::path::PathBuf;

use clap::Args;

use crate::cli::op::{read_input, CallFailed};
use common::module::ENCRYPT;
use common::prelude::HostValue;

#[derive(Args, Debug, Clone)]
pub struct Encrypt {
    /// Recipient public key (age1...), repeatable
    #[arg(short = 'r', long = "recipient", required = true)]
    pub recipients: Vec<String>,

    /// Read plaintext from this file instead of stdin
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum EncryptError {
    #[error("failed to read plaintext: {0}")]
    Input(#[from] std::io::Error),
    #[error(transparent)]
    Call(#[from] CallFailed),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Encrypt {
    type Error = EncryptError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let plaintext = read_input(self.input.as_deref()).await?;
        let args = vec![
            HostValue::String(plaintext),
            HostValue::from(self.recipients.clone()),
        ];
        let armored = ctx.call_for_string(ENCRYPT, args).await?;
        // armor already ends in a newline and println! adds another
        Ok(armored.trim_end().to_string())
    }
}
