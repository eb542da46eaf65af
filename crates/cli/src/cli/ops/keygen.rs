use std::fmt;

use clap::Args;

use crate::cli::op::CallFailed;
use common::module::GENERATE_IDENTITY;
use common::prelude::HostValue;

#[derive(Args, Debug, Clone)]
pub struct Keygen;

/// A new identity in age's key file layout
#[derive(Debug)]
pub struct KeygenOutput {
    pub identity: String,
    pub recipient: String,
}

impl fmt::Display for KeygenOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# public key: {}", self.recipient)?;
        write!(f, "{}", self.identity)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KeygenError {
    #[error(transparent)]
    Call(#[from] CallFailed),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Keygen {
    type Error = KeygenError;
    type Output = KeygenOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let value = ctx.call(GENERATE_IDENTITY, vec![]).await?;
        if let HostValue::Array(pair) = &value {
            if let [HostValue::String(identity), HostValue::String(recipient)] = pair.as_slice() {
                return Ok(KeygenOutput {
                    identity: identity.clone(),
                    recipient: recipient.clone(),
                });
            }
        }
        Err(CallFailed::UnexpectedResult(value.kind(), "a pair of strings").into())
    }
}
