use age::x25519;
use secrecy::{ExposeSecret, SecretString};

use crate::contract::ValidatedArgs;
use crate::error::CallError;
use crate::value::Outcome;

/// A fresh X25519 key pair in its textual forms
pub struct GeneratedIdentity {
    /// `AGE-SECRET-KEY-1...`
    pub identity: SecretString,
    /// `age1...`
    pub recipient: String,
}

impl GeneratedIdentity {
    pub fn generate() -> Self {
        let identity = x25519::Identity::generate();
        let recipient = identity.to_public().to_string();
        Self {
            identity: identity.to_string(),
            recipient,
        }
    }
}

/// Handler for `generateIdentity()`; resolves to `[identity, recipient]`.
pub fn generate_identity(_args: &ValidatedArgs) -> Result<Outcome, CallError> {
    let generated = GeneratedIdentity::generate();
    Ok(Outcome::Pair(
        generated.identity.expose_secret().to_string(),
        generated.recipient,
    ))
}
