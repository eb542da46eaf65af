use std::io::Read;
use std::iter;
use std::str::FromStr;

use age::armor::ArmoredReader;
use age::x25519;

use crate::contract::ValidatedArgs;
use crate::error::CallError;
use crate::value::Outcome;

/// Handler for `decrypt(armoredCiphertext, identity)`; resolves to the plaintext.
pub fn decrypt(args: &ValidatedArgs) -> Result<Outcome, CallError> {
    decrypt_text(args.string(0)?, args.string(1)?).map(Outcome::Text)
}

/// Decrypt ASCII-armored ciphertext with a single X25519 identity.
///
/// A wrong identity and a tampered file both surface as a decryption
/// failure; neither message carries any key or plaintext bytes.
pub fn decrypt_text(armored: &str, identity: &str) -> Result<String, CallError> {
    let identity = x25519::Identity::from_str(identity)
        .map_err(|reason| CallError::IdentityParse(reason.to_string()))?;

    // pasted armor often carries surrounding blank lines or indentation
    let armored = armored.trim();
    let decryptor =
        age::Decryptor::new(ArmoredReader::new(armored.as_bytes())).map_err(CallError::Decrypt)?;
    let mut reader = decryptor
        .decrypt(iter::once(&identity as &dyn age::Identity))
        .map_err(CallError::Decrypt)?;

    let mut plaintext = String::new();
    reader
        .read_to_string(&mut plaintext)
        .map_err(|e| CallError::stream("failed to read decrypted text", e))?;

    Ok(plaintext)
}
