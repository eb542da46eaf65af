//! Shared test utilities for module integration tests
#![allow(dead_code)]

use common::prelude::*;

/// The age module with default bridge settings
pub fn setup_module() -> Module {
    Module::default()
}

/// Generate a key pair through the exported operation, as a host would.
pub async fn generate_identity(module: &Module) -> (String, String) {
    let value = module
        .invoke("generateIdentity", vec![])
        .await
        .expect("generateIdentity should resolve");
    match value {
        HostValue::Array(items) => match items.as_slice() {
            [HostValue::String(identity), HostValue::String(recipient)] => {
                (identity.clone(), recipient.clone())
            }
            other => panic!("unexpected pair shape: {:?}", other),
        },
        other => panic!("expected an array, got {:?}", other),
    }
}

pub async fn encrypt(
    module: &Module,
    plaintext: &str,
    recipients: &[String],
) -> Result<String, HostError> {
    let recipients = HostValue::Array(recipients.iter().cloned().map(HostValue::from).collect());
    let value = module
        .invoke("encrypt", vec![HostValue::from(plaintext), recipients])
        .await?;
    Ok(value.as_str().expect("ciphertext is a string").to_string())
}

pub async fn decrypt(module: &Module, armored: &str, identity: &str) -> Result<String, HostError> {
    let value = module
        .invoke(
            "decrypt",
            vec![HostValue::from(armored), HostValue::from(identity)],
        )
        .await?;
    Ok(value.as_str().expect("plaintext is a string").to_string())
}
