//! Operation handlers
//!
//! Each handler takes arguments that already passed their contract, calls
//! into `age`, and stops at the first failing step. None of them retry.

mod decrypt;
mod encrypt;
mod generate_identity;

pub use decrypt::{decrypt, decrypt_text};
pub use encrypt::{encrypt, encrypt_text};
pub use generate_identity::{generate_identity, GeneratedIdentity};
