pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Call, Decrypt, Encrypt, Init, Keygen, Version};
