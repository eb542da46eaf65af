pub mod call;
pub mod decrypt;
pub mod encrypt;
pub mod init;
pub mod keygen;
pub mod version;

pub use call::Call;
pub use decrypt::Decrypt;
pub use encrypt::Encrypt;
pub use init::Init;
pub use keygen::Keygen;
pub use version::Version;
