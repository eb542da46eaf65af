/**
 * Asynchronous bridge between a host scripting
 *  environment and the `age` encryption library.
 * Each call is spawned on its own worker thread
 *  and settles its promise exactly once.
 */
pub mod bridge;
/**
 * Per-operation argument contracts: arity and
 *  the expected kind at each position.
 */
pub mod contract;
/**
 * Call errors, their kinds, and the error
 *  object a rejected promise carries.
 */
pub mod error;
/**
 * The export table the host calls into.
 */
pub mod module;
/**
 * Handlers for generate-identity, encrypt
 *  and decrypt.
 */
pub mod ops;
/**
 * Dynamic host values and their narrowing
 *  into typed arguments.
 */
pub mod value;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::bridge::{Bridge, BridgeConfig, Callbacks, CallId, Completion, Promise, Settler};
    pub use crate::error::{CallError, ErrorKind, HostError};
    pub use crate::module::Module;
    pub use crate::value::{HostValue, Kind};
    pub use crate::version::build_info;
}
