// Host process modules (logging, panic hook)
pub mod process;

// App state (configuration, paths)
pub mod state;

// Re-exports for consumers
pub use process::init_logging;
pub use state::{AppConfig, AppState, StateError};
