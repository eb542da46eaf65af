pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "agebox")]
#[command(about = "Encrypt and decrypt with age through the async call bridge")]
pub struct Args {
    /// Path to the agebox config directory (defaults to ~/.agebox)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Seconds to wait for a call to settle (overrides the config file)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: crate::Command,
}
