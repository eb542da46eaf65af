use clap::Args;

use agebox::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Default log level written to the new config
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Directory for log files (stderr only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("failed to initialize agebox directory: {0}")]
    State(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            log_level: self.log_level.clone(),
            log_dir: self.log_dir.clone(),
            ..AppConfig::default()
        };
        // reject a bad level now rather than on the next start
        config.log_level()?;

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        tracing::info!(path = %state.config_path.display(), "wrote config");
        Ok(format!(
            "Initialized agebox directory at {}",
            state.agebox_dir.display()
        ))
    }
}
