// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Call, Decrypt, Encrypt, Init, Keygen, Version};

use agebox::state::AppState;

command_enum! {
    (Keygen, Keygen),
    (Encrypt, Encrypt),
    (Decrypt, Decrypt),
    (Call, Call),
    (Init, Init),
    (Version, Version),
}

fn setup(args: &Args) -> anyhow::Result<(AppState, Vec<tracing_appender::non_blocking::WorkerGuard>)> {
    let state = AppState::load(args.config_path.clone())?;
    let guards = agebox::init_logging(&state.config)?;
    Ok((state, guards))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let (state, guards) = match setup(&args) {
        Ok(setup) => setup,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let ctx = cli::op::OpContext::new(&state, args.config_path.clone(), args.timeout_secs);

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            1
        }
    };

    // process::exit skips destructors; flush the log writers first
    drop(guards);
    std::process::exit(code);
}
