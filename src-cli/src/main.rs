use clap::Parser;
use miner_cli::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    miner_cli::init_tracing();

    if let Err(e) = miner_cli::run(cli).await {
        eprintln!("Error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
