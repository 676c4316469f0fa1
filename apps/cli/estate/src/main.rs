use estate::cli::Cli;
use estate::commands::{self, Context};
use estate::error::EstateError;
use estate::logger::initialize as LoggerInitialize;

use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String, EstateError> {
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => commands::default_config_dir()?,
    };

    // Logger first, so config and session loading are logged too
    LoggerInitialize(&config_dir.join("logs"), cli.verbose)?;
    info!("Config directory: {}", config_dir.display());

    let context = Context::load(&config_dir)?;
    commands::execute(&context, cli.command).await
}
