use std::process::ExitCode;

use anyhow::Context;
use remindme::{
    cli::{self, Invocation},
    client, server,
};
use remindme_core::RemindmeConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    match cli::parse_args(std::env::args_os()) {
        Invocation::Help => {
            print!("{}", cli::usage());
            Ok(ExitCode::SUCCESS)
        }
        Invocation::Version => {
            println!("{}", cli::version_line());
            Ok(ExitCode::SUCCESS)
        }
        Invocation::Usage => {
            eprint!("{}", cli::usage());
            Ok(ExitCode::FAILURE)
        }
        Invocation::Serve { config } => serve(config.as_deref()).await,
        Invocation::Submit {
            config,
            destination,
            timespec,
            message,
        } => Ok(submit(config.as_deref(), &destination, &timespec, &message).await),
    }
}

async fn serve(config_path: Option<&str>) -> anyhow::Result<ExitCode> {
    // load config: explicit path > REMINDME_CONFIG env > ~/.remindme/remindme.toml
    let config = RemindmeConfig::load(config_path).context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.as_str().into()),
        )
        .init();

    info!(
        version = cli::VERSION,
        socket = %config.channel.socket_path.display(),
        "initializing remindme scheduling process"
    );

    match server::serve(config).await {
        Ok(()) => {
            info!("scheduling process stopped");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(code = e.code(), "{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn submit(config_path: Option<&str>, destination: &str, timespec: &str, message: &str) -> ExitCode {
    let payload = match client::prepare(destination, timespec, message) {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let config = match RemindmeConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match client::submit(&config.channel.socket_path, &payload).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
