//! shopcart local event runner.
//!
//! Reads one request event (JSON) from a file or stdin, handles it
//! against the configured store and prints the response to stdout.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use shopcart_db::{DbManager, run_migrations};
use shopcart_server::{App, HttpRequest, ServerConfig, ServerError};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "shopcart_server=info,shopcart_cart=info,shopcart_db=info";

/// Handle one request event against the configured store
#[derive(Debug, Parser)]
#[command(name = "shopcart-server", version, long_about = None)]
struct Args {
    /// Event file (JSON); `-` or nothing reads stdin
    event: Option<PathBuf>,
}

impl Args {
    fn event_path(&self) -> Option<&Path> {
        self.event.as_deref().filter(|p| *p != Path::new("-"))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "shopcart runner failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<(), ServerError> {
    let config = ServerConfig::from_env()?;
    let request: HttpRequest = serde_json::from_str(&read_event(args.event_path())?)?;

    let manager = DbManager::connect(&config.db).await?;
    run_migrations(manager.client()).await?;

    let app = App::from_db(manager.client().clone(), config.cart);
    let response = app.handle(request).await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn read_event(path: Option<&Path>) -> Result<String, ServerError> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            Ok(raw)
        }
    }
}
