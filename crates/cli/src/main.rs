//! # docsheet: command-line entry point
//!
//! A thin entrypoint; all logic lives in the `docsheet_cli` library crate.

use anyhow::Result;
use clap::Parser;
use docsheet_cli::{run, Cli};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable.
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive("docsheet=info".parse()?))
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("[docsheet error] Failed to execute command: {e:?}");
        std::process::exit(1);
    }

    Ok(())
}
