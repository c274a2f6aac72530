use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use dockerpkg_cli::cli::{Cli, Command};
use dockerpkg_cli::commands::{self, doctor};
use dockerpkg_cli::connect::engine_or_exit;
use dockerpkg_cli::output::Printer;
use dockerpkg_cli::terminal::ColorPalette;
use dockerpkg_lib::{DockerEngine, Endpoint, Error as LibError};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.global.log_level.as_deref())?;
    debug!(command = ?cli.command, "parsed command line");

    let mut printer = Printer::stdout(cli.global.format);
    let host = cli.global.host.as_deref();

    if cli.command == Command::Doctor {
        doctor::handle_doctor(host, &mut printer)
            .await
            .context("failed to write diagnostics")?;
        return Ok(ExitCode::SUCCESS);
    }

    let connected = connect(host).await;
    let engine = match engine_or_exit(connected, ColorPalette::detect(), &mut io::stderr()) {
        Ok(engine) => engine,
        Err(code) => return Ok(ExitCode::from(code)),
    };

    commands::dispatch(&cli.command, &engine, &mut printer)
        .await
        .context("failed to write command output")?;
    Ok(ExitCode::SUCCESS)
}

async fn connect(host: Option<&str>) -> Result<DockerEngine, LibError> {
    let endpoint = Endpoint::resolve(host)?;
    DockerEngine::connect(&endpoint).await
}

/// Configure tracing to write only to stderr so stdout stays parseable.
fn init_tracing(log_level: Option<&str>) -> Result<()> {
    let env_filter = match log_level {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let subscriber = fmt()
        .with_writer(io::stderr)
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;
    Ok(())
}
