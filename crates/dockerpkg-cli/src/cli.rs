//! Command-line argument model.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "dockerpkg",
    author,
    version,
    about = "dockerpkg - APT-like package manager for Docker",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Engine endpoint (unix://, npipe://, tcp://, http:// or a socket path).
    /// Overrides DOCKERPKG_HOST and DOCKER_HOST.
    #[arg(long, global = true, value_name = "URL")]
    pub host: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log filter (e.g. `debug`, `dockerpkg_lib=trace`). Defaults to RUST_LOG, then `warn`.
    #[arg(long, global = true, value_name = "FILTER", value_parser = parse_log_filter)]
    pub log_level: Option<String>,
}

/// Reject filters `tracing-subscriber` cannot parse while arguments are parsed.
fn parse_log_filter(value: &str) -> Result<String, String> {
    EnvFilter::try_new(value)
        .map(|_| value.to_string())
        .map_err(|e| e.to_string())
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pull an image.
    Install {
        /// Image reference, e.g. `nginx` or `nginx:1.27`.
        #[arg(value_name = "IMAGE[:TAG]")]
        image: String,
    },
    /// Remove an image.
    #[command(name = "removei")]
    RemoveImage {
        #[arg(value_name = "IMAGE")]
        image: String,
    },
    /// Re-pull an image and report whether it changed.
    Update {
        #[arg(value_name = "IMAGE[:TAG]")]
        image: String,
    },
    /// Re-pull every tagged local image.
    #[command(name = "update-all")]
    UpdateAll,
    /// Run a container (detached).
    Run {
        #[arg(value_name = "IMAGE[:TAG]")]
        image: String,
        /// Name to give the container.
        #[arg(long)]
        name: Option<String>,
    },
    /// Start a container.
    Start {
        #[arg(value_name = "CONTAINER")]
        container: String,
    },
    /// Stop a container.
    Stop {
        #[arg(value_name = "CONTAINER")]
        container: String,
    },
    /// Restart a container.
    Restart {
        #[arg(value_name = "CONTAINER")]
        container: String,
    },
    /// Show a container's state.
    Status {
        #[arg(value_name = "CONTAINER")]
        container: String,
    },
    /// Remove a container (by name or ID).
    #[command(name = "removec")]
    RemoveContainer {
        #[arg(value_name = "CONTAINER")]
        container: String,
    },
    /// List all images.
    #[command(name = "listi")]
    ListImages,
    /// List all containers.
    #[command(name = "listc")]
    ListContainers,
    /// Check connectivity to the engine.
    Doctor,
}
