//! Engine endpoint configuration.
//!
//! The endpoint is resolved from, in order: an explicit override (the CLI's
//! `--host`), `DOCKERPKG_HOST`, `DOCKER_HOST`, then the platform default socket.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};

/// Environment variable that overrides the engine endpoint for this tool only.
pub const ENDPOINT_ENV: &str = "DOCKERPKG_HOST";

/// Environment variable honoured by the engine's own tooling.
pub const DOCKER_HOST_ENV: &str = "DOCKER_HOST";

/// Default local socket.
#[cfg(unix)]
pub const DEFAULT_ENDPOINT: &str = "unix:///var/run/docker.sock";
#[cfg(windows)]
pub const DEFAULT_ENDPOINT: &str = "npipe:////./pipe/docker_engine";

/// Where the engine's management API listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Unix domain socket or Windows named pipe.
    Socket(PathBuf),
    /// Plain HTTP address, e.g. `tcp://127.0.0.1:2375`.
    Http(String),
}

impl Endpoint {
    /// Resolve the endpoint from an optional override and the environment.
    pub fn resolve(explicit: Option<&str>) -> Result<Self> {
        let from_env = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        let (source, raw) = match explicit {
            Some(value) => ("flag", value.to_string()),
            None => match from_env(ENDPOINT_ENV) {
                Some(value) => (ENDPOINT_ENV, value),
                None => match from_env(DOCKER_HOST_ENV) {
                    Some(value) => (DOCKER_HOST_ENV, value),
                    None => ("default", DEFAULT_ENDPOINT.to_string()),
                },
            },
        };
        debug!(source, endpoint = %raw, "resolved engine endpoint");
        raw.parse()
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        let invalid = |reason: &str| Error::InvalidEndpoint {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if let Some(path) = value
            .strip_prefix("unix://")
            .or_else(|| value.strip_prefix("npipe://"))
        {
            if path.is_empty() {
                return Err(invalid("socket path is empty"));
            }
            return Ok(Endpoint::Socket(PathBuf::from(path)));
        }

        if let Some(addr) = value.strip_prefix("tcp://") {
            if addr.is_empty() {
                return Err(invalid("address is empty"));
            }
            return Ok(Endpoint::Http(format!("http://{addr}")));
        }

        if value.starts_with("http://") {
            return Ok(Endpoint::Http(value.to_string()));
        }

        if value.starts_with('/') {
            return Ok(Endpoint::Socket(PathBuf::from(value)));
        }

        Err(invalid(
            "expected unix://, npipe://, tcp://, http:// or an absolute socket path",
        ))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Socket(path) => {
                let path = path.display().to_string();
                if path.starts_with("//./pipe/") {
                    write!(f, "npipe://{path}")
                } else {
                    write!(f, "unix://{path}")
                }
            }
            Endpoint::Http(addr) => f.write_str(addr),
        }
    }
}
