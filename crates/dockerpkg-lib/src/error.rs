use std::error::Error as StdError;
use std::fmt;
use std::io;

use serde::Serialize;
use thiserror::Error;

/// Convenient result alias for the dockerpkg library.
pub type Result<T> = std::result::Result<T, Error>;

/// Remediation shown alongside permission-denied failures.
pub const PERMISSION_HINT: &str =
    "Add your user to the 'docker' group or run with elevated privileges.";

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured endpoint string cannot be turned into a client.
    #[error("invalid engine endpoint {value}: {reason}")]
    InvalidEndpoint { value: String, reason: String },

    /// The engine could not be reached at all.
    #[error("could not connect to the container engine at {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    /// The referenced image or container does not exist.
    #[error("{message}")]
    NotFound { message: String },

    /// The caller lacks rights to the engine socket or the requested action.
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// The engine returned a structured error; message is surfaced verbatim.
    ///
    /// `status` is absent for errors reported inside a progress stream.
    #[error("engine API error{}: {message}", status_label(.status))]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// Anything the classifier does not recognise.
    #[error("{message}")]
    Unknown { message: String },
}

/// Coarse classification used when reporting failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Connection,
    NotFound,
    PermissionDenied,
    Api,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorCategory::Connection => "connection",
            ErrorCategory::NotFound => "not-found",
            ErrorCategory::PermissionDenied => "permission-denied",
            ErrorCategory::Api => "api",
            ErrorCategory::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

impl Error {
    /// Category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidEndpoint { .. } | Error::Connection { .. } => ErrorCategory::Connection,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::PermissionDenied { .. } => ErrorCategory::PermissionDenied,
            Error::Api { .. } => ErrorCategory::Api,
            Error::Unknown { .. } => ErrorCategory::Unknown,
        }
    }

    /// Whether this is a not-found answer from the engine.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Classify an error reported by the engine client.
    ///
    /// HTTP status codes take precedence, and errors the daemon reports
    /// mid-stream become [`Error::Api`] with their text. Transport failures
    /// are classified by walking the source chain for an [`io::Error`]:
    /// `PermissionDenied` maps to [`Error::PermissionDenied`], refused/missing
    /// sockets map to [`Error::Connection`] against `endpoint`.
    pub fn from_engine(err: bollard::errors::Error, endpoint: &str) -> Self {
        use bollard::errors::Error as Bollard;

        match err {
            Bollard::DockerResponseServerError {
                status_code,
                message,
            } => Self::from_status(status_code, message),
            // Reported inside a 200 response stream; bollard's Display drops the text.
            Bollard::DockerStreamError { error }
            | Bollard::DockerContainerWaitError { error, .. } => Error::Api {
                status: None,
                message: error,
            },
            // Transparent variant, so the payload is not in the source chain.
            Bollard::IOError { err: io_err } => {
                let message = io_err.to_string();
                Self::from_io_kind(io_err.kind(), message, endpoint)
            }
            other => match io_error_kind(&other) {
                Some(kind) => Self::from_io_kind(kind, other.to_string(), endpoint),
                None => Error::Unknown {
                    message: other.to_string(),
                },
            },
        }
    }

    /// Map an engine HTTP status and message onto the taxonomy.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            404 => Error::NotFound { message },
            401 | 403 => Error::PermissionDenied { message },
            _ => Error::Api {
                status: Some(status),
                message,
            },
        }
    }

    fn from_io_kind(kind: io::ErrorKind, message: String, endpoint: &str) -> Self {
        match kind {
            io::ErrorKind::PermissionDenied => Error::PermissionDenied { message },
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotFound
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::TimedOut => Error::Connection {
                endpoint: endpoint.to_string(),
                message,
            },
            _ => Error::Unknown { message },
        }
    }
}

/// Owned, serializable record of a classified failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub category: ErrorCategory,
    pub message: String,
}

impl From<&Error> for Failure {
    fn from(err: &Error) -> Self {
        Self {
            category: err.category(),
            message: err.to_string(),
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    status.map(|code| format!(" ({code})")).unwrap_or_default()
}

/// First [`io::Error`] kind found in the source chain of `err`.
fn io_error_kind(err: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        current = e.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "unix:///var/run/docker.sock";

    fn server_error(status_code: u16, message: &str) -> bollard::errors::Error {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message: message.to_string(),
        }
    }

    #[test]
    fn status_404_is_not_found() {
        let err = Error::from_engine(server_error(404, "No such container: web"), ENDPOINT);
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.to_string(), "No such container: web");
    }

    #[test]
    fn status_403_is_permission_denied() {
        let err = Error::from_engine(server_error(403, "forbidden"), ENDPOINT);
        assert_eq!(err.category(), ErrorCategory::PermissionDenied);
    }

    #[test]
    fn other_status_is_api_error_with_verbatim_message() {
        let err = Error::from_engine(server_error(409, "conflict: name in use"), ENDPOINT);
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, Some(409));
                assert_eq!(message, "conflict: name in use");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn stream_error_during_pull_keeps_daemon_message() {
        let err = Error::from_engine(
            bollard::errors::Error::DockerStreamError {
                error: "manifest for nginx:nope not found: manifest unknown".to_string(),
            },
            ENDPOINT,
        );
        assert_eq!(err.category(), ErrorCategory::Api);
        assert_eq!(
            err.to_string(),
            "engine API error: manifest for nginx:nope not found: manifest unknown"
        );
    }

    #[test]
    fn socket_permission_denied_is_classified() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "connect: permission denied");
        let err = Error::from_engine(bollard::errors::Error::from(io_err), ENDPOINT);
        assert_eq!(err.category(), ErrorCategory::PermissionDenied);
    }

    #[test]
    fn refused_connection_carries_endpoint() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let err = Error::from_engine(bollard::errors::Error::from(io_err), ENDPOINT);
        match err {
            Error::Connection { endpoint, .. } => assert_eq!(endpoint, ENDPOINT),
            other => panic!("expected Connection error, got {other:?}"),
        }
    }

    #[test]
    fn unrelated_io_error_is_unknown() {
        let io_err = io::Error::new(io::ErrorKind::InvalidData, "garbage");
        let err = Error::from_engine(bollard::errors::Error::from(io_err), ENDPOINT);
        assert_eq!(err.category(), ErrorCategory::Unknown);
    }

    #[test]
    fn failure_keeps_category_and_message() {
        let err = Error::Api {
            status: Some(500),
            message: "boom".to_string(),
        };
        let failure = Failure::from(&err);
        assert_eq!(failure.category, ErrorCategory::Api);
        assert_eq!(failure.message, "engine API error (500): boom");
    }

    #[test]
    fn category_labels() {
        assert_eq!(ErrorCategory::PermissionDenied.to_string(), "permission-denied");
        assert_eq!(ErrorCategory::NotFound.to_string(), "not-found");
    }
}
