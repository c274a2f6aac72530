//! Pre-dispatch connection outcome.
//!
//! Every command except `doctor` needs a reachable engine before its handler
//! runs. This module decides what a failed connect means for the process.

use std::io::Write;

use tracing::error;

use dockerpkg_lib::{Error, ErrorCategory};

use crate::output::hint_for;
use crate::terminal::ColorPalette;

/// Exit status when the engine endpoint cannot be reached before dispatch.
pub const EXIT_CONNECTION_FAILURE: u8 = 1;

/// Hand back the connected engine, or report the failure to `err_out` and
/// return the exit status the process should end with.
///
/// A permission-denied answer aborts the command but is not a process
/// failure; any other connect error is.
pub fn engine_or_exit<E, W: Write>(
    connected: Result<E, Error>,
    palette: ColorPalette,
    err_out: &mut W,
) -> Result<E, u8> {
    let err = match connected {
        Ok(engine) => return Ok(engine),
        Err(err) => err,
    };

    let _ = writeln!(
        err_out,
        "{}Error: Could not connect to the Docker daemon. {}{}",
        palette.red, err, palette.reset
    );
    if let Some(hint) = hint_for(&err) {
        let _ = writeln!(err_out, "{}{}{}", palette.yellow, hint, palette.reset);
    }

    if err.category() == ErrorCategory::PermissionDenied {
        Err(0)
    } else {
        error!(error = %err, "engine unreachable");
        Err(EXIT_CONNECTION_FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockerpkg_lib::PERMISSION_HINT;

    fn decide(connected: Result<&'static str, Error>) -> (Result<&'static str, u8>, String) {
        let mut err_out = Vec::new();
        let result = engine_or_exit(connected, ColorPalette::plain(), &mut err_out);
        (result, String::from_utf8(err_out).unwrap())
    }

    #[test]
    fn connected_engine_passes_through_silently() {
        let (result, stderr) = decide(Ok("engine"));
        assert_eq!(result, Ok("engine"));
        assert!(stderr.is_empty());
    }

    #[test]
    fn permission_denied_prints_hint_and_exits_zero() {
        let (result, stderr) = decide(Err(Error::PermissionDenied {
            message: "connect: permission denied".to_string(),
        }));
        assert_eq!(result, Err(0));
        assert!(stderr.starts_with(
            "Error: Could not connect to the Docker daemon. permission denied: \
             connect: permission denied\n"
        ));
        assert!(stderr.ends_with(&format!("{PERMISSION_HINT}\n")));
    }

    #[test]
    fn unreachable_engine_exits_with_connection_code() {
        let (result, stderr) = decide(Err(Error::Connection {
            endpoint: "unix:///var/run/docker.sock".to_string(),
            message: "connection refused".to_string(),
        }));
        assert_eq!(result, Err(EXIT_CONNECTION_FAILURE));
        assert!(stderr.contains("unix:///var/run/docker.sock"));
        assert!(!stderr.contains(PERMISSION_HINT));
    }

    #[test]
    fn malformed_endpoint_exits_with_connection_code() {
        let (result, _) = decide(Err(Error::InvalidEndpoint {
            value: "ssh://nowhere".to_string(),
            reason: "unsupported scheme".to_string(),
        }));
        assert_eq!(result, Err(EXIT_CONNECTION_FAILURE));
    }
}
