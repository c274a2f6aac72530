//! Doctor command handler.

use std::io::{self, Write};

use tracing::info;

use dockerpkg_lib::{diagnose, DiagnosticReport, DockerEngine, Endpoint, Engine};

use crate::output::Printer;

/// Run diagnostics against a freshly built client for `host`.
///
/// Unlike every other command, an unreachable or malformed endpoint is a
/// reported result here rather than a fatal error.
pub async fn handle_doctor<W: Write>(host: Option<&str>, printer: &mut Printer<W>) -> io::Result<()> {
    let endpoint = match Endpoint::resolve(host) {
        Ok(endpoint) => endpoint,
        Err(err) => {
            let label = host.unwrap_or("<environment>");
            return printer.diagnostics(&DiagnosticReport::unreachable(label, &err));
        }
    };

    match DockerEngine::new(&endpoint) {
        Ok(engine) => handle_doctor_with(&engine, printer).await,
        Err(err) => {
            printer.diagnostics(&DiagnosticReport::unreachable(&endpoint.to_string(), &err))
        }
    }
}

/// Run diagnostics against an existing engine handle.
pub async fn handle_doctor_with<W: Write>(
    engine: &dyn Engine,
    printer: &mut Printer<W>,
) -> io::Result<()> {
    printer.progress("Running diagnostics...")?;
    let report = diagnose(engine).await;
    info!(healthy = report.healthy(), "diagnostics complete");
    printer.diagnostics(&report)
}
