//! Connectivity diagnostics.
//!
//! [`diagnose`] runs a fixed sequence of checks against the engine. Each check
//! is reported on its own; a failure never stops the checks after it.

use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::{ContainerFilter, Engine};
use crate::error::{Error, Failure, Result};

/// Check names, in the order they run.
pub const CHECK_CONNECT: &str = "connect";
pub const CHECK_LIST_IMAGES: &str = "list images";
pub const CHECK_LIST_CONTAINERS: &str = "list containers";

const CHECKS: [&str; 3] = [CHECK_CONNECT, CHECK_LIST_IMAGES, CHECK_LIST_CONTAINERS];

/// Result of one diagnostic step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CheckOutcome {
    Passed { detail: String },
    Failed(Failure),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub name: &'static str,
    #[serde(flatten)]
    pub outcome: CheckOutcome,
}

impl Check {
    fn from_result(name: &'static str, result: Result<String>) -> Self {
        let outcome = match result {
            Ok(detail) => {
                debug!(check = name, %detail, "check passed");
                CheckOutcome::Passed { detail }
            }
            Err(err) => {
                warn!(check = name, category = %err.category(), "check failed");
                CheckOutcome::Failed(Failure::from(&err))
            }
        };
        Self { name, outcome }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(self.outcome, CheckOutcome::Passed { .. })
    }
}

/// Every check's outcome for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    pub endpoint: String,
    pub checks: Vec<Check>,
}

impl DiagnosticReport {
    /// Report for an engine client that could not even be constructed.
    pub fn unreachable(endpoint: &str, err: &Error) -> Self {
        let failure = Failure::from(err);
        Self {
            endpoint: endpoint.to_string(),
            checks: CHECKS
                .iter()
                .map(|&name| Check {
                    name,
                    outcome: CheckOutcome::Failed(failure.clone()),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn healthy(&self) -> bool {
        self.checks.iter().all(Check::passed)
    }
}

/// Run every check against `engine`.
pub async fn diagnose(engine: &dyn Engine) -> DiagnosticReport {
    let connect = async {
        engine.ping().await?;
        let version = engine.version().await?;
        Ok::<_, Error>(format!(
            "Docker {} (API {}) on {}/{}",
            version.version, version.api_version, version.os, version.arch
        ))
    }
    .await;

    let images = engine
        .list_images()
        .await
        .map(|images| format!("{} image(s)", images.len()));

    let containers = engine
        .list_containers(&ContainerFilter::all())
        .await
        .map(|containers| format!("{} container(s)", containers.len()));

    DiagnosticReport {
        endpoint: engine.endpoint(),
        checks: vec![
            Check::from_result(CHECK_CONNECT, connect),
            Check::from_result(CHECK_LIST_IMAGES, images),
            Check::from_result(CHECK_LIST_CONTAINERS, containers),
        ],
    }
}
