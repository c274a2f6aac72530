//! Operations that take more than one engine request.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::{Engine, PullSummary, RunSpec};
use crate::error::Result;

/// Container started by [`run_container`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub id: String,
    /// Present when the image had to be pulled before the container could be created.
    pub pulled: Option<PullSummary>,
}

/// Create and start a detached container from `spec`.
///
/// When the engine reports the image missing, it is pulled once and the
/// create is issued again, the way the engine's own `run` behaves.
pub async fn run_container(engine: &dyn Engine, spec: &RunSpec) -> Result<RunOutcome> {
    let (id, pulled) = match engine.create_container(spec).await {
        Ok(id) => (id, None),
        Err(err) if err.is_not_found() => {
            info!(image = %spec.image, "image not present locally; pulling");
            let summary = engine.pull_image(&spec.image).await?;
            let id = engine.create_container(spec).await?;
            (id, Some(summary))
        }
        Err(err) => return Err(err),
    };
    engine.start_container(&id).await?;
    Ok(RunOutcome { id, pulled })
}

/// Whether a re-pull changed the local image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    /// The tag now points at a different image (or was not present before).
    Updated,
    UpToDate,
}

/// Re-pull `reference` and compare the image id before and after.
pub async fn update_image(engine: &dyn Engine, reference: &str) -> Result<UpdateState> {
    let before = match engine.inspect_image(reference).await {
        Ok(image) => Some(image.id),
        Err(err) if err.is_not_found() => None,
        Err(err) => return Err(err),
    };

    engine.pull_image(reference).await?;
    let after = engine.inspect_image(reference).await?.id;

    let state = if before.as_deref() == Some(after.as_str()) {
        UpdateState::UpToDate
    } else {
        UpdateState::Updated
    };
    debug!(reference, ?state, "image update checked");
    Ok(state)
}

/// Result of updating one tag during [`update_all`].
#[derive(Debug)]
pub struct UpdateOutcome {
    pub reference: String,
    pub result: Result<UpdateState>,
}

/// Re-pull every tagged local image, continuing past individual failures.
///
/// # Errors
///
/// Only the initial image listing can fail the whole operation.
pub async fn update_all(engine: &dyn Engine) -> Result<Vec<UpdateOutcome>> {
    let images = engine.list_images().await?;
    let mut references: Vec<String> = images
        .iter()
        .flat_map(|image| image.pullable_tags().map(str::to_string))
        .collect();
    references.sort();
    references.dedup();

    let mut outcomes = Vec::with_capacity(references.len());
    for reference in references {
        let result = update_image(engine, &reference).await;
        if let Err(err) = &result {
            warn!(reference = %reference, category = %err.category(), "update failed");
        }
        outcomes.push(UpdateOutcome { reference, result });
    }
    Ok(outcomes)
}

/// Tally of an [`update_all`] run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateTally {
    pub updated: usize,
    pub up_to_date: usize,
    pub failed: usize,
}

impl UpdateTally {
    pub fn from_outcomes(outcomes: &[UpdateOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut tally, outcome| {
                match &outcome.result {
                    Ok(UpdateState::Updated) => tally.updated += 1,
                    Ok(UpdateState::UpToDate) => tally.up_to_date += 1,
                    Err(_) => tally.failed += 1,
                }
                tally
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::fake::FakeEngine;

    #[tokio::test]
    async fn run_with_local_image_creates_then_starts() {
        let engine = FakeEngine::new().with_image("nginx:latest", "sha256:aaa");

        let outcome = run_container(&engine, &RunSpec::new("nginx:latest"))
            .await
            .unwrap();

        assert!(outcome.pulled.is_none());
        assert_eq!(
            engine.calls(),
            vec![
                "create_container nginx:latest".to_string(),
                format!("start_container {}", outcome.id),
            ]
        );
        assert!(engine.containers()[0].running);
    }

    #[tokio::test]
    async fn run_pulls_missing_image_once() {
        let engine = FakeEngine::new().with_remote("redis:7", "sha256:bbb");

        let spec = RunSpec::new("redis:7").with_name(Some("cache".to_string()));
        let outcome = run_container(&engine, &spec).await.unwrap();

        assert!(outcome.pulled.is_some());
        let calls = engine.calls();
        assert_eq!(calls[0], "create_container redis:7 name=cache");
        assert_eq!(calls[1], "pull_image redis:7");
        assert_eq!(calls[2], "create_container redis:7 name=cache");
        assert_eq!(engine.containers()[0].name, "cache");
    }

    #[tokio::test]
    async fn run_with_unknown_image_reports_not_found() {
        let engine = FakeEngine::new();

        let err = run_container(&engine, &RunSpec::new("nope:1")).await.unwrap_err();

        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(engine.containers().is_empty());
    }

    #[tokio::test]
    async fn name_conflict_is_api_error() {
        let engine = FakeEngine::new()
            .with_image("nginx:latest", "sha256:aaa")
            .with_container("web", "nginx:latest", true);

        let spec = RunSpec::new("nginx:latest").with_name(Some("web".to_string()));
        let err = run_container(&engine, &spec).await.unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Api);
    }

    #[tokio::test]
    async fn update_detects_new_image() {
        let engine = FakeEngine::new()
            .with_image("alpine:3", "sha256:old")
            .with_remote("alpine:3", "sha256:new");

        let state = update_image(&engine, "alpine:3").await.unwrap();

        assert_eq!(state, UpdateState::Updated);
        assert_eq!(
            engine.calls(),
            vec!["inspect_image alpine:3", "pull_image alpine:3", "inspect_image alpine:3"]
        );
    }

    #[tokio::test]
    async fn update_detects_unchanged_image() {
        let engine = FakeEngine::new()
            .with_image("alpine:3", "sha256:same")
            .with_remote("alpine:3", "sha256:same");

        let state = update_image(&engine, "alpine:3").await.unwrap();

        assert_eq!(state, UpdateState::UpToDate);
    }

    #[tokio::test]
    async fn update_of_absent_image_installs_it() {
        let engine = FakeEngine::new().with_remote("busybox:latest", "sha256:c");

        let state = update_image(&engine, "busybox:latest").await.unwrap();

        assert_eq!(state, UpdateState::Updated);
    }

    #[tokio::test]
    async fn update_all_continues_past_failures() {
        let engine = FakeEngine::new()
            .with_image("alpine:3", "sha256:a1")
            .with_image("local/only:dev", "sha256:l1")
            .with_image("nginx:latest", "sha256:n1")
            .with_remote("alpine:3", "sha256:a2")
            .with_remote("nginx:latest", "sha256:n1");

        let outcomes = update_all(&engine).await.unwrap();

        let references: Vec<_> = outcomes.iter().map(|o| o.reference.as_str()).collect();
        assert_eq!(references, vec!["alpine:3", "local/only:dev", "nginx:latest"]);
        assert_eq!(
            UpdateTally::from_outcomes(&outcomes),
            UpdateTally {
                updated: 1,
                up_to_date: 1,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn update_all_on_empty_engine_makes_one_call() {
        let engine = FakeEngine::new();

        let outcomes = update_all(&engine).await.unwrap();

        assert!(outcomes.is_empty());
        assert_eq!(engine.calls(), vec!["list_images"]);
    }
}
