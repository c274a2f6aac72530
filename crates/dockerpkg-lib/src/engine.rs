//! Engine abstraction.
//!
//! [`Engine`] has one method per request the tool makes against the container
//! engine. The value types are transient copies of what the engine reports;
//! nothing here is cached or persisted.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// Length of the abbreviated identifier shown to users.
pub const SHORT_ID_LEN: usize = 12;

/// Abbreviate a full identifier, dropping any `sha256:` prefix.
#[must_use]
pub fn short_id(id: &str) -> &str {
    let id = id.strip_prefix("sha256:").unwrap_or(id);
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Daemon version information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineVersion {
    pub version: String,
    pub api_version: String,
    pub os: String,
    pub arch: String,
}

/// One locally stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub id: String,
    pub tags: Vec<String>,
    pub size: i64,
}

impl ImageInfo {
    /// Tags joined for display, or `<none>` for dangling images.
    #[must_use]
    pub fn display_tags(&self) -> String {
        if self.tags.is_empty() {
            "<none>".to_string()
        } else {
            self.tags.join(", ")
        }
    }

    /// Tags that can be pulled again (skips `<none>:<none>` placeholders).
    pub fn pullable_tags(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .map(String::as_str)
            .filter(|tag| !tag.starts_with("<none>"))
    }
}

/// One row of the container list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub state: String,
    pub status: String,
}

impl ContainerInfo {
    /// Primary name without the engine's leading `/`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.names
            .first()
            .map(|n| n.trim_start_matches('/'))
            .unwrap_or("<unnamed>")
    }

    #[must_use]
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    /// Whether any of the container's names equals `name` exactly.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        let name = name.trim_start_matches('/');
        self.names.iter().any(|n| n.trim_start_matches('/') == name)
    }
}

/// Result of inspecting a single container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerDetails {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: String,
    pub running: bool,
    pub started_at: Option<String>,
    pub exit_code: Option<i64>,
}

impl ContainerDetails {
    #[must_use]
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

/// Outcome of pulling an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullSummary {
    pub reference: String,
    /// Last status line reported by the engine, e.g. `Status: Downloaded newer image for ...`.
    pub status: Option<String>,
    /// Number of distinct layers the engine reported progress for.
    pub layers: usize,
}

/// What to create for `run`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub name: Option<String>,
}

impl RunSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }
}

/// Filter for listing containers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerFilter {
    /// Include stopped containers.
    pub all: bool,
    /// Restrict to containers whose name contains this value.
    pub name: Option<String>,
}

impl ContainerFilter {
    /// Every container, running or not.
    #[must_use]
    pub fn all() -> Self {
        Self {
            all: true,
            name: None,
        }
    }

    /// Every container whose name matches `name`.
    #[must_use]
    pub fn by_name(name: &str) -> Self {
        Self {
            all: true,
            name: Some(name.to_string()),
        }
    }
}

/// Requests the tool makes against the container engine.
///
/// Each method is a single best-effort request; implementations do not retry.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Human-readable endpoint this engine talks to.
    fn endpoint(&self) -> String;

    async fn ping(&self) -> Result<()>;

    async fn version(&self) -> Result<EngineVersion>;

    /// Pull `reference` exactly as given.
    async fn pull_image(&self, reference: &str) -> Result<PullSummary>;

    async fn inspect_image(&self, reference: &str) -> Result<ImageInfo>;

    /// Remove an image, forcing removal when it is in use.
    async fn remove_image(&self, reference: &str) -> Result<()>;

    async fn list_images(&self) -> Result<Vec<ImageInfo>>;

    /// Create a container and return its id.
    async fn create_container(&self, spec: &RunSpec) -> Result<String>;

    async fn start_container(&self, id: &str) -> Result<()>;

    async fn stop_container(&self, id: &str) -> Result<()>;

    async fn restart_container(&self, id: &str) -> Result<()>;

    /// Remove a container, killing it first when running.
    async fn remove_container(&self, id: &str) -> Result<()>;

    async fn inspect_container(&self, reference: &str) -> Result<ContainerDetails>;

    async fn list_containers(&self, filter: &ContainerFilter) -> Result<Vec<ContainerInfo>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_strips_digest_prefix() {
        assert_eq!(
            short_id("sha256:4c1b2f9e8d7a6b5c4d3e2f1a0b9c8d7e"),
            "4c1b2f9e8d7a"
        );
    }

    #[test]
    fn short_id_keeps_short_values() {
        assert_eq!(short_id("abc123"), "abc123");
    }

    #[test]
    fn container_name_drops_leading_slash() {
        let info = ContainerInfo {
            id: "f00dfeedbeef00112233".to_string(),
            names: vec!["/web".to_string()],
            image: "nginx:latest".to_string(),
            state: "running".to_string(),
            status: "Up 2 minutes".to_string(),
        };
        assert_eq!(info.name(), "web");
        assert!(info.has_name("web"));
        assert!(info.has_name("/web"));
        assert!(!info.has_name("we"));
        assert_eq!(info.short_id(), "f00dfeedbeef");
    }

    #[test]
    fn dangling_image_displays_none() {
        let image = ImageInfo {
            id: "sha256:1".to_string(),
            tags: vec!["<none>:<none>".to_string()],
            size: 0,
        };
        assert_eq!(image.pullable_tags().count(), 0);

        let untagged = ImageInfo {
            tags: Vec::new(),
            ..image
        };
        assert_eq!(untagged.display_tags(), "<none>");
    }
}
