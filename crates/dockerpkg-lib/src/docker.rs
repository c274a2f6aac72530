//! [`Engine`] implementation backed by the `bollard` Docker Engine API client.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, RestartContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::image::{CreateImageOptions, ListImagesOptions, RemoveImageOptions};
use bollard::{Docker, API_DEFAULT_VERSION};
use futures_util::{pin_mut, TryStreamExt};
use tracing::{debug, info};

use crate::endpoint::Endpoint;
use crate::engine::{
    ContainerDetails, ContainerFilter, ContainerInfo, Engine, EngineVersion, ImageInfo,
    PullSummary, RunSpec,
};
use crate::error::{Error, Result};

/// Request timeout in seconds, matching the client library's own default.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Status lines that mark a layer as present locally after a pull.
const LAYER_DONE_STATUSES: [&str; 2] = ["Pull complete", "Already exists"];

/// Engine client bound to a single endpoint for the lifetime of the process.
pub struct DockerEngine {
    docker: Docker,
    endpoint: String,
}

impl DockerEngine {
    /// Build a client for `endpoint` without contacting the engine.
    pub fn new(endpoint: &Endpoint) -> Result<Self> {
        let label = endpoint.to_string();
        let docker = match endpoint {
            Endpoint::Socket(path) => {
                let path = path.to_str().ok_or_else(|| Error::InvalidEndpoint {
                    value: label.clone(),
                    reason: "socket path is not valid UTF-8".to_string(),
                })?;
                Docker::connect_with_socket(path, REQUEST_TIMEOUT_SECS, API_DEFAULT_VERSION)
            }
            Endpoint::Http(addr) => {
                Docker::connect_with_http(addr, REQUEST_TIMEOUT_SECS, API_DEFAULT_VERSION)
            }
        }
        .map_err(|e| Error::Connection {
            endpoint: label.clone(),
            message: e.to_string(),
        })?;

        debug!(endpoint = %label, "engine client constructed");
        Ok(Self {
            docker,
            endpoint: label,
        })
    }

    /// Build a client and verify the engine answers.
    ///
    /// Transport failures are reported as [`Error::Connection`]; a socket the
    /// caller may not open is reported as [`Error::PermissionDenied`].
    pub async fn connect(endpoint: &Endpoint) -> Result<Self> {
        let engine = Self::new(endpoint)?;
        engine.ping().await.map_err(|e| match e {
            Error::PermissionDenied { .. } | Error::Connection { .. } => e,
            other => Error::Connection {
                endpoint: engine.endpoint.clone(),
                message: other.to_string(),
            },
        })?;
        info!(endpoint = %engine.endpoint, "connected to engine");
        Ok(engine)
    }

    fn classify(&self, err: bollard::errors::Error) -> Error {
        Error::from_engine(err, &self.endpoint)
    }
}

/// Tag to send alongside `fromImage` when pulling `reference`.
///
/// References without an explicit tag or digest pull `latest`; an empty tag
/// would make the engine pull every tag of the repository.
fn pull_tag(reference: &str) -> Option<&'static str> {
    if reference.contains('@') {
        return None;
    }
    let last_segment = reference.rsplit('/').next().unwrap_or(reference);
    if last_segment.contains(':') {
        None
    } else {
        Some("latest")
    }
}

#[async_trait]
impl Engine for DockerEngine {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn ping(&self) -> Result<()> {
        debug!("ping");
        self.docker.ping().await.map_err(|e| self.classify(e))?;
        Ok(())
    }

    async fn version(&self) -> Result<EngineVersion> {
        let version = self.docker.version().await.map_err(|e| self.classify(e))?;
        Ok(EngineVersion {
            version: version.version.unwrap_or_default(),
            api_version: version.api_version.unwrap_or_default(),
            os: version.os.unwrap_or_default(),
            arch: version.arch.unwrap_or_default(),
        })
    }

    async fn pull_image(&self, reference: &str) -> Result<PullSummary> {
        debug!(reference, "pull image");
        let options = CreateImageOptions {
            from_image: reference.to_string(),
            tag: pull_tag(reference).unwrap_or_default().to_string(),
            ..Default::default()
        };

        let stream = self.docker.create_image(Some(options), None, None);
        pin_mut!(stream);

        let mut status = None;
        let mut layers = HashSet::new();
        while let Some(progress) = stream.try_next().await.map_err(|e| self.classify(e))? {
            if let (Some(id), Some(line)) = (progress.id.as_deref(), progress.status.as_deref()) {
                if LAYER_DONE_STATUSES.contains(&line) {
                    layers.insert(id.to_string());
                }
            }
            if let Some(line) = progress.status {
                debug!(reference, status = %line, "pull progress");
                status = Some(line);
            }
        }

        Ok(PullSummary {
            reference: reference.to_string(),
            status,
            layers: layers.len(),
        })
    }

    async fn inspect_image(&self, reference: &str) -> Result<ImageInfo> {
        debug!(reference, "inspect image");
        let image = self
            .docker
            .inspect_image(reference)
            .await
            .map_err(|e| self.classify(e))?;
        Ok(ImageInfo {
            id: image.id.unwrap_or_default(),
            tags: image.repo_tags.unwrap_or_default(),
            size: image.size.unwrap_or_default(),
        })
    }

    async fn remove_image(&self, reference: &str) -> Result<()> {
        debug!(reference, "remove image");
        let options = RemoveImageOptions {
            force: true,
            ..Default::default()
        };
        let removed = self
            .docker
            .remove_image(reference, Some(options), None)
            .await
            .map_err(|e| self.classify(e))?;
        debug!(reference, entries = removed.len(), "image removed");
        Ok(())
    }

    async fn list_images(&self) -> Result<Vec<ImageInfo>> {
        debug!("list images");
        let images = self
            .docker
            .list_images(Some(ListImagesOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await
            .map_err(|e| self.classify(e))?;
        Ok(images
            .into_iter()
            .map(|image| ImageInfo {
                id: image.id,
                tags: image.repo_tags,
                size: image.size,
            })
            .collect())
    }

    async fn create_container(&self, spec: &RunSpec) -> Result<String> {
        debug!(image = %spec.image, name = ?spec.name, "create container");
        let options = spec.name.as_ref().map(|name| CreateContainerOptions {
            name: name.clone(),
            platform: None,
        });
        let config = Config {
            image: Some(spec.image.clone()),
            ..Default::default()
        };
        let created = self
            .docker
            .create_container(options, config)
            .await
            .map_err(|e| self.classify(e))?;
        for warning in &created.warnings {
            debug!(warning = %warning, "engine warning on create");
        }
        Ok(created.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        debug!(id, "start container");
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| self.classify(e))
    }

    async fn stop_container(&self, id: &str) -> Result<()> {
        debug!(id, "stop container");
        self.docker
            .stop_container(id, None::<StopContainerOptions>)
            .await
            .map_err(|e| self.classify(e))
    }

    async fn restart_container(&self, id: &str) -> Result<()> {
        debug!(id, "restart container");
        self.docker
            .restart_container(id, None::<RestartContainerOptions>)
            .await
            .map_err(|e| self.classify(e))
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        debug!(id, "remove container");
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| self.classify(e))
    }

    async fn inspect_container(&self, reference: &str) -> Result<ContainerDetails> {
        debug!(reference, "inspect container");
        let container = self
            .docker
            .inspect_container(reference, None::<InspectContainerOptions>)
            .await
            .map_err(|e| self.classify(e))?;

        let state = container.state.unwrap_or_default();
        Ok(ContainerDetails {
            id: container.id.unwrap_or_default(),
            name: container
                .name
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string(),
            image: container
                .config
                .and_then(|config| config.image)
                .or(container.image)
                .unwrap_or_default(),
            state: state
                .status
                .map(|status| status.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            running: state.running.unwrap_or(false),
            started_at: state.started_at,
            exit_code: state.exit_code,
        })
    }

    async fn list_containers(&self, filter: &ContainerFilter) -> Result<Vec<ContainerInfo>> {
        debug!(?filter, "list containers");
        let mut filters = HashMap::new();
        if let Some(name) = &filter.name {
            filters.insert("name".to_string(), vec![name.clone()]);
        }
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: filter.all,
                filters,
                ..Default::default()
            }))
            .await
            .map_err(|e| self.classify(e))?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerInfo {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
                image: c.image.unwrap_or_default(),
                state: c.state.unwrap_or_default(),
                status: c.status.unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_reference_pulls_latest() {
        assert_eq!(pull_tag("nginx"), Some("latest"));
        assert_eq!(pull_tag("library/nginx"), Some("latest"));
    }

    #[test]
    fn tagged_reference_pulls_its_own_tag() {
        assert_eq!(pull_tag("nginx:1.27"), None);
        assert_eq!(pull_tag("ghcr.io/org/app:v2"), None);
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        assert_eq!(pull_tag("localhost:5000/app"), Some("latest"));
    }

    #[test]
    fn digest_reference_has_no_tag() {
        assert_eq!(pull_tag("alpine@sha256:abcdef"), None);
    }

    #[tokio::test]
    async fn construction_does_not_contact_engine() {
        let endpoint = Endpoint::Http("http://127.0.0.1:1".to_string());
        let engine = DockerEngine::new(&endpoint).expect("client builds offline");
        assert_eq!(engine.endpoint(), "http://127.0.0.1:1");
    }
}
