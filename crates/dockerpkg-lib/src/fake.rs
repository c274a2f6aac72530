//! In-memory [`Engine`] for tests.
//!
//! Records every request as a short string (`"pull_image nginx:latest"`) so
//! tests can assert on exactly which calls were made, and lets individual
//! methods be forced to fail.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::engine::{
    ContainerDetails, ContainerFilter, ContainerInfo, Engine, EngineVersion, ImageInfo,
    PullSummary, RunSpec,
};
use crate::error::{Error, Result};

type FailureFn = Box<dyn Fn() -> Error + Send + Sync>;

#[derive(Default)]
struct State {
    images: Vec<ImageInfo>,
    containers: Vec<ContainerDetails>,
    /// Image id the "registry" serves for a reference.
    registry: HashMap<String, String>,
    calls: Vec<String>,
    next_id: u64,
}

/// Call-recording engine backed by vectors.
pub struct FakeEngine {
    state: Mutex<State>,
    failures: HashMap<&'static str, FailureFn>,
    inspect_by_id_only: bool,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                ..State::default()
            }),
            failures: HashMap::new(),
            inspect_by_id_only: false,
        }
    }

    /// Seed a local image with a single tag.
    pub fn with_image(self, tag: &str, id: &str) -> Self {
        self.lock().images.push(ImageInfo {
            id: id.to_string(),
            tags: vec![tag.to_string()],
            size: 1024,
        });
        self
    }

    /// Make `reference` pullable, resolving to image `id`.
    pub fn with_remote(self, reference: &str, id: &str) -> Self {
        self.lock()
            .registry
            .insert(reference.to_string(), id.to_string());
        self
    }

    /// Seed a container.
    pub fn with_container(self, name: &str, image: &str, running: bool) -> Self {
        {
            let mut state = self.lock();
            let id = state.allocate_id();
            state.containers.push(ContainerDetails {
                id,
                name: name.to_string(),
                image: image.to_string(),
                state: if running { "running" } else { "exited" }.to_string(),
                running,
                started_at: Some("2026-10-16T09:00:00Z".to_string()),
                exit_code: Some(0),
            });
        }
        self
    }

    /// Make `method` fail with the error produced by `error`.
    pub fn failing<F>(mut self, method: &'static str, error: F) -> Self
    where
        F: Fn() -> Error + Send + Sync + 'static,
    {
        self.failures.insert(method, Box::new(error));
        self
    }

    /// Only match full ids or id prefixes on inspect, never names.
    pub fn exact_lookup_by_id_only(mut self) -> Self {
        self.inspect_by_id_only = true;
        self
    }

    /// Requests made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Current local images.
    pub fn images(&self) -> Vec<ImageInfo> {
        self.lock().images.clone()
    }

    /// Current containers.
    pub fn containers(&self) -> Vec<ContainerDetails> {
        self.lock().containers.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record the call and return the injected failure for `method`, if any.
    fn enter(&self, method: &'static str, args: &str) -> Result<MutexGuard<'_, State>> {
        let mut state = self.lock();
        let call = if args.is_empty() {
            method.to_string()
        } else {
            format!("{method} {args}")
        };
        state.calls.push(call);
        match self.failures.get(method) {
            Some(make_error) => Err(make_error()),
            None => Ok(state),
        }
    }
}

impl State {
    fn allocate_id(&mut self) -> String {
        let id = format!("{:064x}", 0xc0ffee_u64 * 1_000 + self.next_id);
        self.next_id += 1;
        id
    }

    fn container_index(&self, reference: &str, by_name: bool) -> Option<usize> {
        self.containers.iter().position(|c| {
            c.id == reference
                || (reference.len() >= 4 && c.id.starts_with(reference))
                || (by_name && c.name == reference.trim_start_matches('/'))
        })
    }

    fn container_mut(&mut self, reference: &str) -> Result<&mut ContainerDetails> {
        match self.container_index(reference, true) {
            Some(idx) => Ok(&mut self.containers[idx]),
            None => Err(no_such_container(reference)),
        }
    }

    fn image_index(&self, reference: &str) -> Option<usize> {
        self.images
            .iter()
            .position(|img| img.id == reference || img.tags.iter().any(|t| t == reference))
    }
}

fn no_such_container(reference: &str) -> Error {
    Error::NotFound {
        message: format!("No such container: {reference}"),
    }
}

fn no_such_image(reference: &str) -> Error {
    Error::NotFound {
        message: format!("No such image: {reference}"),
    }
}

#[async_trait]
impl Engine for FakeEngine {
    fn endpoint(&self) -> String {
        "fake://engine".to_string()
    }

    async fn ping(&self) -> Result<()> {
        let _state = self.enter("ping", "")?;
        Ok(())
    }

    async fn version(&self) -> Result<EngineVersion> {
        let _state = self.enter("version", "")?;
        Ok(EngineVersion {
            version: "27.3.1".to_string(),
            api_version: "1.47".to_string(),
            os: "linux".to_string(),
            arch: "amd64".to_string(),
        })
    }

    async fn pull_image(&self, reference: &str) -> Result<PullSummary> {
        let mut state = self.enter("pull_image", reference)?;
        let id = state
            .registry
            .get(reference)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                message: format!(
                    "pull access denied for {reference}, repository does not exist"
                ),
            })?;

        for image in &mut state.images {
            image.tags.retain(|t| t != reference);
        }
        state.images.retain(|img| !img.tags.is_empty() || img.id == id);
        match state.images.iter().position(|img| img.id == id) {
            Some(idx) => state.images[idx].tags.push(reference.to_string()),
            None => state.images.push(ImageInfo {
                id: id.clone(),
                tags: vec![reference.to_string()],
                size: 2048,
            }),
        }

        Ok(PullSummary {
            reference: reference.to_string(),
            status: Some(format!("Status: Downloaded newer image for {reference}")),
            layers: 1,
        })
    }

    async fn inspect_image(&self, reference: &str) -> Result<ImageInfo> {
        let state = self.enter("inspect_image", reference)?;
        state
            .image_index(reference)
            .map(|idx| state.images[idx].clone())
            .ok_or_else(|| no_such_image(reference))
    }

    async fn remove_image(&self, reference: &str) -> Result<()> {
        let mut state = self.enter("remove_image", reference)?;
        let idx = state
            .image_index(reference)
            .ok_or_else(|| no_such_image(reference))?;
        state.images.remove(idx);
        Ok(())
    }

    async fn list_images(&self) -> Result<Vec<ImageInfo>> {
        let state = self.enter("list_images", "")?;
        Ok(state.images.clone())
    }

    async fn create_container(&self, spec: &RunSpec) -> Result<String> {
        let args = match &spec.name {
            Some(name) => format!("{} name={name}", spec.image),
            None => spec.image.clone(),
        };
        let mut state = self.enter("create_container", &args)?;
        if state.image_index(&spec.image).is_none() {
            return Err(no_such_image(&spec.image));
        }
        if let Some(name) = &spec.name {
            if state.containers.iter().any(|c| &c.name == name) {
                return Err(Error::Api {
                    status: Some(409),
                    message: format!("Conflict. The container name \"/{name}\" is already in use"),
                });
            }
        }

        let id = state.allocate_id();
        let name = spec
            .name
            .clone()
            .unwrap_or_else(|| format!("auto_{}", &id[id.len() - 6..]));
        state.containers.push(ContainerDetails {
            id: id.clone(),
            name,
            image: spec.image.clone(),
            state: "created".to_string(),
            running: false,
            started_at: None,
            exit_code: None,
        });
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        let mut state = self.enter("start_container", id)?;
        let container = state.container_mut(id)?;
        container.state = "running".to_string();
        container.running = true;
        container.started_at = Some("2026-10-16T10:00:00Z".to_string());
        Ok(())
    }

    async fn stop_container(&self, id: &str) -> Result<()> {
        let mut state = self.enter("stop_container", id)?;
        let container = state.container_mut(id)?;
        container.state = "exited".to_string();
        container.running = false;
        container.exit_code = Some(0);
        Ok(())
    }

    async fn restart_container(&self, id: &str) -> Result<()> {
        let mut state = self.enter("restart_container", id)?;
        let container = state.container_mut(id)?;
        container.state = "running".to_string();
        container.running = true;
        Ok(())
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        let mut state = self.enter("remove_container", id)?;
        let idx = state
            .container_index(id, true)
            .ok_or_else(|| no_such_container(id))?;
        state.containers.remove(idx);
        Ok(())
    }

    async fn inspect_container(&self, reference: &str) -> Result<ContainerDetails> {
        let state = self.enter("inspect_container", reference)?;
        state
            .container_index(reference, !self.inspect_by_id_only)
            .map(|idx| state.containers[idx].clone())
            .ok_or_else(|| no_such_container(reference))
    }

    async fn list_containers(&self, filter: &ContainerFilter) -> Result<Vec<ContainerInfo>> {
        let mut args = if filter.all { "all" } else { "running" }.to_string();
        if let Some(name) = &filter.name {
            args.push_str(&format!(" name={name}"));
        }
        let state = self.enter("list_containers", &args)?;
        Ok(state
            .containers
            .iter()
            .filter(|c| filter.all || c.running)
            .map(|c| ContainerInfo {
                id: c.id.clone(),
                names: vec![format!("/{}", c.name)],
                image: c.image.clone(),
                state: c.state.clone(),
                status: if c.running {
                    "Up 5 minutes".to_string()
                } else {
                    "Exited (0) 1 minute ago".to_string()
                },
            })
            .filter(|c| match &filter.name {
                Some(name) => c.names.iter().any(|n| n.contains(name.as_str())),
                None => true,
            })
            .collect())
    }
}
