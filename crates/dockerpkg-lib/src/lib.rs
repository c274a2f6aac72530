//! dockerpkg library entry points.
//!
//! This crate exposes the engine abstraction used by the `dockerpkg` CLI:
//! endpoint resolution, the [`Engine`] trait with its `bollard`-backed
//! implementation, error classification, container resolution, and the
//! multi-request operations (`run`, `update`, `doctor`). The CLI should only
//! depend on what is exported here instead of talking to the client directly.

#![deny(warnings)]

pub mod docker;
pub mod doctor;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod operations;
pub mod resolve;

#[cfg(any(test, feature = "fake-engine"))]
pub mod fake;

pub use docker::DockerEngine;
pub use doctor::{diagnose, Check, CheckOutcome, DiagnosticReport};
pub use endpoint::Endpoint;
pub use engine::{
    short_id, ContainerDetails, ContainerFilter, ContainerInfo, Engine, EngineVersion, ImageInfo,
    PullSummary, RunSpec,
};
pub use error::{Error, ErrorCategory, Failure, Result, PERMISSION_HINT};
pub use operations::{
    run_container, update_all, update_image, RunOutcome, UpdateOutcome, UpdateState, UpdateTally,
};
pub use resolve::resolve_container;
