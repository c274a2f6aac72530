//! Container reference resolution.
//!
//! Every container command resolves its argument the same way: an exact
//! lookup first, then, only when the engine answers not-found, a name-filtered
//! list lookup that accepts a container whose name matches exactly.

use tracing::debug;

use crate::engine::{ContainerDetails, ContainerFilter, Engine};
use crate::error::Result;

/// Resolve `reference` (id, id prefix, or name) to a container.
///
/// # Errors
///
/// Returns the exact lookup's not-found error when the fallback also finds
/// nothing. Any other error from the exact lookup is returned unchanged.
pub async fn resolve_container(engine: &dyn Engine, reference: &str) -> Result<ContainerDetails> {
    let exact_err = match engine.inspect_container(reference).await {
        Ok(details) => return Ok(details),
        Err(err) if err.is_not_found() => err,
        Err(err) => return Err(err),
    };

    debug!(reference, "exact lookup missed; trying name filter");
    let candidates = engine
        .list_containers(&ContainerFilter::by_name(reference))
        .await?;
    match candidates.iter().find(|c| c.has_name(reference)) {
        Some(found) => engine.inspect_container(&found.id).await,
        None => Err(exact_err),
    }
}
