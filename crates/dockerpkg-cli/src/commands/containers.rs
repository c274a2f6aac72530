//! Container command handlers: run, start, stop, restart, status, removec, listc.

use std::io::{self, Write};

use tracing::{info, warn};

use dockerpkg_lib::{
    resolve_container, run_container, short_id, ContainerFilter, Engine, Result, RunSpec,
};

use crate::output::Printer;

/// Lifecycle transitions that take a resolved container id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Start,
    Stop,
    Restart,
}

impl Lifecycle {
    fn command(self) -> &'static str {
        match self {
            Lifecycle::Start => "start",
            Lifecycle::Stop => "stop",
            Lifecycle::Restart => "restart",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Lifecycle::Start => "started",
            Lifecycle::Stop => "stopped",
            Lifecycle::Restart => "restarted",
        }
    }

    async fn apply(self, engine: &dyn Engine, id: &str) -> Result<()> {
        match self {
            Lifecycle::Start => engine.start_container(id).await,
            Lifecycle::Stop => engine.stop_container(id).await,
            Lifecycle::Restart => engine.restart_container(id).await,
        }
    }
}

/// Create and start a detached container from `image`.
pub async fn handle_run<W: Write>(
    engine: &dyn Engine,
    printer: &mut Printer<W>,
    image: &str,
    name: Option<&str>,
) -> io::Result<()> {
    printer.progress(&format!("Starting container from {image}..."))?;
    let spec = RunSpec::new(image).with_name(name.map(str::to_string));
    match run_container(engine, &spec).await {
        Ok(outcome) => {
            if let Some(pull) = &outcome.pulled {
                info!(image, layers = pull.layers, "pulled missing image before run");
            }
            let short = short_id(&outcome.id);
            printer.success_with_id(
                "run",
                image,
                Some(&outcome.id),
                &format!("Container {short} running."),
            )
        }
        Err(err) => {
            warn!(image, category = %err.category(), "run failed");
            printer.failure("run", image, &format!("Failed to run container {image}"), &err)
        }
    }
}

/// Resolve `container` and apply one lifecycle transition.
pub async fn handle_lifecycle<W: Write>(
    engine: &dyn Engine,
    printer: &mut Printer<W>,
    container: &str,
    action: Lifecycle,
) -> io::Result<()> {
    let command = action.command();
    let result = async {
        let details = resolve_container(engine, container).await?;
        action.apply(engine, &details.id).await
    }
    .await;

    match result {
        Ok(()) => printer.success(
            command,
            container,
            &format!("Container {container} {}.", action.past_tense()),
        ),
        Err(err) => {
            warn!(container, command, category = %err.category(), "lifecycle call failed");
            printer.failure(
                command,
                container,
                &format!("Failed to {command} container {container}"),
                &err,
            )
        }
    }
}

pub async fn handle_status<W: Write>(
    engine: &dyn Engine,
    printer: &mut Printer<W>,
    container: &str,
) -> io::Result<()> {
    match resolve_container(engine, container).await {
        Ok(details) => printer.status(&details),
        Err(err) => printer.failure(
            "status",
            container,
            &format!("Failed to get status of container {container}"),
            &err,
        ),
    }
}

/// Resolve and force-remove `container`.
pub async fn handle_remove_container<W: Write>(
    engine: &dyn Engine,
    printer: &mut Printer<W>,
    container: &str,
) -> io::Result<()> {
    let result = async {
        let details = resolve_container(engine, container).await?;
        engine.remove_container(&details.id).await
    }
    .await;

    match result {
        Ok(()) => printer.success(
            "removec",
            container,
            &format!("Container {container} removed successfully."),
        ),
        Err(err) => {
            warn!(container, category = %err.category(), "container removal failed");
            printer.failure(
                "removec",
                container,
                &format!("Failed to remove container {container}"),
                &err,
            )
        }
    }
}

/// List every container, running or stopped.
pub async fn handle_list_containers<W: Write>(
    engine: &dyn Engine,
    printer: &mut Printer<W>,
) -> io::Result<()> {
    match engine.list_containers(&ContainerFilter::all()).await {
        Ok(containers) => printer.containers(&containers),
        Err(err) => printer.failure("listc", "*", "Failed to list containers", &err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use crate::terminal::ColorPalette;
    use dockerpkg_lib::fake::FakeEngine;
    use dockerpkg_lib::Error;

    fn printer() -> Printer<Vec<u8>> {
        Printer::new(Vec::new(), ColorPalette::plain(), OutputFormat::Text)
    }

    fn output(printer: Printer<Vec<u8>>) -> String {
        String::from_utf8(printer.into_inner()).unwrap()
    }

    #[tokio::test]
    async fn run_prints_short_id() {
        let engine = FakeEngine::new().with_image("nginx:latest", "sha256:n");
        let mut p = printer();

        handle_run(&engine, &mut p, "nginx:latest", Some("web"))
            .await
            .unwrap();

        let id = engine.containers()[0].id.clone();
        assert_eq!(
            output(p),
            format!(
                "Starting container from nginx:latest...\nContainer {} running.\n",
                &id[..12]
            )
        );
    }

    #[tokio::test]
    async fn stop_resolves_then_stops() {
        let engine = FakeEngine::new().with_container("web", "nginx:latest", true);
        let id = engine.containers()[0].id.clone();
        let mut p = printer();

        handle_lifecycle(&engine, &mut p, "web", Lifecycle::Stop)
            .await
            .unwrap();

        assert_eq!(output(p), "Container web stopped.\n");
        assert_eq!(
            engine.calls(),
            vec!["inspect_container web".to_string(), format!("stop_container {id}")]
        );
        assert!(!engine.containers()[0].running);
    }

    #[tokio::test]
    async fn restart_of_unknown_container_is_not_found() {
        let engine = FakeEngine::new();
        let mut p = printer();

        handle_lifecycle(&engine, &mut p, "ghost", Lifecycle::Restart)
            .await
            .unwrap();

        assert!(output(p).starts_with("Failed to restart container ghost: not found"));
    }

    #[tokio::test]
    async fn remove_nonexistent_container_reports_not_found() {
        let engine = FakeEngine::new();
        let mut p = printer();

        handle_remove_container(&engine, &mut p, "ghost")
            .await
            .unwrap();

        assert_eq!(
            output(p),
            "Failed to remove container ghost: not found (No such container: ghost)\n"
        );
        assert!(!engine.calls().iter().any(|c| c.starts_with("remove_container")));
    }

    #[tokio::test]
    async fn remove_existing_container() {
        let engine = FakeEngine::new().with_container("db", "postgres:16", false);
        let mut p = printer();

        handle_remove_container(&engine, &mut p, "db").await.unwrap();

        assert_eq!(output(p), "Container db removed successfully.\n");
        assert!(engine.containers().is_empty());
    }

    #[tokio::test]
    async fn status_shows_state() {
        let engine = FakeEngine::new().with_container("db", "postgres:16", false);
        let mut p = printer();

        handle_status(&engine, &mut p, "db").await.unwrap();

        let out = output(p);
        assert!(out.starts_with("Container db\n"));
        assert!(out.contains("  Image:   postgres:16\n"));
        assert!(out.contains("  State:   exited\n"));
        assert!(out.contains("  Exit:    0\n"));
    }

    #[tokio::test]
    async fn list_containers_on_empty_engine_makes_one_call() {
        let engine = FakeEngine::new();
        let mut p = printer();

        handle_list_containers(&engine, &mut p).await.unwrap();

        assert_eq!(output(p), "No containers found.\n");
        assert_eq!(engine.calls(), vec!["list_containers all"]);
    }

    #[tokio::test]
    async fn api_error_is_surfaced_verbatim() {
        let engine = FakeEngine::new()
            .with_container("web", "nginx:latest", true)
            .failing("start_container", || Error::Api {
                status: Some(500),
                message: "driver failed programming external connectivity".to_string(),
            });
        let mut p = printer();

        handle_lifecycle(&engine, &mut p, "web", Lifecycle::Start)
            .await
            .unwrap();

        assert_eq!(
            output(p),
            "Failed to start container web: engine API error 500: \
             driver failed programming external connectivity\n"
        );
    }
}
