//! Image command handlers: install, removei, update, update-all, listi.

use std::io::{self, Write};

use tracing::{info, warn};

use dockerpkg_lib::{update_all, update_image, Engine, UpdateState};

use crate::output::Printer;

/// Pull `image` exactly as given.
pub async fn handle_install<W: Write>(
    engine: &dyn Engine,
    printer: &mut Printer<W>,
    image: &str,
) -> io::Result<()> {
    printer.progress(&format!("Pulling image {image}..."))?;
    match engine.pull_image(image).await {
        Ok(summary) => {
            info!(image, layers = summary.layers, status = ?summary.status, "image pulled");
            printer.success("install", image, &format!("Image {image} installed successfully."))
        }
        Err(err) => {
            warn!(image, category = %err.category(), "pull failed");
            printer.failure("install", image, &format!("Failed to install image {image}"), &err)
        }
    }
}

/// Remove `image`, forcing removal when containers still reference it.
pub async fn handle_remove_image<W: Write>(
    engine: &dyn Engine,
    printer: &mut Printer<W>,
    image: &str,
) -> io::Result<()> {
    match engine.remove_image(image).await {
        Ok(()) => printer.success("removei", image, &format!("Image {image} removed successfully.")),
        Err(err) => {
            warn!(image, category = %err.category(), "image removal failed");
            printer.failure("removei", image, &format!("Failed to remove image {image}"), &err)
        }
    }
}

/// Re-pull `image` and say whether it changed.
pub async fn handle_update<W: Write>(
    engine: &dyn Engine,
    printer: &mut Printer<W>,
    image: &str,
) -> io::Result<()> {
    printer.progress(&format!("Checking for updates to {image}..."))?;
    match update_image(engine, image).await {
        Ok(UpdateState::Updated) => {
            printer.success("update", image, &format!("Image {image} updated."))
        }
        Ok(UpdateState::UpToDate) => printer.success(
            "update",
            image,
            &format!("Image {image} is already up to date."),
        ),
        Err(err) => {
            warn!(image, category = %err.category(), "update failed");
            printer.failure("update", image, &format!("Failed to update image {image}"), &err)
        }
    }
}

/// Re-pull every tagged local image.
pub async fn handle_update_all<W: Write>(
    engine: &dyn Engine,
    printer: &mut Printer<W>,
) -> io::Result<()> {
    printer.progress("Updating all images...")?;
    match update_all(engine).await {
        Ok(outcomes) => printer.updates(&outcomes),
        Err(err) => printer.failure("update-all", "*", "Failed to list images", &err),
    }
}

pub async fn handle_list_images<W: Write>(
    engine: &dyn Engine,
    printer: &mut Printer<W>,
) -> io::Result<()> {
    match engine.list_images().await {
        Ok(images) => printer.images(&images),
        Err(err) => printer.failure("listi", "*", "Failed to list images", &err),
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
    async fn install_issues_exactly_one_unmodified_pull() {
        let engine = FakeEngine::new().with_remote("ghcr.io/acme/tool:v1.2", "sha256:t");
        let mut p = printer();

        handle_install(&engine, &mut p, "ghcr.io/acme/tool:v1.2")
            .await
            .unwrap();

        assert_eq!(engine.calls(), vec!["pull_image ghcr.io/acme/tool:v1.2"]);
        assert_eq!(
            output(p),
            "Pulling image ghcr.io/acme/tool:v1.2...\n\
             Image ghcr.io/acme/tool:v1.2 installed successfully.\n"
        );
    }

    #[tokio::test]
    async fn install_of_missing_repository_reports_not_found() {
        let engine = FakeEngine::new();
        let mut p = printer();

        handle_install(&engine, &mut p, "nope").await.unwrap();

        let out = output(p);
        assert!(out.contains("Failed to install image nope: not found"));
        assert_eq!(engine.calls().len(), 1);
    }

    #[tokio::test]
    async fn install_surfaces_daemon_message_from_pull_stream() {
        let engine = FakeEngine::new().failing("pull_image", || Error::Api {
            status: None,
            message: "no matching manifest for linux/amd64 in the manifest list entries"
                .to_string(),
        });
        let mut p = printer();

        handle_install(&engine, &mut p, "acme/tool:arm-only")
            .await
            .unwrap();

        assert!(output(p).ends_with(
            "Failed to install image acme/tool:arm-only: engine API error: \
             no matching manifest for linux/amd64 in the manifest list entries\n"
        ));
    }

    #[tokio::test]
    async fn remove_image_success() {
        let engine = FakeEngine::new().with_image("nginx:latest", "sha256:n");
        let mut p = printer();

        handle_remove_image(&engine, &mut p, "nginx:latest")
            .await
            .unwrap();

        assert_eq!(output(p), "Image nginx:latest removed successfully.\n");
        assert!(engine.images().is_empty());
    }

    #[tokio::test]
    async fn update_reports_up_to_date() {
        let engine = FakeEngine::new()
            .with_image("alpine:3", "sha256:a")
            .with_remote("alpine:3", "sha256:a");
        let mut p = printer();

        handle_update(&engine, &mut p, "alpine:3").await.unwrap();

        assert!(output(p).ends_with("Image alpine:3 is already up to date.\n"));
    }

    #[tokio::test]
    async fn update_all_prints_tally() {
        let engine = FakeEngine::new()
            .with_image("alpine:3", "sha256:a1")
            .with_remote("alpine:3", "sha256:a2");
        let mut p = printer();

        handle_update_all(&engine, &mut p).await.unwrap();

        let out = output(p);
        assert!(out.contains("updated     alpine:3"));
        assert!(out.ends_with("1 updated, 0 up to date, 0 failed.\n"));
    }

    #[tokio::test]
    async fn list_images_on_empty_engine_makes_one_call() {
        let engine = FakeEngine::new();
        let mut p = printer();

        handle_list_images(&engine, &mut p).await.unwrap();

        assert_eq!(output(p), "No images found.\n");
        assert_eq!(engine.calls(), vec!["list_images"]);
    }
}
