// Command handlers, one module per area.
//
// Every handler makes its engine request(s), then reports success or a
// classified failure through the `Printer`. Engine errors never escape a
// handler; only output write errors do.

pub mod containers;
pub mod doctor;
pub mod images;

use std::io::{self, Write};

use dockerpkg_lib::Engine;

use crate::cli::Command;
use crate::output::Printer;
use containers::Lifecycle;

/// Invoke the handler for `command` against `engine`.
pub async fn dispatch<W: Write>(
    command: &Command,
    engine: &dyn Engine,
    printer: &mut Printer<W>,
) -> io::Result<()> {
    match command {
        Command::Install { image } => images::handle_install(engine, printer, image).await,
        Command::RemoveImage { image } => images::handle_remove_image(engine, printer, image).await,
        Command::Update { image } => images::handle_update(engine, printer, image).await,
        Command::UpdateAll => images::handle_update_all(engine, printer).await,
        Command::ListImages => images::handle_list_images(engine, printer).await,
        Command::Run { image, name } => {
            containers::handle_run(engine, printer, image, name.as_deref()).await
        }
        Command::Start { container } => {
            containers::handle_lifecycle(engine, printer, container, Lifecycle::Start).await
        }
        Command::Stop { container } => {
            containers::handle_lifecycle(engine, printer, container, Lifecycle::Stop).await
        }
        Command::Restart { container } => {
            containers::handle_lifecycle(engine, printer, container, Lifecycle::Restart).await
        }
        Command::Status { container } => {
            containers::handle_status(engine, printer, container).await
        }
        Command::RemoveContainer { container } => {
            containers::handle_remove_container(engine, printer, container).await
        }
        Command::ListContainers => containers::handle_list_containers(engine, printer).await,
        Command::Doctor => doctor::handle_doctor_with(engine, printer).await,
    }
}
