//! Output formatting for command results.
//!
//! Every handler reports through a [`Printer`], which renders either colored
//! human-readable text or a single JSON document per invocation.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use dockerpkg_lib::{
    ContainerDetails, ContainerInfo, DiagnosticReport, Error, ErrorCategory, Failure, ImageInfo,
    UpdateOutcome, UpdateState, UpdateTally, PERMISSION_HINT,
};

use crate::terminal::{format_size, ColorPalette};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text, colored when the terminal allows it.
    #[default]
    Text,
    /// One pretty-printed JSON document on stdout.
    Json,
}

/// JSON shape for single-target actions (install, start, removec, ...).
#[derive(Debug, Serialize)]
struct ActionReport<'a> {
    action: &'a str,
    target: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Failure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdateEntry<'a> {
    reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<UpdateState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Failure>,
}

/// Renders command results to a writer.
pub struct Printer<W: Write> {
    out: W,
    palette: ColorPalette,
    format: OutputFormat,
}

impl Printer<io::Stdout> {
    /// Printer on stdout with colors detected from the environment.
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(io::stdout(), ColorPalette::detect(), format)
    }
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, palette: ColorPalette, format: OutputFormat) -> Self {
        Self {
            out,
            palette,
            format,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, value).map_err(io::Error::other)?;
        self.out.write_all(b"\n")
    }

    fn line(&mut self, color: &str, text: &str) -> io::Result<()> {
        writeln!(self.out, "{color}{text}{}", self.palette.reset)
    }

    /// Progress line shown before a slow request; text mode only.
    pub fn progress(&mut self, text: &str) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                let cyan = self.palette.cyan;
                self.line(cyan, text)
            }
            OutputFormat::Json => Ok(()),
        }
    }

    /// Report a successful single-target action.
    pub fn success(&mut self, action: &str, target: &str, message: &str) -> io::Result<()> {
        self.success_with_id(action, target, None, message)
    }

    /// Report a successful action that produced an object id.
    pub fn success_with_id(
        &mut self,
        action: &str,
        target: &str,
        id: Option<&str>,
        message: &str,
    ) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                let green = self.palette.green;
                self.line(green, message)
            }
            OutputFormat::Json => self.json(&ActionReport {
                action,
                target,
                ok: true,
                id,
                message: Some(message),
                error: None,
                hint: None,
            }),
        }
    }

    /// Report a failed single-target action.
    ///
    /// `context` is the text-mode lead-in, e.g. `Failed to remove container web`.
    pub fn failure(
        &mut self,
        action: &str,
        target: &str,
        context: &str,
        err: &Error,
    ) -> io::Result<()> {
        let hint = hint_for(err);
        match self.format {
            OutputFormat::Text => {
                let red = self.palette.red;
                let text = format!("{context}: {}", describe_failure(err));
                self.line(red, &text)?;
                if let Some(hint) = hint {
                    let yellow = self.palette.yellow;
                    self.line(yellow, hint)?;
                }
                Ok(())
            }
            OutputFormat::Json => self.json(&ActionReport {
                action,
                target,
                ok: false,
                id: None,
                message: None,
                error: Some(Failure::from(err)),
                hint,
            }),
        }
    }

    /// Render the image list.
    pub fn images(&mut self, images: &[ImageInfo]) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(&serde_json::json!({ "images": images }));
        }
        let p = self.palette;
        if images.is_empty() {
            return self.line(p.yellow, "No images found.");
        }
        self.line(p.cyan, "Available images:")?;
        for image in images {
            writeln!(
                self.out,
                "- {}{}{} {}({}, {}){}",
                p.white_bold,
                image.display_tags(),
                p.reset,
                p.gray,
                dockerpkg_lib::short_id(&image.id),
                format_size(image.size),
                p.reset
            )?;
        }
        Ok(())
    }

    /// Render the container list.
    pub fn containers(&mut self, containers: &[ContainerInfo]) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(&serde_json::json!({ "containers": containers }));
        }
        let p = self.palette;
        if containers.is_empty() {
            return self.line(p.yellow, "No containers found.");
        }
        self.line(p.cyan, "Available containers:")?;
        for c in containers {
            writeln!(
                self.out,
                "- {}{}{} ({}) [{}] {}{}{}",
                p.white_bold,
                c.name(),
                p.reset,
                c.short_id(),
                c.status,
                p.gray,
                c.image,
                p.reset
            )?;
        }
        Ok(())
    }

    /// Render one container's state.
    pub fn status(&mut self, details: &ContainerDetails) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(details);
        }
        let p = self.palette;
        let state_color = if details.running { p.green } else { p.yellow };
        writeln!(
            self.out,
            "{}Container {}{}{}",
            p.cyan, p.white_bold, details.name, p.reset
        )?;
        writeln!(self.out, "  ID:      {}", details.short_id())?;
        writeln!(self.out, "  Image:   {}", details.image)?;
        writeln!(
            self.out,
            "  State:   {}{}{}",
            state_color, details.state, p.reset
        )?;
        if let Some(started) = details.started_at.as_deref().filter(|s| !s.is_empty()) {
            writeln!(self.out, "  Started: {started}")?;
        }
        if !details.running {
            if let Some(code) = details.exit_code {
                writeln!(self.out, "  Exit:    {code}")?;
            }
        }
        Ok(())
    }

    /// Render the per-tag results of `update-all`.
    pub fn updates(&mut self, outcomes: &[UpdateOutcome]) -> io::Result<()> {
        let tally = UpdateTally::from_outcomes(outcomes);
        if self.format == OutputFormat::Json {
            let entries: Vec<UpdateEntry<'_>> = outcomes
                .iter()
                .map(|o| UpdateEntry {
                    reference: &o.reference,
                    state: o.result.as_ref().ok().copied(),
                    error: o.result.as_ref().err().map(Failure::from),
                })
                .collect();
            return self.json(&serde_json::json!({ "updates": entries, "tally": tally }));
        }

        let p = self.palette;
        if outcomes.is_empty() {
            return self.line(p.yellow, "No images found.");
        }
        for outcome in outcomes {
            match &outcome.result {
                Ok(UpdateState::Updated) => {
                    writeln!(self.out, "{}updated{}     {}", p.green, p.reset, outcome.reference)?
                }
                Ok(UpdateState::UpToDate) => {
                    writeln!(self.out, "{}up to date{}  {}", p.gray, p.reset, outcome.reference)?
                }
                Err(err) => writeln!(
                    self.out,
                    "{}failed{}      {}: {}",
                    p.red,
                    p.reset,
                    outcome.reference,
                    describe_failure(err)
                )?,
            }
        }
        let summary = format!(
            "{} updated, {} up to date, {} failed.",
            tally.updated, tally.up_to_date, tally.failed
        );
        let color = if tally.failed > 0 { p.yellow } else { p.green };
        self.line(color, &summary)
    }

    /// Render the diagnostic report.
    pub fn diagnostics(&mut self, report: &DiagnosticReport) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(report);
        }
        let p = self.palette;
        writeln!(self.out, "{}Engine endpoint: {}{}", p.cyan, report.endpoint, p.reset)?;
        for check in &report.checks {
            match &check.outcome {
                dockerpkg_lib::CheckOutcome::Passed { detail } => writeln!(
                    self.out,
                    "{}[ok]{}   {:<16} {}",
                    p.green, p.reset, check.name, detail
                )?,
                dockerpkg_lib::CheckOutcome::Failed(failure) => writeln!(
                    self.out,
                    "{}[fail]{} {:<16} {} ({})",
                    p.red, p.reset, check.name, failure.message, failure.category
                )?,
            }
        }
        let denied = report.checks.iter().any(|c| {
            matches!(&c.outcome, dockerpkg_lib::CheckOutcome::Failed(f)
                if f.category == ErrorCategory::PermissionDenied)
        });
        if denied {
            self.line(p.yellow, PERMISSION_HINT)?;
        }
        if report.healthy() {
            self.line(p.green, "All checks passed.")
        } else {
            self.line(p.yellow, "Some checks failed.")
        }
    }
}

/// One-line description of a classified failure.
pub fn describe_failure(err: &Error) -> String {
    match err {
        Error::NotFound { message } => format!("not found ({message})"),
        Error::PermissionDenied { message } => format!("permission denied ({message})"),
        Error::Api {
            status: Some(status),
            message,
        } => format!("engine API error {status}: {message}"),
        Error::Api {
            status: None,
            message,
        } => format!("engine API error: {message}"),
        other => other.to_string(),
    }
}

/// Remediation hint for failures that have one.
pub fn hint_for(err: &Error) -> Option<&'static str> {
    match err.category() {
        ErrorCategory::PermissionDenied => Some(PERMISSION_HINT),
        _ => None,
    }
}
