//! # Ctl Core Exception Handling
//!
//! [`Handler`] decides whether a failure is worth reporting, reports it to
//! the application logger and renders it for the console. The console
//! kernel resolves it from the container under `exception.handler`.
use std::error::Error as StdError;
use std::result::Result as StdResult;
use std::sync::Arc;

use thiserror::Error as ThisError;

use crate::console::Output;
use crate::kernel::bindings::keys;
use crate::kernel::bootstrap::Application;
use crate::kernel::error::{Error, ErrorKind};
use crate::logging::LogContext;

/// Reports and renders errors that reach the console kernel boundary.
#[derive(Debug, Clone, Default)]
pub struct Handler {
    dont_report: Vec<ErrorKind>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never report errors of `kind`, including its sub-kinds.
    pub fn dont_report(mut self, kind: ErrorKind) -> Self {
        if !self.dont_report.contains(&kind) {
            self.dont_report.push(kind);
        }
        self
    }

    pub fn ignored(&self) -> &[ErrorKind] {
        &self.dont_report
    }

    pub fn should_report(&self, error: &Error) -> bool {
        !error.kind().lineage().any(|kind| self.dont_report.contains(&kind))
    }

    /// Report `error` unless it is excluded.
    ///
    /// Self-reporting errors report themselves. Anything else goes to the
    /// application logger. When the logger cannot be resolved the original
    /// error is handed back inside [`ReportFailure`], never dropped.
    pub fn report(&self, app: &mut Application, error: Error) -> StdResult<(), ReportFailure> {
        if !self.should_report(&error) {
            log::debug!("Not reporting {}", error.kind().title());
            return Ok(());
        }

        if let Error::SelfReporting(inner) = &error {
            inner.report();
            return Ok(());
        }

        match app.logger() {
            Ok(logger) => {
                logger.error(&error.to_string(), &error_context(&error));
                Ok(())
            }
            Err(cause) => Err(ReportFailure { original: error, cause }),
        }
    }

    /// Write `error` to the error stream of `output`.
    pub fn render_for_console(&self, output: &mut dyn Output, error: &Error) {
        output.error_line("");
        output.error_line(&format!("  {}", error.kind().title()));
        output.error_line("");
        for line in error.to_string().lines() {
            output.error_line(&format!("  {}", line).trim_end());
        }

        let mut source = error.source();
        while let Some(cause) = source {
            output.error_line(&format!("  Caused by: {}", cause));
            source = cause.source();
        }
        output.error_line("");
    }
}

/// A report that could not be written, carrying the original error back.
#[derive(Debug, ThisError)]
#[error("Failed to report {}: {cause}", .original.kind().title())]
pub struct ReportFailure {
    pub original: Error,
    #[source]
    pub cause: Error,
}

impl ReportFailure {
    pub fn into_original(self) -> Error {
        self.original
    }
}

/// Report `error` with the application's handler, then render it.
///
/// Used wherever a failure stops at a console boundary. Falls back to a
/// default [`Handler`] when none can be resolved.
pub fn report_and_render(app: &mut Application, output: &mut dyn Output, error: Error) {
    let handler = app
        .make::<Handler>(keys::EXCEPTION_HANDLER)
        .unwrap_or_else(|e| {
            log::warn!("Falling back to the default exception handler: {}", e);
            Arc::new(Handler::default())
        });

    handler.render_for_console(output, &error);
    if let Err(failure) = handler.report(app, error) {
        log::error!("{}", failure);
        handler.render_for_console(output, &failure.cause);
    }
}

fn error_context(error: &Error) -> LogContext {
    let mut context = LogContext::new();
    context.insert("kind".to_string(), error.kind().title().into());
    let mut causes: Vec<serde_json::Value> = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        causes.push(cause.to_string().into());
        source = cause.source();
    }
    if !causes.is_empty() {
        context.insert("causes".to_string(), causes.into());
    }
    context
}
