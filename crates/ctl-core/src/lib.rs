//! # Ctl Core
//!
//! A small console-application framework: a lazy service container, an
//! [`Application`] that owns paths, environment, configuration and service
//! providers, and a console [`Kernel`] that dispatches commands and turns
//! failures into exit codes.
pub mod console;
pub mod event;
pub mod exceptions;
pub mod kernel;
pub mod logging;
pub mod storage;
pub mod testing;
pub mod utils;

pub use console::{BufferedOutput, Command, CommandContext, ConsoleApplication, ConsoleOutput, Kernel, Output, Schedule};
pub use event::{Event, EventDispatcher, EventResult};
pub use exceptions::{Handler, ReportFailure};
pub use kernel::error::Error as KernelError;
pub use kernel::{Application, Error, ErrorKind, Result, ServiceKey, ServiceProvider};
pub use logging::LogManager;
pub use storage::{ConfigRepository, StorageProvider};

#[cfg(test)]
mod tests;
