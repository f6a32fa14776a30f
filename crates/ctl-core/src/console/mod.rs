//! # Ctl Core Console
//!
//! The console [`Kernel`] and everything it dispatches: the [`Command`]
//! trait, the command registry, output streams, the schedule and the
//! built-in `list` and `schedule:run` commands.
pub mod command;
pub mod commands;
pub mod error;
pub mod kernel;
pub mod output;
pub mod provider;
pub mod schedule;

pub use command::{Command, CommandContext, CommandRegistry, Input};
pub use error::ConsoleError;
pub use kernel::{ConsoleApplication, DefaultConsole, Kernel, KernelState};
pub use output::{BufferedOutput, ConsoleOutput, Output};
pub use provider::ConsoleServiceProvider;
pub use schedule::{Frequency, Schedule, ScheduledCommand};

// Test module declaration
#[cfg(test)]
mod tests;
