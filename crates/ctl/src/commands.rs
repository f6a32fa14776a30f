//! Commands shipped with the `ctl` binary.
use std::sync::Arc;

use ctl_core::console::{Command, CommandContext, ConsoleApplication, Schedule};
use ctl_core::Result;

/// The console application run by the binary.
#[derive(Debug, Default)]
pub struct AppConsole;

impl ConsoleApplication for AppConsole {
    fn commands(&self) -> Vec<Arc<dyn Command>> {
        vec![Arc::new(ExampleCommand), Arc::new(LogProcessorCommand)]
    }

    fn schedule(&self, _schedule: &mut Schedule) {}
}

/// `app:example {name}`: prints its argument.
#[derive(Debug)]
pub struct ExampleCommand;

impl Command for ExampleCommand {
    fn name(&self) -> &str {
        "app:example"
    }

    fn description(&self) -> &str {
        "Example command"
    }

    fn configure(&self, command: clap::Command) -> clap::Command {
        command.arg(clap::Arg::new("name").required(true).help("Value to print"))
    }

    fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<i32> {
        let name = ctx.required_argument("name")?;
        ctx.line(&name);
        Ok(0)
    }
}

/// `app:log-processor {table}`: prints the table it was asked to process.
#[derive(Debug)]
pub struct LogProcessorCommand;

impl Command for LogProcessorCommand {
    fn name(&self) -> &str {
        "app:log-processor"
    }

    fn description(&self) -> &str {
        "Seed the database with records"
    }

    fn configure(&self, command: clap::Command) -> clap::Command {
        command.arg(clap::Arg::new("table").required(true).help("Target table"))
    }

    fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<i32> {
        let table = ctx.required_argument("table")?;
        log::debug!("Processing table {}", table);
        ctx.line(&table);
        Ok(0)
    }
}
