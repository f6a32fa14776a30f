use chrono::Utc;

use crate::console::Schedule;
use crate::console::command::{Command, CommandContext};
use crate::kernel::bindings::keys;
use crate::kernel::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::kernel::error::Result;

/// Runs the scheduled commands that are due this minute.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScheduleRunCommand;

impl Command for ScheduleRunCommand {
    fn name(&self) -> &str {
        "schedule:run"
    }

    fn description(&self) -> &str {
        "Run the scheduled commands"
    }

    fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<i32> {
        let app = ctx.app();
        let schedule = app.make::<Schedule>(keys::SCHEDULE)?;
        let environment = app.environment();

        let due = schedule.due_events(Utc::now(), &environment);
        if due.is_empty() {
            ctx.line("No scheduled commands are ready to run.");
            return Ok(EXIT_SUCCESS);
        }

        let mut exit_code = EXIT_SUCCESS;
        for event in due {
            ctx.line(&format!("Running scheduled command: {}", event.summary()));
            match ctx.call(event.command(), &event.parameters()) {
                Ok(EXIT_SUCCESS) => {}
                Ok(code) => {
                    log::warn!("Scheduled command {} exited with {}", event.command(), code);
                    exit_code = EXIT_FAILURE;
                }
                Err(e) => {
                    log::warn!("Scheduled command {} failed: {}", event.command(), e);
                    ctx.report(e);
                    exit_code = EXIT_FAILURE;
                }
            }
        }
        Ok(exit_code)
    }
}
