use crate::console::command::{Command, CommandContext};
use crate::kernel::constants::EXIT_SUCCESS;
use crate::kernel::error::Result;

/// Prints the application version and every registered command.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListCommand;

impl Command for ListCommand {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "List commands"
    }

    fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<i32> {
        let version = ctx.app().version();
        let rows: Vec<(String, String)> = ctx
            .commands()
            .iter()
            .map(|command| (command.name().to_string(), command.description().to_string()))
            .collect();
        let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

        ctx.line(&version);
        ctx.line("");
        ctx.line("Available commands:");
        for (name, description) in rows {
            ctx.line(format!("  {:<width$}  {}", name, description, width = width).trim_end());
        }
        Ok(EXIT_SUCCESS)
    }
}
