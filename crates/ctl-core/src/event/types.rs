use std::any::Any;

use crate::event::Event;

/// Events fired by the console kernel around each command.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    /// A command is about to run
    CommandStarting { command: String },
    /// A command completed with the given exit code
    CommandFinished { command: String, exit_code: i32 },
}

impl ConsoleEvent {
    pub fn command(&self) -> &str {
        match self {
            ConsoleEvent::CommandStarting { command } => command,
            ConsoleEvent::CommandFinished { command, .. } => command,
        }
    }
}

impl Event for ConsoleEvent {
    fn name(&self) -> &str {
        match self {
            ConsoleEvent::CommandStarting { .. } => "console.command.starting",
            ConsoleEvent::CommandFinished { .. } => "console.command.finished",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Events fired by [`Application::bootstrap_with`](crate::kernel::Application::bootstrap_with).
///
/// The event name embeds the bootstrapper, e.g. `bootstrapping: load-config`.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapEvent {
    name: String,
    bootstrapper: String,
}

impl BootstrapEvent {
    pub fn bootstrapping(bootstrapper: &str) -> Self {
        Self {
            name: format!("bootstrapping: {}", bootstrapper),
            bootstrapper: bootstrapper.to_string(),
        }
    }

    pub fn bootstrapped(bootstrapper: &str) -> Self {
        Self {
            name: format!("bootstrapped: {}", bootstrapper),
            bootstrapper: bootstrapper.to_string(),
        }
    }

    pub fn bootstrapper(&self) -> &str {
        &self.bootstrapper
    }
}

impl Event for BootstrapEvent {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
