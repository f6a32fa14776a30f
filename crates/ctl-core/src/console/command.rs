use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use clap::ArgMatches;
use clap::error::ErrorKind as ClapErrorKind;

use crate::console::error::ConsoleError;
use crate::console::output::Output;
use crate::kernel::bootstrap::Application;
use crate::kernel::constants::EXIT_SUCCESS;
use crate::exceptions::report_and_render;
use crate::kernel::error::{Error, Result};

/// A console command.
///
/// Arguments are declared on the clap [`clap::Command`] passed to
/// [`Command::configure`]; the command name itself is never part of the
/// parsed arguments.
pub trait Command: Send + Sync + fmt::Debug {
    /// Name used to invoke the command, e.g. `app:example`.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Declare arguments and options.
    fn configure(&self, command: clap::Command) -> clap::Command {
        command
    }

    /// Run the command and return its exit code.
    fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<i32>;
}

/// Parsed arguments of one invocation.
#[derive(Debug, Clone)]
pub struct Input {
    command: String,
    matches: ArgMatches,
}

impl Input {
    pub fn command(&self) -> &str {
        &self.command
    }

    /// A single-valued argument or option.
    pub fn argument(&self, name: &str) -> Option<String> {
        self.matches.try_get_one::<String>(name).ok().flatten().cloned()
    }

    /// Every value of a multi-valued argument or option.
    pub fn arguments(&self, name: &str) -> Vec<String> {
        self.matches
            .try_get_many::<String>(name)
            .ok()
            .flatten()
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    }

    /// A boolean flag declared with `ArgAction::SetTrue`.
    pub fn flag(&self, name: &str) -> bool {
        self.matches
            .try_get_one::<bool>(name)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false)
    }

    pub fn matches(&self) -> &ArgMatches {
        &self.matches
    }
}

/// Everything a running command may touch.
pub struct CommandContext<'a> {
    app: &'a mut Application,
    commands: &'a CommandRegistry,
    input: Input,
    output: &'a mut dyn Output,
}

impl<'a> CommandContext<'a> {
    pub fn app(&mut self) -> &mut Application {
        self.app
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn argument(&self, name: &str) -> Option<String> {
        self.input.argument(name)
    }

    /// Like [`CommandContext::argument`], failing when the value is absent.
    pub fn required_argument(&self, name: &str) -> Result<String> {
        self.input.argument(name).ok_or_else(|| {
            ConsoleError::InvalidInput {
                command: Some(self.input.command.clone()),
                message: format!("Not enough arguments (missing: \"{}\").", name),
            }
            .into()
        })
    }

    pub fn flag(&self, name: &str) -> bool {
        self.input.flag(name)
    }

    pub fn output(&mut self) -> &mut dyn Output {
        &mut *self.output
    }

    pub fn line(&mut self, text: &str) {
        self.output.line(text);
    }

    pub fn error(&mut self, text: &str) {
        self.output.error_line(text);
    }

    /// Run another registered command with the same application and output.
    pub fn call(&mut self, name: &str, parameters: &[(&str, &str)]) -> Result<i32> {
        let args = parameters_to_args(parameters);
        self.commands.run(&mut *self.app, name, args, &mut *self.output)
    }

    pub fn commands(&self) -> &CommandRegistry {
        self.commands
    }

    /// Report and render `error` without stopping the current command.
    pub fn report(&mut self, error: Error) {
        report_and_render(&mut *self.app, &mut *self.output, error);
    }
}

/// Turn `(name, value)` pairs into an argument vector.
///
/// Names starting with `-` are options and are emitted before their value;
/// an option with an empty value is a bare flag. Any other name is a
/// positional argument and only its value is emitted.
pub fn parameters_to_args(parameters: &[(&str, &str)]) -> Vec<String> {
    let mut args = Vec::new();
    for (name, value) in parameters {
        if name.starts_with('-') {
            args.push(name.to_string());
            if !value.is_empty() {
                args.push(value.to_string());
            }
        } else {
            args.push(value.to_string());
        }
    }
    args
}

/// Registered commands, ordered by name.
#[derive(Debug, Default, Clone)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Arc<dyn Command>) -> Result<()> {
        let name = command.name().to_string();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ConsoleError::InvalidCommandName { name }.into());
        }
        if self.commands.contains_key(&name) {
            return Err(ConsoleError::DuplicateCommand { name }.into());
        }
        log::trace!("Registered command {}", name);
        self.commands.insert(name, command);
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    /// Look a command up, suggesting close names when it is missing.
    pub fn find(&self, name: &str) -> Result<Arc<dyn Command>> {
        self.get(name).ok_or_else(|| {
            ConsoleError::CommandNotFound {
                name: name.to_string(),
                alternatives: self.alternatives(name),
            }
            .into()
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn alternatives(&self, name: &str) -> Vec<String> {
        let threshold = name.chars().count() / 3 + 1;
        self.commands
            .keys()
            .filter(|candidate| {
                candidate.contains(name) || edit_distance(candidate, name) <= threshold
            })
            .cloned()
            .collect()
    }

    /// The clap definition of `command`.
    pub fn definition(command: &dyn Command) -> clap::Command {
        let definition = clap::Command::new(command.name().to_string())
            .about(command.description().to_string())
            .no_binary_name(true);
        command.configure(definition)
    }

    /// Parse `args` for command `name` and run it.
    ///
    /// `--help` prints the usage text and succeeds.
    pub fn run(
        &self,
        app: &mut Application,
        name: &str,
        args: Vec<String>,
        output: &mut dyn Output,
    ) -> Result<i32> {
        let command = self.find(name)?;

        let matches = match Self::definition(command.as_ref()).try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(e) if matches!(e.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
                output.write(&e.render().to_string());
                return Ok(EXIT_SUCCESS);
            }
            Err(e) => {
                return Err(ConsoleError::InvalidInput {
                    command: Some(name.to_string()),
                    message: e.render().to_string().trim_end().to_string(),
                }
                .into());
            }
        };

        log::debug!("Running command {}", name);
        let mut ctx = CommandContext {
            app,
            commands: self,
            input: Input {
                command: name.to_string(),
                matches,
            },
            output,
        };
        command.handle(&mut ctx)
    }
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        previous = current;
    }
    previous[b.len()]
}
