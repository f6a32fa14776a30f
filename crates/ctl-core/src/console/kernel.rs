use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::console::command::{Command, CommandRegistry, parameters_to_args};
use crate::console::commands::{ListCommand, ScheduleRunCommand};
use crate::console::output::{BufferedOutput, Output};
use crate::console::schedule::Schedule;
use crate::event::ConsoleEvent;
use crate::exceptions::report_and_render;
use crate::kernel::bindings::keys;
use crate::kernel::bootstrap::Application;
use crate::kernel::constants::{EXIT_FAILURE, EXIT_INVALID};
use crate::kernel::error::{Error, ErrorKind, KernelLifecyclePhase, Result};

/// What an application contributes to its console kernel.
pub trait ConsoleApplication {
    /// Commands in addition to the built-in `list` and `schedule:run`.
    fn commands(&self) -> Vec<Arc<dyn Command>> {
        Vec::new()
    }

    /// Define scheduled commands.
    fn schedule(&self, _schedule: &mut Schedule) {}
}

/// A console application with no commands of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConsole;

impl ConsoleApplication for DefaultConsole {}

/// Lifecycle of a [`Kernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelState {
    Constructed,
    CommandsResolved,
    Booted,
    Running,
    Terminated,
}

/// Dispatches one command per call and maps the outcome to an exit code.
///
/// Nothing escapes [`Kernel::handle`] or [`Kernel::call`]: errors and panics
/// raised while dispatching are reported through the exception handler,
/// rendered to the output and turned into a nonzero exit code.
pub struct Kernel {
    app: Application,
    console: Box<dyn ConsoleApplication>,
    commands: Option<Arc<CommandRegistry>>,
    state: KernelState,
    last_output: BufferedOutput,
}

impl Kernel {
    /// Prepare `app` for console use and define the schedule.
    pub fn new(mut app: Application, console: impl ConsoleApplication + 'static) -> Result<Self> {
        app.prepare_for_console_command()?;

        let mut schedule = Schedule::new();
        console.schedule(&mut schedule);
        log::debug!("Defined {} scheduled command(s)", schedule.events().len());
        app.instance(keys::SCHEDULE, schedule);

        Ok(Self {
            app,
            console: Box::new(console),
            commands: None,
            state: KernelState::Constructed,
            last_output: BufferedOutput::new(),
        })
    }

    pub fn app(&self) -> &Application {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut Application {
        &mut self.app
    }

    pub fn into_app(self) -> Application {
        self.app
    }

    pub fn state(&self) -> KernelState {
        self.state
    }

    fn set_state(&mut self, state: KernelState) {
        log::trace!("Console kernel {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Build the command table on first use.
    fn resolve_commands(&mut self) -> Result<Arc<CommandRegistry>> {
        if let Some(commands) = &self.commands {
            return Ok(commands.clone());
        }

        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(ListCommand))?;
        registry.register(Arc::new(ScheduleRunCommand))?;
        for command in self.console.commands() {
            registry.register(command)?;
        }
        log::debug!("Resolved {} console command(s)", registry.len());

        let registry = Arc::new(registry);
        self.commands = Some(registry.clone());
        if self.state == KernelState::Constructed {
            self.set_state(KernelState::CommandsResolved);
        }
        Ok(registry)
    }

    /// Boot the application.
    pub fn bootstrap(&mut self) -> Result<()> {
        self.ensure_not_terminated(KernelLifecyclePhase::Boot)?;
        self.resolve_commands()?;
        self.app.boot()?;
        if self.state == KernelState::CommandsResolved {
            self.set_state(KernelState::Booted);
        }
        Ok(())
    }

    fn ensure_not_terminated(&self, phase: KernelLifecyclePhase) -> Result<()> {
        if self.state == KernelState::Terminated {
            return Err(Error::KernelLifecycle {
                phase,
                message: "the console kernel has already terminated".to_string(),
            });
        }
        Ok(())
    }

    /// Names of every registered command.
    pub fn all(&mut self) -> Result<Vec<String>> {
        Ok(self.resolve_commands()?.names())
    }

    /// Run the command named by the first element of `args`.
    ///
    /// `args` excludes the binary name. An empty vector runs `list`.
    pub fn handle(&mut self, args: Vec<String>, output: &mut dyn Output) -> i32 {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.dispatch(args, &mut *output)));
        self.finish(outcome, output)
    }

    /// Run `name` with `(name, value)` parameters, capturing its output.
    ///
    /// The captured output is available from [`Kernel::output`] until the
    /// next call.
    pub fn call(&mut self, name: &str, parameters: &[(&str, &str)]) -> i32 {
        let mut args = vec![name.to_string()];
        args.extend(parameters_to_args(parameters));

        let mut output = BufferedOutput::new();
        let exit_code = self.handle(args, &mut output);
        self.last_output = output;
        exit_code
    }

    /// Output captured by the last [`Kernel::call`].
    pub fn output(&self) -> &BufferedOutput {
        &self.last_output
    }

    /// Queueing commands needs a queue backend, which this framework lacks.
    pub fn queue(&mut self, name: &str, _parameters: &[(&str, &str)]) -> Result<()> {
        log::debug!("Refusing to queue {}", name);
        Err(Error::Unsupported {
            feature: "Queueing console commands",
        })
    }

    /// Finish the kernel's lifecycle. Later dispatches fail.
    pub fn terminate(&mut self, exit_code: i32) {
        log::info!("Console kernel terminating with exit code {}", exit_code);
        self.set_state(KernelState::Terminated);
    }

    fn dispatch(&mut self, mut args: Vec<String>, output: &mut dyn Output) -> Result<i32> {
        self.ensure_not_terminated(KernelLifecyclePhase::Dispatch)?;
        self.bootstrap()?;
        let commands = self.resolve_commands()?;

        let name = if args.is_empty() {
            "list".to_string()
        } else {
            args.remove(0)
        };
        commands.find(&name)?;

        let events = self.app.events()?;
        events.dispatch(&ConsoleEvent::CommandStarting {
            command: name.clone(),
        });

        self.set_state(KernelState::Running);
        let result = commands.run(&mut self.app, &name, args, output);
        self.set_state(KernelState::Booted);

        let exit_code = result?;
        events.dispatch(&ConsoleEvent::CommandFinished {
            command: name,
            exit_code,
        });
        Ok(exit_code)
    }

    fn finish(&mut self, outcome: std::thread::Result<Result<i32>>, output: &mut dyn Output) -> i32 {
        let error = match outcome {
            Ok(Ok(exit_code)) => return exit_code,
            Ok(Err(error)) => error,
            Err(payload) => {
                if self.state == KernelState::Running {
                    self.set_state(KernelState::Booted);
                }
                Error::from_panic(payload)
            }
        };

        let exit_code = exit_code_for(&error);
        report_and_render(&mut self.app, output, error);
        exit_code
    }
}

/// Exit code for an error caught at the kernel boundary.
pub fn exit_code_for(error: &Error) -> i32 {
    match error.kind() {
        ErrorKind::InvalidInput => EXIT_INVALID,
        _ => EXIT_FAILURE,
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("app", &self.app)
            .field("commands", &self.commands.as_ref().map(|c| c.names()))
            .field("state", &self.state)
            .finish()
    }
}
