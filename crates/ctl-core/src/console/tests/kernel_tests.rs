use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use clap::Arg;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use tempfile::{TempDir, tempdir};

use crate::console::command::{Command, CommandContext};
use crate::console::kernel::{ConsoleApplication, Kernel, KernelState};
use crate::console::output::BufferedOutput;
use crate::console::schedule::Schedule;
use crate::event::{ConsoleEvent, EventResult};
use crate::exceptions::Handler;
use crate::kernel::bindings::keys;
use crate::kernel::bootstrap::Application;
use crate::kernel::environment::MapEnv;
use crate::kernel::error::{Error, ErrorKind, Result};

#[derive(Debug)]
struct Example;

impl Command for Example {
    fn name(&self) -> &str {
        "app:example"
    }

    fn description(&self) -> &str {
        "Print the given name"
    }

    fn configure(&self, command: clap::Command) -> clap::Command {
        command.arg(Arg::new("name").required(true))
    }

    fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<i32> {
        let name = ctx.required_argument("name")?;
        ctx.line(&name);
        Ok(0)
    }
}

#[derive(Debug)]
struct Exploding;

impl Command for Exploding {
    fn name(&self) -> &str {
        "app:explode"
    }

    fn handle(&self, _ctx: &mut CommandContext<'_>) -> Result<i32> {
        Err(Error::uncaught(std::io::Error::other("disk on fire")))
    }
}

#[derive(Debug)]
struct Panicking;

impl Command for Panicking {
    fn name(&self) -> &str {
        "app:panic"
    }

    fn handle(&self, _ctx: &mut CommandContext<'_>) -> Result<i32> {
        panic!("unexpected state");
    }
}

#[derive(Debug)]
struct Partial;

impl Command for Partial {
    fn name(&self) -> &str {
        "app:partial"
    }

    fn handle(&self, ctx: &mut CommandContext<'_>) -> Result<i32> {
        ctx.error("some rows skipped");
        Ok(3)
    }
}

#[derive(Debug, Default)]
struct TestConsole {
    scheduled: bool,
}

impl ConsoleApplication for TestConsole {
    fn commands(&self) -> Vec<Arc<dyn Command>> {
        vec![
            Arc::new(Example),
            Arc::new(Exploding),
            Arc::new(Panicking),
            Arc::new(Partial),
        ]
    }

    fn schedule(&self, schedule: &mut Schedule) {
        if self.scheduled {
            schedule
                .command("app:example")
                .parameter("name", "scheduled")
                .every_minute();
        }
    }
}

fn kernel_with(console: impl ConsoleApplication + 'static) -> (TempDir, Kernel) {
    let dir = tempdir().expect("tempdir");
    let app = Application::builder(dir.path())
        .env(MapEnv::new().with("APP_ENV", "testing"))
        .build()
        .expect("build application");
    let kernel = Kernel::new(app, console).expect("build kernel");
    (dir, kernel)
}

fn kernel() -> (TempDir, Kernel) {
    kernel_with(TestConsole::default())
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn test_example_command_echoes_argument() {
    let (_dir, mut kernel) = kernel();
    let mut output = BufferedOutput::new();

    let code = kernel.handle(args(&["app:example", "hello"]), &mut output);

    assert_eq!(code, 0);
    assert_eq!(output.fetch(), "hello\n");
    assert_eq!(output.fetch_errors(), "");
}

#[test]
fn test_example_command_with_random_word() {
    let words = ["alpha", "bravo", "charlie", "delta", "echo"];
    let word = *words.choose(&mut rand::thread_rng()).expect("non-empty");
    let (_dir, mut kernel) = kernel();

    let code = kernel.call("app:example", &[("name", word)]);

    assert_eq!(code, 0);
    assert_eq!(kernel.output().fetch().trim(), word);
}

#[test]
fn test_unknown_command_is_rendered_not_raised() {
    let (_dir, mut kernel) = kernel();
    let mut output = BufferedOutput::new();

    let code = kernel.handle(args(&["does:not-exist"]), &mut output);

    assert_eq!(code, 1);
    assert!(output.fetch_errors().contains("CommandNotFoundError"));
    assert!(output.fetch_errors().contains("Command \"does:not-exist\" is not defined."));
    assert_eq!(kernel.state(), KernelState::Booted);
}

#[test]
fn test_invalid_input_exits_with_two() {
    let (_dir, mut kernel) = kernel();

    let code = kernel.call("app:example", &[]);

    assert_eq!(code, 2);
    assert!(kernel.output().fetch_errors().contains("InvalidInputError"));
}

#[test]
fn test_command_error_maps_to_one_with_cause() {
    let (_dir, mut kernel) = kernel();

    let code = kernel.call("app:explode", &[]);

    assert_eq!(code, 1);
    let errors = kernel.output().fetch_errors();
    assert!(errors.contains("UncaughtRuntimeError"));
    assert!(errors.contains("disk on fire"));
}

#[test]
fn test_panic_is_caught_at_boundary() {
    let (_dir, mut kernel) = kernel();

    let code = kernel.call("app:panic", &[]);

    assert_eq!(code, 1);
    assert!(kernel.output().fetch_errors().contains("command panicked: unexpected state"));
    assert_eq!(kernel.state(), KernelState::Booted);

    // the kernel keeps working afterwards
    assert_eq!(kernel.call("app:example", &[("name", "again")]), 0);
}

#[test]
fn test_command_exit_code_is_returned() {
    let (_dir, mut kernel) = kernel();
    assert_eq!(kernel.call("app:partial", &[]), 3);
    assert_eq!(kernel.output().fetch_errors(), "some rows skipped\n");
}

#[test]
fn test_state_transitions() -> Result<()> {
    let (_dir, mut kernel) = kernel();
    assert_eq!(kernel.state(), KernelState::Constructed);

    kernel.all()?;
    assert_eq!(kernel.state(), KernelState::CommandsResolved);

    kernel.bootstrap()?;
    assert_eq!(kernel.state(), KernelState::Booted);
    assert!(kernel.app().is_booted());

    kernel.terminate(0);
    assert_eq!(kernel.state(), KernelState::Terminated);

    let code = kernel.call("app:example", &[("name", "late")]);
    assert_eq!(code, 1);
    assert!(kernel.output().fetch_errors().contains("KernelLifecycleError"));
    Ok(())
}

#[test]
fn test_handle_boots_before_dispatch() {
    let (_dir, mut kernel) = kernel();
    assert!(!kernel.app().is_booted());

    kernel.call("app:example", &[("name", "x")]);

    assert!(kernel.app().is_booted());
    assert!(kernel.app().provider_is_loaded::<crate::console::ConsoleServiceProvider>());
}

#[test]
fn test_all_lists_builtins_and_application_commands() -> Result<()> {
    let (_dir, mut kernel) = kernel();
    let names = kernel.all()?;
    for expected in ["app:example", "app:explode", "list", "schedule:run"] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
    Ok(())
}

#[test]
fn test_empty_args_run_list() {
    let (_dir, mut kernel) = kernel();
    let mut output = BufferedOutput::new();

    let code = kernel.handle(vec![], &mut output);

    assert_eq!(code, 0);
    assert!(output.fetch().contains("Available commands:"));
    assert!(output.fetch().contains("app:example"));
    assert!(output.fetch().contains("Print the given name"));
}

#[test]
fn test_queue_is_unsupported() {
    let (_dir, mut kernel) = kernel();
    let err = kernel.queue("app:example", &[("name", "x")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn test_command_events_are_dispatched() -> Result<()> {
    let (_dir, mut kernel) = kernel();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    kernel.app_mut().events()?.listen_for::<ConsoleEvent, _>(move |event| {
        sink.lock().push(event.clone());
        EventResult::Continue
    });

    kernel.call("app:partial", &[]);

    assert_eq!(
        *seen.lock(),
        vec![
            ConsoleEvent::CommandStarting { command: "app:partial".into() },
            ConsoleEvent::CommandFinished {
                command: "app:partial".into(),
                exit_code: 3
            },
        ]
    );
    Ok(())
}

#[test]
fn test_schedule_run_with_empty_schedule() {
    let (_dir, mut kernel) = kernel();
    assert_eq!(kernel.call("schedule:run", &[]), 0);
    assert!(kernel.output().fetch().contains("No scheduled commands are ready to run."));
}

#[test]
fn test_schedule_run_runs_due_commands() {
    let (_dir, mut kernel) = kernel_with(TestConsole { scheduled: true });

    assert_eq!(kernel.call("schedule:run", &[]), 0);

    let out = kernel.output().fetch();
    assert!(out.contains("Running scheduled command: app:example"));
    assert!(out.contains("scheduled\n"));
}

/// Due every minute: a failing command, then one that succeeds.
struct FailingFirstSchedule;

impl ConsoleApplication for FailingFirstSchedule {
    fn commands(&self) -> Vec<Arc<dyn Command>> {
        TestConsole::default().commands()
    }

    fn schedule(&self, schedule: &mut Schedule) {
        schedule.command("app:explode");
        schedule.command("app:example").parameter("name", "still runs");
    }
}

#[test]
fn test_schedule_run_continues_after_a_failing_command() {
    let (_dir, mut kernel) = kernel_with(FailingFirstSchedule);

    assert_eq!(kernel.call("schedule:run", &[]), 1);

    let out = kernel.output().fetch();
    assert!(out.contains("Running scheduled command: app:explode"));
    assert!(out.contains("Running scheduled command: app:example"));
    assert!(out.contains("still runs\n"));
    let errors = kernel.output().fetch_errors();
    assert!(errors.contains("UncaughtRuntimeError"));
    assert!(errors.contains("disk on fire"));
    assert_eq!(kernel.state(), KernelState::Booted);
}

#[test]
fn test_excluded_errors_are_rendered_but_not_reported() {
    let dir = tempdir().expect("tempdir");
    let mut app = Application::builder(dir.path())
        .env(MapEnv::new())
        .build()
        .expect("build application");
    app.instance(
        keys::EXCEPTION_HANDLER,
        Handler::new().dont_report(ErrorKind::Console),
    );
    // a broken logging config makes any report attempt fail loudly
    std::fs::create_dir_all(dir.path().join("config")).expect("config dir");
    std::fs::write(dir.path().join("config/logging.json"), r#"{ "level": "loud" }"#)
        .expect("write config");
    let mut kernel = Kernel::new(app, TestConsole::default()).expect("build kernel");

    let code = kernel.call("does:not-exist", &[]);

    assert_eq!(code, 1);
    let errors = kernel.output().fetch_errors();
    assert!(errors.contains("is not defined"));
    assert!(!errors.contains("ConfigurationError"), "report must be skipped: {}", errors);
}

#[test]
fn test_report_failure_is_rendered_with_original_error() {
    let dir = tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("config")).expect("config dir");
    std::fs::write(dir.path().join("config/logging.json"), r#"{ "level": "loud" }"#)
        .expect("write config");
    let app = Application::builder(dir.path())
        .env(MapEnv::new())
        .build()
        .expect("build application");
    let mut kernel = Kernel::new(app, TestConsole::default()).expect("build kernel");

    let code = kernel.call("app:explode", &[]);

    assert_eq!(code, 1);
    let errors = kernel.output().fetch_errors();
    assert!(errors.contains("ConfigurationError"));
    assert!(errors.contains("invalid log level 'loud'"));
    assert!(errors.contains("disk on fire"));
}

#[test]
fn test_providers_see_late_registration_through_kernel() -> Result<()> {
    let (_dir, mut kernel) = kernel();
    kernel.bootstrap()?;

    #[derive(Debug)]
    struct Late(Arc<AtomicUsize>);
    impl crate::kernel::provider::ServiceProvider for Late {
        fn boot(&self, _app: &mut Application) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    let booted = Arc::new(AtomicUsize::new(0));
    kernel.app_mut().register(Late(booted.clone()))?;
    assert_eq!(booted.load(Ordering::SeqCst), 1);
    Ok(())
}
