//! # Ctl Core Testing Support
//!
//! Helpers for exercising an application from tests: [`TestHarness`] owns a
//! console kernel for the duration of one test, runs commands with captured
//! output and flushes the application on teardown.
use std::path::PathBuf;

use serde_json::Value;

use crate::console::{BufferedOutput, ConsoleApplication, Kernel};
use crate::kernel::bootstrap::Application;
use crate::kernel::constants::{ENV_VAR, EXIT_SUCCESS, TESTING_ENVIRONMENT};
use crate::kernel::environment::MapEnv;
use crate::kernel::error::Result;

type TeardownCallback = Box<dyn FnOnce(&mut Application)>;

/// Result of [`TestHarness::artisan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub exit_code: i32,
    pub output: BufferedOutput,
}

impl CommandOutcome {
    pub fn stdout(&self) -> &str {
        self.output.fetch()
    }

    pub fn stderr(&self) -> &str {
        self.output.fetch_errors()
    }

    #[track_caller]
    pub fn assert_exit_code(&self, expected: i32) -> &Self {
        assert_eq!(
            self.exit_code, expected,
            "unexpected exit code; output:\n{}",
            self.output
        );
        self
    }

    #[track_caller]
    pub fn assert_successful(&self) -> &Self {
        self.assert_exit_code(EXIT_SUCCESS)
    }

    #[track_caller]
    pub fn assert_failed(&self) -> &Self {
        assert_ne!(self.exit_code, EXIT_SUCCESS, "command unexpectedly succeeded");
        self
    }

    #[track_caller]
    pub fn expects_output(&self, text: &str) -> &Self {
        assert!(
            self.stdout().contains(text),
            "expected output to contain {:?}, got:\n{}",
            text,
            self.stdout()
        );
        self
    }

    #[track_caller]
    pub fn expects_error_output(&self, text: &str) -> &Self {
        assert!(
            self.stderr().contains(text),
            "expected error output to contain {:?}, got:\n{}",
            text,
            self.stderr()
        );
        self
    }
}

/// One application per test.
pub struct TestHarness {
    kernel: Option<Kernel>,
    before_destroyed: Vec<TeardownCallback>,
}

impl TestHarness {
    /// Wrap a kernel created by `create`.
    pub fn new<F>(create: F) -> Result<Self>
    where
        F: FnOnce() -> Result<Kernel>,
    {
        Ok(Self {
            kernel: Some(create()?),
            before_destroyed: Vec::new(),
        })
    }

    /// An application rooted at `base_path` running in the `testing` environment.
    pub fn with_console(
        base_path: impl Into<PathBuf>,
        console: impl ConsoleApplication + 'static,
    ) -> Result<Self> {
        let base_path = base_path.into();
        Self::new(move || {
            let app = Application::builder(base_path)
                .env(MapEnv::new().with(ENV_VAR, TESTING_ENVIRONMENT))
                .build()?;
            Kernel::new(app, console)
        })
    }

    fn kernel_mut(&mut self) -> &mut Kernel {
        match self.kernel.as_mut() {
            Some(kernel) => kernel,
            None => panic!("the test application has already been torn down"),
        }
    }

    pub fn kernel(&mut self) -> &mut Kernel {
        self.kernel_mut()
    }

    pub fn app(&mut self) -> &mut Application {
        self.kernel_mut().app_mut()
    }

    /// Run a command and capture its outcome.
    pub fn artisan(&mut self, name: &str, parameters: &[(&str, &str)]) -> CommandOutcome {
        let kernel = self.kernel_mut();
        let exit_code = kernel.call(name, parameters);
        CommandOutcome {
            exit_code,
            output: kernel.output().clone(),
        }
    }

    /// Run `callback` just before the application is flushed.
    pub fn before_application_destroyed<F>(&mut self, callback: F)
    where
        F: FnOnce(&mut Application) + 'static,
    {
        self.before_destroyed.push(Box::new(callback));
    }

    pub fn is_torn_down(&self) -> bool {
        self.kernel.is_none()
    }

    /// Run teardown callbacks and flush the application.
    pub fn tear_down(&mut self) -> Result<()> {
        let Some(mut kernel) = self.kernel.take() else {
            return Ok(());
        };
        let app = kernel.app_mut();
        for callback in self.before_destroyed.drain(..) {
            callback(app);
        }
        app.flush()
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        if let Err(e) = self.tear_down() {
            log::warn!("Failed to tear down test application: {}", e);
        }
    }
}

/// Counts rows in a table; implemented by whatever database layer an
/// application uses.
pub trait RowCounter {
    fn count(&self, table: &str, criteria: &[(&str, Value)]) -> Result<u64>;
}

/// Database assertions for tests that embed a [`RowCounter`].
pub trait DatabaseAssertions {
    fn connection(&self) -> &dyn RowCounter;

    #[track_caller]
    fn assert_database_has(&self, table: &str, criteria: &[(&str, Value)]) {
        match self.connection().count(table, criteria) {
            Ok(count) => assert!(
                count > 0,
                "unable to find row in table [{}] matching {:?}",
                table,
                criteria
            ),
            Err(e) => panic!("failed to query table [{}]: {}", table, e),
        }
    }

    #[track_caller]
    fn assert_database_missing(&self, table: &str, criteria: &[(&str, Value)]) {
        match self.connection().count(table, criteria) {
            Ok(count) => assert_eq!(
                count, 0,
                "found unexpected row in table [{}] matching {:?}",
                table, criteria
            ),
            Err(e) => panic!("failed to query table [{}]: {}", table, e),
        }
    }

    #[track_caller]
    fn assert_database_count(&self, table: &str, expected: u64) {
        match self.connection().count(table, &[]) {
            Ok(count) => assert_eq!(count, expected, "unexpected row count in table [{}]", table),
            Err(e) => panic!("failed to query table [{}]: {}", table, e),
        }
    }
}
