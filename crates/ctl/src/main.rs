mod commands;

use std::path::PathBuf;

use clap::Parser;
use core_logging::LoggingServiceProvider;
use ctl_core::console::{ConsoleOutput, Kernel};
use ctl_core::kernel::constants::EXIT_FAILURE;
use ctl_core::kernel::{Application, LoadConfiguration};

use commands::AppConsole;

/// Ctl: a small console application framework
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Application base path (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    base_path: Option<PathBuf>,

    /// Override the detected environment
    #[arg(long = "env", value_name = "NAME")]
    environment: Option<String>,

    /// Command to run followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn build_application(args: &CliArgs) -> ctl_core::Result<Application> {
    let base_path = match &args.base_path {
        Some(path) => path.clone(),
        None => std::env::current_dir().map_err(|e| {
            ctl_core::Error::Configuration(format!("cannot determine the current directory: {}", e))
        })?,
    };

    let mut app = Application::new(base_path)?;
    if let Some(environment) = &args.environment {
        app.set_environment(environment.clone());
    }
    app.bootstrap_with(&[&LoadConfiguration::new(["app", "logging"])])?;
    app.register(LoggingServiceProvider)?;
    Ok(app)
}

fn main() {
    let args = CliArgs::parse();

    let app = match build_application(&args) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to initialize application: {}", e);
            std::process::exit(EXIT_FAILURE);
        }
    };

    let mut kernel = match Kernel::new(app, AppConsole) {
        Ok(kernel) => kernel,
        Err(e) => {
            eprintln!("Failed to initialize console kernel: {}", e);
            std::process::exit(EXIT_FAILURE);
        }
    };

    let exit_code = kernel.handle(args.command, &mut ConsoleOutput::new());
    kernel.terminate(exit_code);
    log::debug!("Exiting with code {}", exit_code);
    std::process::exit(exit_code);
}
