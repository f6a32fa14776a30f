//! Process-wide logging for ctl applications.
//!
//! [`LoggingServiceProvider`] reads the `logging` configuration and installs
//! a `tracing` fmt subscriber. Records emitted through the `log` facade,
//! including those of the framework's own `log` channel, are bridged into
//! it with `tracing-log`. Output goes to stderr so command output on stdout
//! stays clean.
use std::sync::atomic::{AtomicBool, Ordering};

use ctl_core::kernel::{Application, Error, Result, ServiceProvider};
use ctl_core::logging::{LogFormat, LogSettings};
use tracing_subscriber::EnvFilter;

static SUBSCRIBER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Installs the global subscriber during the register phase.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingServiceProvider;

impl ServiceProvider for LoggingServiceProvider {
    fn name(&self) -> &'static str {
        "core-logging"
    }

    fn register(&self, app: &mut Application) -> Result<()> {
        app.configure("logging")?;
        let settings = LogSettings::from_config(&*app.config()?)?;
        if init_subscriber(&settings)? {
            tracing::debug!(
                channel = %settings.channel,
                level = %settings.level,
                "Installed {:?} log subscriber",
                settings.format
            );
        }
        Ok(())
    }

    fn boot(&self, app: &mut Application) -> Result<()> {
        log::info!("Logging ready for {} ({})", app.version(), app.environment());
        Ok(())
    }
}

/// The filter directive used when `RUST_LOG` is not set.
pub fn default_directive(settings: &LogSettings) -> String {
    settings.level.to_string().to_lowercase()
}

fn env_filter(settings: &LogSettings) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directive(settings))
            .map_err(|e| Error::Configuration(format!("invalid log filter: {}", e))),
    }
}

/// Install the global subscriber for `settings`.
///
/// Returns `Ok(false)` when a subscriber or `log` logger is already in
/// place; the first installation wins for the life of the process.
pub fn init_subscriber(settings: &LogSettings) -> Result<bool> {
    if SUBSCRIBER_INSTALLED.load(Ordering::Acquire) {
        return Ok(false);
    }

    let filter = env_filter(settings)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    let installed = match settings.format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    };
    if let Err(e) = installed {
        log::debug!("Global tracing subscriber already set: {}", e);
        return Ok(false);
    }

    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::debug!("log facade already has a logger: {}", e);
    }

    SUBSCRIBER_INSTALLED.store(true, Ordering::Release);
    Ok(true)
}

/// Whether this process has a subscriber installed by [`init_subscriber`].
pub fn subscriber_installed() -> bool {
    SUBSCRIBER_INSTALLED.load(Ordering::Acquire)
}
