//! # Ctl Core Kernel Errors
//!
//! Defines the top-level error type of the framework.
//!
//! [`Error`] wraps the subsystem errors ([`StorageSystemError`],
//! [`ConsoleError`]) and adds the container and lifecycle failures raised by
//! the kernel itself. Every variant maps to an [`ErrorKind`], which the
//! exception handler uses for its "do not report" checks.
use std::error::Error as StdError;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::console::error::ConsoleError;
use crate::storage::error::StorageSystemError;

/// An error that knows how to report itself.
///
/// When the exception handler receives an [`Error::SelfReporting`] it calls
/// [`SelfReporting::report`] instead of writing to the application logger.
pub trait SelfReporting: StdError + Send + Sync + 'static {
    fn report(&self);
}

/// Top-level error type for container, bootstrap and console operations.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The key has neither a binding nor a resolved instance.
    #[error("Target [{key}] is not resolvable: no binding or instance is registered for it")]
    UnresolvableBinding { key: String },

    /// The factory for the key already ran and failed; it is not retried.
    #[error("Target [{key}] could not be built: its factory failed on an earlier resolution")]
    BindingFailed { key: String },

    /// A typed lookup found an instance of another type.
    #[error("Binding [{key}] does not hold a value of type `{expected}`")]
    BindingTypeMismatch { key: String, expected: &'static str },

    /// Malformed configuration or a cyclic alias. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Specific, typed storage system error
    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),

    /// Specific, typed console error
    #[error(transparent)]
    Console(#[from] ConsoleError),

    /// The operation is not valid in the kernel's current state.
    #[error("Kernel lifecycle error during {phase}: {message}")]
    KernelLifecycle {
        phase: KernelLifecyclePhase,
        message: String,
    },

    /// The framework deliberately does not implement this operation.
    #[error("{feature} is not supported")]
    Unsupported { feature: &'static str },

    /// Any other failure raised while a command was executing.
    #[error("{message}")]
    Uncaught {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    /// An error carrying its own reporting hook.
    #[error("{0}")]
    SelfReporting(Box<dyn SelfReporting>),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Represents a specific phase in the kernel's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum KernelLifecyclePhase {
    #[error("Bootstrap")]
    Bootstrap,
    #[error("Register")]
    Register,
    #[error("Boot")]
    Boot,
    #[error("Dispatch")]
    Dispatch,
    #[error("Terminate")]
    Terminate,
}

/// Coarse classification of [`Error`] values.
///
/// Kinds form a shallow hierarchy (see [`ErrorKind::parent`]) so that an
/// exclusion list can name either a specific failure or a whole family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Root of the hierarchy; matches every error.
    Any,
    Container,
    UnresolvableBinding,
    BindingFailed,
    BindingTypeMismatch,
    Configuration,
    Storage,
    Console,
    CommandNotFound,
    InvalidInput,
    KernelLifecycle,
    Unsupported,
    Uncaught,
    SelfReporting,
    Other,
}

impl ErrorKind {
    /// The enclosing kind, or `None` for [`ErrorKind::Any`].
    pub fn parent(self) -> Option<ErrorKind> {
        match self {
            ErrorKind::Any => None,
            ErrorKind::UnresolvableBinding
            | ErrorKind::BindingFailed
            | ErrorKind::BindingTypeMismatch => {
                Some(ErrorKind::Container)
            }
            ErrorKind::CommandNotFound | ErrorKind::InvalidInput => Some(ErrorKind::Console),
            _ => Some(ErrorKind::Any),
        }
    }

    /// This kind followed by each of its ancestors, most specific first.
    pub fn lineage(self) -> impl Iterator<Item = ErrorKind> {
        std::iter::successors(Some(self), |kind| kind.parent())
    }

    /// Short human readable title used when rendering errors.
    pub fn title(self) -> &'static str {
        match self {
            ErrorKind::Any => "Error",
            ErrorKind::Container => "ContainerError",
            ErrorKind::UnresolvableBinding => "UnresolvableBindingError",
            ErrorKind::BindingFailed => "BindingFailedError",
            ErrorKind::BindingTypeMismatch => "BindingTypeMismatchError",
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Storage => "StorageError",
            ErrorKind::Console => "ConsoleError",
            ErrorKind::CommandNotFound => "CommandNotFoundError",
            ErrorKind::InvalidInput => "InvalidInputError",
            ErrorKind::KernelLifecycle => "KernelLifecycleError",
            ErrorKind::Unsupported => "UnsupportedOperationError",
            ErrorKind::Uncaught => "UncaughtRuntimeError",
            ErrorKind::SelfReporting => "ReportedError",
            ErrorKind::Other => "Error",
        }
    }
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnresolvableBinding { .. } => ErrorKind::UnresolvableBinding,
            Error::BindingFailed { .. } => ErrorKind::BindingFailed,
            Error::BindingTypeMismatch { .. } => ErrorKind::BindingTypeMismatch,
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::StorageSystem(_) => ErrorKind::Storage,
            Error::Console(console) => match console {
                ConsoleError::CommandNotFound { .. } => ErrorKind::CommandNotFound,
                ConsoleError::InvalidInput { .. } => ErrorKind::InvalidInput,
                _ => ErrorKind::Console,
            },
            Error::KernelLifecycle { .. } => ErrorKind::KernelLifecycle,
            Error::Unsupported { .. } => ErrorKind::Unsupported,
            Error::Uncaught { .. } => ErrorKind::Uncaught,
            Error::SelfReporting(_) => ErrorKind::SelfReporting,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    pub fn unresolvable(key: impl Into<String>) -> Self {
        Error::UnresolvableBinding { key: key.into() }
    }

    /// Wrap an arbitrary failure raised by command code.
    pub fn uncaught<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error::Uncaught {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Build an [`Error::Uncaught`] from a panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let detail = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Error::Uncaught {
            message: format!("command panicked: {}", detail),
            source: None,
        }
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<std::io::Error> for Error {
    fn from(io_err: std::io::Error) -> Self {
        Error::uncaught(io_err)
    }
}
