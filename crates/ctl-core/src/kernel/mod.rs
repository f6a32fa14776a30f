//! # Ctl Core Kernel
//!
//! The `kernel` module forms the heart of the framework: the service
//! container, the [`Application`](bootstrap::Application) that owns it, and
//! the provider lifecycle.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Container**: lazy singleton bindings keyed by [`ServiceKey`] with alias
//!   chains ([`container`]).
//! - **Core binders**: the closed set of built-in lazy registrations
//!   (`config`, `log`, `events`, `files`) in [`bindings`].
//! - **Application**: paths, environment, memoized configuration loading and
//!   provider register/boot ([`bootstrap`]).
//! - **Service providers**: the [`ServiceProvider`] trait and the ordered
//!   provider repository ([`provider`]).
//! - **Error Handling**: the kernel [`Error`] type, its [`ErrorKind`]
//!   classification and a `Result` alias ([`error`]).
pub mod bindings;
pub mod bootstrap;
pub mod constants;
pub mod container;
pub mod environment;
pub mod error;
pub mod provider;

pub use bindings::{CoreBinding, keys};
pub use bootstrap::{Application, ApplicationBuilder, BootProviders, Bootstrapper, LoadConfiguration};
pub use container::{Container, Instance, ServiceKey};
pub use environment::{EnvSource, MapEnv, SystemEnv};
pub use error::{Error, ErrorKind, KernelLifecyclePhase, Result};
pub use provider::ServiceProvider;

// Test module declaration
#[cfg(test)]
mod tests;
