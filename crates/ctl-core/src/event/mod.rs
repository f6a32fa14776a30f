//! # Ctl Core Events
//!
//! Synchronous event dispatch. The bootstrap sequence announces each
//! bootstrapper and the console kernel announces every command it runs;
//! listeners subscribe either by event name or by concrete event type.
pub mod dispatcher;
pub mod types;

use std::any::Any;
use std::fmt;

/// Handle returned by `listen`, accepted by `forget`.
pub type EventId = u64;

/// What a listener asks the dispatcher to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    /// Skip the remaining listeners
    Stop,
}

/// Something listeners can subscribe to, by name or by type.
pub trait Event: Any + fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

pub use dispatcher::EventDispatcher;
pub use types::{BootstrapEvent, ConsoleEvent};
