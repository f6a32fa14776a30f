//! Environment-variable sources.
use std::collections::HashMap;
use std::fmt;

/// Read access to environment variables.
///
/// The application reads `APP_ENV` through this trait so tests can supply
/// values without touching the process environment.
pub trait EnvSource: Send + Sync + fmt::Debug {
    /// The value of `name`, if set.
    fn var(&self, name: &str) -> Option<String>;

    /// The value of `name`, or `default` when unset or empty.
    fn get(&self, name: &str, default: &str) -> String {
        match self.var(name) {
            Some(value) if !value.is_empty() => value,
            _ => default.to_string(),
        }
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl EnvSource for SystemEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
