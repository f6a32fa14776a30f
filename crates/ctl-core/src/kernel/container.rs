use std::any::{Any, type_name};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::kernel::error::{Error, Result};

/// A resolved, shared service.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Lazy constructor for a binding. Invoked at most once.
pub type Factory = Box<dyn FnOnce(&mut Container) -> Result<Instance>>;

/// Canonical lookup key of the container.
///
/// Keys are plain string tags (`"config"`, `"path.base"`). Type tokens are
/// expressed as keys too, via [`ServiceKey::of_type`], and are normally
/// aliased onto a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceKey(Cow<'static, str>);

impl ServiceKey {
    pub const fn from_static(key: &'static str) -> Self {
        ServiceKey(Cow::Borrowed(key))
    }

    /// The key naming type `T`.
    pub fn of_type<T: ?Sized>() -> Self {
        ServiceKey(Cow::Borrowed(type_name::<T>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceKey {
    fn from(key: &str) -> Self {
        ServiceKey(Cow::Owned(key.to_string()))
    }
}

impl From<String> for ServiceKey {
    fn from(key: String) -> Self {
        ServiceKey(Cow::Owned(key))
    }
}

impl From<&ServiceKey> for ServiceKey {
    fn from(key: &ServiceKey) -> Self {
        key.clone()
    }
}

/// Binding registry plus singleton slots.
///
/// Every binding is a singleton: the factory runs on first resolution and its
/// product is cached for the lifetime of the container (or until
/// [`Container::flush`]).
#[derive(Default)]
pub struct Container {
    bindings: HashMap<ServiceKey, Factory>,
    instances: HashMap<ServiceKey, Instance>,
    aliases: HashMap<ServiceKey, ServiceKey>,
    failed: HashSet<ServiceKey>,
}

impl Container {
    /// Create a new empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lazy constructor for `key`.
    ///
    /// Returns `false` without touching the registry when `key` has already
    /// been resolved. An alias named `key` is dropped so the binding is
    /// reachable under that name.
    pub fn bind<T, F>(&mut self, key: impl Into<ServiceKey>, factory: F) -> bool
    where
        T: Any + Send + Sync,
        F: FnOnce(&mut Container) -> Result<T> + 'static,
    {
        self.bind_factory(key, Box::new(move |container| {
            factory(container).map(|value| Arc::new(value) as Instance)
        }))
    }

    /// Register an already boxed factory. See [`Container::bind`].
    pub fn bind_factory(&mut self, key: impl Into<ServiceKey>, factory: Factory) -> bool {
        let key = key.into();
        if self.instances.contains_key(&key) {
            log::debug!("Ignoring binding for [{}]: already resolved", key);
            return false;
        }
        self.claim(&key);
        if self.bindings.insert(key.clone(), factory).is_some() {
            log::debug!("Replaced pending binding for [{}]", key);
        }
        true
    }

    /// Install a resolved singleton directly, discarding any pending factory.
    pub fn instance<T: Any + Send + Sync>(&mut self, key: impl Into<ServiceKey>, value: T) -> Arc<T> {
        let shared = Arc::new(value);
        self.share(key, shared.clone());
        shared
    }

    /// Install an existing shared instance.
    pub fn share(&mut self, key: impl Into<ServiceKey>, value: Instance) {
        let key = key.into();
        self.claim(&key);
        self.bindings.remove(&key);
        self.instances.insert(key, value);
    }

    /// Make `key` a concrete slot again: it stops being an alias and
    /// forgets any earlier factory failure.
    fn claim(&mut self, key: &ServiceKey) {
        if let Some(target) = self.aliases.remove(key) {
            log::debug!("[{}] no longer aliases [{}]", key, target);
        }
        self.failed.remove(key);
    }

    /// Redirect `alias` to `target`.
    ///
    /// Fails with [`Error::Configuration`] if the alias would introduce a
    /// cycle.
    pub fn alias(&mut self, alias: impl Into<ServiceKey>, target: impl Into<ServiceKey>) -> Result<()> {
        let alias = alias.into();
        let target = target.into();

        let mut cursor = Some(&target);
        while let Some(key) = cursor {
            if *key == alias {
                return Err(Error::Configuration(format!(
                    "[{}] is aliased to itself through [{}]",
                    alias, target
                )));
            }
            cursor = self.aliases.get(key);
        }

        self.aliases.insert(alias, target);
        Ok(())
    }

    /// Follow aliases to the canonical key.
    pub fn canonical(&self, key: &ServiceKey) -> Result<ServiceKey> {
        let mut seen = HashSet::new();
        let mut current = key;
        while let Some(next) = self.aliases.get(current) {
            if !seen.insert(current) {
                return Err(Error::Configuration(format!(
                    "alias cycle detected while resolving [{}]",
                    key
                )));
            }
            current = next;
        }
        Ok(current.clone())
    }

    /// Whether `key` has a pending binding or a resolved instance.
    pub fn bound(&self, key: &ServiceKey) -> bool {
        match self.canonical(key) {
            Ok(key) => self.bindings.contains_key(&key) || self.instances.contains_key(&key),
            Err(_) => false,
        }
    }

    /// Whether `key` has already been resolved.
    pub fn resolved(&self, key: &ServiceKey) -> bool {
        match self.canonical(key) {
            Ok(key) => self.instances.contains_key(&key),
            Err(_) => false,
        }
    }

    /// Resolve `key`, running its factory on first use.
    pub fn resolve(&mut self, key: &ServiceKey) -> Result<Instance> {
        let key = self.canonical(key)?;

        if let Some(instance) = self.instances.get(&key) {
            return Ok(instance.clone());
        }

        let Some(factory) = self.bindings.remove(&key) else {
            if self.failed.contains(&key) {
                return Err(Error::BindingFailed { key: key.to_string() });
            }
            return Err(Error::unresolvable(key.as_str()));
        };

        log::debug!("Building [{}]", key);
        match factory(self) {
            Ok(instance) => {
                self.instances.insert(key, instance.clone());
                Ok(instance)
            }
            Err(e) => {
                log::debug!("Factory for [{}] failed: {}", key, e);
                self.failed.insert(key);
                Err(e)
            }
        }
    }

    /// Resolve `key` and downcast it to `T`.
    pub fn make<T: Any + Send + Sync>(&mut self, key: &ServiceKey) -> Result<Arc<T>> {
        let instance = self.resolve(key)?;
        downcast(key, instance)
    }

    /// Look up an already resolved instance of type `T` without building anything.
    pub fn cached<T: Any + Send + Sync>(&self, key: &ServiceKey) -> Option<Arc<T>> {
        let key = self.canonical(key).ok()?;
        let instance = self.instances.get(&key)?.clone();
        Arc::downcast::<T>(instance).ok()
    }

    /// Drop a resolved instance, returning it.
    pub fn forget_instance(&mut self, key: &ServiceKey) -> Option<Instance> {
        let key = self.canonical(key).ok()?;
        self.instances.remove(&key)
    }

    /// Every key with a pending binding or a resolved instance, sorted.
    pub fn keys(&self) -> Vec<ServiceKey> {
        let mut keys: Vec<ServiceKey> = self
            .bindings
            .keys()
            .chain(self.instances.keys())
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    /// Remove every binding, instance and alias.
    pub fn flush(&mut self) {
        self.bindings.clear();
        self.instances.clear();
        self.aliases.clear();
        self.failed.clear();
    }
}

/// Downcast a resolved instance, naming `key` in the error.
pub fn downcast<T: Any + Send + Sync>(key: &ServiceKey, instance: Instance) -> Result<Arc<T>> {
    Arc::downcast::<T>(instance).map_err(|_| Error::BindingTypeMismatch {
        key: key.to_string(),
        expected: type_name::<T>(),
    })
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending: Vec<&ServiceKey> = self.bindings.keys().collect();
        pending.sort();
        let mut resolved: Vec<&ServiceKey> = self.instances.keys().collect();
        resolved.sort();
        f.debug_struct("Container")
            .field("pending", &pending)
            .field("resolved", &resolved)
            .field("aliases", &self.aliases.len())
            .finish()
    }
}
