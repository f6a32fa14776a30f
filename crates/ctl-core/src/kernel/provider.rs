use std::any::{TypeId, type_name};
use std::fmt::Debug;
use std::sync::Arc;

use crate::kernel::bootstrap::Application;
use crate::kernel::error::Result;

/// A unit of registration logic applied once per provider type.
///
/// Both phases are optional. `register` runs as soon as the provider is
/// registered; `boot` runs when the application boots, or immediately when
/// the provider is registered after the application has booted.
pub trait ServiceProvider: Send + Sync + Debug + 'static {
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Bind services into the application.
    fn register(&self, _app: &mut Application) -> Result<()> {
        Ok(())
    }

    /// Initialise services once every provider has registered.
    fn boot(&self, _app: &mut Application) -> Result<()> {
        Ok(())
    }
}

/// A registered provider and its boot state.
#[derive(Debug, Clone)]
pub struct LoadedProvider {
    pub type_id: TypeId,
    pub name: &'static str,
    pub provider: Arc<dyn ServiceProvider>,
    pub booted: bool,
}

/// Providers in registration order, unique by concrete type.
#[derive(Debug, Default)]
pub struct ProviderRepository {
    loaded: Vec<LoadedProvider>,
}

impl ProviderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.loaded.iter().any(|entry| entry.type_id == type_id)
    }

    /// Record a provider. Returns its index, or `None` if the type is already present.
    pub fn insert(&mut self, type_id: TypeId, provider: Arc<dyn ServiceProvider>) -> Option<usize> {
        if self.contains(type_id) {
            return None;
        }
        self.loaded.push(LoadedProvider {
            type_id,
            name: provider.name(),
            provider,
            booted: false,
        });
        Some(self.loaded.len() - 1)
    }

    /// Drop a provider whose register phase failed.
    pub fn remove(&mut self, type_id: TypeId) {
        self.loaded.retain(|entry| entry.type_id != type_id);
    }

    /// The provider at `index` if it has not booted yet.
    pub fn pending_boot(&self, index: usize) -> Option<Arc<dyn ServiceProvider>> {
        self.loaded
            .get(index)
            .filter(|entry| !entry.booted)
            .map(|entry| entry.provider.clone())
    }

    pub fn mark_booted(&mut self, index: usize) {
        if let Some(entry) = self.loaded.get_mut(index) {
            entry.booted = true;
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.loaded.iter().map(|entry| entry.name).collect()
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    pub fn clear(&mut self) {
        self.loaded.clear();
    }
}
