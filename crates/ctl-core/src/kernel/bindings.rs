//! Well-known container keys and the built-in lazy binders.
use crate::event::EventDispatcher;
use crate::kernel::bootstrap::Application;
use crate::kernel::container::ServiceKey;
use crate::kernel::error::Result;
use crate::logging::{LogManager, LogSettings};
use crate::storage::{ConfigRepository, LocalStorageProvider};

/// Canonical keys of the services the framework itself provides.
pub mod keys {
    use crate::kernel::container::ServiceKey;

    pub const ENV: ServiceKey = ServiceKey::from_static("env");
    pub const PATH: ServiceKey = ServiceKey::from_static("path");
    pub const PATH_BASE: ServiceKey = ServiceKey::from_static("path.base");
    pub const PATH_LANG: ServiceKey = ServiceKey::from_static("path.lang");
    pub const PATH_CONFIG: ServiceKey = ServiceKey::from_static("path.config");
    pub const PATH_STORAGE: ServiceKey = ServiceKey::from_static("path.storage");
    pub const PATH_DATABASE: ServiceKey = ServiceKey::from_static("path.database");
    pub const PATH_RESOURCES: ServiceKey = ServiceKey::from_static("path.resources");
    pub const PATH_BOOTSTRAP: ServiceKey = ServiceKey::from_static("path.bootstrap");

    pub const CONFIG: ServiceKey = ServiceKey::from_static("config");
    pub const LOG: ServiceKey = ServiceKey::from_static("log");
    pub const EVENTS: ServiceKey = ServiceKey::from_static("events");
    pub const FILES: ServiceKey = ServiceKey::from_static("files");
    pub const EXCEPTION_HANDLER: ServiceKey = ServiceKey::from_static("exception.handler");
    pub const SCHEDULE: ServiceKey = ServiceKey::from_static("schedule");
}

/// Built-in lazy binders.
///
/// Each variant installs the factory for one canonical key the first time
/// that key is requested from an [`Application`]. The table is fixed at
/// compile time and therefore survives [`Application::flush`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreBinding {
    Config,
    Log,
    Events,
    Files,
}

impl CoreBinding {
    pub const ALL: [CoreBinding; 4] = [
        CoreBinding::Config,
        CoreBinding::Log,
        CoreBinding::Events,
        CoreBinding::Files,
    ];

    /// The binder responsible for a canonical key.
    pub fn for_key(key: &ServiceKey) -> Option<Self> {
        Self::ALL.into_iter().find(|binding| binding.key() == *key)
    }

    /// The canonical key this binder provides.
    pub fn key(self) -> ServiceKey {
        match self {
            CoreBinding::Config => keys::CONFIG,
            CoreBinding::Log => keys::LOG,
            CoreBinding::Events => keys::EVENTS,
            CoreBinding::Files => keys::FILES,
        }
    }

    /// Register the factory for this binder's key on `app`.
    pub fn install(self, app: &mut Application) -> Result<()> {
        match self {
            CoreBinding::Config => {
                app.container_mut().bind(keys::CONFIG, |_| Ok(ConfigRepository::new()));
            }
            CoreBinding::Log => {
                app.configure("logging")?;
                let settings = LogSettings::from_config(&*app.config()?)?;
                app.container_mut().bind(keys::LOG, move |_| Ok(LogManager::new(settings)));
            }
            CoreBinding::Events => {
                app.container_mut().bind(keys::EVENTS, |_| Ok(EventDispatcher::new()));
            }
            CoreBinding::Files => {
                let base_path = app.base_path(None);
                app.container_mut()
                    .bind(keys::FILES, move |_| Ok(LocalStorageProvider::new(base_path)));
            }
        }
        Ok(())
    }
}

/// Secondary names and type tokens registered on every application.
pub(crate) fn default_aliases() -> Vec<(ServiceKey, ServiceKey)> {
    vec![
        (ServiceKey::from_static("logger"), keys::LOG),
        (ServiceKey::of_type::<ConfigRepository>(), keys::CONFIG),
        (ServiceKey::of_type::<LogManager>(), keys::LOG),
        (ServiceKey::of_type::<EventDispatcher>(), keys::EVENTS),
        (ServiceKey::of_type::<LocalStorageProvider>(), keys::FILES),
        (ServiceKey::of_type::<crate::exceptions::Handler>(), keys::EXCEPTION_HANDLER),
        (ServiceKey::of_type::<crate::console::Schedule>(), keys::SCHEDULE),
    ]
}
