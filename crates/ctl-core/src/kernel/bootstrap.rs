use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use crate::console::ConsoleServiceProvider;
use crate::event::{BootstrapEvent, EventDispatcher};
use crate::kernel::bindings::{CoreBinding, default_aliases, keys};
use crate::kernel::constants;
use crate::kernel::container::{Container, Instance, ServiceKey, downcast};
use crate::kernel::environment::{EnvSource, SystemEnv};
use crate::kernel::error::Result;
use crate::kernel::provider::{ProviderRepository, ServiceProvider};
use crate::logging::LogManager;
use crate::storage::{ConfigLoader, ConfigRepository, LocalStorageProvider};
use crate::utils::str_is_any;

/// Callback run around the boot phase.
pub type AppCallback = Box<dyn FnMut(&mut Application) -> Result<()>>;

/// A step of [`Application::bootstrap_with`].
pub trait Bootstrapper {
    fn name(&self) -> &str;
    fn bootstrap(&self, app: &mut Application) -> Result<()>;
}

/// Loads the named configuration sources.
#[derive(Debug, Clone)]
pub struct LoadConfiguration {
    names: Vec<String>,
}

impl LoadConfiguration {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl Bootstrapper for LoadConfiguration {
    fn name(&self) -> &str {
        "load-configuration"
    }

    fn bootstrap(&self, app: &mut Application) -> Result<()> {
        for name in &self.names {
            app.configure(name)?;
        }
        Ok(())
    }
}

/// Boots every registered provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct BootProviders;

impl Bootstrapper for BootProviders {
    fn name(&self) -> &str {
        "boot-providers"
    }

    fn bootstrap(&self, app: &mut Application) -> Result<()> {
        app.boot()
    }
}

/// Builder for [`Application`].
pub struct ApplicationBuilder {
    base_path: PathBuf,
    storage_path: Option<PathBuf>,
    env: Arc<dyn EnvSource>,
}

impl ApplicationBuilder {
    /// Read environment variables from `env` instead of the process environment.
    pub fn env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Use a storage directory outside the base path.
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<Application> {
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);
        let mut app = Application {
            base_path: self.base_path,
            storage_path: self.storage_path,
            env: self.env,
            container: Container::new(),
            ran_binders: HashSet::new(),
            providers: ProviderRepository::new(),
            loaded_configurations: HashSet::new(),
            booting_callbacks: Vec::new(),
            booted_callbacks: Vec::new(),
            booting_fired: false,
            booted: false,
            has_been_bootstrapped: false,
        };
        app.bootstrap_container()?;
        register_error_handling();
        log::debug!("Using base path: {}", app.base_path.display());
        Ok(app)
    }
}

/// The root container.
///
/// Owns path resolution, environment detection, configuration loading and
/// the provider lifecycle. Services are resolved lazily: the built-in
/// [`CoreBinding`]s install their factories the first time their key is
/// requested through [`Application::make_instance`].
pub struct Application {
    base_path: PathBuf,
    storage_path: Option<PathBuf>,
    env: Arc<dyn EnvSource>,
    container: Container,
    ran_binders: HashSet<CoreBinding>,
    providers: ProviderRepository,
    loaded_configurations: HashSet<String>,
    booting_callbacks: Vec<AppCallback>,
    booted_callbacks: Vec<AppCallback>,
    booting_fired: bool,
    booted: bool,
    has_been_bootstrapped: bool,
}

impl Application {
    /// Creates an application rooted at `base_path`, reading the process environment.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(base_path).build()
    }

    pub fn builder(base_path: impl Into<PathBuf>) -> ApplicationBuilder {
        ApplicationBuilder {
            base_path: base_path.into(),
            storage_path: None,
            env: Arc::new(SystemEnv),
        }
    }

    /// Bind paths, the application version and the default aliases.
    fn bootstrap_container(&mut self) -> Result<()> {
        self.bind_path_instances();
        let version = self.version();
        self.container.instance(ServiceKey::from_static("app.version"), version);
        for (alias, target) in default_aliases() {
            self.container.alias(alias, target)?;
        }
        Ok(())
    }

    fn bind_path_instances(&mut self) {
        let paths = [
            (keys::PATH, self.path(None)),
            (keys::PATH_BASE, self.base_path(None)),
            (keys::PATH_LANG, self.lang_path(None)),
            (keys::PATH_CONFIG, self.config_path(None)),
            (keys::PATH_STORAGE, self.storage_path(None)),
            (keys::PATH_DATABASE, self.database_path(None)),
            (keys::PATH_RESOURCES, self.resource_path(None)),
            (keys::PATH_BOOTSTRAP, self.bootstrap_path(None)),
        ];
        for (key, path) in paths {
            self.container.instance(key, path);
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    /// Register a lazy singleton. See [`Container::bind`].
    pub fn bind<T, F>(&mut self, key: impl Into<ServiceKey>, factory: F) -> bool
    where
        T: Any + Send + Sync,
        F: FnOnce(&mut Container) -> Result<T> + 'static,
    {
        self.container.bind(key, factory)
    }

    /// Install a resolved singleton. See [`Container::instance`].
    pub fn instance<T: Any + Send + Sync>(&mut self, key: impl Into<ServiceKey>, value: T) -> Arc<T> {
        self.container.instance(key, value)
    }

    pub fn alias(&mut self, alias: impl Into<ServiceKey>, target: impl Into<ServiceKey>) -> Result<()> {
        self.container.alias(alias, target)
    }

    /// Whether `key` is bound, resolved, or provided by a built-in binder.
    pub fn bound(&self, key: impl Into<ServiceKey>) -> bool {
        let key = key.into();
        if self.container.bound(&key) {
            return true;
        }
        self.container
            .canonical(&key)
            .ok()
            .and_then(|canonical| CoreBinding::for_key(&canonical))
            .is_some()
    }

    /// Resolve `key`, running its built-in binder first if needed.
    pub fn make_instance(&mut self, key: impl Into<ServiceKey>) -> Result<Instance> {
        let key = self.container.canonical(&key.into())?;

        if !self.container.bound(&key) {
            if let Some(binding) = CoreBinding::for_key(&key) {
                if !self.ran_binders.contains(&binding) {
                    log::trace!("Running core binder for [{}]", key);
                    binding.install(self)?;
                    self.ran_binders.insert(binding);
                }
            }
        }

        self.container.resolve(&key)
    }

    /// Resolve `key` as a `T`.
    pub fn make<T: Any + Send + Sync>(&mut self, key: impl Into<ServiceKey>) -> Result<Arc<T>> {
        let key = key.into();
        let instance = self.make_instance(key.clone())?;
        downcast(&key, instance)
    }

    /// Resolve the service registered for type `T`.
    pub fn make_type<T: Any + Send + Sync>(&mut self) -> Result<Arc<T>> {
        self.make(ServiceKey::of_type::<T>())
    }

    pub fn config(&mut self) -> Result<Arc<ConfigRepository>> {
        self.make(keys::CONFIG)
    }

    pub fn events(&mut self) -> Result<Arc<EventDispatcher>> {
        self.make(keys::EVENTS)
    }

    pub fn logger(&mut self) -> Result<Arc<LogManager>> {
        self.make(keys::LOG)
    }

    pub fn files(&mut self) -> Result<Arc<LocalStorageProvider>> {
        self.make(keys::FILES)
    }

    // Paths

    pub fn base_path(&self, path: Option<&str>) -> PathBuf {
        join_suffix(&self.base_path, path)
    }

    /// The application code directory.
    pub fn path(&self, path: Option<&str>) -> PathBuf {
        join_suffix(&self.base_path.join(constants::APP_DIR), path)
    }

    pub fn config_path(&self, path: Option<&str>) -> PathBuf {
        join_suffix(&self.base_path.join(constants::CONFIG_DIR), path)
    }

    pub fn storage_path(&self, path: Option<&str>) -> PathBuf {
        let root = self
            .storage_path
            .clone()
            .unwrap_or_else(|| self.base_path.join(constants::STORAGE_DIR));
        join_suffix(&root, path)
    }

    pub fn database_path(&self, path: Option<&str>) -> PathBuf {
        join_suffix(&self.base_path.join(constants::DATABASE_DIR), path)
    }

    pub fn resource_path(&self, path: Option<&str>) -> PathBuf {
        join_suffix(&self.base_path.join(constants::RESOURCES_DIR), path)
    }

    pub fn lang_path(&self, path: Option<&str>) -> PathBuf {
        join_suffix(&self.resource_path(Some(constants::LANG_DIR)), path)
    }

    pub fn bootstrap_path(&self, path: Option<&str>) -> PathBuf {
        join_suffix(&self.base_path.join(constants::BOOTSTRAP_DIR), path)
    }

    /// Override the storage directory.
    pub fn use_storage_path(&mut self, path: impl Into<PathBuf>) {
        self.storage_path = Some(path.into());
        let storage = self.storage_path(None);
        self.container.instance(keys::PATH_STORAGE, storage);
    }

    // Environment

    /// The current environment name.
    ///
    /// An explicit [`Application::set_environment`] wins; otherwise `APP_ENV`,
    /// then `app.env` from an already resolved configuration, then
    /// `production`.
    pub fn environment(&self) -> String {
        if let Some(env) = self.container.cached::<String>(&keys::ENV) {
            return env.as_ref().clone();
        }
        if let Some(env) = self.env.var(constants::ENV_VAR).filter(|env| !env.is_empty()) {
            return env;
        }
        self.container
            .cached::<ConfigRepository>(&keys::CONFIG)
            .and_then(|config| config.get::<String>("app.env"))
            .unwrap_or_else(|| constants::DEFAULT_ENVIRONMENT.to_string())
    }

    /// Pin the environment name.
    pub fn set_environment(&mut self, env: impl Into<String>) {
        self.container.instance(keys::ENV, env.into());
    }

    /// Whether the environment matches any of the `*` wildcard patterns.
    pub fn environment_matches<S: AsRef<str>>(&self, patterns: &[S]) -> bool {
        str_is_any(patterns, &self.environment())
    }

    pub fn running_unit_tests(&self) -> bool {
        self.environment() == constants::TESTING_ENVIRONMENT
    }

    pub fn env_source(&self) -> &dyn EnvSource {
        self.env.as_ref()
    }

    // Configuration

    /// Load configuration `name` into the repository, at most once.
    pub fn configure(&mut self, name: &str) -> Result<()> {
        if !self.loaded_configurations.insert(name.to_string()) {
            return Ok(());
        }

        let result = self.load_configuration(name);
        if result.is_err() {
            self.loaded_configurations.remove(name);
        }
        result
    }

    fn load_configuration(&mut self, name: &str) -> Result<()> {
        let files = self.files()?;
        let loader = ConfigLoader::new(files, self.config_path(None));
        let config = self.config()?;

        match loader.load(name)? {
            Some(table) => config.merge(name, table),
            None => {
                log::debug!("No configuration found for '{}'", name);
                Ok(())
            }
        }
    }

    pub fn configuration_is_loaded(&self, name: &str) -> bool {
        self.loaded_configurations.contains(name)
    }

    // Providers

    /// Register `provider`. Returns `false` if its type was already registered.
    pub fn register<P: ServiceProvider>(&mut self, provider: P) -> Result<bool> {
        let type_id = TypeId::of::<P>();
        let provider: Arc<dyn ServiceProvider> = Arc::new(provider);
        let index = match self.providers.insert(type_id, provider.clone()) {
            Some(index) => index,
            None => {
                log::debug!("Provider {} already registered", provider.name());
                return Ok(false);
            }
        };

        log::debug!("Registering provider {}", provider.name());
        if let Err(e) = provider.register(self) {
            log::error!("Provider {} failed to register: {}", provider.name(), e);
            self.providers.remove(type_id);
            return Err(e);
        }

        if self.booted {
            self.boot_provider(index)?;
        }
        Ok(true)
    }

    /// Register a provider by type.
    pub fn register_type<P: ServiceProvider + Default>(&mut self) -> Result<bool> {
        if self.provider_is_loaded::<P>() {
            return Ok(false);
        }
        self.register(P::default())
    }

    /// Register a provider whose services may be needed later.
    ///
    /// Providers are never deferred; this registers immediately.
    pub fn register_deferred_provider<P: ServiceProvider>(&mut self, provider: P) -> Result<bool> {
        self.register(provider)
    }

    pub fn provider_is_loaded<P: ServiceProvider>(&self) -> bool {
        self.providers.contains(TypeId::of::<P>())
    }

    /// Names of the registered providers, in registration order.
    pub fn loaded_providers(&self) -> Vec<&'static str> {
        self.providers.names()
    }

    /// Configure `config`, register `P`, then resolve `key`.
    pub fn load_component<P: ServiceProvider + Default>(
        &mut self,
        config: &str,
        key: impl Into<ServiceKey>,
    ) -> Result<Instance> {
        self.configure(config)?;
        self.register_type::<P>()?;
        self.make_instance(key)
    }

    fn boot_provider(&mut self, index: usize) -> Result<()> {
        let Some(provider) = self.providers.pending_boot(index) else {
            return Ok(());
        };
        log::debug!("Booting provider {}", provider.name());
        provider.boot(self)?;
        self.providers.mark_booted(index);
        Ok(())
    }

    /// Boot every registered provider. Subsequent calls do nothing.
    pub fn boot(&mut self) -> Result<()> {
        if self.booted {
            return Ok(());
        }

        if !self.booting_fired {
            self.run_callbacks(|app| &mut app.booting_callbacks)?;
            self.booting_fired = true;
        }

        // providers registered while booting are picked up by the loop
        let mut index = 0;
        while index < self.providers.len() {
            self.boot_provider(index)?;
            index += 1;
        }

        self.booted = true;
        log::info!("Application booted with {} provider(s)", self.providers.len());

        self.run_callbacks(|app| &mut app.booted_callbacks)
    }

    /// Run `callback` before providers boot.
    pub fn booting<F>(&mut self, callback: F)
    where
        F: FnMut(&mut Application) -> Result<()> + 'static,
    {
        self.booting_callbacks.push(Box::new(callback));
    }

    /// Run `callback` after providers boot; immediately if already booted.
    pub fn booted<F>(&mut self, callback: F) -> Result<()>
    where
        F: FnMut(&mut Application) -> Result<()> + 'static,
    {
        let mut callback: AppCallback = Box::new(callback);
        if self.booted {
            callback(self)?;
        }
        self.booted_callbacks.push(callback);
        Ok(())
    }

    fn run_callbacks(&mut self, list: fn(&mut Application) -> &mut Vec<AppCallback>) -> Result<()> {
        let mut callbacks = std::mem::take(list(self));
        let mut result = Ok(());
        for callback in callbacks.iter_mut() {
            result = callback(self);
            if result.is_err() {
                break;
            }
        }
        // keep callbacks added while running
        callbacks.append(list(self));
        *list(self) = callbacks;
        result
    }

    pub fn is_booted(&self) -> bool {
        self.booted
    }

    /// Run `bootstrappers` in order, announcing each one on the event dispatcher.
    pub fn bootstrap_with(&mut self, bootstrappers: &[&dyn Bootstrapper]) -> Result<()> {
        self.has_been_bootstrapped = true;
        let events = self.events()?;
        for bootstrapper in bootstrappers {
            events.dispatch(&BootstrapEvent::bootstrapping(bootstrapper.name()));
            bootstrapper.bootstrap(self)?;
            events.dispatch(&BootstrapEvent::bootstrapped(bootstrapper.name()));
        }
        Ok(())
    }

    pub fn has_been_bootstrapped(&self) -> bool {
        self.has_been_bootstrapped
    }

    /// Install what the console kernel needs.
    pub fn prepare_for_console_command(&mut self) -> Result<()> {
        self.events()?;
        self.register_type::<ConsoleServiceProvider>()?;
        Ok(())
    }

    // Misc

    pub fn version(&self) -> String {
        format!("{} v{}", constants::APP_NAME, constants::APP_VERSION)
    }

    pub fn locale(&mut self) -> Result<String> {
        self.configure("app")?;
        Ok(self.config()?.get_or("app.locale", "en".to_string()))
    }

    pub fn set_locale(&mut self, locale: &str) -> Result<()> {
        self.configure("app")?;
        self.config()?.set("app.locale", locale)
    }

    /// Clear every binding, instance, provider and memo.
    ///
    /// Paths and default aliases are bound again afterwards, so the
    /// application behaves as if it had just been constructed.
    pub fn flush(&mut self) -> Result<()> {
        log::debug!("Flushing application state");
        self.container.flush();
        self.ran_binders.clear();
        self.providers.clear();
        self.loaded_configurations.clear();
        self.booting_callbacks.clear();
        self.booted_callbacks.clear();
        self.booting_fired = false;
        self.booted = false;
        self.has_been_bootstrapped = false;
        self.bootstrap_container()
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("base_path", &self.base_path)
            .field("storage_path", &self.storage_path)
            .field("container", &self.container)
            .field("providers", &self.providers.names())
            .field("loaded_configurations", &self.loaded_configurations)
            .field("booted", &self.booted)
            .finish()
    }
}

fn join_suffix(root: &Path, suffix: Option<&str>) -> PathBuf {
    match suffix {
        Some(suffix) if !suffix.is_empty() => root.join(suffix),
        _ => root.to_path_buf(),
    }
}

static ERROR_HANDLING: Once = Once::new();

/// Log panics through the `log` facade before the previous hook runs.
fn register_error_handling() {
    ERROR_HANDLING.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            log::error!("{}", info);
            previous(info);
        }));
    });
}
