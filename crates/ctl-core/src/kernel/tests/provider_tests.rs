use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tempfile::tempdir;

use crate::kernel::bootstrap::Application;
use crate::kernel::environment::MapEnv;
use crate::kernel::error::{Error, Result};
use crate::kernel::provider::ServiceProvider;

fn app() -> (tempfile::TempDir, Application) {
    let dir = tempdir().expect("tempdir");
    let app = Application::builder(dir.path())
        .env(MapEnv::new())
        .build()
        .expect("build application");
    (dir, app)
}

#[derive(Debug, Default, Clone)]
struct Counters {
    registered: Arc<AtomicUsize>,
    booted: Arc<AtomicUsize>,
}

impl Counters {
    fn registered(&self) -> usize {
        self.registered.load(Ordering::SeqCst)
    }

    fn booted(&self) -> usize {
        self.booted.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct CountingProvider(Counters);

impl ServiceProvider for CountingProvider {
    fn register(&self, _app: &mut Application) -> Result<()> {
        self.0.registered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn boot(&self, _app: &mut Application) -> Result<()> {
        self.0.booted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_register_twice_registers_once() -> Result<()> {
    let (_dir, mut app) = app();
    let counters = Counters::default();

    assert!(app.register(CountingProvider(counters.clone()))?);
    assert!(!app.register(CountingProvider(counters.clone()))?);

    assert_eq!(counters.registered(), 1);
    assert_eq!(app.loaded_providers().len(), 1);
    assert!(app.provider_is_loaded::<CountingProvider>());
    Ok(())
}

#[test]
fn test_boot_twice_boots_once() -> Result<()> {
    let (_dir, mut app) = app();
    let counters = Counters::default();
    app.register(CountingProvider(counters.clone()))?;
    assert_eq!(counters.booted(), 0, "register must not boot");

    app.boot()?;
    app.boot()?;

    assert!(app.is_booted());
    assert_eq!(counters.booted(), 1);
    Ok(())
}

#[test]
fn test_late_registration_boots_immediately() -> Result<()> {
    let (_dir, mut app) = app();
    app.boot()?;

    let counters = Counters::default();
    app.register(CountingProvider(counters.clone()))?;

    assert_eq!(counters.registered(), 1);
    assert_eq!(counters.booted(), 1);

    app.boot()?;
    assert_eq!(counters.booted(), 1);
    Ok(())
}

static DEFAULT_REGISTERED: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Default)]
struct DefaultProvider;

impl ServiceProvider for DefaultProvider {
    fn register(&self, _app: &mut Application) -> Result<()> {
        DEFAULT_REGISTERED.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_register_by_type() -> Result<()> {
    let (_dir, mut app) = app();

    assert!(app.register_type::<DefaultProvider>()?);
    assert!(!app.register_type::<DefaultProvider>()?);
    assert!(!app.register_deferred_provider(DefaultProvider)?);

    assert_eq!(DEFAULT_REGISTERED.load(Ordering::SeqCst), 1);
    Ok(())
}

/// Registers [`CountingProvider`] from its own boot phase.
#[derive(Debug)]
struct ChainingProvider(Counters);

impl ServiceProvider for ChainingProvider {
    fn boot(&self, app: &mut Application) -> Result<()> {
        app.register(CountingProvider(self.0.clone()))?;
        Ok(())
    }
}

#[test]
fn test_provider_registered_during_boot_is_booted() -> Result<()> {
    let (_dir, mut app) = app();
    let counters = Counters::default();
    app.register(ChainingProvider(counters.clone()))?;

    app.boot()?;

    assert_eq!(counters.registered(), 1);
    assert_eq!(counters.booted(), 1);
    assert_eq!(app.loaded_providers().len(), 2);
    Ok(())
}

#[derive(Debug)]
struct FailingProvider;

impl ServiceProvider for FailingProvider {
    fn register(&self, _app: &mut Application) -> Result<()> {
        Err(Error::Configuration("missing credentials".into()))
    }
}

#[test]
fn test_failed_registration_is_rolled_back() {
    let (_dir, mut app) = app();

    assert!(matches!(app.register(FailingProvider), Err(Error::Configuration(_))));
    assert!(!app.provider_is_loaded::<FailingProvider>());
}

#[derive(Debug)]
struct FlakyBootProvider {
    attempts: Arc<AtomicUsize>,
}

impl ServiceProvider for FlakyBootProvider {
    fn boot(&self, _app: &mut Application) -> Result<()> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(Error::Other("not yet".into()));
        }
        Ok(())
    }
}

#[test]
fn test_boot_retry_does_not_reboot_finished_providers() -> Result<()> {
    let (_dir, mut app) = app();
    let counters = Counters::default();
    let attempts = Arc::new(AtomicUsize::new(0));
    app.register(CountingProvider(counters.clone()))?;
    app.register(FlakyBootProvider { attempts: attempts.clone() })?;

    assert!(app.boot().is_err());
    assert!(!app.is_booted());

    app.boot()?;
    assert!(app.is_booted());
    assert_eq!(counters.booted(), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_boot_callbacks_run_in_order() -> Result<()> {
    let (_dir, mut app) = app();
    let order = Arc::new(Mutex::new(Vec::new()));

    let log = order.clone();
    app.booting(move |_| {
        log.lock().push("booting");
        Ok(())
    });
    let log = order.clone();
    app.booted(move |_| {
        log.lock().push("booted");
        Ok(())
    })?;

    app.boot()?;
    assert_eq!(*order.lock(), vec!["booting", "booted"]);

    // registered after boot: fires straight away
    let log = order.clone();
    app.booted(move |_| {
        log.lock().push("late");
        Ok(())
    })?;
    assert_eq!(*order.lock(), vec!["booting", "booted", "late"]);
    Ok(())
}

#[derive(Debug, Default)]
struct QuietProvider;

impl ServiceProvider for QuietProvider {}

#[test]
fn test_loaded_providers_in_registration_order() -> Result<()> {
    let (_dir, mut app) = app();
    app.register_type::<QuietProvider>()?;
    app.register(CountingProvider(Counters::default()))?;

    let names = app.loaded_providers();
    assert_eq!(names.len(), 2);
    assert!(names[0].ends_with("QuietProvider"));
    assert!(names[1].ends_with("CountingProvider"));
    Ok(())
}

#[test]
fn test_boot_retry_does_not_rerun_booting_callbacks() -> Result<()> {
    let (_dir, mut app) = app();
    let attempts = Arc::new(AtomicUsize::new(0));
    let booting = Arc::new(AtomicUsize::new(0));
    let seen = booting.clone();
    app.booting(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    app.register(FlakyBootProvider { attempts: attempts.clone() })?;

    assert!(app.boot().is_err());
    app.boot()?;

    assert_eq!(booting.load(Ordering::SeqCst), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    Ok(())
}
