use crate::console::schedule::Schedule;
use crate::exceptions::Handler;
use crate::kernel::bindings::keys;
use crate::kernel::bootstrap::Application;
use crate::kernel::error::Result;
use crate::kernel::provider::ServiceProvider;

/// Binds the console services: the exception handler and an empty schedule.
///
/// Existing bindings are left alone, so an application can install its own
/// handler before the console kernel is created.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleServiceProvider;

impl ServiceProvider for ConsoleServiceProvider {
    fn name(&self) -> &'static str {
        "console"
    }

    fn register(&self, app: &mut Application) -> Result<()> {
        if !app.container().bound(&keys::EXCEPTION_HANDLER) {
            app.bind(keys::EXCEPTION_HANDLER, |_| Ok(Handler::default()));
        }
        if !app.container().bound(&keys::SCHEDULE) {
            app.bind(keys::SCHEDULE, |_| Ok(Schedule::new()));
        }
        Ok(())
    }
}
