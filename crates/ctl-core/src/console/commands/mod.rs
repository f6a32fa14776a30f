//! Commands every console kernel provides.
mod list;
mod schedule_run;

pub use list::ListCommand;
pub use schedule_run::ScheduleRunCommand;
