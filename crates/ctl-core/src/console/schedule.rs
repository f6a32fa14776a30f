//! Programmable command schedule executed by `schedule:run`.
use std::fmt;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

use crate::utils::str_is_any;

/// How often a scheduled command runs. Evaluated at minute granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    EveryMinute,
    EveryFiveMinutes,
    EveryTenMinutes,
    EveryFifteenMinutes,
    EveryThirtyMinutes,
    /// At the given minute of every hour.
    HourlyAt(u32),
    /// At the given hour and minute of every day.
    DailyAt(u32, u32),
    /// At the given weekday, hour and minute.
    WeeklyOn(Weekday, u32, u32),
    /// At the given day of month, hour and minute.
    MonthlyOn(u32, u32, u32),
}

impl Frequency {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        let minute = now.minute();
        let hour = now.hour();
        match *self {
            Frequency::EveryMinute => true,
            Frequency::EveryFiveMinutes => minute % 5 == 0,
            Frequency::EveryTenMinutes => minute % 10 == 0,
            Frequency::EveryFifteenMinutes => minute % 15 == 0,
            Frequency::EveryThirtyMinutes => minute % 30 == 0,
            Frequency::HourlyAt(at) => minute == at,
            Frequency::DailyAt(h, m) => hour == h && minute == m,
            Frequency::WeeklyOn(day, h, m) => now.weekday() == day && hour == h && minute == m,
            Frequency::MonthlyOn(day, h, m) => now.day() == day && hour == h && minute == m,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::EveryMinute => write!(f, "every minute"),
            Frequency::EveryFiveMinutes => write!(f, "every five minutes"),
            Frequency::EveryTenMinutes => write!(f, "every ten minutes"),
            Frequency::EveryFifteenMinutes => write!(f, "every fifteen minutes"),
            Frequency::EveryThirtyMinutes => write!(f, "every thirty minutes"),
            Frequency::HourlyAt(m) => write!(f, "hourly at :{:02}", m),
            Frequency::DailyAt(h, m) => write!(f, "daily at {:02}:{:02}", h, m),
            Frequency::WeeklyOn(d, h, m) => write!(f, "weekly on {} at {:02}:{:02}", d, h, m),
            Frequency::MonthlyOn(d, h, m) => write!(f, "monthly on day {} at {:02}:{:02}", d, h, m),
        }
    }
}

/// A command invocation attached to a [`Frequency`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledCommand {
    command: String,
    parameters: Vec<(String, String)>,
    frequency: Frequency,
    environments: Vec<String>,
    description: Option<String>,
}

impl ScheduledCommand {
    fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            parameters: Vec::new(),
            frequency: Frequency::EveryMinute,
            environments: Vec::new(),
            description: None,
        }
    }

    /// Pass `(name, value)` to the command, as in [`Kernel::call`](crate::console::Kernel::call).
    pub fn parameter(&mut self, name: &str, value: &str) -> &mut Self {
        self.parameters.push((name.to_string(), value.to_string()));
        self
    }

    pub fn cron(&mut self, frequency: Frequency) -> &mut Self {
        self.frequency = frequency;
        self
    }

    pub fn every_minute(&mut self) -> &mut Self {
        self.cron(Frequency::EveryMinute)
    }

    pub fn every_five_minutes(&mut self) -> &mut Self {
        self.cron(Frequency::EveryFiveMinutes)
    }

    pub fn every_ten_minutes(&mut self) -> &mut Self {
        self.cron(Frequency::EveryTenMinutes)
    }

    pub fn every_fifteen_minutes(&mut self) -> &mut Self {
        self.cron(Frequency::EveryFifteenMinutes)
    }

    pub fn every_thirty_minutes(&mut self) -> &mut Self {
        self.cron(Frequency::EveryThirtyMinutes)
    }

    pub fn hourly(&mut self) -> &mut Self {
        self.cron(Frequency::HourlyAt(0))
    }

    pub fn hourly_at(&mut self, minute: u32) -> &mut Self {
        self.cron(Frequency::HourlyAt(minute))
    }

    pub fn daily(&mut self) -> &mut Self {
        self.cron(Frequency::DailyAt(0, 0))
    }

    pub fn daily_at(&mut self, hour: u32, minute: u32) -> &mut Self {
        self.cron(Frequency::DailyAt(hour, minute))
    }

    pub fn weekly(&mut self) -> &mut Self {
        self.cron(Frequency::WeeklyOn(Weekday::Sun, 0, 0))
    }

    pub fn monthly(&mut self) -> &mut Self {
        self.cron(Frequency::MonthlyOn(1, 0, 0))
    }

    /// Only run in environments matching one of `patterns`.
    pub fn environments<I, S>(&mut self, patterns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.environments = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn description(&mut self, description: &str) -> &mut Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn parameters(&self) -> Vec<(&str, &str)> {
        self.parameters
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect()
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn summary(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.command)
    }

    pub fn runs_in_environment(&self, environment: &str) -> bool {
        self.environments.is_empty() || str_is_any(&self.environments, environment)
    }

    pub fn is_due(&self, now: DateTime<Utc>, environment: &str) -> bool {
        self.runs_in_environment(environment) && self.frequency.is_due(now)
    }
}

/// Commands to run periodically. Empty unless the console application
/// defines entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    events: Vec<ScheduledCommand>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `command`; runs every minute until another frequency is set.
    pub fn command(&mut self, command: &str) -> &mut ScheduledCommand {
        self.events.push(ScheduledCommand::new(command));
        let last = self.events.len() - 1;
        &mut self.events[last]
    }

    pub fn events(&self) -> &[ScheduledCommand] {
        &self.events
    }

    pub fn due_events(&self, now: DateTime<Utc>, environment: &str) -> Vec<&ScheduledCommand> {
        self.events
            .iter()
            .filter(|event| event.is_due(now, environment))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
