use chrono::{DateTime, TimeZone, Utc, Weekday};

use crate::console::schedule::{Frequency, Schedule};

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single().expect("valid timestamp")
}

#[test]
fn test_minute_frequencies() {
    let on_the_quarter = at(2024, 3, 5, 10, 45);
    let odd_minute = at(2024, 3, 5, 10, 47);

    assert!(Frequency::EveryMinute.is_due(odd_minute));
    assert!(Frequency::EveryFiveMinutes.is_due(on_the_quarter));
    assert!(!Frequency::EveryFiveMinutes.is_due(odd_minute));
    assert!(Frequency::EveryFifteenMinutes.is_due(on_the_quarter));
    assert!(!Frequency::EveryThirtyMinutes.is_due(on_the_quarter));
    assert!(!Frequency::EveryTenMinutes.is_due(on_the_quarter));
}

#[test]
fn test_calendar_frequencies() {
    // 2024-03-03 is a Sunday
    let sunday_midnight = at(2024, 3, 3, 0, 0);
    let first_of_month = at(2024, 3, 1, 0, 0);

    assert!(Frequency::HourlyAt(0).is_due(sunday_midnight));
    assert!(Frequency::DailyAt(0, 0).is_due(sunday_midnight));
    assert!(!Frequency::DailyAt(2, 30).is_due(sunday_midnight));
    assert!(Frequency::WeeklyOn(Weekday::Sun, 0, 0).is_due(sunday_midnight));
    assert!(!Frequency::WeeklyOn(Weekday::Sun, 0, 0).is_due(first_of_month));
    assert!(Frequency::MonthlyOn(1, 0, 0).is_due(first_of_month));
}

#[test]
fn test_due_events_respect_environment_filters() {
    let mut schedule = Schedule::new();
    schedule.command("reports:send").daily_at(6, 0).environments(["production"]);
    schedule.command("cache:prune").every_minute().environments(["local*", "testing"]);
    schedule.command("queue:work").every_five_minutes();

    let now = at(2024, 3, 5, 6, 0);
    let due: Vec<&str> = schedule
        .due_events(now, "production")
        .into_iter()
        .map(|event| event.command())
        .collect();
    assert_eq!(due, vec!["reports:send", "queue:work"]);

    let due: Vec<&str> = schedule
        .due_events(now, "local-dev")
        .into_iter()
        .map(|event| event.command())
        .collect();
    assert_eq!(due, vec!["cache:prune", "queue:work"]);
}

#[test]
fn test_scheduled_command_builder() {
    let mut schedule = Schedule::new();
    assert!(schedule.is_empty());

    schedule
        .command("app:example")
        .parameter("name", "nightly")
        .daily()
        .description("Nightly example");

    let event = &schedule.events()[0];
    assert_eq!(event.frequency(), Frequency::DailyAt(0, 0));
    assert_eq!(event.parameters(), vec![("name", "nightly")]);
    assert_eq!(event.summary(), "Nightly example");
    assert_eq!(event.frequency().to_string(), "daily at 00:00");
}
