//! Due-check predicate shared by the scheduler and its tests.

use chrono::{DateTime, Utc};
use recurbot_core::types::{IntervalUnit, Template};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Repeat interval in milliseconds.
///
/// Unknown units fall back to one day regardless of `value`.
pub fn interval_ms(value: u64, unit: &IntervalUnit) -> i64 {
    let value = i64::try_from(value).unwrap_or(i64::MAX);
    match unit {
        IntervalUnit::Minutes => value.saturating_mul(MINUTE_MS),
        IntervalUnit::Hours => value.saturating_mul(HOUR_MS),
        IntervalUnit::Days => value.saturating_mul(DAY_MS),
        IntervalUnit::Other(_) => DAY_MS,
    }
}

/// Whether `template` should be sent at `now`.
///
/// Never-sent templates are always due. Otherwise due once the elapsed
/// time reaches the interval; missed intervals are not replayed.
pub fn is_due(template: &Template, now: DateTime<Utc>) -> bool {
    let Some(last_sent) = template.last_sent_time else {
        return true;
    };
    let elapsed = (now - last_sent).num_milliseconds();
    elapsed >= interval_ms(template.interval_value, &template.interval_unit)
}
