//! Calendar durations in the `P(nY)?(nM)?(nD)?` subset of ISO-8601.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

/// Years, months and days to add to an instant, in that order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalendarDuration {
    years: u32,
    months: u32,
    days: u32,
}

impl CalendarDuration {
    /// Creates a duration from its components.
    #[must_use]
    pub fn new(years: u32, months: u32, days: u32) -> Self {
        Self {
            years,
            months,
            days,
        }
    }

    /// Parses `P(nY)?(nM)?(nD)?`. Weeks, time parts and malformed input yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let body = value.strip_prefix('P')?;
        if body.is_empty() {
            return None;
        }

        let mut duration = Self::default();
        let mut digits = String::new();
        // Designators must appear in Y, M, D order and at most once each.
        let mut next_slot = 0_usize;

        for character in body.chars() {
            if character.is_ascii_digit() {
                digits.push(character);
                continue;
            }

            let slot = match character {
                'Y' => 0,
                'M' => 1,
                'D' => 2,
                _ => return None,
            };
            if digits.is_empty() || slot < next_slot {
                return None;
            }

            let amount = digits.parse::<u32>().ok()?;
            digits.clear();
            match slot {
                0 => duration.years = amount,
                1 => duration.months = amount,
                _ => duration.days = amount,
            }
            next_slot = slot + 1;
        }

        digits.is_empty().then_some(duration)
    }

    /// Adds the duration to `from`, normalising day overflow after each step.
    ///
    /// Returns `None` when the result leaves the supported calendar range.
    #[must_use]
    pub fn checked_add_to(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let start = from.date_naive();

        let year = start.year().checked_add(i32::try_from(self.years).ok()?)?;
        let after_years = rolled_date(year, start.month(), start.day())?;

        let month_index = i64::from(after_years.month0()) + i64::from(self.months);
        let year = after_years
            .year()
            .checked_add(i32::try_from(month_index / 12).ok()?)?;
        let month = u32::try_from(month_index % 12).ok()? + 1;
        let after_months = rolled_date(year, month, after_years.day())?;

        let after_days = after_months.checked_add_days(Days::new(u64::from(self.days)))?;

        Some(after_days.and_time(from.time()).and_utc())
    }
}

/// Adds an ISO-8601 calendar duration to `from`.
///
/// Unparseable durations, and results outside the calendar range, leave
/// `from` unchanged.
#[must_use]
pub fn add_duration(from: DateTime<Utc>, iso: &str) -> DateTime<Utc> {
    CalendarDuration::parse(iso)
        .and_then(|duration| duration.checked_add_to(from))
        .unwrap_or(from)
}

/// Builds a date letting days past the end of the month roll into the next.
fn rolled_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?.checked_add_days(Days::new(u64::from(day) - 1))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    use super::{CalendarDuration, add_duration};

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 9, 30, 0)
            .single()
            .unwrap_or_default()
    }

    #[test]
    fn parses_supported_subset() {
        assert_eq!(
            CalendarDuration::parse("P1Y2M3D"),
            Some(CalendarDuration::new(1, 2, 3))
        );
        assert_eq!(
            CalendarDuration::parse("P30D"),
            Some(CalendarDuration::new(0, 0, 30))
        );
        assert_eq!(
            CalendarDuration::parse("P1M"),
            Some(CalendarDuration::new(0, 1, 0))
        );
    }

    #[test]
    fn rejects_weeks_time_parts_and_disorder() {
        for value in ["P", "P1W", "PT1H", "P1DT2H", "P1D1M", "P1Y1Y", "30D", "P1", "Pxd"] {
            assert_eq!(CalendarDuration::parse(value), None, "{value}");
        }
    }

    #[test]
    fn thirty_days_from_new_year() {
        assert_eq!(add_duration(at(2025, 1, 1), "P30D"), at(2025, 1, 31));
    }

    #[test]
    fn month_overflow_rolls_forward() {
        // Jan 30 + 1 month is "Feb 30", which rolls to Mar 2 in 2025.
        assert_eq!(add_duration(at(2025, 1, 30), "P1M"), at(2025, 3, 2));
        assert_eq!(add_duration(at(2024, 2, 29), "P1Y"), at(2025, 3, 1));
        assert_eq!(add_duration(at(2025, 11, 15), "P3M"), at(2026, 2, 15));
    }

    #[test]
    fn years_apply_before_months_and_days() {
        assert_eq!(add_duration(at(2024, 1, 31), "P1Y1M1D"), at(2025, 3, 4));
    }

    #[test]
    fn unparseable_duration_is_zero() {
        assert_eq!(add_duration(at(2025, 1, 1), "P1W"), at(2025, 1, 1));
        assert_eq!(add_duration(at(2025, 1, 1), ""), at(2025, 1, 1));
    }

    proptest! {
        #[test]
        fn day_only_durations_match_plain_day_addition(days in 0_u32..5000) {
            let from = at(2025, 1, 1);
            let expected = from + chrono::Duration::days(i64::from(days));
            prop_assert_eq!(add_duration(from, &format!("P{days}D")), expected);
        }
    }
}
