use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use chrono_tz::Tz;

/// Range selector for the task board. `Date` is the calendar-picker mode
/// carrying its own target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    Day,
    Week,
    Month,
    Date(NaiveDate),
}

impl RangeMode {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(RangeMode::Day),
            "week" => Ok(RangeMode::Week),
            "month" => Ok(RangeMode::Month),
            other => Err(anyhow::anyhow!(
                "unknown range mode: {other} (expected day/week/month)"
            )),
        }
    }
}

/// An inclusive calendar-date window. Both bounds are local calendar dates
/// in the configured application timezone; instants are converted to that
/// basis before comparison and the two are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn contains_instant(&self, instant: DateTime<Utc>, tz: &Tz) -> bool {
        self.contains(instant.with_timezone(tz).date_naive())
    }
}

pub fn resolve(reference: NaiveDate, mode: RangeMode) -> DateRange {
    match mode {
        RangeMode::Day => DateRange {
            start: reference,
            end: reference,
        },
        RangeMode::Week => {
            let start = week_start(reference);
            DateRange {
                start,
                end: start.checked_add_days(Days::new(6)).unwrap_or(start),
            }
        }
        RangeMode::Month => DateRange {
            start: month_start(reference),
            end: month_end(reference),
        },
        RangeMode::Date(target) => DateRange {
            start: target,
            end: target,
        },
    }
}

/// Moves the reference one unit forward; refused (no-op) when the result
/// would land past `today`, so navigation cannot reach into the future.
pub fn advance(reference: NaiveDate, mode: RangeMode, today: NaiveDate) -> NaiveDate {
    let next = match mode {
        RangeMode::Day | RangeMode::Date(_) => reference.checked_add_days(Days::new(1)),
        RangeMode::Week => reference.checked_add_days(Days::new(7)),
        RangeMode::Month => reference.checked_add_months(Months::new(1)),
    };

    match next {
        Some(next) if next <= today => next,
        _ => reference,
    }
}

pub fn retreat(reference: NaiveDate, mode: RangeMode) -> NaiveDate {
    let prev = match mode {
        RangeMode::Day | RangeMode::Date(_) => reference.checked_sub_days(Days::new(1)),
        RangeMode::Week => reference.checked_sub_days(Days::new(7)),
        RangeMode::Month => reference.checked_sub_months(Months::new(1)),
    };
    prev.unwrap_or(reference)
}

pub fn label(reference: NaiveDate, mode: RangeMode) -> String {
    match mode {
        RangeMode::Day => reference.format("%a, %b %-d, %Y").to_string(),
        RangeMode::Date(target) => target.format("%a, %b %-d, %Y").to_string(),
        RangeMode::Week | RangeMode::Month => {
            let range = resolve(reference, mode);
            format!(
                "{} - {}",
                range.start.format("%-m/%-d/%Y"),
                range.end.format("%-m/%-d/%Y")
            )
        }
    }
}

/// Calendar date of `now` in the application timezone; the "today" used
/// for navigation clamping.
pub fn today_in(now: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    now.with_timezone(tz).date_naive()
}

/// The most recent Sunday on or before `date`. Week start is fixed at
/// Sunday regardless of locale.
fn week_start(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn month_end(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate, Weekday};

    use super::{DateRange, RangeMode, advance, label, resolve, retreat};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn day_window_is_the_reference_date() {
        let range = resolve(date(2024, 3, 10), RangeMode::Day);
        assert_eq!(range.start, date(2024, 3, 10));
        assert_eq!(range.end, date(2024, 3, 10));
    }

    #[test]
    fn week_window_starts_sunday_and_spans_six_days() {
        for offset in 0..14 {
            let reference = date(2024, 3, 3) + chrono::Duration::days(offset);
            let range = resolve(reference, RangeMode::Week);
            assert_eq!(range.start.weekday(), Weekday::Sun);
            assert_eq!(range.end - range.start, chrono::Duration::days(6));
            assert!(range.contains(reference));
        }
    }

    #[test]
    fn week_window_on_a_sunday_starts_that_day() {
        let range = resolve(date(2024, 3, 10), RangeMode::Week);
        assert_eq!(range.start, date(2024, 3, 10));
        assert_eq!(range.end, date(2024, 3, 16));
    }

    #[test]
    fn month_window_ends_on_last_calendar_day() {
        let feb_leap = resolve(date(2024, 2, 10), RangeMode::Month);
        assert_eq!(feb_leap.start, date(2024, 2, 1));
        assert_eq!(feb_leap.end, date(2024, 2, 29));

        let feb = resolve(date(2023, 2, 10), RangeMode::Month);
        assert_eq!(feb.end, date(2023, 2, 28));

        let dec = resolve(date(2023, 12, 25), RangeMode::Month);
        assert_eq!(dec.start, date(2023, 12, 1));
        assert_eq!(dec.end, date(2023, 12, 31));
    }

    #[test]
    fn membership_is_a_closed_interval() {
        let range = DateRange {
            start: date(2024, 3, 3),
            end: date(2024, 3, 9),
        };
        assert!(range.contains(date(2024, 3, 3)));
        assert!(range.contains(date(2024, 3, 9)));
        assert!(!range.contains(date(2024, 3, 2)));
        assert!(!range.contains(date(2024, 3, 10)));
    }

    #[test]
    fn advance_is_clamped_at_today() {
        let today = date(2024, 3, 10);
        assert_eq!(advance(today, RangeMode::Day, today), today);
        assert_eq!(advance(date(2024, 3, 9), RangeMode::Day, today), today);
        assert_eq!(advance(date(2024, 3, 5), RangeMode::Week, today), date(2024, 3, 5));
        assert_eq!(advance(date(2024, 2, 20), RangeMode::Month, today), date(2024, 2, 20));
        assert_eq!(advance(date(2024, 2, 1), RangeMode::Month, today), date(2024, 3, 1));
    }

    #[test]
    fn month_navigation_rolls_over_year_and_clamps_day() {
        assert_eq!(
            advance(date(2023, 12, 15), RangeMode::Month, date(2024, 6, 1)),
            date(2024, 1, 15)
        );
        assert_eq!(
            advance(date(2024, 1, 31), RangeMode::Month, date(2024, 6, 1)),
            date(2024, 2, 29)
        );
        assert_eq!(retreat(date(2024, 1, 10), RangeMode::Month), date(2023, 12, 10));
        assert_eq!(retreat(date(2024, 3, 31), RangeMode::Month), date(2024, 2, 29));
    }

    #[test]
    fn retreat_is_unbounded_by_today() {
        assert_eq!(retreat(date(2024, 3, 10), RangeMode::Day), date(2024, 3, 9));
        assert_eq!(retreat(date(2024, 3, 10), RangeMode::Week), date(2024, 3, 3));
    }

    #[test]
    fn labels_render_the_window() {
        assert_eq!(label(date(2024, 3, 10), RangeMode::Day), "Sun, Mar 10, 2024");
        assert_eq!(
            label(date(2024, 3, 13), RangeMode::Week),
            "3/10/2024 - 3/16/2024"
        );
        assert_eq!(
            label(date(2024, 2, 10), RangeMode::Month),
            "2/1/2024 - 2/29/2024"
        );
    }
}
