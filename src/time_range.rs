use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grain {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Grain {
    pub fn name(self) -> &'static str {
        match self {
            Grain::Day => "day",
            Grain::Week => "week",
            Grain::Month => "month",
            Grain::Quarter => "quarter",
            Grain::Year => "year",
        }
    }
}

/// A relative point in time, as spoken. Turned into a timestamp only once the
/// reference time of a call is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeAnchor {
    /// "today", "this week", ...
    StartOf(Grain),
    /// "last 7 days": start of the day `amount` grains before now.
    Last { amount: u32, grain: Grain },
}

impl TimeAnchor {
    pub fn resolve(self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            TimeAnchor::StartOf(grain) => start_of(grain, now),
            TimeAnchor::Last { amount, grain } => {
                let amount = i32::try_from(amount).unwrap_or(i32::MAX);
                start_of(Grain::Day, shift_datetime_by_grain(now, -amount, grain))
            }
        }
    }
}

impl fmt::Display for TimeAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeAnchor::StartOf(Grain::Day) => f.write_str("today"),
            TimeAnchor::StartOf(grain) => write!(f, "this {}", grain.name()),
            TimeAnchor::Last { amount, grain } => {
                let plural = if *amount == 1 { "" } else { "s" };
                write!(f, "last {amount} {}{plural}", grain.name())
            }
        }
    }
}

fn midnight() -> NaiveTime {
    NaiveTime::MIN
}

/// Start of the `grain` containing `dt`. Weeks start on Monday.
pub fn start_of(grain: Grain, dt: NaiveDateTime) -> NaiveDateTime {
    match grain {
        Grain::Day => NaiveDateTime::new(dt.date(), midnight()),
        Grain::Week => {
            let weekday_offset = dt.date().weekday().num_days_from_monday() as i64;
            let start_date = dt.date() - Duration::days(weekday_offset);
            NaiveDateTime::new(start_date, midnight())
        }
        Grain::Month => NaiveDateTime::new(
            NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1).unwrap_or_else(|| dt.date()),
            midnight(),
        ),
        Grain::Quarter => {
            let quarter_start = ((dt.month() - 1) / 3) * 3 + 1;
            NaiveDateTime::new(
                NaiveDate::from_ymd_opt(dt.year(), quarter_start, 1).unwrap_or_else(|| dt.date()),
                midnight(),
            )
        }
        Grain::Year => {
            NaiveDateTime::new(NaiveDate::from_ymd_opt(dt.year(), 1, 1).unwrap_or_else(|| dt.date()), midnight())
        }
    }
}

/// Shift `dt` by whole grains. Month arithmetic clamps the day to the target
/// month's length. Results outside chrono's range saturate.
pub fn shift_datetime_by_grain(dt: NaiveDateTime, amount: i32, grain: Grain) -> NaiveDateTime {
    let shifted = match grain {
        Grain::Day => Duration::try_days(amount as i64).and_then(|d| dt.checked_add_signed(d)),
        Grain::Week => Duration::try_weeks(amount as i64).and_then(|d| dt.checked_add_signed(d)),
        Grain::Month => add_months(dt, amount),
        Grain::Quarter => amount.checked_mul(3).and_then(|m| add_months(dt, m)),
        Grain::Year => amount.checked_mul(12).and_then(|m| add_months(dt, m)),
    };
    shifted.unwrap_or(if amount < 0 { NaiveDateTime::MIN } else { NaiveDateTime::MAX })
}

fn add_months(dt: NaiveDateTime, months: i32) -> Option<NaiveDateTime> {
    let base_year = dt.date().year();
    let base_month = dt.date().month() as i32;
    let zero_based = (base_month - 1).checked_add(months)?;
    let year = base_year.checked_add(zero_based.div_euclid(12))?;
    let month = (zero_based.rem_euclid(12) + 1) as u32;
    let day = dt.date().day().min(days_in_month(year, month)?);
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(NaiveDateTime::new(date, dt.time()))
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 { (year.checked_add(1)?, 1) } else { (year, month + 1) };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    first_next.pred_opt().map(|last| last.day())
}
