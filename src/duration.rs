//! ISO-8601 durations
//!
//! Parses `PnYnMnWnDTnHnMnS` durations and adds them to a moment the way a
//! calendar does: years, months, weeks and days move the wall-clock date,
//! hours, minutes and seconds are exact elapsed time.

use crate::error::{Error, Result};
use chrono::{DateTime, Days, FixedOffset, Months, TimeDelta, TimeZone};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Regex for ISO-8601 durations: P1Y2M3W4DT5H6M7.5S
static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:[.,](\d{1,9}))?S)?)?$",
    )
    .unwrap()
});

/// A parsed ISO-8601 duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IsoDuration {
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub nanos: u32,
}

impl IsoDuration {
    /// Duration of whole hours
    pub fn hours(hours: u32) -> Self {
        Self {
            hours,
            ..Self::default()
        }
    }

    /// Duration of whole days
    pub fn days(days: u32) -> Self {
        Self {
            days,
            ..Self::default()
        }
    }

    /// Check if any calendar component (years to days) is set
    pub fn has_calendar_part(&self) -> bool {
        self.years > 0 || self.months > 0 || self.weeks > 0 || self.days > 0
    }

    /// The exact-time part (hours to seconds)
    pub fn clock_part(&self) -> Option<TimeDelta> {
        let seconds = i64::from(self.hours) * 3600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds);
        TimeDelta::try_seconds(seconds)?.checked_add(&TimeDelta::nanoseconds(i64::from(self.nanos)))
    }

    /// Add this duration to `start`
    ///
    /// The shifted wall-clock time is resolved in `offset`, which lets the
    /// caller account for a UTC offset change (daylight saving) between the
    /// two ends. Returns `None` on overflow.
    pub fn add_in_offset(
        &self,
        start: &DateTime<FixedOffset>,
        offset: FixedOffset,
    ) -> Option<DateTime<FixedOffset>> {
        let shifted = if self.has_calendar_part() {
            let months = self.years.checked_mul(12)?.checked_add(self.months)?;
            let days = u64::from(self.weeks) * 7 + u64::from(self.days);
            let local = start
                .naive_local()
                .checked_add_months(Months::new(months))?
                .checked_add_days(Days::new(days))?;
            offset.from_local_datetime(&local).single()?
        } else {
            start.with_timezone(&offset)
        };

        shifted.checked_add_signed(self.clock_part()?)
    }

    /// Add this duration to `start`, keeping its UTC offset
    pub fn add_to(&self, start: &DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        self.add_in_offset(start, *start.offset())
    }
}

impl FromStr for IsoDuration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidDuration {
            value: s.to_string(),
        };
        let text = s.trim().to_ascii_uppercase();

        let caps = DURATION_REGEX.captures(&text).ok_or_else(invalid)?;
        if text.ends_with('T') || caps.iter().skip(1).all(|group| group.is_none()) {
            return Err(invalid());
        }

        let field = |index: usize| -> Result<u32> {
            caps.get(index)
                .map_or(Ok(0), |m| m.as_str().parse().map_err(|_| invalid()))
        };
        let nanos = match caps.get(8) {
            Some(m) => format!("{:0<9}", m.as_str()).parse().map_err(|_| invalid())?,
            None => 0,
        };

        Ok(Self {
            years: field(1)?,
            months: field(2)?,
            weeks: field(3)?,
            days: field(4)?,
            hours: field(5)?,
            minutes: field(6)?,
            seconds: field(7)?,
            nanos,
        })
    }
}

impl fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("P")?;
        for (value, unit) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if value > 0 {
                write!(f, "{value}{unit}")?;
            }
        }

        let has_seconds = self.seconds > 0 || self.nanos > 0;
        if self.hours > 0 || self.minutes > 0 || has_seconds {
            f.write_str("T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if has_seconds {
                if self.nanos > 0 {
                    let fraction = format!("{:09}", self.nanos);
                    write!(f, "{}.{}S", self.seconds, fraction.trim_end_matches('0'))?;
                } else {
                    write!(f, "{}S", self.seconds)?;
                }
            }
        } else if !self.has_calendar_part() {
            f.write_str("T0S")?;
        }
        Ok(())
    }
}
