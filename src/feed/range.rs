use chrono::{DateTime, Days, FixedOffset, LocalResult, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time window selector for the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    #[default]
    Today,
    Yesterday,
    #[serde(rename = "3days")]
    ThreeDays,
    Week,
}

impl TimeRange {
    /// All ranges in display order.
    pub const ALL: [TimeRange; 4] = [
        TimeRange::Today,
        TimeRange::Yesterday,
        TimeRange::ThreeDays,
        TimeRange::Week,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeRange::Today => "Today",
            TimeRange::Yesterday => "Yesterday",
            TimeRange::ThreeDays => "3 Days",
            TimeRange::Week => "Week",
        }
    }

    /// Key used in config files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            TimeRange::Today => "today",
            TimeRange::Yesterday => "yesterday",
            TimeRange::ThreeDays => "3days",
            TimeRange::Week => "week",
        }
    }

    /// Next range in display order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|r| *r == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown time range '{s}' (expected today, yesterday, 3days or week)"))
    }
}

/// Half-open interval `[since, until)`. `until == None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub since: DateTime<FixedOffset>,
    pub until: Option<DateTime<FixedOffset>>,
}

impl DateBounds {
    /// Whether `at` falls inside the interval.
    #[cfg(test)]
    fn contains<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        *at >= self.since && self.until.map_or(true, |until| *at < until)
    }
}

/// Resolve a range against wall-clock `now`. All boundaries sit on local
/// midnight in `now`'s time zone.
pub fn resolve<Tz: TimeZone>(range: TimeRange, now: &DateTime<Tz>) -> DateBounds {
    let tz = now.timezone();
    let today = now.date_naive();
    let midnight = |days_back: u64| local_midnight(&tz, days_before(today, days_back));

    match range {
        TimeRange::Today => DateBounds {
            since: midnight(0),
            until: None,
        },
        TimeRange::Yesterday => DateBounds {
            since: midnight(1),
            until: Some(midnight(0)),
        },
        TimeRange::ThreeDays => DateBounds {
            since: midnight(2),
            until: None,
        },
        TimeRange::Week => DateBounds {
            since: midnight(6),
            until: None,
        },
    }
}

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// First instant of `date` in `tz`.
///
/// Zones that jump forward at midnight have no local 00:00; the day then
/// starts at the first valid instant after the gap.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<FixedOffset> {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.fixed_offset(),
        LocalResult::None => tz
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive))
            .fixed_offset(),
    }
}
