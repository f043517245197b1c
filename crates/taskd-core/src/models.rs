use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::sqlite::{SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef};
use sqlx::{Decode, Encode, FromRow, Sqlite, Type};
use uuid::Uuid;

use crate::error::RuleError;

/// Canonical textual form of a [`CalendarDate`]: 8 digits, zero-padded.
/// Lexicographic order of this form equals chronological order, which the
/// storage layer relies on when sorting by the TEXT `date` column.
pub const DATE_FORMAT: &str = "%Y%m%d";

// ============================================================================
// Calendar Dates
// ============================================================================

/// A day-granularity date. No time-of-day, no timezone: a task scheduled for
/// `20240601` is due on that calendar day wherever the server runs.
///
/// Serializes as the fixed-width `YYYYMMDD` string both in JSON and in
/// SQLite (TEXT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The server's current calendar day (local clock). The recurrence
    /// engine never calls this itself; callers read the clock once per
    /// request and pass the value down.
    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }

    pub fn day(self) -> u32 {
        self.0.day()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    /// The following calendar day.
    pub fn succ(self) -> Self {
        Self(self.0.succ_opt().unwrap_or(NaiveDate::MAX))
    }

    pub fn plus_days(self, days: u64) -> Self {
        Self(self.0.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX))
    }

    /// Adds whole calendar years. Feb 29 clamps to Feb 28 on non-leap
    /// target years.
    pub fn plus_years(self, years: u32) -> Self {
        Self(
            self.0
                .checked_add_months(Months::new(12 * years))
                .unwrap_or(NaiveDate::MAX),
        )
    }

    /// True when no later day falls in the same month.
    pub fn is_last_of_month(self) -> bool {
        self.succ().month() != self.month()
    }

    /// True when the following day is the last day of the month. Defined
    /// indirectly rather than via month length so the two checks cannot
    /// disagree.
    pub fn is_second_to_last_of_month(self) -> bool {
        self.succ().is_last_of_month()
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for CalendarDate {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Fixed width: "202461" or "2024-06-01" are rejected, not guessed at.
        if s.len() != 8 {
            return Err(RuleError::InvalidDate(s.to_string()));
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(CalendarDate)
            .map_err(|_| RuleError::InvalidDate(s.to_string()))
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl Type<Sqlite> for CalendarDate {
    fn type_info() -> SqliteTypeInfo {
        <&str as Type<Sqlite>>::type_info()
    }
}

impl<'q> Encode<'q, Sqlite> for CalendarDate {
    fn encode_by_ref(&self, buf: &mut Vec<SqliteArgumentValue<'q>>) -> sqlx::encode::IsNull {
        buf.push(SqliteArgumentValue::Text(Cow::Owned(self.to_string())));
        sqlx::encode::IsNull::No
    }
}

impl<'r> Decode<'r, Sqlite> for CalendarDate {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let text = <&str as Decode<Sqlite>>::decode(value)?;
        Ok(text.parse::<CalendarDate>()?)
    }
}

// ============================================================================
// Tasks
// ============================================================================

/// A scheduled task as stored and as served over the API.
///
/// `repeat` holds the raw repetition-rule text (empty for one-shot tasks);
/// it is validated before persistence and re-parsed when the task is
/// completed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub date: CalendarDate,
    pub title: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub repeat: String,
}

/// Fields for creating a task. The date has already been normalized by the
/// caller (see [`crate::recurrence::normalize_date`]).
#[derive(Debug, Clone)]
pub struct NewTaskData {
    pub date: CalendarDate,
    pub title: String,
    pub comment: String,
    pub repeat: String,
}

/// Full-record task update; every field is written.
#[derive(Debug, Clone)]
pub struct UpdateTaskData {
    pub id: Uuid,
    pub date: CalendarDate,
    pub title: String,
    pub comment: String,
    pub repeat: String,
}

/// Outcome of completing a task.
#[derive(Debug)]
pub enum CompletionResult {
    /// One-shot task: removed from the store. Carries the final record.
    Finished(Task),
    /// Recurring task: rescheduled to its next occurrence. The returned
    /// record carries the new date.
    Rescheduled(Task),
}
