//! Repetition rules and next-occurrence calculation.
//!
//! The grammar is a leading kind token followed by kind-specific parameters:
//!
//! | rule        | meaning                                          |
//! |-------------|--------------------------------------------------|
//! | `d 7`       | every 7 days (interval in 1..=400)               |
//! | `y`         | every year on the same month and day             |
//! | `w 1,3,5`   | on Mondays, Wednesdays, Fridays (1=Mon..7=Sun)   |
//! | `m 15,-1`   | on the 15th and the last day of every month      |
//! | `m -2 3,6`  | on the second-to-last day of March and June      |
//!
//! Rules are parsed once into [`RepeatRule`] and never re-tokenized during
//! calculation. Everything in this module is pure: the reference date is a
//! caller-supplied parameter, never an ambient clock read, so results are
//! reproducible in tests.

use std::str::FromStr;

use chrono::Weekday;

use crate::error::RuleError;
use crate::models::CalendarDate;

/// Upper bound for the `d` rule's day interval.
pub const MAX_DAILY_INTERVAL: u32 = 400;

/// How many days past the reference date a monthly scan may run without a
/// match before the rule is declared unsatisfiable. Nine years covers the
/// widest legitimate gap between occurrences (Feb 29 skips eight years
/// around non-leap century years), so a rule like `m 30 2` (day 30 of
/// February) fails instead of scanning forever.
const MONTHLY_SCAN_LIMIT: u32 = 9 * 366;

/// One entry of a monthly rule's day list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySelector {
    /// A literal day of month, 1..=31.
    Day(u8),
    /// The last day of the month (wire form `-1`).
    LastDay,
    /// The second-to-last day of the month (wire form `-2`).
    SecondToLastDay,
}

/// A validated repetition rule. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeatRule {
    /// Every `every` days, anchored at the task's start date.
    Daily { every: u32 },
    /// On the listed weekdays, anchored at the reference date.
    Weekly { weekdays: Vec<Weekday> },
    /// On matching days of the listed months, anchored at the start date.
    /// `months` is always populated; an omitted month list parses to all
    /// twelve.
    Monthly {
        days: Vec<DaySelector>,
        months: Vec<u32>,
    },
    /// Same month and day every year.
    Yearly,
}

impl FromStr for RepeatRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let kind = tokens
            .next()
            .ok_or_else(|| RuleError::UnknownRule(s.to_string()))?;

        let rule = match kind {
            "d" => {
                let arg = tokens.next().ok_or(RuleError::MissingParameter("d"))?;
                RepeatRule::Daily {
                    every: parse_daily_interval(arg)?,
                }
            }
            "y" => RepeatRule::Yearly,
            "w" => {
                let arg = tokens.next().ok_or(RuleError::MissingParameter("w"))?;
                RepeatRule::Weekly {
                    weekdays: parse_weekdays(arg)?,
                }
            }
            "m" => {
                let days_arg = tokens.next().ok_or(RuleError::MissingParameter("m"))?;
                let months = match tokens.next() {
                    Some(months_arg) => parse_months(months_arg)?,
                    None => (1..=12).collect(),
                };
                RepeatRule::Monthly {
                    days: parse_day_selectors(days_arg)?,
                    months,
                }
            }
            other => return Err(RuleError::UnknownRule(other.to_string())),
        };

        if let Some(extra) = tokens.next() {
            return Err(RuleError::InvalidParameter(format!(
                "unexpected parameter {extra:?}"
            )));
        }
        Ok(rule)
    }
}

fn parse_daily_interval(arg: &str) -> Result<u32, RuleError> {
    let every: u32 = arg
        .parse()
        .map_err(|_| RuleError::InvalidParameter(format!("day interval {arg:?} is not a number")))?;
    if every == 0 || every > MAX_DAILY_INTERVAL {
        return Err(RuleError::InvalidParameter(format!(
            "day interval must be between 1 and {MAX_DAILY_INTERVAL}, got {every}"
        )));
    }
    Ok(every)
}

fn parse_weekdays(arg: &str) -> Result<Vec<Weekday>, RuleError> {
    let mut weekdays = Vec::new();
    for part in arg.split(',') {
        let number: u32 = part.parse().map_err(|_| {
            RuleError::InvalidParameter(format!("weekday {part:?} is not a number"))
        })?;
        let weekday = match number {
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            7 => Weekday::Sun,
            _ => {
                return Err(RuleError::InvalidParameter(format!(
                    "weekday must be between 1 and 7, got {number}"
                )))
            }
        };
        weekdays.push(weekday);
    }
    Ok(weekdays)
}

fn parse_day_selectors(arg: &str) -> Result<Vec<DaySelector>, RuleError> {
    let mut days = Vec::new();
    for part in arg.split(',') {
        let number: i32 = part.parse().map_err(|_| {
            RuleError::InvalidParameter(format!("month day {part:?} is not a number"))
        })?;
        let selector = match number {
            -1 => DaySelector::LastDay,
            -2 => DaySelector::SecondToLastDay,
            1..=31 => DaySelector::Day(number as u8),
            _ => {
                return Err(RuleError::InvalidParameter(format!(
                    "month day must be 1..=31, -1 or -2, got {number}"
                )))
            }
        };
        days.push(selector);
    }
    Ok(days)
}

fn parse_months(arg: &str) -> Result<Vec<u32>, RuleError> {
    let mut months = Vec::new();
    for part in arg.split(',') {
        let month: u32 = part
            .parse()
            .map_err(|_| RuleError::InvalidParameter(format!("month {part:?} is not a number")))?;
        if !(1..=12).contains(&month) {
            return Err(RuleError::InvalidParameter(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        months.push(month);
    }
    Ok(months)
}

/// Computes the first occurrence of `rule` strictly after `after`.
///
/// The anchor differs by rule kind, and the difference is load-bearing for
/// completion semantics:
///
/// - `Daily`/`Yearly` step from `start` in whole intervals. A start date
///   that is already past the reference still advances by one interval, so
///   completing a future-dated task pushes it to the following occurrence
///   rather than returning the same date.
/// - `Weekly` scans forward from the day after `after` and ignores `start`
///   entirely.
/// - `Monthly` scans forward from `start` one day at a time and accepts the
///   first date past `after` whose day and month both match.
pub fn next_occurrence(
    after: CalendarDate,
    start: CalendarDate,
    rule: &RepeatRule,
) -> Result<CalendarDate, RuleError> {
    match rule {
        RepeatRule::Daily { every } => {
            let mut date = start.plus_days(u64::from(*every));
            while date <= after {
                date = date.plus_days(u64::from(*every));
            }
            Ok(date)
        }
        RepeatRule::Yearly => {
            let mut date = start.plus_years(1);
            while date <= after {
                date = date.plus_years(1);
            }
            Ok(date)
        }
        RepeatRule::Weekly { weekdays } => {
            let mut date = after.succ();
            while !weekdays.contains(&date.weekday()) {
                date = date.succ();
            }
            Ok(date)
        }
        RepeatRule::Monthly { days, months } => {
            let mut date = start;
            let mut scanned_past_reference = 0u32;
            loop {
                if date > after {
                    if day_matches(date, days) && months.contains(&date.month()) {
                        return Ok(date);
                    }
                    scanned_past_reference += 1;
                    if scanned_past_reference > MONTHLY_SCAN_LIMIT {
                        return Err(RuleError::InvalidParameter(
                            "monthly rule matches no calendar date".to_string(),
                        ));
                    }
                }
                date = date.succ();
            }
        }
    }
}

fn day_matches(date: CalendarDate, days: &[DaySelector]) -> bool {
    days.iter().any(|selector| match selector {
        DaySelector::Day(day) => u32::from(*day) == date.day(),
        DaySelector::LastDay => date.is_last_of_month(),
        DaySelector::SecondToLastDay => date.is_second_to_last_of_month(),
    })
}

/// String-facing entry point: parses `start` and `repeat`, then calculates.
/// This is what the direct next-date endpoint and the completion path call.
pub fn next_date(
    after: CalendarDate,
    start: &str,
    repeat: &str,
) -> Result<CalendarDate, RuleError> {
    let start: CalendarDate = start.parse()?;
    let rule: RepeatRule = repeat.parse()?;
    next_occurrence(after, start, &rule)
}

/// Resolves the date a task should be stored with.
///
/// - Empty or `"today"` input resolves to `today`.
/// - A date today-or-later is kept as-is; its rule (if any) is not consulted.
/// - A past date advances through the rule when one is present, otherwise it
///   clamps to `today`.
///
/// Runs on task creation and update, before persistence.
pub fn normalize_date(
    date: &str,
    repeat: &str,
    today: CalendarDate,
) -> Result<CalendarDate, RuleError> {
    let date = date.trim();
    if date.is_empty() || date == "today" {
        return Ok(today);
    }

    let parsed: CalendarDate = date.parse()?;
    if parsed >= today {
        return Ok(parsed);
    }

    if !repeat.trim().is_empty() {
        let rule: RepeatRule = repeat.parse()?;
        return next_occurrence(today, parsed, &rule);
    }
    Ok(today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(s: &str) -> CalendarDate {
        s.parse().expect("test date must be valid")
    }

    fn next(after: &str, start: &str, repeat: &str) -> String {
        next_date(date(after), start, repeat)
            .expect("calculation must succeed")
            .to_string()
    }

    mod parser_tests {
        use super::*;

        #[test]
        fn daily_rule_parses() {
            assert_eq!(
                "d 7".parse::<RepeatRule>().unwrap(),
                RepeatRule::Daily { every: 7 }
            );
            assert_eq!(
                "d 400".parse::<RepeatRule>().unwrap(),
                RepeatRule::Daily { every: 400 }
            );
        }

        #[test]
        fn weekly_rule_parses() {
            assert_eq!(
                "w 1,3,5".parse::<RepeatRule>().unwrap(),
                RepeatRule::Weekly {
                    weekdays: vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]
                }
            );
            // 7 is Sunday.
            assert_eq!(
                "w 7".parse::<RepeatRule>().unwrap(),
                RepeatRule::Weekly {
                    weekdays: vec![Weekday::Sun]
                }
            );
        }

        #[test]
        fn monthly_rule_parses_with_and_without_months() {
            assert_eq!(
                "m 15,-1 3,6".parse::<RepeatRule>().unwrap(),
                RepeatRule::Monthly {
                    days: vec![DaySelector::Day(15), DaySelector::LastDay],
                    months: vec![3, 6],
                }
            );
            // Omitted month list means every month.
            assert_eq!(
                "m -2".parse::<RepeatRule>().unwrap(),
                RepeatRule::Monthly {
                    days: vec![DaySelector::SecondToLastDay],
                    months: (1..=12).collect(),
                }
            );
        }

        #[test]
        fn yearly_rule_parses() {
            assert_eq!("y".parse::<RepeatRule>().unwrap(), RepeatRule::Yearly);
        }

        #[rstest]
        #[case::interval_too_large("d 500")]
        #[case::interval_zero("d 0")]
        #[case::interval_negative("d -1")]
        #[case::interval_not_a_number("d abc")]
        #[case::weekday_zero("w 0")]
        #[case::weekday_too_large("w 8")]
        #[case::weekday_mixed_validity("w 1,8")]
        #[case::weekday_not_a_number("w mon")]
        #[case::month_day_zero("m 0")]
        #[case::month_day_too_large("m 32")]
        #[case::month_day_below_markers("m -3")]
        #[case::month_out_of_range("m 15 13")]
        #[case::yearly_takes_no_parameters("y 5")]
        #[case::daily_extra_parameter("d 3 4")]
        fn invalid_parameters_are_rejected(#[case] rule: &str) {
            assert!(matches!(
                rule.parse::<RepeatRule>(),
                Err(RuleError::InvalidParameter(_))
            ));
        }

        #[rstest]
        #[case::daily("d")]
        #[case::weekly("w")]
        #[case::monthly("m")]
        fn missing_parameters_are_rejected(#[case] rule: &str) {
            assert!(matches!(
                rule.parse::<RepeatRule>(),
                Err(RuleError::MissingParameter(_))
            ));
        }

        #[test]
        fn unknown_rules_are_rejected() {
            assert!(matches!(
                "x".parse::<RepeatRule>(),
                Err(RuleError::UnknownRule(_))
            ));
            assert!(matches!(
                "".parse::<RepeatRule>(),
                Err(RuleError::UnknownRule(_))
            ));
        }
    }

    mod daily_tests {
        use super::*;

        #[test]
        fn steps_from_start_until_past_reference() {
            assert_eq!(next("20240126", "20240113", "d 7"), "20240127");
            assert_eq!(next("20240126", "20240126", "d 7"), "20240202");
        }

        #[test]
        fn future_start_still_advances_one_interval() {
            // The start date is already past the reference, yet the result is
            // start + interval, not the start date itself.
            assert_eq!(next("20240101", "20240210", "d 5"), "20240215");
        }

        #[test]
        fn result_is_congruent_to_start() {
            let after = date("20240601");
            let start = date("19990115");
            let rule = RepeatRule::Daily { every: 13 };

            let result = next_occurrence(after, start, &rule).unwrap();
            assert!(result > after);

            // Walking back from the result in 13-day steps lands on start.
            let mut cursor = start;
            while cursor < result {
                cursor = cursor.plus_days(13);
            }
            assert_eq!(cursor, result);
        }

        #[test]
        fn maximum_interval_is_honored() {
            assert_eq!(next("20240101", "20240101", "d 400"), "20250204");
        }
    }

    mod yearly_tests {
        use super::*;

        #[test]
        fn strictly_after_semantics() {
            assert_eq!(next("20240101", "20230301", "y"), "20240301");
            // Completing on the occurrence day itself moves a full year out.
            assert_eq!(next("20240301", "20230301", "y"), "20250301");
        }

        #[test]
        fn leap_day_clamps_to_feb_28() {
            assert_eq!(next("20240301", "20240229", "y"), "20250228");
        }

        #[test]
        fn catches_up_over_multiple_years() {
            assert_eq!(next("20260615", "20200701", "y"), "20260701");
        }
    }

    mod weekly_tests {
        use super::*;

        #[test]
        fn finds_next_listed_weekday_after_reference() {
            // 2024-01-01 is a Monday; the scan starts on Tuesday.
            assert_eq!(next("20240101", "20240101", "w 1,3,5"), "20240103");
        }

        #[test]
        fn start_date_is_ignored() {
            assert_eq!(
                next("20240101", "19700101", "w 1,3,5"),
                next("20240101", "20991231", "w 1,3,5"),
            );
        }

        #[test]
        fn seven_means_sunday() {
            // 2024-01-03 is a Wednesday; next Sunday is the 7th.
            assert_eq!(next("20240103", "20240103", "w 7"), "20240107");
        }

        #[test]
        fn reference_weekday_itself_is_excluded() {
            // Reference is a Monday and Monday is in the set, but the search
            // begins the next day.
            assert_eq!(next("20240101", "20240101", "w 1"), "20240108");
        }
    }

    mod monthly_tests {
        use super::*;

        #[test]
        fn last_day_of_month() {
            assert_eq!(next("20240101", "20240101", "m -1"), "20240131");
        }

        #[test]
        fn last_day_in_leap_february() {
            assert_eq!(next("20240201", "20240101", "m -1"), "20240229");
        }

        #[rstest]
        #[case::january_31_days("20240101", "20240130")]
        #[case::leap_february_29_days("20240201", "20240228")]
        #[case::plain_february_28_days("20230201", "20230227")]
        #[case::april_30_days("20240401", "20240429")]
        fn second_to_last_day_tracks_month_length(#[case] after: &str, #[case] expected: &str) {
            assert_eq!(next(after, "20230101", "m -2"), expected);
        }

        #[test]
        fn numeric_day_list() {
            assert_eq!(next("20240110", "20240101", "m 7,19"), "20240119");
            assert_eq!(next("20240119", "20240101", "m 7,19"), "20240207");
        }

        #[test]
        fn month_list_restricts_matches() {
            // After Feb 20 the next 15th inside {Jan, Feb} is next January.
            assert_eq!(next("20240220", "20240101", "m 15 1,2"), "20250115");
        }

        #[test]
        fn day_31_skips_short_months() {
            assert_eq!(next("20240131", "20240101", "m 31"), "20240331");
        }

        #[test]
        fn unsatisfiable_rule_errors_instead_of_spinning() {
            // February never has a 30th day.
            let result = next_date(date("20240101"), "20240101", "m 30 2");
            assert!(matches!(result, Err(RuleError::InvalidParameter(_))));
        }
    }

    mod normalize_tests {
        use super::*;

        #[test]
        fn empty_and_today_resolve_to_today() {
            let today = date("20240601");
            assert_eq!(normalize_date("", "", today).unwrap(), today);
            assert_eq!(normalize_date("today", "d 3", today).unwrap(), today);
        }

        #[test]
        fn today_or_future_dates_pass_through() {
            let today = date("20240601");
            assert_eq!(
                normalize_date("20240601", "", today).unwrap().to_string(),
                "20240601"
            );
            assert_eq!(
                normalize_date("20241225", "d 3", today).unwrap().to_string(),
                "20241225"
            );
        }

        #[test]
        fn past_date_without_rule_clamps_to_today() {
            let today = date("20240601");
            assert_eq!(normalize_date("20200101", "", today).unwrap(), today);
        }

        #[test]
        fn past_date_with_rule_advances() {
            let today = date("20240601");
            let result = normalize_date("20240530", "d 3", today).unwrap();
            // 0530 -> 0602: first step already clears the reference.
            assert_eq!(result.to_string(), "20240602");
            assert!(result > today);
        }

        #[test]
        fn invalid_inputs_error() {
            let today = date("20240601");
            assert!(matches!(
                normalize_date("junk", "", today),
                Err(RuleError::InvalidDate(_))
            ));
            assert!(matches!(
                normalize_date("20200101", "x 1", today),
                Err(RuleError::UnknownRule(_))
            ));
        }
    }

    #[test]
    fn calculation_is_idempotent() {
        let first = next("20240126", "20240113", "d 7");
        let second = next("20240126", "20240113", "d 7");
        assert_eq!(first, second);
    }
}
