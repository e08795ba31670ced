//! Release dates and running times written as free text.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use super::flatten_text;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const MONTH_ALTERNATION: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

/// All four date shapes as one alternation, in priority order. The leftmost match wins;
/// priority only decides between shapes starting at the same position.
static RELEASE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        concat!(
            r"(?P<mdy>(?P<mdy_month>{m})\s(?P<mdy_day>\d{{1,2}}),\s(?P<mdy_year>\d{{4}}))",
            r"|(?P<ymd>(?P<ymd_year>\d{{4}}).(?P<ymd_month>[01]\d).(?P<ymd_day>[0-3]\d))",
            r"|(?P<my>(?P<my_month>{m})\s(?P<my_year>\d{{4}}))",
            r"|(?P<y>\d{{4}})",
        ),
        m = MONTH_ALTERNATION
    ))
    .unwrap()
});

static RUNTIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*ho?u?r?s?\s*(\d*)|(\d+)\s*m").unwrap());

/// Textual release-date conventions, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateShape {
    /// `January 1, 2000`
    MonthDayYear,
    /// `2000-01-01`, any single separator
    NumericYmd,
    /// `January 2000`
    MonthYear,
    /// `2000`
    YearOnly,
}

const DATE_RULES: [DateShape; 4] = [
    DateShape::MonthDayYear,
    DateShape::NumericYmd,
    DateShape::MonthYear,
    DateShape::YearOnly,
];

impl DateShape {
    /// Name of the outer capture group this shape matches in [`RELEASE_DATE`].
    fn group(self) -> &'static str {
        match self {
            DateShape::MonthDayYear => "mdy",
            DateShape::NumericYmd => "ymd",
            DateShape::MonthYear => "my",
            DateShape::YearOnly => "y",
        }
    }

    /// Builds the calendar date from this shape's captures; day-less shapes use the 1st,
    /// year-only uses January 1st.
    fn to_date(self, caps: &Captures<'_>) -> Option<NaiveDate> {
        let num = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());
        let year = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<i32>().ok());
        let month = |name: &str| caps.name(name).and_then(|m| month_number(m.as_str()));

        match self {
            DateShape::MonthDayYear => {
                NaiveDate::from_ymd_opt(year("mdy_year")?, month("mdy_month")?, num("mdy_day")?)
            }
            DateShape::NumericYmd => {
                NaiveDate::from_ymd_opt(year("ymd_year")?, num("ymd_month")?, num("ymd_day")?)
            }
            DateShape::MonthYear => NaiveDate::from_ymd_opt(year("my_year")?, month("my_month")?, 1),
            DateShape::YearOnly => NaiveDate::from_ymd_opt(year("y")?, 1, 1),
        }
    }
}

fn month_number(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|m| *m == name)
        .map(|idx| idx as u32 + 1)
}

/// Finds the leftmost date in `text` and the shape it was written in.
///
/// A matched substring that is not a real calendar day (e.g. `2001-02-30`) is missing;
/// no later match is consulted.
pub fn match_release_date(text: &str) -> Option<(DateShape, Option<NaiveDate>)> {
    let caps = RELEASE_DATE.captures(text)?;
    let shape = DATE_RULES
        .iter()
        .copied()
        .find(|shape| caps.name(shape.group()).is_some())?;
    Some((shape, shape.to_date(&caps)))
}

/// Parses a scraped release date; lists are joined first.
pub fn parse_release_date(value: &Value) -> Option<NaiveDate> {
    let text = flatten_text(value)?;
    match_release_date(&text).and_then(|(_, date)| date)
}

/// Parses a scraped running time into minutes.
///
/// Either `H hour(s) M` or `M min...` is accepted. When no plain-minutes figure was captured the
/// result is `hours * 60 + minutes`, with an empty minutes capture counting as zero.
pub fn parse_running_time(value: &Value) -> Option<f64> {
    let text = flatten_text(value)?;
    let caps = RUNTIME.captures(&text)?;
    let number = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };

    let plain_minutes = number(3);
    if plain_minutes == 0.0 {
        Some(number(1) * 60.0 + number(2))
    } else {
        Some(plain_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_full_month_form_wins_over_bare_year() {
        let (shape, parsed) = match_release_date("January 1, 2000").unwrap();
        assert_eq!(shape, DateShape::MonthDayYear);
        assert_eq!(parsed, Some(date(2000, 1, 1)));
    }

    #[test]
    fn test_each_shape() {
        assert_eq!(
            parse_release_date(&json!("July 16, 1999 (United States)")),
            Some(date(1999, 7, 16))
        );
        assert_eq!(parse_release_date(&json!("1987-06-05")), Some(date(1987, 6, 5)));
        assert_eq!(parse_release_date(&json!("1987/11/23")), Some(date(1987, 11, 23)));
        assert_eq!(parse_release_date(&json!("March 1975")), Some(date(1975, 3, 1)));
        assert_eq!(parse_release_date(&json!("Released in 1968")), Some(date(1968, 1, 1)));
    }

    #[test]
    fn test_leftmost_date_wins() {
        assert_eq!(
            parse_release_date(&json!("1998 (festival), December 25, 1999")),
            Some(date(1998, 1, 1))
        );
        assert_eq!(
            parse_release_date(&json!(["1998 (Sundance)", "March 5, 1999 (United States)"])),
            Some(date(1998, 1, 1))
        );
    }

    #[test]
    fn test_priority_breaks_ties_at_same_position() {
        let (shape, _) = match_release_date("March 1999, 5").unwrap();
        assert_eq!(shape, DateShape::MonthYear);
        let (shape, parsed) = match_release_date("1999-03-05 premiere").unwrap();
        assert_eq!(shape, DateShape::NumericYmd);
        assert_eq!(parsed, Some(date(1999, 3, 5)));
    }

    #[test]
    fn test_lists_are_joined() {
        assert_eq!(
            parse_release_date(&json!(["May 19, 1999", "(Cannes)", "June 4, 1999"])),
            Some(date(1999, 5, 19))
        );
    }

    #[test]
    fn test_unmatched_or_impossible_dates_are_missing() {
        assert_eq!(parse_release_date(&json!("TBA")), None);
        assert_eq!(parse_release_date(&json!("February 30, 2001")), None);
        assert_eq!(parse_release_date(&json!(1999)), None);
    }

    #[test]
    fn test_running_time_hours_and_minutes() {
        assert_eq!(parse_running_time(&json!("1h 30")), Some(90.0));
        assert_eq!(parse_running_time(&json!("2 hours 15 minutes")), Some(135.0));
        assert_eq!(parse_running_time(&json!("1 hour")), Some(60.0));
    }

    #[test]
    fn test_running_time_minutes_only() {
        assert_eq!(parse_running_time(&json!("45 min")), Some(45.0));
        assert_eq!(parse_running_time(&json!(["102 minutes", "(director's cut)"])), Some(102.0));
    }

    #[test]
    fn test_running_time_unparseable() {
        assert_eq!(parse_running_time(&json!("unknown")), None);
        assert_eq!(parse_running_time(&json!("")), None);
        assert_eq!(parse_running_time(&Value::Null), None);
    }
}
