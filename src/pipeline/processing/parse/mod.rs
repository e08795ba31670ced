// Free-text field parsers for the scraped source

pub mod currency;
pub mod dates;

pub use currency::{extract_money, parse_dollars, parse_money_field, CurrencyShape};
pub use dates::{parse_release_date, parse_running_time, DateShape};

use serde_json::Value;

use crate::constants::{BOX_OFFICE_KEY, BUDGET_KEY, IMDB_ID_KEY, RELEASE_DATE_KEY, RUNNING_TIME_KEY};
use crate::domain::{CanonicalMovieRecord, ScrapedMovie};

/// Flattens a scraped value into one string; lists are joined with single spaces.
///
/// Anything that is neither a string nor a list yields `None`.
pub fn flatten_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| item.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        _ => None,
    }
}

/// Parses the free-text money, date and runtime attributes of a deduplicated record.
///
/// The parsed source attributes are removed from the remaining attributes. Returns `None`
/// for a record without a stamped `imdb_id`; the second element lists attributes that were
/// present but matched no accepted shape.
pub fn parse_scraped_movie(record: CanonicalMovieRecord) -> Option<(ScrapedMovie, Vec<&'static str>)> {
    let mut attributes = record.into_map();
    let imdb_id = match attributes.remove(IMDB_ID_KEY) {
        Some(Value::String(id)) => id,
        _ => return None,
    };

    let mut unparsed = Vec::new();
    let mut take = |key: &'static str, parse: &dyn Fn(&Value) -> Option<f64>| -> Option<f64> {
        let value = attributes.remove(key)?;
        let parsed = parse(&value);
        if parsed.is_none() && !value.is_null() {
            unparsed.push(key);
        }
        parsed
    };
    let box_office = take(BOX_OFFICE_KEY, &|v| parse_money_field(v, false));
    let budget = take(BUDGET_KEY, &|v| parse_money_field(v, true));
    let running_time = take(RUNNING_TIME_KEY, &parse_running_time);

    let release_date = match attributes.remove(RELEASE_DATE_KEY) {
        Some(value) => {
            let parsed = parse_release_date(&value);
            if parsed.is_none() && !value.is_null() {
                unparsed.push(RELEASE_DATE_KEY);
            }
            parsed
        }
        None => None,
    };

    Some((
        ScrapedMovie {
            imdb_id,
            release_date,
            running_time,
            budget,
            box_office,
            attributes,
        },
        unparsed,
    ))
}
