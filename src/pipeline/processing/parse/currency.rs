//! Dollar amounts written as free text.
//!
//! Three shapes are recognized, tried in order at the start of the text:
//! `$1.2 million`, `$1.2 billion` and `$1,234,567` (comma or period separated groups).

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;

use super::flatten_text;

static MILLIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\$\s*(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+\.?\d*)\s*milli?on").unwrap()
});

static BILLIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\$\s*(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+\.?\d*)\s*billi?on").unwrap()
});

static GROUPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$\s*(\d{1,3}(?:[,.]\d{3})+)").unwrap());

static SCALE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s[mb]illion").unwrap());

static CITATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]\s*").unwrap());

/// The textual conventions a dollar amount may follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyShape {
    Millions,
    Billions,
    Grouped,
}

/// Priority order; the first shape that matches wins.
const CURRENCY_RULES: [CurrencyShape; 3] = [
    CurrencyShape::Millions,
    CurrencyShape::Billions,
    CurrencyShape::Grouped,
];

impl CurrencyShape {
    fn multiplier(self) -> f64 {
        match self {
            CurrencyShape::Millions => 1e6,
            CurrencyShape::Billions => 1e9,
            CurrencyShape::Grouped => 1.0,
        }
    }

    /// Matches this shape at the start of `text`, returning the matched prefix and its digits.
    fn match_prefix(self, text: &str) -> Option<(&str, &str)> {
        match self {
            CurrencyShape::Millions => scaled_prefix(&MILLIONS, text),
            CurrencyShape::Billions => scaled_prefix(&BILLIONS, text),
            CurrencyShape::Grouped => grouped_prefix(text),
        }
    }

    fn value(self, digits: &str) -> Option<f64> {
        let cleaned: String = match self {
            CurrencyShape::Grouped => digits.chars().filter(|c| c.is_ascii_digit()).collect(),
            _ => digits.chars().filter(|c| *c != ',').collect(),
        };
        cleaned.parse::<f64>().ok().map(|n| n * self.multiplier())
    }
}

fn scaled_prefix<'a>(pattern: &Regex, text: &'a str) -> Option<(&'a str, &'a str)> {
    let caps = pattern.captures(text)?;
    Some((caps.get(0)?.as_str(), caps.get(1)?.as_str()))
}

/// Grouped digits not immediately followed by " million"/" billion".
///
/// When the scale word follows, the last group is given back (as a backtracking matcher
/// would); a single group then cannot match at all.
fn grouped_prefix(text: &str) -> Option<(&str, &str)> {
    let caps = GROUPED.captures(text)?;
    let whole = caps.get(0)?;
    let digits = caps.get(1)?;
    if !SCALE_WORD.is_match(&text[whole.end()..]) {
        return Some((whole.as_str(), digits.as_str()));
    }
    let last_sep = digits.as_str().rfind(|c: char| c == ',' || c == '.')?;
    let shortened = &digits.as_str()[..last_sep];
    if !shortened.contains(|c: char| c == ',' || c == '.') {
        return None;
    }
    let end = digits.start() + last_sep;
    Some((&text[..end], shortened))
}

/// Converts a dollar string into a number; anything else is "not a number" (`None`).
pub fn parse_dollars(value: &Value) -> Option<f64> {
    value.as_str().and_then(parse_dollar_text)
}

/// Same as [`parse_dollars`] for text already in hand. The shape must start the text.
pub fn parse_dollar_text(text: &str) -> Option<f64> {
    CURRENCY_RULES.iter().find_map(|shape| {
        shape
            .match_prefix(text)
            .and_then(|(_, digits)| shape.value(digits))
    })
}

/// Finds the first dollar amount anywhere in `text`, scanning left to right.
pub fn extract_money(text: &str) -> Option<&str> {
    text.match_indices('$').find_map(|(start, _)| {
        let tail = &text[start..];
        CURRENCY_RULES
            .iter()
            .find_map(|shape| shape.match_prefix(tail))
            .map(|(matched, _)| matched)
    })
}

/// Replaces the span from `$` through the last usable dash with `$`, so a range keeps its
/// upper bound. A dash directly followed by a lowercase letter is a hyphenated word, not a range.
pub fn collapse_ranges(text: &str) -> Cow<'_, str> {
    let mut out = String::new();
    let mut rest = text;
    let mut changed = false;

    while let Some(dollar) = rest.find('$') {
        let line_len = rest[dollar..].find('\n').unwrap_or(rest.len() - dollar);
        let line = &rest[dollar..dollar + line_len];
        let cut = line
            .char_indices()
            .filter(|(i, c)| {
                matches!(c, '-' | '—' | '–')
                    && !matches!(line[i + c.len_utf8()..].chars().next(), Some('a'..='z'))
            })
            .last()
            .map(|(i, c)| i + c.len_utf8());

        match cut {
            Some(end) => {
                out.push_str(&rest[..dollar]);
                out.push('$');
                rest = &rest[dollar + end..];
                changed = true;
            }
            None => {
                out.push_str(&rest[..=dollar]);
                rest = &rest[dollar + 1..];
            }
        }
    }

    if !changed {
        return Cow::Borrowed(text);
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Parses a scraped money attribute (budget or box office) end to end.
///
/// Lists are joined, ranges collapsed, citation markers optionally stripped, then the first
/// recognizable amount is extracted and converted.
pub fn parse_money_field(value: &Value, strip_citations: bool) -> Option<f64> {
    let text = flatten_text(value)?;
    let text = collapse_ranges(&text);
    let text = if strip_citations {
        CITATION.replace_all(&text, "").into_owned()
    } else {
        text.into_owned()
    };
    extract_money(&text).and_then(parse_dollar_text)
}
