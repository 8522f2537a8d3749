use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

static LEADING_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+").unwrap());

/// Parses the leading integer of a cell, degrading to 0 for anything that
/// does not start with one. Negative values pass through untouched.
pub fn safe_parse_int(text: Option<&str>) -> i32 {
    let Some(text) = text else {
        return 0;
    };

    let normalized = text.trim().replace('\u{2212}', "-");

    LEADING_INT
        .find(&normalized)
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(0)
}

/// Text of an element with runs of whitespace collapsed to single spaces.
pub fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}
