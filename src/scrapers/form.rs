use crate::domain::FormResult;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;

static FORM_ICON: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("i, span, abbr, li, div, a, [class*='form'], [class*='result'], [class*='icon']")
        .unwrap()
});

fn from_class(class: &str) -> Option<FormResult> {
    let class = class.to_ascii_lowercase();
    if class.contains("draw") {
        Some(FormResult::D)
    } else if class.contains("loss") || class.contains("defeat") || class.contains("lose") {
        Some(FormResult::L)
    } else if class.contains("win") || class.contains("won") {
        Some(FormResult::W)
    } else {
        None
    }
}

fn from_text(element: &ElementRef) -> Option<FormResult> {
    let text = element.text().collect::<String>();
    let mut chars = text.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => FormResult::from_char(c),
        _ => None,
    }
}

/// Reads the recent-results column, in markup order, capped at `max_len`.
///
/// Icon elements are read first (class name, then a single W/D/L character).
/// Only when no icon yields a result is the cell's raw text read character
/// by character. Never fails; an unreadable cell gives an empty form.
pub fn extract(cell: &ElementRef, max_len: usize) -> Vec<FormResult> {
    let mut matched_ids = HashSet::new();
    let mut form = Vec::new();

    for element in cell.select(&FORM_ICON) {
        if element.ancestors().any(|a| matched_ids.contains(&a.id())) {
            continue;
        }

        let result = element
            .value()
            .attr("class")
            .and_then(from_class)
            .or_else(|| from_text(&element));

        if let Some(result) = result {
            matched_ids.insert(element.id());
            form.push(result);
        }
    }

    if form.is_empty() {
        form = cell
            .text()
            .flat_map(str::chars)
            .filter_map(FormResult::from_char)
            .collect();
    }

    form.truncate(max_len);
    form
}
