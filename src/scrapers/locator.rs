use super::Selectors;
use crate::error::{LeagueError, Result};
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use tracing::{info, warn};

/// Finds the rows of the standings table, header row included.
///
/// Ranked selectors are tried first; the first one that matches a table with
/// at least one `tr` wins. When the markup has drifted away from every known
/// selector, a looser scan over "table"/"league" containers picks up row-like
/// elements instead.
pub fn locate<'a>(document: &'a Html, selectors: &Selectors) -> Result<Vec<ElementRef<'a>>> {
    for (raw, selector) in &selectors.tables {
        for table in document.select(selector) {
            let rows: Vec<_> = table.select(&selectors.rows).collect();
            if !rows.is_empty() {
                info!("League table located with selector '{}'", raw);
                return Ok(rows);
            }
        }
    }

    warn!("No known table selector matched, falling back to class heuristics");

    let rows = outermost(document.select(&selectors.fallback_rows));
    if rows.is_empty() {
        return Err(LeagueError::NoTableFound);
    }

    info!("League table located by class heuristics ({} rows)", rows.len());
    Ok(rows)
}

/// Drops matches nested inside an earlier match, so a row's own children
/// are not mistaken for rows.
fn outermost<'a>(matches: impl Iterator<Item = ElementRef<'a>>) -> Vec<ElementRef<'a>> {
    let mut kept_ids = HashSet::new();
    let mut kept = Vec::new();

    for element in matches {
        if element.ancestors().any(|a| kept_ids.contains(&a.id())) {
            continue;
        }
        kept_ids.insert(element.id());
        kept.push(element);
    }

    kept
}
