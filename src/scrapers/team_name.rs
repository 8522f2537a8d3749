use crate::utils::{collapse_whitespace, element_text};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// One way of pulling a candidate team name out of the team cell.
pub type NameStrategy = fn(&ElementRef) -> Option<String>;

/// Tried in order; the first candidate that survives cleaning wins.
pub const STRATEGIES: [(&str, NameStrategy); 4] = [
    ("team-class", by_team_class),
    ("anchor", by_anchor),
    ("team-span", by_team_span),
    ("cell-text", by_cell_text),
];

static TEAM_CLASS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        ".team-name, .team_name, .teamname, .club-name, .team-name-full, [itemprop='name']",
    )
    .unwrap()
});
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static TEAM_SPAN: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("span[data-team-name], span[data-team], span[class*='team']").unwrap()
});

/// Cells can hold several matches (a rank link next to the club link),
/// so each strategy skips past candidates that would not survive cleaning.
fn first_usable(mut candidates: impl Iterator<Item = String>) -> Option<String> {
    candidates.find(|t| is_usable(&clean_team_name(t)))
}

pub fn by_team_class(cell: &ElementRef) -> Option<String> {
    first_usable(cell.select(&TEAM_CLASS).map(|el| element_text(&el)))
}

pub fn by_anchor(cell: &ElementRef) -> Option<String> {
    first_usable(cell.select(&ANCHOR).map(|el| element_text(&el)))
}

pub fn by_team_span(cell: &ElementRef) -> Option<String> {
    first_usable(cell.select(&TEAM_SPAN).map(|el| {
        el.value()
            .attr("data-team-name")
            .or_else(|| el.value().attr("data-team"))
            .map(collapse_whitespace)
            .unwrap_or_else(|| element_text(&el))
    }))
}

pub fn by_cell_text(cell: &ElementRef) -> Option<String> {
    let text = element_text(cell);
    let name = text.split('|').next().unwrap_or_default().trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Strips the boilerplate the source wraps names in: a leading "team "
/// token and a trailing " FC".
pub fn clean_team_name(raw: &str) -> String {
    let mut name = collapse_whitespace(raw);

    if name.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("team ")) {
        name.replace_range(..5, "");
    }
    let cut = name.len().saturating_sub(3);
    if name.get(cut..).is_some_and(|s| s.eq_ignore_ascii_case(" fc")) {
        name.truncate(cut);
    }

    name.trim().to_string()
}

fn is_numeric(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',' || c.is_whitespace())
}

/// A name is usable when it is longer than two characters and not just a number.
pub fn is_usable(name: &str) -> bool {
    name.chars().count() > 2 && !is_numeric(name)
}

pub fn resolve(
    cell: &ElementRef,
    position: u32,
    fallback_teams: &BTreeMap<u32, String>,
) -> Option<String> {
    for (label, strategy) in STRATEGIES {
        let Some(candidate) = strategy(cell) else {
            continue;
        };

        let name = clean_team_name(&candidate);
        if is_usable(&name) {
            trace!("Team name '{}' resolved by {}", name, label);
            return Some(name);
        }
    }

    let name = fallback_teams.get(&position).map(|n| clean_team_name(n))?;
    debug!(
        "Team name for position {} taken from fallback table: {}",
        position, name
    );
    is_usable(&name).then_some(name)
}
