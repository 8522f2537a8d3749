use super::{form, team_name};
use crate::domain::StandingsRow;
use crate::utils::{element_text, safe_parse_int};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use std::collections::BTreeMap;
use tracing::debug;

pub const MIN_CELLS: usize = 10;

const TEAM_CELL: usize = 1;
const FORM_CELL: usize = 10;

static LOGO: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Column layout: pos, team, P, W, D, L, GF, GA, GD, Pts, [form].
pub struct RowExtractor<'a> {
    pub fallback_teams: &'a BTreeMap<u32, String>,
    pub max_form_len: usize,
    pub captured_at: DateTime<Utc>,
}

impl RowExtractor<'_> {
    /// Returns `None` for rows that cannot be a team line: the header at
    /// index 0, short decorative rows, a missing position or team name.
    pub fn extract(&self, row: &ElementRef, index: usize) -> Option<StandingsRow> {
        if index == 0 {
            return None;
        }

        let cells: Vec<ElementRef> = row.children().filter_map(ElementRef::wrap).collect();
        if cells.len() < MIN_CELLS {
            debug!("Row {} skipped: only {} cells", index, cells.len());
            return None;
        }

        let stat = |i: usize| safe_parse_int(Some(element_text(&cells[i]).as_str()));

        let position = stat(0);
        if position <= 0 {
            debug!("Row {} skipped: no usable position", index);
            return None;
        }
        let position = position as u32;

        let team_cell = &cells[TEAM_CELL];
        let Some(team) = team_name::resolve(team_cell, position, self.fallback_teams) else {
            debug!("Row {} skipped: no team name for position {}", index, position);
            return None;
        };

        let logo = team_cell
            .select(&LOGO)
            .find_map(|img| img.value().attr("src"))
            .unwrap_or_default()
            .to_string();

        let form = cells
            .get(FORM_CELL)
            .map(|cell| form::extract(cell, self.max_form_len))
            .unwrap_or_default();

        Some(StandingsRow {
            position,
            team,
            played: stat(2),
            won: stat(3),
            drawn: stat(4),
            lost: stat(5),
            goals_for: stat(6),
            goals_against: stat(7),
            goal_difference: stat(8),
            points: stat(9),
            form,
            logo,
            captured_at: self.captured_at,
        })
    }
}
