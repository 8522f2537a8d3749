use crate::config::ScraperConfig;
use crate::domain::StandingsRow;
use crate::error::{LeagueError, Result};
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

pub(crate) mod form;
pub(crate) mod locator;
pub(crate) mod row;
pub(crate) mod team_name;

use row::RowExtractor;

/// Container classes the heuristic scan treats as a table, and the row-ish
/// children it pulls out of them.
const FALLBACK_ROW_SELECTOR: &str =
    "[class*='table'] [class*='row'], [class*='league'] [class*='row']";

pub struct Selectors {
    /// Ranked table selectors, kept with their source text for logging.
    pub tables: Vec<(String, Selector)>,
    pub rows: Selector,
    pub fallback_rows: Selector,
}

impl Selectors {
    pub fn new(table_selectors: &[String]) -> Result<Self> {
        let tables = table_selectors
            .iter()
            .map(|raw| {
                Selector::parse(raw)
                    .map(|selector| (raw.clone(), selector))
                    .map_err(|e| LeagueError::Selector(format!("{raw}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = Selector::parse("tr").map_err(|e| LeagueError::Selector(e.to_string()))?;
        let fallback_rows = Selector::parse(FALLBACK_ROW_SELECTOR)
            .map_err(|e| LeagueError::Selector(e.to_string()))?;

        Ok(Self {
            tables,
            rows,
            fallback_rows,
        })
    }
}

/// Turns league-page HTML into ordered standings rows.
pub struct LeagueTableScraper {
    selectors: Selectors,
    fallback_teams: BTreeMap<u32, String>,
    max_form_len: usize,
}

impl LeagueTableScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            selectors: Selectors::new(&config.table_selectors)?,
            fallback_teams: config.fallback_teams.clone(),
            max_form_len: config.validation.max_form_len,
        })
    }

    /// Parses a whole page. Fails only when no table can be located; rows
    /// that cannot be read are dropped.
    pub fn parse(&self, html: &str, captured_at: DateTime<Utc>) -> Result<Vec<StandingsRow>> {
        let document = Html::parse_document(html);
        let rows = locator::locate(&document, &self.selectors)?;

        let extractor = RowExtractor {
            fallback_teams: &self.fallback_teams,
            max_form_len: self.max_form_len,
            captured_at,
        };

        let mut seen = HashSet::new();
        let mut standings = Vec::new();

        for (index, element) in rows.iter().enumerate() {
            let Some(row) = extractor.extract(element, index) else {
                continue;
            };

            if !seen.insert(row.position) {
                warn!(
                    "Duplicate position {} for {}, keeping first occurrence",
                    row.position, row.team
                );
                continue;
            }
            standings.push(row);
        }

        standings.sort_by_key(|row| row.position);

        debug!(
            "Kept {} of {} candidate rows",
            standings.len(),
            rows.len()
        );
        info!("Parsed {} teams from league table", standings.len());
        Ok(standings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationThresholds;
    use crate::domain::FormResult;
    use crate::services::validation::Validator;

    const FIXTURE: &str = include_str!("../../tests/fixtures/highland_league.html");

    fn scraper() -> LeagueTableScraper {
        LeagueTableScraper::new(&ScraperConfig::default()).unwrap()
    }

    #[test]
    fn fixture_yields_eighteen_sorted_rows() {
        let rows = scraper().parse(FIXTURE, Utc::now()).unwrap();

        assert_eq!(rows.len(), 18);
        let positions: Vec<u32> = rows.iter().map(|r| r.position).collect();
        assert_eq!(positions, (1..=18).collect::<Vec<_>>());
    }

    #[test]
    fn fixture_rows_carry_stats_form_and_logo() {
        let rows = scraper().parse(FIXTURE, Utc::now()).unwrap();

        let leader = &rows[0];
        assert_eq!(leader.team, "Brechin City");
        assert_eq!(leader.played, 30);
        assert_eq!(leader.won, 24);
        assert_eq!(leader.drawn, 3);
        assert_eq!(leader.lost, 3);
        assert_eq!(leader.goal_difference, 64);
        assert_eq!(leader.points, 75);
        assert_eq!(
            leader.form,
            vec![
                FormResult::W,
                FormResult::W,
                FormResult::D,
                FormResult::W,
                FormResult::L
            ]
        );
        assert_eq!(leader.logo, "/images/crests/brechin.png");
    }

    #[test]
    fn fixture_numeric_team_cell_uses_fallback() {
        let rows = scraper().parse(FIXTURE, Utc::now()).unwrap();
        assert_eq!(rows[2].team, "Banks o' Dee");
    }

    #[test]
    fn fixture_blank_played_defaults_to_zero() {
        let rows = scraper().parse(FIXTURE, Utc::now()).unwrap();
        let wick = rows.iter().find(|r| r.team == "Wick Academy").unwrap();
        assert_eq!(wick.played, 0);
        assert!(wick.won + wick.drawn + wick.lost > 0);
    }

    #[test]
    fn page_without_table_is_fatal() {
        let err = scraper()
            .parse("<html><body><p>Maintenance</p></body></html>", Utc::now())
            .unwrap_err();
        assert!(matches!(err, LeagueError::NoTableFound));
    }

    #[test]
    fn duplicate_positions_keep_first_row() {
        let html = r#"<table>
            <tr><th>Pos</th></tr>
            <tr><td>1</td><td>Keith</td><td>1</td><td>1</td><td>0</td><td>0</td><td>2</td><td>0</td><td>2</td><td>3</td></tr>
            <tr><td>1</td><td>Huntly</td><td>1</td><td>0</td><td>0</td><td>1</td><td>0</td><td>2</td><td>-2</td><td>0</td></tr>
        </table>"#;

        let rows = scraper().parse(html, Utc::now()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team, "Keith");
    }

    #[test]
    fn oversized_counts_parse_and_validate_with_warnings() {
        let html = r#"<table>
            <tr><th>Pos</th></tr>
            <tr><td>1</td><td>Keith</td><td>1</td><td>1000000000</td><td>1000000000</td><td>0</td><td>2</td><td>0</td><td>2</td><td>2147483647</td></tr>
        </table>"#;

        let rows = scraper().parse(html, Utc::now()).unwrap();
        assert_eq!(rows[0].won, 1_000_000_000);

        let report = Validator::new(ValidationThresholds::default()).validate(&rows);
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn invalid_selector_is_reported() {
        let config = ScraperConfig {
            table_selectors: vec!["table[".to_string()],
            ..ScraperConfig::default()
        };
        assert!(matches!(
            LeagueTableScraper::new(&config),
            Err(LeagueError::Selector(_))
        ));
    }
}
