use crate::config::ValidationThresholds;
use crate::domain::StandingsRow;
use crate::scrapers::team_name::is_usable;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    PointsMismatch,
    NegativeCount,
    PlayedMismatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    pub position: u32,
    pub team: String,
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Why the whole scrape was rejected, when it was.
    pub rejection: Option<String>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    fn rejected(reason: String) -> Self {
        warn!("Scrape rejected: {}", reason);
        Self {
            is_valid: false,
            rejection: Some(reason),
            warnings: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn warnings_for(&self, position: u32) -> impl Iterator<Item = &ValidationWarning> {
        self.warnings.iter().filter(move |w| w.position == position)
    }
}

/// Sanity checks on an assembled table.
///
/// Only an empty table or an unusable team name rejects the scrape; the
/// arithmetic checks just log and collect warnings.
pub struct Validator {
    thresholds: ValidationThresholds,
}

impl Validator {
    pub fn new(thresholds: ValidationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn validate(&self, rows: &[StandingsRow]) -> ValidationReport {
        if rows.is_empty() {
            return ValidationReport::rejected("no rows extracted".to_string());
        }

        if let Some(bad) = rows.iter().find(|r| !is_usable(r.team.trim())) {
            return ValidationReport::rejected(format!(
                "invalid team name '{}' at position {}",
                bad.team, bad.position
            ));
        }

        let mut warnings = Vec::new();
        for row in rows {
            self.check_row(row, &mut warnings);
        }

        for warning in &warnings {
            warn!("Validation: {}", warning.message);
        }

        ValidationReport {
            is_valid: true,
            rejection: None,
            warnings,
        }
    }

    fn check_row(&self, row: &StandingsRow, warnings: &mut Vec<ValidationWarning>) {
        let mut push = |kind, message: String| {
            warnings.push(ValidationWarning {
                position: row.position,
                team: row.team.clone(),
                kind,
                message,
            })
        };

        let expected = row.expected_points();
        let tolerance = u64::from(self.thresholds.points_tolerance.unsigned_abs());
        if i64::from(row.points).abs_diff(expected) > tolerance {
            push(
                WarningKind::PointsMismatch,
                format!(
                    "{} has {} points, expected about {} from W{} D{}",
                    row.team, row.points, expected, row.won, row.drawn
                ),
            );
        }

        let counts = [
            ("played", row.played),
            ("won", row.won),
            ("drawn", row.drawn),
            ("lost", row.lost),
        ];
        for (label, value) in counts {
            if value < 0 {
                push(
                    WarningKind::NegativeCount,
                    format!("{} has negative {} ({})", row.team, label, value),
                );
            }
        }

        if i64::from(row.played) != row.results_total() {
            push(
                WarningKind::PlayedMismatch,
                format!(
                    "{} played {} but W+D+L = {}",
                    row.team,
                    row.played,
                    row.results_total()
                ),
            );
        }
    }
}
