use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormResult {
    W,
    D,
    L,
}

impl FormResult {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'W' => Some(FormResult::W),
            'D' => Some(FormResult::D),
            'L' => Some(FormResult::L),
            _ => None,
        }
    }
}

/// One team's line in the league table at the time of a scrape.
///
/// Counts are signed on purpose: the page is the source of truth and odd
/// values are flagged by validation rather than rejected during parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsRow {
    pub position: u32,
    pub team: String,
    pub played: i32,
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub points: i32,
    #[serde(default)]
    pub form: Vec<FormResult>,
    #[serde(default)]
    pub logo: String,
    pub captured_at: DateTime<Utc>,
}

impl StandingsRow {
    // Widened so page values near i32::MAX cannot overflow.
    pub fn expected_points(&self) -> i64 {
        i64::from(self.won) * 3 + i64::from(self.drawn)
    }

    pub fn results_total(&self) -> i64 {
        i64::from(self.won) + i64::from(self.drawn) + i64::from(self.lost)
    }
}
