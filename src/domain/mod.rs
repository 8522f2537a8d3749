mod standings;
pub(crate) mod storage;

pub use standings::{FormResult, StandingsRow};
