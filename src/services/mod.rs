pub(crate) mod league_table;
pub(crate) mod validation;
