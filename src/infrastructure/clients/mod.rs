pub(crate) mod league_page;
