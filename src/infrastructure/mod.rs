mod clients;
mod storage;

pub use clients::league_page::{HtmlFetcher, PageFetcher};
pub use storage::fs_store::FileSystemStore;
