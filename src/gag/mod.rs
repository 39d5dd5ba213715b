use std::path::Path;

pub mod catalog;
pub mod error;
pub mod io;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod resolver;
pub mod sanitize;
pub mod tui;

pub use catalog::{Catalog, MediaVariant};
pub use error::{GagError, GagResult};
pub use io::directory::DirectoryManager;
pub use io::{AppConfig, ConfigError, ConfigManager};
pub use models::{
    DownloadOutcome, DownloadStatus, KindCounts, MediaKind, PostRecord, ProgressEvent,
    RunStatus, SourceCategory, Statistics,
};
pub use orchestrator::{CancelToken, Orchestrator};
pub use parser::{parse_document, parse_export, CategorySelection};
pub use resolver::{FetchError, Fetcher, HttpFetcher, MediaResponse, Resolver};
pub use sanitize::{sanitize, CacheKey};

/// Downloads every record into `destination_root` using the default configuration.
///
/// This is the entry point a front end calls after [parse_export]. `on_progress` is
/// invoked once per processed record, and `cancel` is checked between records.
///
/// The run always uses [AppConfig::default]. Build an [Orchestrator] with
/// [Orchestrator::from_config] or [Orchestrator::new] to change the catalog,
/// timeout or cache key.
///
/// # Arguments
///
/// * `records`: The posts to download, in the order they should be processed.
/// * `destination_root`: Folder that receives the `gags/` tree.
/// * `on_progress`: Callback receiving a [ProgressEvent] after every record.
/// * `cancel`: Token the caller can trip to stop the run at the next record.
///
/// returns: Result<Statistics, GagError>
pub fn run_downloads<P>(
    records: &[PostRecord],
    destination_root: &Path,
    on_progress: P,
    cancel: &CancelToken,
) -> GagResult<Statistics>
where
    P: FnMut(&ProgressEvent<'_>),
{
    let orchestrator = Orchestrator::from_config(&AppConfig::default())?;
    orchestrator.run(records, destination_root, on_progress, cancel)
}
