use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::gag::error::{GagError, GagResult};
use crate::gag::io::AppConfig;
use crate::gag::io::directory::DirectoryManager;
use crate::gag::models::{PostRecord, ProgressEvent, RunStatus, Statistics};
use crate::gag::resolver::{Fetcher, HttpFetcher, Resolver};

/// Shared flag that asks a running download loop to stop at the next record.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs the resolver over a list of posts, one at a time.
#[derive(Debug, Clone)]
pub struct Orchestrator<F> {
    resolver: Resolver<F>,
}

impl Orchestrator<HttpFetcher> {
    /// Builds an orchestrator backed by the HTTP client described in `config`.
    pub fn from_config(config: &AppConfig) -> GagResult<Self> {
        let fetcher = HttpFetcher::new(&config.http)?;
        Ok(Self::new(Resolver::from_config(fetcher, config)?))
    }
}

impl<F: Fetcher> Orchestrator<F> {
    pub fn new(resolver: Resolver<F>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Resolver<F> {
        &self.resolver
    }

    /// Downloads `records` in order into `destination_root`.
    ///
    /// Per-post failures are counted, never returned. The run only errors when
    /// there is nothing to do or the destination folders cannot be created.
    pub fn run<P>(
        &self,
        records: &[PostRecord],
        destination_root: &Path,
        mut on_progress: P,
        cancel: &CancelToken,
    ) -> GagResult<Statistics>
    where
        P: FnMut(&ProgressEvent<'_>),
    {
        if records.is_empty() {
            return Err(GagError::EmptySelection);
        }

        let directories = DirectoryManager::new(destination_root);
        directories.create_directory_structure()?;

        let total = records.len();
        let mut stats = Statistics::new(total);
        info!("Downloading {} gags to {}", total, directories.gags_dir().display());

        for (index, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("Download cancelled after {} of {} gags", index, total);
                stats.status = RunStatus::Cancelled;
                break;
            }

            trace!("[{}/{}] {} ({})", index + 1, total, record.title(), record.id());
            let outcome = self.resolver.resolve(record, &directories);
            stats.record(&outcome);

            on_progress(&ProgressEvent {
                index,
                total,
                title: record.title(),
                outcome: &outcome,
            });
        }

        if stats.failed > 0 {
            warn!(
                "{} of {} processed gags could not be downloaded",
                stats.failed, stats.processed
            );
        }
        info!("{}", stats.summary());
        debug!(
            "{} videos and {} images stored or already present",
            stats.by_kind.video, stats.by_kind.image
        );

        Ok(stats)
    }
}
