//! Turns a [PostRecord] into a file on disk.
//!
//! Videos are tried before images. Within a kind the catalog variants are tried in
//! order and the first response that passes validation is written verbatim. A
//! post whose file already exists for its stem is reported as cached without any
//! network traffic.

use std::fmt;
use std::io;
use std::path::Path;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

use crate::gag::catalog::Catalog;
use crate::gag::error::GagResult;
use crate::gag::io::directory::DirectoryManager;
use crate::gag::io::{AppConfig, ConfigResult, Http, Validation};
use crate::gag::models::{DownloadOutcome, MediaKind, PostRecord};
use crate::gag::sanitize::CacheKey;

/// Transport-level failure of a single request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if e.is_connect() {
            FetchError::Connection(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

/// What the resolver needs to know about a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// Empty unless the status is 200.
    pub body: Vec<u8>,
}

impl MediaResponse {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }

    /// Whether the `Content-Type` header announces video content.
    pub fn is_video(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|value| value.trim().to_ascii_lowercase().starts_with("video/"))
    }
}

/// Performs a single GET for the resolver.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<MediaResponse, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, url: &str) -> Result<MediaResponse, FetchError> {
        (**self).fetch(url)
    }
}

/// [Fetcher] backed by a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds the client with the configured user agent and timeout.
    pub fn new(http: &Http) -> GagResult<Self> {
        let client = Client::builder()
            .user_agent(&http.user_agent)
            .timeout(http.timeout())
            .build()?;

        debug!("Initialized HTTP client with a {}s timeout", http.timeout().as_secs());
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<MediaResponse, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if status != StatusCode::OK {
            return Ok(MediaResponse {
                status: status.as_u16(),
                content_type,
                body: Vec::new(),
            });
        }

        let body = response.bytes()?.to_vec();
        Ok(MediaResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Why a single variant did not produce a file.
#[derive(Debug)]
enum Miss {
    Status(u16),
    Rejected {
        content_type: Option<String>,
        len: usize,
    },
    Transport(FetchError),
    Write(io::Error),
}

impl fmt::Display for Miss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Miss::Status(status) => write!(f, "HTTP status {}", status),
            Miss::Rejected { content_type, len } => write!(
                f,
                "rejected {} byte body with content type {}",
                len,
                content_type.as_deref().unwrap_or("<none>")
            ),
            Miss::Transport(e) => write!(f, "{}", e),
            Miss::Write(e) => write!(f, "unable to write file: {}", e),
        }
    }
}

/// Resolves posts to media files through a [Fetcher].
#[derive(Debug, Clone)]
pub struct Resolver<F> {
    fetcher: F,
    catalog: Catalog,
    min_video_bytes: usize,
    cache_key: CacheKey,
}

impl<F: Fetcher> Resolver<F> {
    /// Creates a resolver with the default size threshold and cache key.
    pub fn new(fetcher: F, catalog: Catalog) -> Self {
        Self {
            fetcher,
            catalog,
            min_video_bytes: Validation::default().min_video_bytes,
            cache_key: CacheKey::default(),
        }
    }

    /// Creates a resolver from the `[catalog]`, `[validation]` and `[cache]` sections.
    pub fn from_config(fetcher: F, config: &AppConfig) -> ConfigResult<Self> {
        Ok(Self::new(fetcher, config.catalog()?)
            .with_min_video_bytes(config.validation.min_video_bytes)
            .with_cache_key(config.cache.key))
    }

    pub fn with_min_video_bytes(mut self, min_video_bytes: usize) -> Self {
        self.min_video_bytes = min_video_bytes;
        self
    }

    pub fn with_cache_key(mut self, cache_key: CacheKey) -> Self {
        self.cache_key = cache_key;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cache_key(&self) -> CacheKey {
        self.cache_key
    }

    /// Downloads `record` into the tree managed by `directories`.
    ///
    /// Never fails: every problem along the way becomes a miss for one variant, and
    /// a post with no remaining variants comes back as a failed outcome.
    pub fn resolve(&self, record: &PostRecord, directories: &DirectoryManager) -> DownloadOutcome {
        let stem = self.cache_key.stem(record);

        for kind in MediaKind::RESOLUTION_ORDER {
            if let Some(outcome) = self.resolve_kind(record, &stem, kind, directories) {
                return outcome;
            }
        }

        error!("Failed to download gag: {}", record.post_url());
        DownloadOutcome::failed(record.clone())
    }

    fn resolve_kind(
        &self,
        record: &PostRecord,
        stem: &str,
        kind: MediaKind,
        directories: &DirectoryManager,
    ) -> Option<DownloadOutcome> {
        let extensions = self.catalog.extensions(kind);
        if let Some(path) = directories.find_existing(kind, stem, &extensions) {
            info!("{} already downloaded: {}", kind, display_name(&path));
            return Some(DownloadOutcome::cached(record.clone(), kind, path));
        }

        for variant in self.catalog.variants(kind) {
            let url = self.catalog.url_for(record.id(), variant);
            let stored = self.attempt(&url, kind).and_then(|body| {
                directories
                    .store(kind, stem, &variant.extension, &body)
                    .map_err(Miss::Write)
            });

            match stored {
                Ok(path) => {
                    info!("{} downloaded as {}", kind, display_name(&path));
                    return Some(DownloadOutcome::downloaded(record.clone(), kind, path));
                }
                Err(miss @ Miss::Write(_)) => warn!("{} {}: {}", kind, url, miss),
                Err(miss) => debug!("{} {}: {}", kind, url, miss),
            }
        }

        None
    }

    /// Fetches one URL and checks that the response is usable for `kind`.
    fn attempt(&self, url: &str, kind: MediaKind) -> Result<Vec<u8>, Miss> {
        trace!("GET {}", url);
        let response = self.fetcher.fetch(url).map_err(Miss::Transport)?;

        if !response.is_ok() {
            return Err(Miss::Status(response.status));
        }

        // Error pages come back as 200 with a small HTML body.
        if kind == MediaKind::Video
            && !response.is_video()
            && response.body.len() < self.min_video_bytes
        {
            return Err(Miss::Rejected {
                content_type: response.content_type,
                len: response.body.len(),
            });
        }

        Ok(response.body)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
