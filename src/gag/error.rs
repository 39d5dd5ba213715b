use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::gag::io::ConfigError;

/// Errors that stop a parse or a download run.
///
/// Anything that goes wrong for a single post (bad status, rejected body, timeout)
/// is absorbed by the resolver and reported as a failed outcome instead.
#[derive(Error, Debug)]
pub enum GagError {
    #[error("9GAG data file not found: {}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No upvoted or saved gags found")]
    EmptySelection,

    #[error("Unable to prepare destination folder {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
}

/// Result type for engine operations
pub type GagResult<T> = Result<T, GagError>;
