//! URL scheme of the 9GAG media CDN.
//!
//! The host renames and retires suffixes from time to time, so the table lives here
//! as plain data (and can be overridden from `config.toml`) instead of being spread
//! through the resolver.

use serde::{Deserialize, Serialize};

use crate::gag::io::{ConfigError, ConfigResult};
use crate::gag::models::MediaKind;

/// Base URL every media request starts with.
pub const DEFAULT_BASE_URL: &str = "https://9gag.com/photo/";

/// Built-in variants, best first within each kind.
const DEFAULT_VARIANTS: &[(MediaKind, &str, &str)] = &[
    (MediaKind::Video, "_460svav1.mp4", "mp4"),
    (MediaKind::Video, "_460sv.mp4", "mp4"),
    (MediaKind::Video, "_460svh265.mp4", "mp4"),
    (MediaKind::Image, "_700b.jpg", "jpg"),
    (MediaKind::Image, "_460s.jpg", "jpg"),
];

/// One URL suffix the resolver may try for a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaVariant {
    pub kind: MediaKind,
    pub suffix: String,
    pub extension: String,
}

impl MediaVariant {
    pub fn new(kind: MediaKind, suffix: &str, extension: &str) -> Self {
        MediaVariant {
            kind,
            suffix: suffix.to_string(),
            extension: extension.to_string(),
        }
    }
}

/// Ordered table of media variants together with the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    base_url: String,
    variants: Vec<MediaVariant>,
}

impl Catalog {
    /// Creates a catalog after checking that every entry is usable.
    ///
    /// # Arguments
    ///
    /// * `base_url`: Prefix prepended to `{id}{suffix}`.
    /// * `variants`: Variants in the order they are tried.
    ///
    /// returns: Result<Catalog, ConfigError>
    pub fn new(base_url: impl Into<String>, variants: Vec<MediaVariant>) -> ConfigResult<Self> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(ConfigError::InvalidCatalog("base URL is empty".to_string()));
        }
        if variants.is_empty() {
            return Err(ConfigError::InvalidCatalog("no media variants configured".to_string()));
        }
        if let Some(bad) = variants
            .iter()
            .find(|v| v.suffix.is_empty() || v.extension.is_empty())
        {
            return Err(ConfigError::InvalidCatalog(format!(
                "{} variant has an empty suffix or extension",
                bad.kind
            )));
        }

        Ok(Catalog { base_url, variants })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All variants in priority order.
    pub fn all(&self) -> &[MediaVariant] {
        &self.variants
    }

    /// Variants of a single kind in priority order.
    pub fn variants(&self, kind: MediaKind) -> impl Iterator<Item = &MediaVariant> {
        self.variants.iter().filter(move |v| v.kind == kind)
    }

    /// Distinct file extensions used by `kind`, in first-seen order.
    pub fn extensions(&self, kind: MediaKind) -> Vec<&str> {
        let mut extensions: Vec<&str> = Vec::new();
        for variant in self.variants(kind) {
            if !extensions.contains(&variant.extension.as_str()) {
                extensions.push(&variant.extension);
            }
        }
        extensions
    }

    /// Full URL of `variant` for the post `id`.
    pub fn url_for(&self, id: &str, variant: &MediaVariant) -> String {
        format!("{}{}{}", self.base_url, id, variant.suffix)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog {
            base_url: DEFAULT_BASE_URL.to_string(),
            variants: default_variants(),
        }
    }
}

/// The built-in variant table as owned values.
pub fn default_variants() -> Vec<MediaVariant> {
    DEFAULT_VARIANTS
        .iter()
        .map(|(kind, suffix, extension)| MediaVariant::new(*kind, suffix, extension))
        .collect()
}
