/*
 * Copyright (c) 2022 McSib
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */


use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::gag::models::{DownloadOutcome, DownloadStatus, ProgressEvent};

/// Template of the main download bar.
pub const DOWNLOAD_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {prefix}: {msg}";

/// Filled, current and empty bar symbols.
const PROGRESS_CHARS: &str = "#>-";

/// Template used when [DOWNLOAD_TEMPLATE] is rejected.
const FALLBACK_TEMPLATE: &str = "{spinner} [{elapsed_precise}] {bar} {pos}/{len}";

/// Longest title shown in the bar prefix before it is cut.
const PREFIX_CHARS: usize = 13;

/// A builder that helps in making a new [ProgressStyle] for use.
pub struct ProgressStyleBuilder {
    /// The [ProgressStyle] being built.
    progress_style: ProgressStyle,
}

impl ProgressStyleBuilder {
    /// Sets the template of the progress style.
    ///
    /// A template indicatif cannot parse is replaced by a plain bar and logged.
    ///
    /// # Arguments
    ///
    /// * `msg_template`: The template to use.
    ///
    /// returns: Result<ProgressStyleBuilder, anyhow::Error>
    pub fn template(mut self, msg_template: &str) -> Result<Self> {
        match self.progress_style.clone().template(msg_template) {
            Ok(style) => {
                self.progress_style = style;
                Ok(self)
            }
            Err(err) => {
                warn!("Template error with '{}': {}. Using fallback template.", msg_template, err);
                self.progress_style = Self::fallback_style();
                Ok(self)
            }
        }
    }

    /// Creates a builder with a plain spinner and bar.
    fn create_simple() -> Self {
        Self {
            progress_style: Self::fallback_style(),
        }
    }

    fn fallback_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(FALLBACK_TEMPLATE)
            .unwrap_or_else(|e| {
                error!("Fallback template also failed: {}. Using default bar.", e);
                ProgressStyle::default_bar()
            })
    }

    /// Sets the progress style chars.
    ///
    /// # Arguments
    ///
    /// * `chars`: Progress chars to use.
    ///
    /// returns: Result<ProgressStyleBuilder, anyhow::Error>
    pub fn progress_chars(mut self, chars: &str) -> Result<Self> {
        if chars.chars().count() < 2 {
            anyhow::bail!("progress chars need at least two symbols, got {:?}", chars);
        }
        self.progress_style = self.progress_style.progress_chars(chars);
        Ok(self)
    }

    pub fn build(self) -> ProgressStyle {
        self.progress_style
    }
}

impl Default for ProgressStyleBuilder {
    fn default() -> Self {
        Self {
            progress_style: ProgressStyle::default_bar(),
        }
    }
}

/// A builder that helps in initializing and configuring a new [ProgressBar] for use.
pub struct ProgressBarBuilder {
    /// The [ProgressBar] to build.
    progress_bar: ProgressBar,
}

impl ProgressBarBuilder {
    /// Creates new instance of the builder.
    ///
    /// # Arguments
    ///
    /// * `len`: Total length of the progress bar.
    ///
    /// returns: ProgressBarBuilder
    pub fn new(len: u64) -> Self {
        Self {
            progress_bar: ProgressBar::new(len),
        }
    }

    /// Sets the style of the progress bar to the style given.
    pub fn style(self, progress_style: ProgressStyle) -> Self {
        self.progress_bar.set_style(progress_style);
        self
    }

    /// Sets the draw target (output) of the progress bar to the target given.
    pub fn draw_target(self, target: ProgressDrawTarget) -> Self {
        self.progress_bar.set_draw_target(target);
        self
    }

    /// Resets the progress bar state to update it.
    pub fn reset(self) -> Self {
        self.progress_bar.reset();
        self
    }

    /// Sets the steady tick's duration to the given duration.
    ///
    /// # Arguments
    ///
    /// * `duration`: Steady tick duration.
    ///
    /// returns: ProgressBarBuilder
    pub fn steady_tick(self, duration: Duration) -> Self {
        self.progress_bar.enable_steady_tick(duration);
        self
    }

    /// Returns the newly built progress bar.
    pub fn build(self) -> ProgressBar {
        self.progress_bar
    }
}

/// Style of the download bar, or a plain bar when `progress_chars` is unusable.
fn download_style(progress_chars: &str) -> ProgressStyle {
    match ProgressStyleBuilder::default()
        .template(DOWNLOAD_TEMPLATE)
        .and_then(|builder| builder.progress_chars(progress_chars))
    {
        Ok(builder) => builder.build(),
        Err(e) => {
            warn!("{}. Using a plain progress bar.", e);
            ProgressStyleBuilder::create_simple().build()
        }
    }
}

/// Builds the bar shown while gags are downloaded.
///
/// # Arguments
///
/// * `len`: Number of gags in the run.
///
/// returns: ProgressBar
pub fn download_bar(len: u64) -> ProgressBar {
    let bar = ProgressBarBuilder::new(len)
        .style(download_style(PROGRESS_CHARS))
        .draw_target(ProgressDrawTarget::stderr_with_hz(5))
        .reset()
        .steady_tick(Duration::from_millis(200))
        .build();
    bar.set_prefix("Downloading");
    bar.set_message("Initializing...");
    bar
}

/// Moves `bar` forward for one processed gag.
pub fn advance(bar: &ProgressBar, event: &ProgressEvent<'_>) {
    bar.set_prefix(short_title(event.title));
    bar.set_message(describe_outcome(event.outcome));
    bar.inc(1);
}

/// One line describing what happened to a gag.
pub fn describe_outcome(outcome: &DownloadOutcome) -> String {
    let kind = outcome
        .media_kind
        .map(|kind| kind.to_string().to_lowercase())
        .unwrap_or_else(|| "gag".to_string());

    match outcome.status {
        DownloadStatus::Downloaded => format!("{} downloaded", kind),
        DownloadStatus::AlreadyCached => format!("{} already downloaded", kind),
        DownloadStatus::Failed => format!("failed: {}", outcome.record.post_url()),
    }
}

/// Cuts `title` so the bar prefix keeps a steady width.
pub fn short_title(title: &str) -> String {
    if title.chars().count() > PREFIX_CHARS {
        let head: String = title.chars().take(PREFIX_CHARS - 1).collect();
        format!("{}…", head)
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::gag::models::{MediaKind, PostRecord, SourceCategory};

    fn record() -> PostRecord {
        PostRecord::new("aW4nMjA", "Test Gag", SourceCategory::Upvoted)
    }

    #[test]
    fn test_describe_outcome() {
        let downloaded = DownloadOutcome::downloaded(record(), MediaKind::Video, PathBuf::from("a.mp4"));
        assert_eq!(describe_outcome(&downloaded), "video downloaded");

        let cached = DownloadOutcome::cached(record(), MediaKind::Image, PathBuf::from("a.jpg"));
        assert_eq!(describe_outcome(&cached), "image already downloaded");

        let failed = DownloadOutcome::failed(record());
        assert_eq!(describe_outcome(&failed), "failed: https://9gag.com/gag/aW4nMjA");
    }

    #[test]
    fn test_short_title() {
        assert_eq!(short_title("Dog"), "Dog");
        assert_eq!(short_title("exactly13char"), "exactly13char");
        assert_eq!(short_title("a much longer title"), "a much longe…");
        assert_eq!(short_title("ääääääääääääää"), "ääääääääääää…");
    }

    #[test]
    fn test_bad_template_falls_back() {
        assert!(ProgressStyleBuilder::default().template("{bar:40.").is_ok());
    }

    #[test]
    fn test_progress_chars_need_two_symbols() {
        assert!(ProgressStyleBuilder::create_simple().progress_chars("#").is_err());
        assert!(ProgressStyleBuilder::create_simple().progress_chars("#>-").is_ok());
    }

    #[test]
    fn test_download_style_survives_bad_chars() {
        let bar = ProgressBarBuilder::new(1)
            .style(download_style("#"))
            .draw_target(ProgressDrawTarget::hidden())
            .build();
        bar.inc(1);
        assert_eq!(bar.position(), 1);
    }

    #[test]
    fn test_download_bar_length() {
        let bar = download_bar(3);
        assert_eq!(bar.length(), Some(3));
        assert_eq!(bar.prefix(), "Downloading");
        bar.finish_and_clear();
    }

    #[test]
    fn test_advance_counts_gags() {
        let bar = ProgressBarBuilder::new(2)
            .style(ProgressStyleBuilder::create_simple().build())
            .draw_target(ProgressDrawTarget::hidden())
            .build();
        let outcome = DownloadOutcome::failed(record());

        advance(
            &bar,
            &ProgressEvent {
                index: 0,
                total: 2,
                title: "Test Gag",
                outcome: &outcome,
            },
        );

        assert_eq!(bar.position(), 1);
        assert_eq!(bar.prefix(), "Test Gag");
        assert_eq!(bar.message(), "failed: https://9gag.com/gag/aW4nMjA");
    }
}
