use serde::{Deserialize, Serialize};

use crate::gag::models::PostRecord;

/// Characters that are not allowed in file names on at least one common filesystem.
pub const FORBIDDEN_CHARS: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Maximum number of characters kept in a file stem.
pub const MAX_STEM_CHARS: usize = 100;

/// Removes invalid characters from a title and caps it at [MAX_STEM_CHARS].
///
/// Whitespace is left alone, so a title made only of forbidden characters becomes
/// an empty stem.
///
/// # Arguments
///
/// * `title`: The post title to turn into a file stem.
///
/// returns: String
pub fn sanitize(title: &str) -> String {
    title
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .take(MAX_STEM_CHARS)
        .collect()
}

/// Decides which stem a post is stored and looked up under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKey {
    /// The sanitized title alone. Posts sharing a title share one file.
    #[default]
    Title,
    /// The sanitized title followed by ` [id]`, so every post gets its own file.
    TitleWithId,
}

impl CacheKey {
    /// Builds the file stem for `record` under this policy.
    pub fn stem(self, record: &PostRecord) -> String {
        match self {
            CacheKey::Title => sanitize(record.title()),
            CacheKey::TitleWithId => {
                let suffix = format!(" [{}]", sanitize(record.id()));
                let room = MAX_STEM_CHARS.saturating_sub(suffix.chars().count());
                let head: String = sanitize(record.title()).chars().take(room).collect();
                let mut stem = head + &suffix;
                if stem.chars().count() > MAX_STEM_CHARS {
                    stem = stem.chars().take(MAX_STEM_CHARS).collect();
                }
                stem
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gag::models::SourceCategory;

    #[test]
    fn test_sanitize_strips_forbidden_characters() {
        let title = r#"Test: <Gag> with / invalid \ chars? * "yes""#;
        assert_eq!(sanitize(title), "Test Gag with  invalid  chars  yes");
    }

    #[test]
    fn test_sanitize_truncates_long_titles() {
        let long_title = "A".repeat(200);
        assert_eq!(sanitize(&long_title).chars().count(), 100);
    }

    #[test]
    fn test_sanitize_truncates_after_stripping() {
        let title = format!("{}{}", "?".repeat(50), "B".repeat(120));
        assert_eq!(sanitize(&title), "B".repeat(100));
    }

    #[test]
    fn test_sanitize_counts_characters_not_bytes() {
        let title = "é".repeat(150);
        let stem = sanitize(&title);
        assert_eq!(stem.chars().count(), 100);
        assert_eq!(stem.len(), 200);
    }

    #[test]
    fn test_sanitize_may_be_empty() {
        assert_eq!(sanitize(r#"\/*?:"<>|"#), "");
    }

    #[test]
    fn test_sanitize_properties() {
        let repeated = "x|".repeat(120);
        let samples: [&str; 6] = [
            "Cat:Meme",
            "  spaced  out  ",
            r#"a"b"c"#,
            "no changes here",
            "ümlaut / ß / 日本語 | emoji 🐱",
            repeated.as_str(),
        ];
        for sample in samples {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", sample);
            assert!(once.chars().count() <= MAX_STEM_CHARS);
            assert!(!once.chars().any(|c| FORBIDDEN_CHARS.contains(&c)));
        }
    }

    #[test]
    fn test_cache_key_title() {
        let record = PostRecord::new("a1", "Cat:Meme", SourceCategory::Upvoted);
        assert_eq!(CacheKey::Title.stem(&record), "CatMeme");
    }

    #[test]
    fn test_cache_key_title_with_id() {
        let record = PostRecord::new("a1", "Cat:Meme", SourceCategory::Upvoted);
        assert_eq!(CacheKey::TitleWithId.stem(&record), "CatMeme [a1]");

        let long = PostRecord::new("aW4nMjA", "D".repeat(300), SourceCategory::Saved);
        let stem = CacheKey::TitleWithId.stem(&long);
        assert_eq!(stem.chars().count(), 100);
        assert!(stem.ends_with(" [aW4nMjA]"));
    }
}
