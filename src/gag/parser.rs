//! Reads posts out of a 9GAG HTML data export.
//!
//! The export lists interactions as `<h3>` headings ("Upvotes", "Saved", ...) each
//! followed by a `<table>`. Every row links to the post in its second cell and
//! carries the title in its third.

use std::fs;
use std::path::Path;

use scraper::{ElementRef, Html, Selector};

use crate::gag::error::{GagError, GagResult};
use crate::gag::models::{PostRecord, SourceCategory};

/// Title used when a row has no title text.
pub const PLACEHOLDER_TITLE: &str = "No Title";

/// Which export tables to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategorySelection {
    pub upvoted: bool,
    pub saved: bool,
}

impl CategorySelection {
    pub fn new(upvoted: bool, saved: bool) -> Self {
        CategorySelection { upvoted, saved }
    }

    pub fn is_empty(&self) -> bool {
        !self.upvoted && !self.saved
    }

    /// Selected categories in extraction order.
    pub fn categories(&self) -> Vec<SourceCategory> {
        let mut categories = Vec::with_capacity(2);
        if self.upvoted {
            categories.push(SourceCategory::Upvoted);
        }
        if self.saved {
            categories.push(SourceCategory::Saved);
        }
        categories
    }
}

/// Selectors used to walk the export.
struct ExportSelectors {
    /// Headings and tables in document order.
    landmarks: Selector,
    row: Selector,
    cell: Selector,
    anchor: Selector,
}

impl ExportSelectors {
    fn new() -> Option<Self> {
        Some(ExportSelectors {
            landmarks: Selector::parse("h3, table").ok()?,
            row: Selector::parse("tr").ok()?,
            cell: Selector::parse("td").ok()?,
            anchor: Selector::parse("a").ok()?,
        })
    }
}

/// Parses a 9GAG HTML export file and extracts the selected posts.
///
/// # Arguments
///
/// * `path`: Path to the HTML export.
/// * `include_upvoted`: Whether to read the "Upvotes" table.
/// * `include_saved`: Whether to read the "Saved" table.
///
/// returns: Result<Vec<PostRecord>, GagError>
pub fn parse_export(
    path: impl AsRef<Path>,
    include_upvoted: bool,
    include_saved: bool,
) -> GagResult<Vec<PostRecord>> {
    let path = path.as_ref();
    trace!("Reading export file {}...", path.display());

    let bytes = fs::read(path).map_err(|source| GagError::SourceNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let html = String::from_utf8_lossy(&bytes);

    let records = parse_document(&html, CategorySelection::new(include_upvoted, include_saved));
    info!("Found {} gags in {}", records.len(), path.display());
    Ok(records)
}

/// Extracts posts from an export that is already in memory.
///
/// Records come out in table order, upvoted before saved. A missing heading or
/// table simply contributes no records.
pub fn parse_document(html: &str, selection: CategorySelection) -> Vec<PostRecord> {
    let Some(selectors) = ExportSelectors::new() else {
        error!("Failed to build export selectors");
        return Vec::new();
    };
    let document = Html::parse_document(html);

    let mut records = Vec::new();
    for category in selection.categories() {
        match find_table(&document, &selectors, category.heading()) {
            Some(table) => {
                let before = records.len();
                records.extend(records_from_table(table, &selectors, category));
                debug!("Extracted {} {} gags", records.len() - before, category);
            }
            None => warn!("No \"{}\" table found in export", category.heading()),
        }
    }

    records
}

/// Finds the first table after the first `<h3>` whose text is `heading`.
fn find_table<'a>(document: &'a Html, selectors: &ExportSelectors, heading: &str) -> Option<ElementRef<'a>> {
    let mut heading_found = false;
    for element in document.select(&selectors.landmarks) {
        match element.value().name() {
            "h3" if !heading_found => {
                heading_found = element_text(element) == heading;
            }
            "table" if heading_found => return Some(element),
            _ => {}
        }
    }
    None
}

fn records_from_table(
    table: ElementRef<'_>,
    selectors: &ExportSelectors,
    category: SourceCategory,
) -> Vec<PostRecord> {
    let mut records = Vec::new();
    for row in table.select(&selectors.row) {
        let cells: Vec<ElementRef<'_>> = row.select(&selectors.cell).collect();
        if cells.len() < 3 {
            continue;
        }

        let Some(id) = cells[1]
            .select(&selectors.anchor)
            .next()
            .and_then(|anchor| anchor.value().attr("href"))
            .and_then(post_id_from_href)
        else {
            trace!("Skipping row without a usable link");
            continue;
        };

        let title = element_text(cells[2]);
        let title = if title.is_empty() {
            PLACEHOLDER_TITLE.to_string()
        } else {
            title
        };

        records.push(PostRecord::new(id, title, category));
    }
    records
}

/// Last path segment of a post link, ignoring any query or fragment.
fn post_id_from_href(href: &str) -> Option<&str> {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    let id = path.rsplit('/').next().unwrap_or_default();
    if id.is_empty() { None } else { Some(id) }
}

/// Collected, trimmed text of an element.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const EXPORT: &str = r#"<html>
<head><title>9GAG Test Data</title></head>
<body>
  <h3>Account</h3>
  <table><tr><td>Username</td><td>tester</td><td>ignored</td></tr></table>
  <h3>Upvotes</h3>
  <table>
    <tr><th>Date</th><th>Link</th><th>Title</th></tr>
    <tr><td>2021-01-01</td><td><a href="https://9gag.com/gag/a1">https://9gag.com/gag/a1</a></td><td>Cat:Meme</td></tr>
    <tr><td>2021-01-02</td><td><a href="https://9gag.com/gag/a2">https://9gag.com/gag/a2</a></td><td> Dog </td></tr>
  </table>
  <h3>Saved</h3>
  <table>
    <tr><td>2021-01-03</td><td><a href="https://9gag.com/gag/a3">https://9gag.com/gag/a3</a></td><td>Dog</td></tr>
  </table>
</body>
</html>"#;

    fn ids(records: &[PostRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_parse_both_categories_in_order() {
        let records = parse_document(EXPORT, CategorySelection::new(true, true));

        assert_eq!(ids(&records), vec!["a1", "a2", "a3"]);
        assert_eq!(records[0].title(), "Cat:Meme");
        assert_eq!(records[1].title(), "Dog");
        assert_eq!(records[2].title(), "Dog");
        assert_eq!(records[0].source_category(), SourceCategory::Upvoted);
        assert_eq!(records[2].source_category(), SourceCategory::Saved);
    }

    #[test]
    fn test_parse_single_category_has_no_cross_contamination() {
        let upvoted = parse_document(EXPORT, CategorySelection::new(true, false));
        assert_eq!(ids(&upvoted), vec!["a1", "a2"]);
        assert!(upvoted.iter().all(|r| r.source_category() == SourceCategory::Upvoted));

        let saved = parse_document(EXPORT, CategorySelection::new(false, true));
        assert_eq!(ids(&saved), vec!["a3"]);
        assert!(saved.iter().all(|r| r.source_category() == SourceCategory::Saved));
    }

    #[test]
    fn test_parse_nothing_selected() {
        assert!(parse_document(EXPORT, CategorySelection::default()).is_empty());
    }

    #[test]
    fn test_missing_heading_is_not_an_error() {
        let html = "<html><body><h3>Comments</h3><table><tr><td>1</td><td><a href=\"/gag/x\">x</a></td><td>t</td></tr></table></body></html>";
        assert!(parse_document(html, CategorySelection::new(true, true)).is_empty());
    }

    #[test]
    fn test_same_id_in_both_tables_is_kept_twice() {
        let html = r#"<h3>Upvotes</h3><table><tr><td>1</td><td><a href="https://9gag.com/gag/dup">x</a></td><td>Same</td></tr></table>
<h3>Saved</h3><table><tr><td>1</td><td><a href="https://9gag.com/gag/dup">x</a></td><td>Same</td></tr></table>"#;
        let records = parse_document(html, CategorySelection::new(true, true));
        assert_eq!(ids(&records), vec!["dup", "dup"]);
    }

    #[test]
    fn test_rows_without_link_are_skipped_and_empty_titles_replaced() {
        let html = r#"<h3>Saved</h3>
<table>
  <tr><td>1</td><td>no link here</td><td>Skipped</td></tr>
  <tr><td>2</td><td><a>no href</a></td><td>Skipped too</td></tr>
  <tr><td>3</td><td><a href="https://9gag.com/gag/">empty id</a></td><td>Skipped three</td></tr>
  <tr><td>4</td><td><a href="https://9gag.com/gag/aKeep">keep</a></td><td>   </td></tr>
  <tr><td>only two</td><td><a href="https://9gag.com/gag/short">x</a></td></tr>
</table>"#;
        let records = parse_document(html, CategorySelection::new(false, true));
        assert_eq!(ids(&records), vec!["aKeep"]);
        assert_eq!(records[0].title(), PLACEHOLDER_TITLE);
    }

    #[test]
    fn test_post_id_from_href() {
        assert_eq!(post_id_from_href("https://9gag.com/gag/aW4nMjA"), Some("aW4nMjA"));
        assert_eq!(post_id_from_href("https://9gag.com/gag/aW4nMjA/"), None);
        assert_eq!(post_id_from_href("https://9gag.com/gag/aW4nMjA?ref=x#top"), Some("aW4nMjA"));
        assert_eq!(post_id_from_href("aW4nMjA"), Some("aW4nMjA"));
        assert_eq!(post_id_from_href(""), None);
    }

    #[test]
    fn test_parse_export_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("9gag_data.html");
        fs::write(&path, EXPORT).unwrap();

        let records = parse_export(&path, true, false).unwrap();
        assert_eq!(ids(&records), vec!["a1", "a2"]);
    }

    #[test]
    fn test_parse_export_missing_file() {
        let dir = tempdir().unwrap();
        let err = parse_export(dir.path().join("non_existent_file.html"), true, true).unwrap_err();
        assert!(matches!(err, GagError::SourceNotFound { .. }));
    }
}
