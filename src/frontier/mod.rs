//! The URL frontier
//!
//! The frontier is the ordered list of recipe-page URLs a run walks. It is
//! read once, up front, from the sitemap files in the sitemap directory and
//! is never extended while crawling; related recipes are picked up from the
//! pages themselves instead.

mod sitemap;

pub use sitemap::{parse_text_sitemap, parse_xml_sitemap};

use crate::{LarderError, Result};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Ordered recipe-page URLs, duplicates included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontier {
    urls: Vec<String>,
}

impl Frontier {
    /// Creates a frontier from URLs already in memory
    pub fn from_urls(urls: Vec<String>) -> Self {
        Self { urls }
    }

    /// Loads every sitemap file in `dir`, in file-name order
    ///
    /// `.txt` files are read as plain-text sitemaps, everything else as XML.
    /// A file that cannot be opened is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `LarderError::Sitemap` when the directory itself cannot be read.
    pub fn from_sitemap_dir(dir: &Path) -> Result<Self> {
        let entries = fs::read_dir(dir).map_err(|e| {
            LarderError::Sitemap(format!("cannot read sitemap directory {}: {}", dir.display(), e))
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let mut urls = Vec::new();
        for path in &files {
            match read_sitemap_file(path) {
                Ok(found) => {
                    tracing::info!("Found {} URLs in sitemap {}", found.len(), path.display());
                    urls.extend(found);
                }
                Err(e) => tracing::warn!("Error reading sitemap {}: {}", path.display(), e),
            }
        }

        tracing::info!(
            "Frontier holds {} URLs from {} sitemap files",
            urls.len(),
            files.len()
        );
        Ok(Self { urls })
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.urls.iter()
    }

    pub fn into_urls(self) -> Vec<String> {
        self.urls
    }
}

impl<'a> IntoIterator for &'a Frontier {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn read_sitemap_file(path: &Path) -> std::io::Result<Vec<String>> {
    let source = path.display().to_string();
    let is_text = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));

    if is_text {
        Ok(parse_text_sitemap(&fs::read_to_string(path)?))
    } else {
        let file = File::open(path)?;
        Ok(parse_xml_sitemap(BufReader::new(file), &source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://x/c</loc></url>
</urlset>"#;

    #[test]
    fn test_from_sitemap_dir_reads_files_in_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.xml"), XML).unwrap();
        fs::write(dir.path().join("a.txt"), "https://x/a\nhttps://x/b\n").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let frontier = Frontier::from_sitemap_dir(dir.path()).unwrap();

        assert_eq!(
            frontier.into_urls(),
            vec!["https://x/a", "https://x/b", "https://x/c"]
        );
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = Frontier::from_sitemap_dir(&dir.path().join("missing"));

        assert!(matches!(result, Err(LarderError::Sitemap(_))));
    }

    #[test]
    fn test_empty_directory_gives_empty_frontier() {
        let dir = TempDir::new().unwrap();
        let frontier = Frontier::from_sitemap_dir(dir.path()).unwrap();

        assert!(frontier.is_empty());
        assert_eq!(frontier.len(), 0);
    }

    #[test]
    fn test_from_urls_keeps_duplicates() {
        let frontier = Frontier::from_urls(vec!["https://x/a".into(), "https://x/a".into()]);

        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.iter().count(), 2);
    }
}
