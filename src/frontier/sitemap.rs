//! Sitemap file parsing

use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::io::Read;

/// Reads the `<url><loc>` entries of an XML sitemap, in document order
///
/// Entries whose location is not a valid URL are logged and dropped.
/// Sitemap index entries (`<sitemap><loc>`) point at further sitemaps
/// that would have to be downloaded; they are logged and ignored.
pub fn parse_xml_sitemap<R: Read>(reader: R, source: &str) -> Vec<String> {
    let mut urls = Vec::new();

    for entity in SiteMapReader::new(reader) {
        match entity {
            SiteMapEntity::Url(entry) => match entry.loc.get_url() {
                Some(url) => urls.push(url.to_string()),
                None => tracing::debug!("Skipping invalid location in {}", source),
            },
            SiteMapEntity::SiteMap(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    tracing::info!("Ignoring nested sitemap {} listed in {}", url, source);
                }
            }
            SiteMapEntity::Err(e) => {
                tracing::warn!("Sitemap {} is malformed: {:?}", source, e);
            }
        }
    }

    urls
}

/// Reads a plain-text sitemap: one URL per line, `#` comments allowed
pub fn parse_text_sitemap(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
