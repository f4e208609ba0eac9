//! Sitemap generation.
//!
//! Generates XML sitemaps for search engine optimization.

use std::{fs, path::Path, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::discovery::SitePage;

static CANONICAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link\s+rel=["']canonical["']\s+href=["']([^"']+)["']"#)
        .expect("canonical pattern is valid")
});

/// Sitemap generation errors.
#[derive(Debug, Error)]
pub enum SitemapError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sitemap operations.
pub type Result<T> = std::result::Result<T, SitemapError>;

/// Change frequency for sitemap entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Daily,
    Monthly,
    Yearly,
}

impl ChangeFreq {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

/// A sitemap URL entry.
#[derive(Debug, Clone)]
pub struct SitemapUrl {
    /// URL location.
    pub loc: String,

    /// Last modification date.
    pub lastmod: Option<DateTime<Utc>>,

    /// Change frequency.
    pub changefreq: ChangeFreq,

    /// Priority (0.0 to 1.0).
    pub priority: f32,
}

/// Sitemap generator.
#[derive(Debug)]
pub struct SitemapGenerator {
    cities_root: String,
}

impl SitemapGenerator {
    /// Create a new sitemap generator; pages under `cities_root` rank as city pages.
    #[must_use]
    pub fn new(cities_root: impl Into<String>) -> Self {
        Self {
            cities_root: cities_root.into().trim_matches('/').to_string(),
        }
    }

    /// Generate sitemap XML from discovered pages.
    pub fn generate(&self, pages: &[SitePage]) -> String {
        debug!(count = pages.len(), "generating sitemap");

        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
        xml.push('\n');

        for page in pages {
            let url = self.page_to_url(page);
            xml.push_str(&url_to_xml(&url));
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Convert a page to a sitemap URL entry.
    fn page_to_url(&self, page: &SitePage) -> SitemapUrl {
        let lastmod = fs::metadata(&page.path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        let (changefreq, priority) = if page.is_home() {
            (ChangeFreq::Daily, 1.0)
        } else if page.rel.starts_with(&self.cities_root) {
            (ChangeFreq::Monthly, 0.8)
        } else {
            (ChangeFreq::Yearly, 0.5)
        };

        SitemapUrl {
            loc: page.url.clone(),
            lastmod,
            changefreq,
            priority,
        }
    }

    /// Generate and write `sitemap.xml` under `root`.
    pub fn write(&self, pages: &[SitePage], root: &Path) -> Result<()> {
        fs::write(root.join("sitemap.xml"), self.generate(pages))?;
        Ok(())
    }
}

/// Convert a URL entry to XML.
fn url_to_xml(url: &SitemapUrl) -> String {
    let mut xml = String::from("  <url>\n");

    xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&url.loc)));

    if let Some(lastmod) = &url.lastmod {
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            lastmod.format("%Y-%m-%d")
        ));
    }

    xml.push_str(&format!(
        "    <changefreq>{}</changefreq>\n",
        url.changefreq.as_str()
    ));
    xml.push_str(&format!("    <priority>{:.1}</priority>\n", url.priority));

    xml.push_str("  </url>\n");
    xml
}

/// Base URL declared by the homepage's canonical link, falling back to `fallback`.
///
/// Trailing slashes are removed either way.
#[must_use]
pub fn detect_base_url(root: &Path, fallback: &str) -> String {
    let detected = fs::read_to_string(root.join("index.html"))
        .ok()
        .and_then(|html| {
            CANONICAL_RE
                .captures(&html)
                .map(|caps| caps[1].trim().to_string())
        });

    match detected {
        Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
        _ => fallback.trim_end_matches('/').to_string(),
    }
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
