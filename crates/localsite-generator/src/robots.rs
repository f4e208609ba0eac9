//! Robots.txt generation.
//!
//! Generates the robots.txt file for search engine crawlers.

use std::{fs::File, io::Write, path::Path};

use localsite_core::config::SeoConfig;
use thiserror::Error;
use tracing::info;

/// Robots generation errors.
#[derive(Debug, Error)]
pub enum RobotsError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for robots generation.
pub type Result<T> = std::result::Result<T, RobotsError>;

/// Robots.txt generator.
#[derive(Debug)]
pub struct RobotsGenerator {
    seo: SeoConfig,
    base_url: String,
}

impl RobotsGenerator {
    /// Create a new robots generator.
    #[must_use]
    pub fn new(seo: SeoConfig, base_url: impl Into<String>) -> Self {
        Self {
            seo,
            base_url: base_url.into(),
        }
    }

    /// Render robots.txt.
    pub fn render(&self) -> Result<String> {
        let mut out = Vec::new();

        writeln!(out, "User-agent: *")?;

        if self.seo.disallow.is_empty() {
            // An empty Disallow line permits everything.
            writeln!(out, "Disallow:")?;
        }
        for path in &self.seo.disallow {
            writeln!(out, "Disallow: {path}")?;
        }

        for path in &self.seo.allow {
            writeln!(out, "Allow: {path}")?;
        }

        writeln!(
            out,
            "Sitemap: {}/sitemap.xml",
            self.base_url.trim_end_matches('/')
        )?;

        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Generate robots.txt under `output_dir`.
    pub fn generate(&self, output_dir: &Path) -> Result<()> {
        info!("generating robots.txt");

        let mut file = File::create(output_dir.join("robots.txt"))?;
        file.write_all(self.render()?.as_bytes())?;
        Ok(())
    }
}
