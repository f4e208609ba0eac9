//! Build orchestration.
//!
//! Coordinates page generation and SEO file output.

use std::{fs, path::PathBuf, time::Instant};

use localsite_core::{Config, CoreError};
use thiserror::Error;
use tracing::info;

use crate::{
    cities::CityPageGenerator,
    discovery::{DiscoveryError, PageDiscovery},
    indexnow,
    legal::LegalPageGenerator,
    pages::GenerateError,
    robots::{RobotsError, RobotsGenerator},
    sitemap::{SitemapError, SitemapGenerator, detect_base_url},
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Page generation error.
    #[error("generate error: {0}")]
    Generate(#[from] GenerateError),

    /// Page discovery error.
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Sitemap generation error.
    #[error("sitemap error: {0}")]
    Sitemap(#[from] SitemapError),

    /// Robots generation error.
    #[error("robots error: {0}")]
    Robots(#[from] RobotsError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] CoreError),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of legal pages generated.
    pub legal_pages: usize,

    /// Number of city pages generated.
    pub city_pages: usize,

    /// Number of URLs in the sitemap.
    pub sitemap_urls: usize,

    /// Base URL written into the sitemap and robots.txt.
    pub base_url: String,

    /// IndexNow key file name, when one was written.
    pub indexnow_file: Option<String>,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Site builder that orchestrates generation.
#[derive(Debug)]
pub struct Builder {
    config: Config,
    base_dir: PathBuf,
    output_dir: PathBuf,
    indexnow_key: Option<String>,
}

impl Builder {
    /// Create a new builder.
    ///
    /// `base_dir` resolves template and content files named in the config.
    #[must_use]
    pub fn new(
        config: Config,
        base_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let indexnow_key = config.seo.indexnow_key.clone();
        Self {
            config,
            base_dir: base_dir.into(),
            output_dir: output_dir.into(),
            indexnow_key,
        }
    }

    /// Set the IndexNow key, replacing the configured one.
    #[must_use]
    pub fn with_indexnow_key(mut self, key: Option<String>) -> Self {
        self.indexnow_key = key;
        self
    }

    /// Generate legal pages, city pages, then the SEO files.
    pub fn build(&self) -> Result<BuildStats> {
        let start = Instant::now();

        info!(
            base = %self.base_dir.display(),
            output = %self.output_dir.display(),
            "starting build"
        );

        fs::create_dir_all(&self.output_dir)?;

        let mut stats = BuildStats {
            legal_pages: self.generate_legal()?,
            city_pages: self.generate_cities()?,
            ..BuildStats::default()
        };
        self.generate_seo(&mut stats)?;

        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            legal_pages = stats.legal_pages,
            city_pages = stats.city_pages,
            sitemap_urls = stats.sitemap_urls,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Generate only legal pages.
    pub fn generate_legal(&self) -> Result<usize> {
        let generator = LegalPageGenerator::new(self.config.clone(), &self.base_dir);
        Ok(generator.generate(&self.output_dir)?)
    }

    /// Generate only city pages.
    pub fn generate_cities(&self) -> Result<usize> {
        let generator = CityPageGenerator::from_config(self.config.clone(), &self.base_dir)?;
        Ok(generator.generate(&self.output_dir)?)
    }

    /// Write sitemap.xml, robots.txt and the IndexNow key file.
    pub fn seo(&self) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = BuildStats::default();
        self.generate_seo(&mut stats)?;
        stats.duration_ms = start.elapsed().as_millis() as u64;
        Ok(stats)
    }

    fn generate_seo(&self, stats: &mut BuildStats) -> Result<()> {
        let base_url = detect_base_url(&self.output_dir, self.config.base_url());

        let pages = PageDiscovery::new(&self.config, &self.output_dir)
            .with_base_url(&base_url)
            .index_pages()?;

        SitemapGenerator::new(&self.config.cities.output_root).write(&pages, &self.output_dir)?;
        info!(urls = pages.len(), base = %base_url, "generated sitemap");

        RobotsGenerator::new(self.config.seo.clone(), &base_url).generate(&self.output_dir)?;

        stats.indexnow_file = match &self.indexnow_key {
            Some(key) => Some(indexnow::write_key_file(&self.output_dir, key)?),
            None => None,
        };
        stats.sitemap_urls = pages.len();
        stats.base_url = base_url;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    fn test_config(dir: &Path) -> Config {
        let path = dir.join("site.toml");
        fs::write(
            &path,
            r#"
[site]
name = "Iowa Gutter Guards"
base_url = "https://iowagutterguards.online"

[[cities.list]]
slug = "ankeny-ia"

[[legal]]
slug = "customer-service"
title = "Customer Service | Iowa Gutter Guards"
content = "<h1>Customer Service</h1>"
"#,
        )
        .unwrap();
        Config::load(&path).unwrap()
    }

    #[test]
    fn test_build_site() {
        let base = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        let stats = Builder::new(test_config(base.path()), base.path(), output.path())
            .build()
            .unwrap();

        assert_eq!(stats.legal_pages, 1);
        assert_eq!(stats.city_pages, 1);
        assert_eq!(stats.sitemap_urls, 2);
        assert!(stats.indexnow_file.is_none());
        assert!(output.path().join("service-areas/ankeny-ia/index.html").exists());
        assert!(output.path().join("customer-service/index.html").exists());
        assert!(output.path().join("sitemap.xml").exists());
        assert!(output.path().join("robots.txt").exists());
    }

    #[test]
    fn test_seo_with_indexnow_key() {
        let base = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::write(output.path().join("index.html"), "<html></html>").unwrap();

        let stats = Builder::new(test_config(base.path()), base.path(), output.path())
            .with_indexnow_key(Some("abc12345def".to_string()))
            .seo()
            .unwrap();

        assert_eq!(stats.sitemap_urls, 1);
        assert_eq!(stats.indexnow_file.as_deref(), Some("abc12345def.txt"));
        assert!(output.path().join("abc12345def.txt").exists());
    }

    #[test]
    fn test_build_stats() {
        let stats = BuildStats::default();
        assert_eq!(stats.city_pages, 0);
        assert_eq!(stats.duration_ms, 0);
    }
}
