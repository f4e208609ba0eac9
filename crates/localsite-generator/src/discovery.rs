//! Page discovery under the site root.
//!
//! Walks the site tree and collects the HTML pages that the sitemap and the
//! rewriters operate on.

use std::path::{Path, PathBuf};

use localsite_core::{Config, url};
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Discovery errors.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Walking the tree failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The site root does not exist.
    #[error("site root not found: {0}")]
    MissingRoot(PathBuf),
}

/// Result type for discovery.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// An HTML page found under the site root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePage {
    /// Absolute (or root-joined) path on disk.
    pub path: PathBuf,

    /// Path relative to the site root.
    pub rel: PathBuf,

    /// Public URL.
    pub url: String,
}

impl SitePage {
    /// Whether this is the root `index.html`.
    #[must_use]
    pub fn is_home(&self) -> bool {
        self.rel == Path::new("index.html")
    }
}

/// Finds pages under a site root, skipping excluded directories.
#[derive(Debug, Clone)]
pub struct PageDiscovery {
    root: PathBuf,
    base_url: String,
    exclude_dirs: Vec<String>,
}

impl PageDiscovery {
    /// Create a discovery over `root` using the config's base URL and exclusions.
    #[must_use]
    pub fn new(config: &Config, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_url: config.base_url().to_string(),
            exclude_dirs: config.build.exclude_dirs.clone(),
        }
    }

    /// Override the base URL used for page URLs.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Site root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.exclude_dirs.iter().any(|d| d == name))
    }

    fn walk(&self, keep: impl Fn(&str) -> bool) -> Result<Vec<SitePage>> {
        if !self.root.is_dir() {
            return Err(DiscoveryError::MissingRoot(self.root.clone()));
        }

        let mut pages = Vec::new();
        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e))
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !keep(name) {
                continue;
            }

            let path = entry.path().to_path_buf();
            let rel = path.strip_prefix(&self.root).unwrap_or(&path).to_path_buf();
            let page_url = url::page_url(&self.base_url, &rel);
            pages.push(SitePage {
                path,
                rel,
                url: page_url,
            });
        }

        pages.sort_by(|a, b| a.rel.cmp(&b.rel));
        debug!(count = pages.len(), root = %self.root.display(), "discovered pages");
        Ok(pages)
    }

    /// Every `index.html` page, sorted by relative path.
    pub fn index_pages(&self) -> Result<Vec<SitePage>> {
        self.walk(|name| name == "index.html")
    }

    /// Every `.html` page whose name does not mention "template".
    pub fn html_pages(&self) -> Result<Vec<SitePage>> {
        self.walk(|name| {
            name.ends_with(".html") && !name.to_ascii_lowercase().contains("template")
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn test_config(dir: &Path) -> Config {
        let path = dir.join("site.toml");
        fs::write(
            &path,
            "[site]\nname = \"Acme\"\nbase_url = \"https://example.com\"\n",
        )
        .unwrap();
        Config::load(&path).unwrap()
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<html></html>").unwrap();
    }

    #[test]
    fn test_index_pages_skip_excluded_dirs() {
        let cfg_dir = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        touch(root.path(), "index.html");
        touch(root.path(), "warranty/index.html");
        touch(root.path(), "service-areas/ames-ia/index.html");
        touch(root.path(), "node_modules/pkg/index.html");
        touch(root.path(), "assets/index.html");
        touch(root.path(), "thanks.html");

        let discovery = PageDiscovery::new(&test_config(cfg_dir.path()), root.path());
        let pages = discovery.index_pages().unwrap();
        let urls: Vec<_> = pages.iter().map(|p| p.url.as_str()).collect();

        assert_eq!(
            urls,
            vec![
                "https://example.com/",
                "https://example.com/service-areas/ames-ia/",
                "https://example.com/warranty/",
            ]
        );
        assert!(pages[0].is_home());
    }

    #[test]
    fn test_html_pages_skip_templates() {
        let cfg_dir = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        touch(root.path(), "index.html");
        touch(root.path(), "thanks.html");
        touch(root.path(), "city-template.html");

        let discovery = PageDiscovery::new(&test_config(cfg_dir.path()), root.path());
        let pages = discovery.html_pages().unwrap();
        let rels: Vec<_> = pages.iter().map(|p| url::to_posix(&p.rel)).collect();

        assert_eq!(rels, vec!["index.html", "thanks.html"]);
    }

    #[test]
    fn test_missing_root() {
        let cfg_dir = tempfile::tempdir().unwrap();
        let discovery = PageDiscovery::new(&test_config(cfg_dir.path()), "/nonexistent/site");
        assert!(matches!(
            discovery.index_pages(),
            Err(DiscoveryError::MissingRoot(_))
        ));
    }
}
