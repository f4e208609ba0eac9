//! Rewrite engine.
//!
//! Discovers the pages under a site root, applies every rewriter that
//! applies to each page in order, and writes a page back only when its
//! content changed.

use std::{
    fs,
    path::{Path, PathBuf},
};

use localsite_core::{Config, url};
use localsite_generator::discovery::{PageDiscovery, SitePage};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    error::{Result, RewriteError},
    markup::normalize_newlines,
};

/// What a rewriter knows about the page it is rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    /// Path relative to the site root.
    pub rel: PathBuf,

    /// Public URL of the page.
    pub url: String,

    /// City slug when the page is `<cities_root>/<slug>/index.html`.
    pub city_slug: Option<String>,

    /// Whether this is the root `index.html`.
    pub is_home: bool,
}

impl PageContext {
    /// Build the context of a discovered page.
    #[must_use]
    pub fn new(page: &SitePage, cities_root: &str) -> Self {
        Self {
            rel: page.rel.clone(),
            url: page.url.clone(),
            city_slug: url::city_slug_from_path(&page.rel, cities_root),
            is_home: page.is_home(),
        }
    }

    /// Whether this is a city page.
    #[must_use]
    pub fn is_city(&self) -> bool {
        self.city_slug.is_some()
    }

    /// Relative path with `/` separators, for messages.
    #[must_use]
    pub fn path(&self) -> String {
        url::to_posix(&self.rel)
    }
}

/// An idempotent page mutation.
pub trait Rewriter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether the rewriter wants to see this page.
    fn applies_to(&self, _page: &PageContext) -> bool {
        true
    }

    /// Rewrite `html`; `None` means the page is left as it is.
    fn rewrite(&self, page: &PageContext, html: &str) -> Result<Option<String>>;
}

/// Counters from one engine run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Pages examined.
    pub scanned: usize,

    /// Pages written back.
    pub changed: usize,

    /// Pages skipped because a rewriter failed.
    pub failed: usize,
}

/// Applies rewriters to every page under a site root.
#[derive(Debug, Clone)]
pub struct RewriteEngine {
    discovery: PageDiscovery,
    cities_root: String,
}

impl RewriteEngine {
    /// Create an engine over `root` using the config's exclusions and base URL.
    #[must_use]
    pub fn new(config: &Config, root: impl Into<PathBuf>) -> Self {
        Self {
            discovery: PageDiscovery::new(config, root),
            cities_root: config.cities.output_root.trim_matches('/').to_string(),
        }
    }

    /// Site root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.discovery.root()
    }

    /// Every rewritable page with its context.
    pub fn pages(&self) -> Result<Vec<(SitePage, PageContext)>> {
        Ok(self
            .discovery
            .html_pages()?
            .into_iter()
            .map(|page| {
                let ctx = PageContext::new(&page, &self.cities_root);
                (page, ctx)
            })
            .collect())
    }

    /// Apply `rewriters` to in-memory HTML; `None` when nothing changed.
    pub fn apply(
        rewriters: &[Box<dyn Rewriter>],
        page: &PageContext,
        html: &str,
    ) -> Result<Option<String>> {
        let mut current = normalize_newlines(html);
        for rewriter in rewriters.iter().filter(|r| r.applies_to(page)) {
            if let Some(next) = rewriter.rewrite(page, &current)? {
                debug!(rewriter = rewriter.name(), page = %page.path(), "rewrote page");
                current = next;
            }
        }
        Ok((current != html).then_some(current))
    }

    fn process(&self, rewriters: &[Box<dyn Rewriter>], page: &SitePage, ctx: &PageContext) -> Result<bool> {
        if !rewriters.iter().any(|r| r.applies_to(ctx)) {
            return Ok(false);
        }

        let bytes = fs::read(&page.path).map_err(|source| RewriteError::Read {
            path: page.path.clone(),
            source,
        })?;
        let html = String::from_utf8(bytes).map_err(|source| RewriteError::InvalidUtf8 {
            path: page.path.clone(),
            source,
        })?;

        match Self::apply(rewriters, ctx, &html)? {
            Some(out) => {
                fs::write(&page.path, out).map_err(|source| RewriteError::Write {
                    path: page.path.clone(),
                    source,
                })?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run `rewriters` over every page.
    ///
    /// A page that is not valid UTF-8 or whose rewrite fails is logged,
    /// counted and left untouched.
    pub fn run(&self, rewriters: &[Box<dyn Rewriter>]) -> Result<RewriteStats> {
        let names: Vec<&str> = rewriters.iter().map(|r| r.name()).collect();
        let pages = self.pages()?;
        info!(
            pages = pages.len(),
            rewriters = ?names,
            root = %self.root().display(),
            "rewriting pages"
        );

        let results: Vec<_> = pages
            .par_iter()
            .map(|(page, ctx)| self.process(rewriters, page, ctx))
            .collect();

        let mut stats = RewriteStats {
            scanned: pages.len(),
            ..RewriteStats::default()
        };
        for ((_, ctx), result) in pages.iter().zip(results) {
            match result {
                Ok(true) => stats.changed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(page = %ctx.path(), error = %e, "rewrite failed");
                    stats.failed += 1;
                }
            }
        }

        info!(
            scanned = stats.scanned,
            changed = stats.changed,
            failed = stats.failed,
            "rewrite complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl Rewriter for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn applies_to(&self, page: &PageContext) -> bool {
            page.is_home
        }

        fn rewrite(&self, _page: &PageContext, html: &str) -> Result<Option<String>> {
            let out = html.to_uppercase();
            Ok((out != html).then_some(out))
        }
    }

    struct Fails;

    impl Rewriter for Fails {
        fn name(&self) -> &'static str {
            "fails"
        }

        fn applies_to(&self, page: &PageContext) -> bool {
            page.is_city()
        }

        fn rewrite(&self, page: &PageContext, _html: &str) -> Result<Option<String>> {
            Err(RewriteError::missing(page.path(), "anything"))
        }
    }

    fn setup() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("site.toml"),
            "[site]\nname = \"Acme\"\nbase_url = \"https://example.com\"\n",
        )
        .unwrap();
        fs::write(root.join("index.html"), "<p>home</p>\r\n").unwrap();
        fs::create_dir_all(root.join("service-areas/ames-ia")).unwrap();
        fs::write(root.join("service-areas/ames-ia/index.html"), "<p>ames</p>").unwrap();
        fs::write(root.join("city-template.html"), "<p>skip</p>").unwrap();
        let config = Config::load(&root.join("site.toml")).unwrap();
        (dir, config)
    }

    #[test]
    fn test_page_context() {
        let page = SitePage {
            path: PathBuf::from("/site/service-areas/ames-ia/index.html"),
            rel: PathBuf::from("service-areas/ames-ia/index.html"),
            url: "https://example.com/service-areas/ames-ia/".to_string(),
        };
        let ctx = PageContext::new(&page, "service-areas");
        assert_eq!(ctx.city_slug.as_deref(), Some("ames-ia"));
        assert!(!ctx.is_home);
        assert_eq!(ctx.path(), "service-areas/ames-ia/index.html");
    }

    #[test]
    fn test_run_writes_changed_pages_only() {
        let (dir, config) = setup();
        let engine = RewriteEngine::new(&config, dir.path());
        let rewriters: Vec<Box<dyn Rewriter>> = vec![Box::new(Upper)];

        let stats = engine.run(&rewriters).unwrap();
        assert_eq!(stats.scanned, 2);
        assert_eq!(stats.changed, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("index.html")).unwrap(),
            "<P>HOME</P>\n"
        );

        let again = engine.run(&rewriters).unwrap();
        assert_eq!(again.changed, 0);
    }

    #[test]
    fn test_failed_page_is_counted_and_untouched() {
        let (dir, config) = setup();
        let engine = RewriteEngine::new(&config, dir.path());
        let rewriters: Vec<Box<dyn Rewriter>> = vec![Box::new(Upper), Box::new(Fails)];

        let stats = engine.run(&rewriters).unwrap();
        assert_eq!(stats.changed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("service-areas/ames-ia/index.html")).unwrap(),
            "<p>ames</p>"
        );
    }

    #[test]
    fn test_invalid_utf8_page_is_skipped() {
        let (dir, config) = setup();
        let bytes = b"<p>caf\xe9</p>".to_vec();
        fs::write(dir.path().join("index.html"), &bytes).unwrap();
        let engine = RewriteEngine::new(&config, dir.path());
        let rewriters: Vec<Box<dyn Rewriter>> = vec![Box::new(Upper)];

        let stats = engine.run(&rewriters).unwrap();
        assert_eq!(stats.changed, 0);
        assert_eq!(stats.failed, 1);
        assert_eq!(fs::read(dir.path().join("index.html")).unwrap(), bytes);
    }

    #[test]
    fn test_apply_normalizes_newlines() {
        let ctx = PageContext {
            rel: PathBuf::from("about.html"),
            url: "https://example.com/about.html".to_string(),
            city_slug: None,
            is_home: false,
        };
        let out = RewriteEngine::apply(&[], &ctx, "a\r\nb").unwrap();
        assert_eq!(out.as_deref(), Some("a\nb"));
        assert_eq!(RewriteEngine::apply(&[], &ctx, "a\nb").unwrap(), None);
    }
}
