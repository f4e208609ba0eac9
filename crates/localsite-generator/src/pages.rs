//! Shared pieces of page generation: errors, site-wide template variables and
//! the page writer.

use std::{
    fs,
    path::{Path, PathBuf},
};

use localsite_core::{Config, CoreError};
use thiserror::Error;
use tracing::debug;

use crate::template::{TemplateContext, TemplateError};

/// Page generation errors.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Template error.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// Configuration error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Writing a specific page failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for page generation.
pub type Result<T> = std::result::Result<T, GenerateError>;

/// Variables available to every generated page.
#[must_use]
pub fn site_context(config: &Config) -> TemplateContext {
    let mut ctx = TemplateContext::new()
        .with_var("SITE_NAME", config.site.name.as_str())
        .with_var("BASE_URL", config.base_url())
        .with_var("REGION", config.site.region.as_str())
        .with_var("REGION_NAME", config.region_name())
        .with_var("CITIES_ROOT", config.cities.output_root.trim_matches('/'))
        .with_var("FOOTER_LINKS", footer_links(config));
    ctx.insert_opt(
        "PHONE",
        config
            .site
            .phone_display
            .as_deref()
            .or(config.site.telephone.as_deref()),
    );
    ctx.insert_opt("EMAIL", config.site.email.as_deref());
    ctx.insert_opt("DESCRIPTION", config.site.description.as_deref());
    ctx
}

/// Footer navigation linking every legal page.
#[must_use]
pub fn footer_links(config: &Config) -> String {
    config
        .legal
        .iter()
        .map(|page| format!(r#"<a href="/{}/">{}</a>"#, page.slug, page.link_label()))
        .collect::<Vec<_>>()
        .join(" &middot;\n")
}

/// Write `<dir>/index.html`, creating parent directories.
pub fn write_index(dir: &Path, html: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| GenerateError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join("index.html");
    fs::write(&path, html).map_err(|source| GenerateError::Write {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "wrote page");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use localsite_core::config::LegalPage;

    use super::*;

    fn test_config() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        fs::write(
            &path,
            r#"
[site]
name = "Acme Gutters"
base_url = "https://example.com/"
phone_display = "(515) 555-0100"
"#,
        )
        .unwrap();
        Config::load(&path).unwrap()
    }

    #[test]
    fn test_site_context() {
        let ctx = site_context(&test_config());
        assert_eq!(ctx.get("SITE_NAME"), Some("Acme Gutters"));
        assert_eq!(ctx.get("BASE_URL"), Some("https://example.com"));
        assert_eq!(ctx.get("PHONE"), Some("(515) 555-0100"));
        assert_eq!(ctx.get("EMAIL"), None);
        assert_eq!(ctx.get("CITIES_ROOT"), Some("service-areas"));
    }

    #[test]
    fn test_footer_links() {
        let mut config = test_config();
        config.legal = vec![
            LegalPage {
                slug: "privacy-policy".to_string(),
                title: "Privacy Policy | Acme".to_string(),
                label: None,
                content: Some(String::new()),
                content_file: None,
            },
            LegalPage {
                slug: "warranty".to_string(),
                title: "Workmanship Warranty | Acme".to_string(),
                label: Some("Warranty".to_string()),
                content: Some(String::new()),
                content_file: None,
            },
        ];

        let links = footer_links(&config);
        assert_eq!(
            links,
            "<a href=\"/privacy-policy/\">Privacy Policy</a> &middot;\n<a href=\"/warranty/\">Warranty</a>"
        );
    }

    #[test]
    fn test_write_index_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b");
        let path = write_index(&target, "<p>hi</p>").unwrap();
        assert_eq!(path, target.join("index.html"));
        assert_eq!(fs::read_to_string(path).unwrap(), "<p>hi</p>");
    }
}
