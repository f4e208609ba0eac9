//! Legal and support page generation.

use std::{
    fs,
    path::{Path, PathBuf},
};

use localsite_core::{Config, CoreError, config::LegalPage};
use tracing::info;

use crate::{
    pages::{Result, site_context, write_index},
    template::TemplateRegistry,
};

/// Generates the pages listed under `[[legal]]`.
#[derive(Debug)]
pub struct LegalPageGenerator {
    config: Config,
    registry: TemplateRegistry,
    base_dir: PathBuf,
}

impl LegalPageGenerator {
    /// Create a generator; `content_file` paths resolve against `base_dir`.
    #[must_use]
    pub fn new(config: Config, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            registry: TemplateRegistry::new(),
            base_dir: base_dir.into(),
        }
    }

    fn body(&self, page: &LegalPage) -> Result<String> {
        if let Some(content) = &page.content {
            return Ok(content.clone());
        }
        match &page.content_file {
            Some(file) => {
                let path = self.base_dir.join(file);
                fs::read_to_string(&path)
                    .map_err(|source| CoreError::MissingContent { path, source }.into())
            }
            None => Err(CoreError::config(format!(
                "legal page '{}' has no content",
                page.slug
            ))
            .into()),
        }
    }

    /// Render one legal page.
    pub fn render(&self, page: &LegalPage) -> Result<String> {
        let mut ctx = site_context(&self.config);
        ctx.insert("TITLE", page.title.as_str());
        ctx.insert("SLUG", page.slug.as_str());
        ctx.insert("CONTENT", self.body(page)?.trim());
        Ok(self.registry.render("legal", &ctx)?)
    }

    /// Generate every legal page. Any failure aborts the run.
    pub fn generate(&self, output_dir: &Path) -> Result<usize> {
        for page in &self.config.legal {
            let html = self.render(page)?;
            write_index(&output_dir.join(&page.slug), &html)?;
        }

        info!(count = self.config.legal.len(), "generated legal pages");
        Ok(self.config.legal.len())
    }
}
