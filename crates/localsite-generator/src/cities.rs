//! City landing page generation.
//!
//! Renders one page per configured city to `<output_root>/<slug>/index.html`.

use std::path::{Path, PathBuf};

use localsite_core::{City, Config};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::{
    pages::{Result, site_context, write_index},
    template::{Template, TemplateContext, TemplateRegistry},
};

/// Generates city landing pages from a template.
#[derive(Debug)]
pub struct CityPageGenerator {
    config: Config,
    registry: TemplateRegistry,
}

impl CityPageGenerator {
    /// Create a generator using the built-in city template.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: TemplateRegistry::new(),
        }
    }

    /// Create a generator, loading `cities.template` relative to `base_dir` when set.
    pub fn from_config(config: Config, base_dir: &Path) -> Result<Self> {
        let mut generator = Self::new(config);
        if let Some(template) = &generator.config.cities.template {
            let path = base_dir.join(template);
            info!(path = %path.display(), "using city template file");
            generator
                .registry
                .register(Template::from_file("city", &path)?);
        }
        Ok(generator)
    }

    /// Template variables for one city.
    #[must_use]
    pub fn context(&self, city: &City) -> TemplateContext {
        let mut ctx = site_context(&self.config);
        ctx.insert("CITY_NAME", city.name.as_str());
        ctx.insert("CITY_SLUG", city.slug.as_str());
        ctx.insert("CITY_TITLE", city.display_name(&self.config.site.region));
        ctx.insert("NEARBY_TOWNS", city.nearby.as_deref().unwrap_or_default());
        ctx.insert_opt("CITY_LEDE", city.lede.as_deref());
        ctx
    }

    /// Render the page for one city.
    pub fn render(&self, city: &City) -> Result<String> {
        Ok(self.registry.render("city", &self.context(city))?)
    }

    /// Output directory of a city page.
    #[must_use]
    pub fn output_dir(&self, city: &City, output_dir: &Path) -> PathBuf {
        output_dir
            .join(self.config.cities.output_root.trim_matches('/'))
            .join(&city.slug)
    }

    /// Generate every configured city page. Returns the number written.
    ///
    /// A page that fails to render or write is logged and skipped.
    pub fn generate(&self, output_dir: &Path) -> Result<usize> {
        let cities = self.config.cities();
        info!(count = cities.len(), "generating city pages");

        let results: Vec<_> = cities
            .par_iter()
            .map(|city| {
                let html = self.render(city)?;
                write_index(&self.output_dir(city, output_dir), &html)
            })
            .collect();

        let mut count = 0;
        for (city, result) in cities.iter().zip(results) {
            match result {
                Ok(_) => count += 1,
                Err(e) => warn!(slug = %city.slug, error = %e, "failed to generate city page"),
            }
        }

        Ok(count)
    }
}
