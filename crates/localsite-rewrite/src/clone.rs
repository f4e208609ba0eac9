//! City pages re-derived from the homepage.
//!
//! Each existing `<cities_root>/<slug>/index.html` becomes a copy of the
//! homepage with city-specific title, description, canonical URL, heading
//! and intro section.

use std::{fs, path::Path, sync::LazyLock};

use localsite_core::{Config, name_from_slug};
use regex::Regex;

use crate::{
    engine::{PageContext, Rewriter},
    error::{Result, RewriteError},
    markup::{self, escape_html},
};

static MAIN_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<main\b[^>]*>").expect("main pattern is valid"));

static SECTION_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</section\s*>").expect("section close pattern is valid"));

/// Rebuilds city pages from the homepage.
#[derive(Debug, Clone)]
pub struct CloneRewriter {
    home: String,
    config: Config,
}

impl CloneRewriter {
    /// Create a cloner from homepage HTML.
    #[must_use]
    pub fn new(config: Config, home: impl Into<String>) -> Self {
        Self {
            home: markup::normalize_newlines(&home.into()),
            config,
        }
    }

    /// Create a cloner reading `<root>/index.html`.
    pub fn load(config: Config, root: &Path) -> Result<Self> {
        let path = root.join("index.html");
        let home = fs::read_to_string(&path).map_err(|source| RewriteError::Read { path, source })?;
        Ok(Self::new(config, home))
    }

    /// Substitute `{site}`, `{city}` and `{region}` in a configured text.
    fn fill(&self, text: &str, city: &str) -> String {
        fill(text, &self.config.site.name, city, &self.config.site.region)
    }

    /// City name from the existing heading, the configured entry, or the slug.
    #[must_use]
    pub fn city_name(&self, slug: &str, existing: &str) -> String {
        if let Some(name) = markup::first_h1_text(existing)
            .and_then(|h1| city_from_heading(&h1, &self.config.site.region))
        {
            return name;
        }

        self.config
            .cities
            .list
            .iter()
            .find(|entry| entry.slug == slug)
            .and_then(|entry| entry.name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(
                || name_from_slug(slug, &self.config.cities.slug_suffix),
                ToString::to_string,
            )
    }

    /// The intro template is markup; substituted values are escaped.
    fn intro(&self, city: &str) -> String {
        let text = fill(
            &self.config.clone.intro,
            &escape_html(&self.config.site.name),
            &escape_html(city),
            &escape_html(&self.config.site.region),
        );
        format!("\n<section class=\"city-intro\">\n  <p>{text}</p>\n</section>")
    }

    /// Insert the intro after the first section closed inside `<main>`.
    fn insert_intro(&self, html: &str, city: &str) -> String {
        let intro = self.intro(city);
        let Some(main) = MAIN_OPEN_RE.find(html) else {
            return format!("{html}\n{intro}\n");
        };
        let at = SECTION_CLOSE_RE
            .find(&html[main.end()..])
            .map_or(main.end(), |close| main.end() + close.end());
        markup::splice(html, at..at, &intro)
    }

    /// The homepage rewritten for one city.
    #[must_use]
    pub fn build_page(&self, slug: &str, city: &str) -> String {
        let clone = &self.config.clone;
        let region = &self.config.site.region;
        let heading = format!("{} {city}, {region}", clone.heading_prefix);
        let title = format!("{heading} | {}", self.config.site.name);
        let canonical = self.config.url_for(&format!(
            "{}/{slug}/",
            self.config.cities.output_root.trim_matches('/')
        ));

        let html = markup::replace_title(&self.home, &title);
        let html = markup::upsert_meta_description(&html, &self.fill(&clone.description, city));
        let html = markup::upsert_canonical(&html, &canonical);
        let html = markup::replace_first_h1(&html, &heading);
        self.insert_intro(&html, city)
    }
}

fn fill(text: &str, site: &str, city: &str, region: &str) -> String {
    text.replace("{site}", site)
        .replace("{city}", city)
        .replace("{region}", region)
}

/// `"Gutter Guards in Des Moines, IA"` yields `"Des Moines"`.
fn city_from_heading(heading: &str, region: &str) -> Option<String> {
    let (_, rest) = heading.rsplit_once(" in ")?;
    let (city, tail) = rest.rsplit_once(',')?;
    let city = city.trim();
    (tail.trim().eq_ignore_ascii_case(region) && !city.is_empty()).then(|| city.to_string())
}

impl Rewriter for CloneRewriter {
    fn name(&self) -> &'static str {
        "clone"
    }

    fn applies_to(&self, page: &PageContext) -> bool {
        page.is_city()
    }

    fn rewrite(&self, page: &PageContext, html: &str) -> Result<Option<String>> {
        let slug = page.city_slug.as_deref().unwrap_or_default();
        let city = self.city_name(slug, html);
        let out = self.build_page(slug, &city);
        Ok((out != html).then_some(out))
    }
}
