//! Open Graph and Twitter card tags, plus lazy image loading.

use std::sync::LazyLock;

use localsite_core::Config;
use regex::Regex;

use crate::{
    engine::{PageContext, Rewriter},
    error::Result,
    markup,
};

static IMG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("img pattern is valid"));

/// Add `loading="lazy"` to images that do not set `loading`.
#[must_use]
pub fn lazy_images(html: &str) -> String {
    IMG_RE
        .replace_all(html, |caps: &regex::Captures<'_>| {
            let tag = &caps[0];
            if markup::attr(tag, "loading").is_some() {
                tag.to_string()
            } else {
                format!(r#"<img loading="lazy"{}"#, &tag[4..])
            }
        })
        .into_owned()
}

/// Upserts social sharing meta tags.
#[derive(Debug, Clone)]
pub struct SocialRewriter {
    site_name: String,
    locale: String,
    default_description: Option<String>,
    image: Option<String>,
}

impl SocialRewriter {
    /// Create a social rewriter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let image = config.site.og_image.as_deref().map(|image| {
            if image.starts_with("http://") || image.starts_with("https://") {
                image.to_string()
            } else {
                config.url_for(image)
            }
        });

        Self {
            site_name: config.site.name.clone(),
            locale: config.site.locale.clone(),
            default_description: config.site.description.clone(),
            image,
        }
    }

    /// `(attribute, key, content)` triples for a page.
    fn tags(&self, page: &PageContext, html: &str) -> Vec<(&'static str, &'static str, String)> {
        let title = markup::title(html).unwrap_or_else(|| self.site_name.clone());
        let description = markup::meta_description(html).or_else(|| self.default_description.clone());
        let card = if self.image.is_some() {
            "summary_large_image"
        } else {
            "summary"
        };

        let mut tags = vec![
            ("property", "og:type", "website".to_string()),
            ("property", "og:url", page.url.clone()),
            ("property", "og:title", title.clone()),
        ];
        if let Some(description) = &description {
            tags.push(("property", "og:description", description.clone()));
        }
        tags.push(("property", "og:site_name", self.site_name.clone()));
        tags.push(("property", "og:locale", self.locale.clone()));
        if let Some(image) = &self.image {
            tags.push(("property", "og:image", image.clone()));
        }

        tags.push(("name", "twitter:card", card.to_string()));
        tags.push(("name", "twitter:title", title));
        if let Some(description) = description {
            tags.push(("name", "twitter:description", description));
        }
        if let Some(image) = &self.image {
            tags.push(("name", "twitter:image", image.clone()));
        }
        tags
    }
}

impl Rewriter for SocialRewriter {
    fn name(&self) -> &'static str {
        "social"
    }

    fn rewrite(&self, page: &PageContext, html: &str) -> Result<Option<String>> {
        let out = self
            .tags(page, html)
            .into_iter()
            .fold(html.to_string(), |out, (attr, key, content)| {
                markup::upsert_meta(&out, attr, key, &content)
            });
        let out = lazy_images(&out);
        Ok((out != html).then_some(out))
    }
}
