//! City page localization.
//!
//! Drops the boilerplate block shared by every city page and installs the
//! city's own hero paragraph.

use std::{collections::HashMap, sync::LazyLock};

use localsite_core::Config;
use regex::Regex;

use crate::{
    engine::{PageContext, Rewriter},
    error::{Result, RewriteError},
    markup,
};

static HERO_LEDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<p\b[^>]*\sclass\s*=\s*["']hero-lede["'][^>]*>(.*?)</p>"#)
        .expect("hero lede pattern is valid")
});

/// Localizes city pages.
#[derive(Debug, Clone)]
pub struct LocalizeRewriter {
    marker: Option<String>,
    ledes: HashMap<String, String>,
}

impl LocalizeRewriter {
    /// Create a localizer from the configured cities.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let ledes = config
            .cities
            .list
            .iter()
            .filter_map(|entry| {
                entry
                    .lede
                    .as_ref()
                    .filter(|l| !l.trim().is_empty())
                    .map(|lede| (entry.slug.clone(), lede.trim().to_string()))
            })
            .collect();

        Self {
            marker: config
                .cities
                .boilerplate_marker
                .clone()
                .filter(|m| !m.trim().is_empty()),
            ledes,
        }
    }

    fn remove_boilerplate(&self, html: String) -> String {
        let Some(marker) = &self.marker else {
            return html;
        };
        let mut current = html;
        while let Some(next) = markup::remove_section_containing(&current, marker) {
            current = next;
        }
        current
    }
}

impl Rewriter for LocalizeRewriter {
    fn name(&self) -> &'static str {
        "localize"
    }

    fn applies_to(&self, page: &PageContext) -> bool {
        page.is_city()
    }

    fn rewrite(&self, page: &PageContext, html: &str) -> Result<Option<String>> {
        let slug = page.city_slug.as_deref().unwrap_or_default();
        let lede = self
            .ledes
            .get(slug)
            .ok_or_else(|| RewriteError::MissingLede {
                slug: slug.to_string(),
            })?;

        let out = self.remove_boilerplate(html.to_string());

        let inner = HERO_LEDE_RE
            .captures(&out)
            .and_then(|caps| caps.get(1))
            .map(|m| m.range())
            .ok_or_else(|| RewriteError::missing(page.path(), r#"<p class="hero-lede">"#))?;
        let out = markup::splice(&out, inner, lede);

        Ok((out != html).then_some(out))
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use super::*;

    const CONFIG: &str = r#"
[site]
name = "Iowa Gutter Guards"
base_url = "https://iowagutterguards.online"

[cities]
boilerplate_marker = "designed to stop clogs"

[[cities.list]]
slug = "ames-ia"
lede = "Ames homes see heavy oak leaf drop every fall."

[[cities.list]]
slug = "adel-ia"
"#;

    const CITY_PAGE: &str = r#"<main>
<section class="hero">
  <h1>Gutter Guards in Ames, IA</h1>
  <p class="hero-lede">
    Generic text for every city.
  </p>
</section>
<section class="city-intro">
  <p>We install guards designed to stop clogs and overflow.</p>
</section>
<section id="faq"></section>
</main>"#;

    fn rewriter() -> LocalizeRewriter {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        fs::write(&path, CONFIG).unwrap();
        LocalizeRewriter::new(&Config::load(&path).unwrap())
    }

    fn city(slug: &str) -> PageContext {
        PageContext {
            rel: PathBuf::from(format!("service-areas/{slug}/index.html")),
            url: format!("https://iowagutterguards.online/service-areas/{slug}/"),
            city_slug: Some(slug.to_string()),
            is_home: false,
        }
    }

    #[test]
    fn test_localizes_city_page() {
        let out = rewriter().rewrite(&city("ames-ia"), CITY_PAGE).unwrap().unwrap();
        assert!(out.contains(
            r#"<p class="hero-lede">Ames homes see heavy oak leaf drop every fall.</p>"#
        ));
        assert!(!out.contains("designed to stop clogs"));
        assert!(!out.contains("city-intro"));
        assert!(out.contains(r#"<section id="faq"></section>"#));
    }

    #[test]
    fn test_marker_in_head_does_not_block_removal() {
        let page = format!(
            r#"<head><meta name="description" content="Guards designed to stop clogs."></head>
{CITY_PAGE}"#
        );
        let out = rewriter().rewrite(&city("ames-ia"), &page).unwrap().unwrap();
        assert!(!out.contains("city-intro"));
        assert!(out.contains(r#"content="Guards designed to stop clogs.""#));
    }

    #[test]
    fn test_second_run_is_noop() {
        let r = rewriter();
        let once = r.rewrite(&city("ames-ia"), CITY_PAGE).unwrap().unwrap();
        assert_eq!(r.rewrite(&city("ames-ia"), &once).unwrap(), None);
    }

    #[test]
    fn test_missing_lede_is_an_error() {
        let err = rewriter().rewrite(&city("adel-ia"), CITY_PAGE).unwrap_err();
        assert!(matches!(err, RewriteError::MissingLede { ref slug } if slug == "adel-ia"));
    }

    #[test]
    fn test_missing_hero_lede_is_an_error() {
        let err = rewriter()
            .rewrite(&city("ames-ia"), "<main><h1>Ames</h1></main>")
            .unwrap_err();
        assert!(err.to_string().contains("hero-lede"));
    }

    #[test]
    fn test_only_city_pages() {
        let mut page = city("ames-ia");
        page.city_slug = None;
        assert!(!rewriter().applies_to(&page));
    }
}
