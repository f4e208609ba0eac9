//! Section removal by id or marker.

use std::{fmt, str::FromStr};

use crate::{
    engine::{PageContext, Rewriter},
    error::Result,
    markup,
};

/// Which pages a section removal touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SectionScope {
    /// Every page.
    #[default]
    All,
    /// The homepage only.
    Home,
    /// City pages only.
    Cities,
}

impl SectionScope {
    /// Whether `page` is in scope.
    #[must_use]
    pub fn includes(self, page: &PageContext) -> bool {
        match self {
            Self::All => true,
            Self::Home => page.is_home,
            Self::Cities => page.is_city(),
        }
    }
}

impl FromStr for SectionScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "home" => Ok(Self::Home),
            "cities" | "city" => Ok(Self::Cities),
            other => Err(format!("unknown scope '{other}' (expected all, home or cities)")),
        }
    }
}

impl fmt::Display for SectionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Home => "home",
            Self::Cities => "cities",
        })
    }
}

/// How the section to remove is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionTarget {
    /// `<section id="...">`.
    Id(String),
    /// A marker string such as `<!-- Trust Badges Section -->`, either inside
    /// the section or directly before it.
    Marker(String),
}

impl SectionTarget {
    fn remove(&self, html: &str) -> Option<String> {
        match self {
            Self::Id(id) => markup::remove_section_by_id(html, id),
            Self::Marker(marker) => markup::remove_marked_section(html, marker),
        }
    }
}

impl fmt::Display for SectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id '{id}'"),
            Self::Marker(marker) => write!(f, "marker '{marker}'"),
        }
    }
}

/// Removes matching sections, nested sections included.
#[derive(Debug, Clone)]
pub struct StripSection {
    target: SectionTarget,
    scope: SectionScope,
}

impl StripSection {
    /// Remove sections matching `target` from pages in `scope`.
    #[must_use]
    pub fn new(target: SectionTarget, scope: SectionScope) -> Self {
        Self { target, scope }
    }

    /// Remove `<section id="id">` from pages in `scope`.
    #[must_use]
    pub fn by_id(id: impl Into<String>, scope: SectionScope) -> Self {
        Self::new(SectionTarget::Id(id.into()), scope)
    }

    /// Remove the section labelled by `marker` from pages in `scope`.
    #[must_use]
    pub fn by_marker(marker: impl Into<String>, scope: SectionScope) -> Self {
        Self::new(SectionTarget::Marker(marker.into()), scope)
    }
}

impl Rewriter for StripSection {
    fn name(&self) -> &'static str {
        "strip-section"
    }

    fn applies_to(&self, page: &PageContext) -> bool {
        self.scope.includes(page)
    }

    fn rewrite(&self, _page: &PageContext, html: &str) -> Result<Option<String>> {
        let mut current: Option<String> = None;
        while let Some(next) = self.target.remove(current.as_deref().unwrap_or(html)) {
            current = Some(next);
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn page(rel: &str, city: Option<&str>) -> PageContext {
        PageContext {
            rel: PathBuf::from(rel),
            url: format!("https://example.com/{rel}"),
            city_slug: city.map(ToString::to_string),
            is_home: rel == "index.html",
        }
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!("home".parse::<SectionScope>().unwrap(), SectionScope::Home);
        assert_eq!("Cities".parse::<SectionScope>().unwrap(), SectionScope::Cities);
        assert!("nowhere".parse::<SectionScope>().is_err());
        assert_eq!(SectionScope::Cities.to_string(), "cities");
    }

    #[test]
    fn test_scope_includes() {
        let home = page("index.html", None);
        let city = page("service-areas/ames-ia/index.html", Some("ames-ia"));
        assert!(SectionScope::Home.includes(&home));
        assert!(!SectionScope::Home.includes(&city));
        assert!(SectionScope::Cities.includes(&city));
        assert!(SectionScope::All.includes(&home));
    }

    #[test]
    fn test_strip_contact_section() {
        let html = r#"<main><section id="hero">Hi</section>
<section id="contact"><section><p>Text us</p></section></section>
</main>"#;
        let strip = StripSection::by_id("contact", SectionScope::All);
        let page = page("index.html", None);

        let out = strip.rewrite(&page, html).unwrap().unwrap();
        assert_eq!(out, "<main><section id=\"hero\">Hi</section>\n\n</main>");
        assert_eq!(strip.rewrite(&page, &out).unwrap(), None);
    }

    #[test]
    fn test_strip_by_marker() {
        let html = r#"<main>
  <section class="hero"><h1>Hi</h1></section>
  <!-- Trust Badges Section -->
  <section class="trust-badges">
    <div class="trust-badge">10+ Years Experience</div>
  </section>
  <section id="faq"><p>Questions</p></section>
</main>"#;
        let strip = StripSection::by_marker("<!-- Trust Badges Section -->", SectionScope::Home);
        let page = page("index.html", None);

        let out = strip.rewrite(&page, html).unwrap().unwrap();
        assert!(!out.contains("Trust Badges"));
        assert!(!out.contains("Years Experience"));
        assert!(out.contains("<h1>Hi</h1>"));
        assert!(out.contains("<p>Questions</p>"));
        assert_eq!(strip.rewrite(&page, &out).unwrap(), None);
    }

    #[test]
    fn test_target_display() {
        assert_eq!(SectionTarget::Id("contact".to_string()).to_string(), "id 'contact'");
        assert_eq!(
            SectionTarget::Marker("<!-- Promo -->".to_string()).to_string(),
            "marker '<!-- Promo -->'"
        );
    }
}
