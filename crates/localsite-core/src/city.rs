//! City model for service-area landing pages.

use crate::{
    config::CityEntry,
    error::{CoreError, Result},
};

/// A service-area city with its display attributes resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct City {
    /// URL slug, e.g. "des-moines-ia".
    pub slug: String,

    /// Display name, e.g. "Des Moines".
    pub name: String,

    /// Nearby towns mentioned on the page.
    pub nearby: Option<String>,

    /// Paragraph unique to this city.
    pub lede: Option<String>,
}

impl City {
    /// Build a city from a config entry, deriving the name from the slug when needed.
    #[must_use]
    pub fn from_entry(entry: &CityEntry, suffix: &str) -> Self {
        let name = entry
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| name_from_slug(&entry.slug, suffix));

        Self {
            slug: entry.slug.clone(),
            name,
            nearby: entry.nearby.clone(),
            lede: entry.lede.clone(),
        }
    }

    /// Name with region code, e.g. "Des Moines, IA".
    #[must_use]
    pub fn display_name(&self, region: &str) -> String {
        format!("{}, {region}", self.name)
    }
}

/// Derive a display name from a slug.
///
/// A trailing `-<suffix>` is dropped and each remaining word capitalized:
/// `"west-des-moines-ia"` becomes `"West Des Moines"`.
#[must_use]
pub fn name_from_slug(slug: &str, suffix: &str) -> String {
    let slug = slug.trim().to_lowercase();
    let tail = format!("-{}", suffix.to_lowercase());
    let stem = if suffix.is_empty() {
        slug.as_str()
    } else {
        slug.strip_suffix(&tail).unwrap_or(&slug)
    };

    stem.split('-')
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Slugs are non-empty and limited to lowercase letters, digits and dashes.
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() {
        return Err(CoreError::city(slug, "slug cannot be empty"));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(CoreError::city(slug, "slug cannot start or end with '-'"));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CoreError::city(
            slug,
            "slug may only contain lowercase letters, digits and '-'",
        ));
    }
    Ok(())
}
