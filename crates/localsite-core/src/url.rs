//! Mapping between files under the site root and public URLs.

use std::path::{Component, Path};

/// Relative path with `/` separators regardless of platform.
#[must_use]
pub fn to_posix(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Public URL for a file relative to the site root.
///
/// `index.html` maps to `base/`, `a/b/index.html` to `base/a/b/`, and any
/// other file keeps its name.
#[must_use]
pub fn page_url(base: &str, rel: &Path) -> String {
    let base = base.trim_end_matches('/');
    let rel = to_posix(rel);

    if rel == "index.html" {
        return format!("{base}/");
    }
    match rel.strip_suffix("index.html") {
        Some(dir) if dir.ends_with('/') => format!("{base}/{dir}"),
        _ => format!("{base}/{rel}"),
    }
}

/// Slug of a city page: `<cities_root>/<slug>/index.html` yields `slug`.
#[must_use]
pub fn city_slug_from_path(rel: &Path, cities_root: &str) -> Option<String> {
    let rel = to_posix(rel);
    let parts: Vec<&str> = rel.split('/').collect();
    match parts.as_slice() {
        [root, slug, "index.html"] if *root == cities_root.trim_matches('/') => {
            Some((*slug).to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_page_url_home() {
        assert_eq!(
            page_url("https://example.com/", Path::new("index.html")),
            "https://example.com/"
        );
    }

    #[test]
    fn test_page_url_directory_index() {
        let rel = PathBuf::from("service-areas").join("ankeny-ia").join("index.html");
        assert_eq!(
            page_url("https://example.com", &rel),
            "https://example.com/service-areas/ankeny-ia/"
        );
    }

    #[test]
    fn test_page_url_plain_file() {
        assert_eq!(
            page_url("https://example.com", Path::new("thanks.html")),
            "https://example.com/thanks.html"
        );
        assert_eq!(
            page_url("https://example.com", Path::new("notindex.html")),
            "https://example.com/notindex.html"
        );
    }

    #[test]
    fn test_city_slug_from_path() {
        assert_eq!(
            city_slug_from_path(Path::new("service-areas/ames-ia/index.html"), "service-areas"),
            Some("ames-ia".to_string())
        );
        assert_eq!(
            city_slug_from_path(Path::new("warranty/index.html"), "service-areas"),
            None
        );
        assert_eq!(
            city_slug_from_path(Path::new("service-areas/index.html"), "service-areas"),
            None
        );
    }
}
