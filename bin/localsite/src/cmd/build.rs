//! Generation commands: full build, city pages, legal pages and SEO files.

use std::{env, path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use localsite_generator::{
    BuildStats, Builder,
    indexnow::{INDEXNOW_ENV, resolve_key},
};

use super::{load_config, site_root};

/// Directory holding the config file; `content_file` and `cities.template`
/// resolve against it.
fn config_dir(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn builder(config_path: &Path, root: &Path) -> Result<Builder> {
    let config = load_config(config_path)?;
    let output = site_root(&config, root);
    let key = resolve_key(env::var(INDEXNOW_ENV).ok(), config.seo.indexnow_key.as_deref());
    Ok(Builder::new(config, config_dir(config_path), output).with_indexnow_key(key))
}

/// Run the build command.
///
/// Generates legal pages, city pages, then sitemap.xml, robots.txt and the
/// IndexNow key file.
pub fn run(config_path: &Path, root: &Path) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?root, "Starting build");

    let stats = builder(config_path, root)?.build().wrap_err("Build failed")?;
    let duration = start.elapsed();

    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Legal pages: {}", stats.legal_pages);
    println!("  City pages:  {}", stats.city_pages);
    print_seo(&stats);
    println!();
    println!("  Duration:    {:.2}s", duration.as_secs_f64());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");
    Ok(())
}

/// Generate city landing pages only.
pub fn cities(config_path: &Path, root: &Path) -> Result<()> {
    let count = builder(config_path, root)?
        .generate_cities()
        .wrap_err("City page generation failed")?;
    println!("  Generated {count} city page(s)");
    Ok(())
}

/// Generate legal and support pages only.
pub fn legal(config_path: &Path, root: &Path) -> Result<()> {
    let count = builder(config_path, root)?
        .generate_legal()
        .wrap_err("Legal page generation failed")?;
    println!("  Generated {count} legal page(s)");
    Ok(())
}

/// Write sitemap.xml, robots.txt and the IndexNow key file.
pub fn seo(config_path: &Path, root: &Path) -> Result<()> {
    let stats = builder(config_path, root)?
        .seo()
        .wrap_err("SEO file generation failed")?;
    print_seo(&stats);
    Ok(())
}

fn print_seo(stats: &BuildStats) {
    println!("  Sitemap:     {} URL(s) under {}", stats.sitemap_urls, stats.base_url);
    if let Some(file) = &stats.indexnow_file {
        println!("  IndexNow:    {file}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir() {
        assert_eq!(config_dir(Path::new("site.toml")), Path::new("."));
        assert_eq!(config_dir(Path::new("config/site.toml")), Path::new("config"));
        assert_eq!(config_dir(Path::new("/srv/site/site.toml")), Path::new("/srv/site"));
    }
}
