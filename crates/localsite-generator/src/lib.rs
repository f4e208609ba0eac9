//! localsite Generator Library
//!
//! Page generation and SEO file output.
//!
//! # Modules
//!
//! - [`template`] - `{{ NAME }}` placeholder templates
//! - [`pages`] - Shared page context, errors and writer
//! - [`cities`] - City landing pages
//! - [`legal`] - Legal and support pages
//! - [`discovery`] - Page discovery under the site root
//! - [`sitemap`] - XML sitemap generation
//! - [`robots`] - robots.txt generation
//! - [`indexnow`] - IndexNow key file
//! - [`build`] - Build orchestration

pub mod build;
pub mod cities;
pub mod discovery;
pub mod indexnow;
pub mod legal;
pub mod pages;
pub mod robots;
pub mod sitemap;
pub mod template;

pub use build::{BuildStats, Builder};
pub use cities::CityPageGenerator;
pub use discovery::{PageDiscovery, SitePage};
pub use legal::LegalPageGenerator;
pub use robots::RobotsGenerator;
pub use sitemap::SitemapGenerator;
pub use template::{Template, TemplateContext, TemplateRegistry};
