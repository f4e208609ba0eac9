//! Site configuration management.

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    city::{City, validate_slug},
    error::{CoreError, Result},
};

/// Main configuration structure for localsite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Business identity and site-wide settings.
    pub site: SiteConfig,

    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// City landing pages.
    #[serde(default)]
    pub cities: CitiesConfig,

    /// Legal and support pages.
    #[serde(default)]
    pub legal: Vec<LegalPage>,

    /// Sitemap, robots and IndexNow settings.
    #[serde(default)]
    pub seo: SeoConfig,

    /// JSON-LD settings.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Lead form rewriting settings.
    #[serde(default)]
    pub forms: FormsConfig,

    /// Search console verification and analytics placeholders.
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Homepage FAQ expansion.
    #[serde(default)]
    pub faq: FaqConfig,

    /// Lead delivery.
    #[serde(default)]
    pub lead: LeadConfig,

    /// City pages cloned from the homepage.
    #[serde(default)]
    pub clone: CloneConfig,
}

/// Business identity and site-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Business name, also used as the site name.
    pub name: String,

    /// Base URL for the site (e.g., "https://example.com").
    pub base_url: String,

    /// Region code used in city titles and postal addresses.
    #[serde(default = "default_region")]
    pub region: String,

    /// Human readable region name (e.g., "Central Iowa").
    #[serde(default)]
    pub region_name: Option<String>,

    /// ISO country code.
    #[serde(default = "default_country")]
    pub country: String,

    /// Telephone in E.164-ish form for schema (e.g., "+1-515-329-5128").
    #[serde(default)]
    pub telephone: Option<String>,

    /// Telephone as shown to visitors.
    #[serde(default)]
    pub phone_display: Option<String>,

    /// Public contact e-mail.
    #[serde(default)]
    pub email: Option<String>,

    /// Default meta description.
    #[serde(default)]
    pub description: Option<String>,

    /// Open Graph locale.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Site-relative or absolute image used for social cards.
    #[serde(default)]
    pub og_image: Option<String>,
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Site root that pages are written to and read from.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Directory names skipped when walking the site.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

/// City landing page configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitiesConfig {
    /// Template file; the built-in city template is used when unset.
    #[serde(default)]
    pub template: Option<String>,

    /// Directory under the site root holding one folder per city.
    #[serde(default = "default_cities_root")]
    pub output_root: String,

    /// Slug suffix stripped when deriving a city name (e.g., "ia").
    #[serde(default = "default_slug_suffix")]
    pub slug_suffix: String,

    /// Sentence identifying the shared boilerplate block on city pages.
    #[serde(default)]
    pub boilerplate_marker: Option<String>,

    /// Cities to generate.
    #[serde(default)]
    pub list: Vec<CityEntry>,
}

/// A single city entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityEntry {
    /// URL slug, e.g. "des-moines-ia".
    pub slug: String,

    /// Display name; derived from the slug when absent.
    #[serde(default)]
    pub name: Option<String>,

    /// Nearby towns, e.g. "West Des Moines and Altoona".
    #[serde(default)]
    pub nearby: Option<String>,

    /// Paragraph unique to this city.
    #[serde(default)]
    pub lede: Option<String>,

    /// Questions about this city, listed before `faq.city`.
    #[serde(default)]
    pub faq: Vec<FaqEntry>,
}

/// A legal or support page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalPage {
    /// Folder name under the site root.
    pub slug: String,

    /// Document title.
    pub title: String,

    /// Footer link label; the title up to the first `|` when absent.
    #[serde(default)]
    pub label: Option<String>,

    /// Inline HTML body.
    #[serde(default)]
    pub content: Option<String>,

    /// HTML body read from a file relative to the config file.
    #[serde(default)]
    pub content_file: Option<String>,
}

impl LegalPage {
    /// Label used in footer navigation.
    #[must_use]
    pub fn link_label(&self) -> &str {
        match &self.label {
            Some(label) => label,
            None => self.title.split('|').next().unwrap_or(&self.title).trim(),
        }
    }
}

/// Sitemap, robots and IndexNow configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeoConfig {
    /// Paths to disallow in robots.txt.
    #[serde(default)]
    pub disallow: Vec<String>,

    /// Paths to allow in robots.txt.
    #[serde(default)]
    pub allow: Vec<String>,

    /// IndexNow key; `INDEXNOW_KEY` takes precedence at build time.
    #[serde(default)]
    pub indexnow_key: Option<String>,
}

/// JSON-LD configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Schema.org type of the business node.
    #[serde(default = "default_business_type")]
    pub business_type: String,

    /// Price range shown on the homepage business node.
    #[serde(default)]
    pub price_range: Option<String>,

    /// Site-relative image for the business node.
    #[serde(default)]
    pub image: Option<String>,

    /// Service offered (e.g., "Gutter Guard Installation").
    #[serde(default)]
    pub service_name: Option<String>,

    /// Schema.org serviceType value.
    #[serde(default)]
    pub service_type: Option<String>,

    /// Service area center and radius.
    #[serde(default)]
    pub geo: Option<GeoConfig>,

    /// Opening hours.
    #[serde(default)]
    pub hours: Vec<HoursConfig>,
}

/// Service area as a geo circle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in meters.
    pub radius_m: u32,
}

/// One opening hours specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoursConfig {
    pub days: Vec<String>,
    pub opens: String,
    pub closes: String,
}

/// Lead form rewriting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormsConfig {
    /// Endpoint lead forms should post to.
    #[serde(default = "default_form_action")]
    pub action: String,

    /// Name of the hidden honeypot input.
    #[serde(default = "default_honeypot_field")]
    pub honeypot_field: String,

    /// Submit button text that identifies the lead form.
    #[serde(default)]
    pub submit_text: Option<String>,
}

/// Search console verification and analytics placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Bing Webmaster Tools token (`msvalidate.01`).
    #[serde(default)]
    pub bing: Option<String>,

    /// Google Search Console token.
    #[serde(default)]
    pub google: Option<String>,

    /// Placeholder GA4 measurement id whose snippet gets commented out.
    #[serde(default = "default_ga_placeholder")]
    pub ga_placeholder: String,
}

/// Homepage and city page FAQ configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaqConfig {
    /// Entries appended after the existing questions.
    #[serde(default)]
    pub extra: Vec<FaqEntry>,

    /// Inline style applied to generated answer paragraphs.
    #[serde(default)]
    pub answer_style: Option<String>,

    /// Questions on every city page after the city's own. `{city}`,
    /// `{nearby}`, `{region}` and `{site}` are substituted.
    #[serde(default)]
    pub city: Vec<FaqEntry>,

    /// Heading of the city page FAQ section, with the same placeholders.
    #[serde(default)]
    pub city_heading: Option<String>,
}

/// A question and its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Lead delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadConfig {
    /// Recipient address; `LEAD_TO` overrides.
    #[serde(default)]
    pub to: Option<String>,

    /// Sender address; `LEAD_FROM` overrides.
    #[serde(default)]
    pub from: Option<String>,

    /// Where browser submissions are redirected after success.
    #[serde(default = "default_lead_redirect")]
    pub redirect: String,

    /// Subject line prefix.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

/// City pages cloned from the homepage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneConfig {
    /// Heading prefix, e.g. "Gutter Guards in".
    #[serde(default = "default_heading_prefix")]
    pub heading_prefix: String,

    /// Meta description; `{city}`, `{region}` and `{site}` are substituted.
    #[serde(default = "default_clone_description")]
    pub description: String,

    /// Intro paragraph HTML; same substitutions as `description`.
    #[serde(default = "default_clone_intro")]
    pub intro: String,
}

// Default value functions
fn default_region() -> String {
    "IA".to_string()
}

fn default_country() -> String {
    "US".to_string()
}

fn default_locale() -> String {
    "en_US".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_exclude_dirs() -> Vec<String> {
    [
        ".git",
        ".github",
        ".cache",
        ".wrangler",
        "assets",
        "audit",
        "backups",
        "build",
        "data",
        "dist",
        "functions",
        "node_modules",
        "tools",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn default_cities_root() -> String {
    "service-areas".to_string()
}

fn default_slug_suffix() -> String {
    "ia".to_string()
}

fn default_business_type() -> String {
    "LocalBusiness".to_string()
}

fn default_form_action() -> String {
    "/api/lead".to_string()
}

fn default_honeypot_field() -> String {
    "website".to_string()
}

fn default_ga_placeholder() -> String {
    "G-XXXXXXXXXX".to_string()
}

fn default_lead_redirect() -> String {
    "/thanks/".to_string()
}

fn default_subject_prefix() -> String {
    "New Lead".to_string()
}

fn default_heading_prefix() -> String {
    "Services in".to_string()
}

fn default_clone_description() -> String {
    "{site} serves homeowners in {city}, {region}. Get a fast online quote.".to_string()
}

fn default_clone_intro() -> String {
    "<strong>{site} serves {city}, {region}</strong>. Get a fast online quote, then we will confirm details and schedule your project.".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            exclude_dirs: default_exclude_dirs(),
        }
    }
}

impl Default for CitiesConfig {
    fn default() -> Self {
        Self {
            template: None,
            output_root: default_cities_root(),
            slug_suffix: default_slug_suffix(),
            boilerplate_marker: None,
            list: Vec::new(),
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            business_type: default_business_type(),
            price_range: None,
            image: None,
            service_name: None,
            service_type: None,
            geo: None,
            hours: Vec::new(),
        }
    }
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            action: default_form_action(),
            honeypot_field: default_honeypot_field(),
            submit_text: None,
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            bing: None,
            google: None,
            ga_placeholder: default_ga_placeholder(),
        }
    }
}

impl Default for LeadConfig {
    fn default() -> Self {
        Self {
            to: None,
            from: None,
            redirect: default_lead_redirect(),
            subject_prefix: default_subject_prefix(),
        }
    }
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            heading_prefix: default_heading_prefix(),
            description: default_clone_description(),
            intro: default_clone_intro(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `LOCALSITE__SECTION__KEY` environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("LOCALSITE").separator("__"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.site.name.trim().is_empty() {
            return Err(CoreError::config("site.name cannot be empty"));
        }

        if self.site.base_url.trim().is_empty() {
            return Err(CoreError::config("site.base_url cannot be empty"));
        }

        if self.site.base_url.ends_with('/') {
            tracing::warn!("site.base_url should not have a trailing slash");
        }

        let mut seen = HashSet::new();
        for entry in &self.cities.list {
            validate_slug(&entry.slug)?;
            if !seen.insert(entry.slug.as_str()) {
                return Err(CoreError::city(&entry.slug, "duplicate slug"));
            }
        }

        for page in &self.legal {
            validate_slug(&page.slug)?;
            if page.content.is_none() && page.content_file.is_none() {
                return Err(CoreError::config(format!(
                    "legal page '{}' needs content or content_file",
                    page.slug
                )));
            }
        }

        if let Some(key) = &self.seo.indexnow_key {
            validate_indexnow_key(key)?;
        }

        Ok(())
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.site.base_url.trim_end_matches('/')
    }

    /// Get the full URL for a path.
    pub fn url_for(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{path}", self.base_url())
    }

    /// Region name used for service areas, falling back to the region code.
    #[must_use]
    pub fn region_name(&self) -> &str {
        self.site.region_name.as_deref().unwrap_or(&self.site.region)
    }

    /// All configured cities with derived names.
    #[must_use]
    pub fn cities(&self) -> Vec<City> {
        self.cities
            .list
            .iter()
            .map(|entry| City::from_entry(entry, &self.cities.slug_suffix))
            .collect()
    }

    /// Look up a configured city by slug.
    #[must_use]
    pub fn city(&self, slug: &str) -> Option<City> {
        self.cities
            .list
            .iter()
            .find(|entry| entry.slug == slug)
            .map(|entry| City::from_entry(entry, &self.cities.slug_suffix))
    }
}

/// Check an IndexNow key: 8 to 128 ASCII letters or digits.
pub fn validate_indexnow_key(key: &str) -> Result<()> {
    let valid = (8..=128).contains(&key.len()) && key.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(CoreError::config(
            "IndexNow key must be 8-128 letters or digits",
        ))
    }
}
