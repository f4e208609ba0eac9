//! HTML template system for page generation.
//!
//! Placeholders are written `{{ NAME }}` (inner whitespace optional, so the
//! `{{CITY_NAME}}` form used by hand-written templates works too). A trailing
//! `?` marks a placeholder as optional.

use std::{collections::HashMap, fs, path::Path};

use thiserror::Error;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("missing required variable: {0}")]
    MissingVariable(String),

    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Invalid template syntax.
    #[error("invalid template syntax: {0}")]
    InvalidSyntax(String),

    /// Template file could not be read.
    #[error("failed to read template {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Template context with variables for interpolation.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable into the context.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Insert a variable only when a value is present.
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Create context with initial variables.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a variable value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Merge another context into this one; its values win.
    pub fn extend(&mut self, other: &TemplateContext) {
        for (key, value) in &other.variables {
            self.variables.insert(key.clone(), value.clone());
        }
    }
}

/// A simple template that supports variable interpolation.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    /// Create a new template with the given name and content.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Load a template from disk.
    pub fn from_file(name: impl Into<String>, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(name, content))
    }

    /// Get the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the template with the given context.
    ///
    /// Substituted values are never scanned for further placeholders.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut result = self.content.clone();
        let mut pos = 0;

        while let Some(start) = result[pos..].find("{{") {
            let start = pos + start;
            let end = result[start..]
                .find("}}")
                .ok_or_else(|| TemplateError::InvalidSyntax("unclosed {{ delimiter".to_string()))?;
            let end = start + end + 2;

            let var_name = result[start + 2..end - 2].trim();

            let (var_name, optional) = if let Some(stripped) = var_name.strip_suffix('?') {
                (stripped.trim_end(), true)
            } else {
                (var_name, false)
            };

            let value = match context.get(var_name) {
                Some(v) => v.to_string(),
                None if optional => String::new(),
                None => return Err(TemplateError::MissingVariable(var_name.to_string())),
            };

            result.replace_range(start..end, &value);
            pos = start + value.len();
        }

        Ok(result)
    }
}

/// Registry of templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    /// Create a new registry with default templates.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(Template::new("city", DEFAULT_CITY_TEMPLATE));
        registry.register(Template::new("legal", DEFAULT_LEGAL_TEMPLATE));
        registry
    }

    /// Register a template, replacing any with the same name.
    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Get a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Render a named template with the given context.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        template.render(context)
    }
}

/// Default city landing page.
pub const DEFAULT_CITY_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>{{ CITY_TITLE }} | {{ SITE_NAME }}</title>
<meta name="description" content="Professional service from {{ SITE_NAME }} in {{ CITY_TITLE }} and nearby communities." />
<link rel="canonical" href="{{ BASE_URL }}/{{ CITIES_ROOT }}/{{ CITY_SLUG }}/" />
<link rel="stylesheet" href="/styles.css" />
</head>
<body>
<div class="page">
<header>
  <nav class="main-nav">
    <a href="/">Home</a>
    <a href="/#service-areas">Service Areas</a>
    <a href="/#faq">FAQ</a>
    <a href="/#contact">Contact</a>
  </nav>
</header>

<main>
<section class="section hero">
<h1>{{ SITE_NAME }} in {{ CITY_TITLE }}</h1>
<p class="hero-lede">{{ CITY_LEDE? }}</p>
<p>If you live in {{ CITY_NAME }} or nearby communities like {{ NEARBY_TOWNS? }}, {{ SITE_NAME }} is ready to help.</p>
<p><a href="/#estimate-form" class="btn-primary">Request Your Estimate</a></p>
</section>
<section class="section" id="faq">
<h2>Frequently Asked Questions</h2>
</section>
</main>

<footer>
<p><strong>{{ SITE_NAME }}</strong> &middot; {{ PHONE? }} &middot; {{ EMAIL? }}</p>
<p>
{{ FOOTER_LINKS? }}
</p>
</footer>
</div>
</body>
</html>
"#;

/// Default legal or support page.
pub const DEFAULT_LEGAL_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>{{ TITLE }}</title>
<link rel="canonical" href="{{ BASE_URL }}/{{ SLUG }}/" />
<link rel="stylesheet" href="/styles.css">
</head>
<body>
<div class="page">
{{ CONTENT }}
<footer>
<p>{{ FOOTER_LINKS? }}</p>
</footer>
</div>
</body>
</html>
"#;
