//! Search console verification tags and placeholder analytics.

use localsite_core::config::VerificationConfig;
use regex::Regex;

use crate::{
    engine::{PageContext, Rewriter},
    error::Result,
    markup::{self, escape_html},
};

/// Marker comment that precedes a disabled analytics snippet.
pub const GA_DISABLED_MARKER: &str = "<!-- OPTIONAL: Google Analytics 4";

/// Adds verification meta tags and disables placeholder analytics.
#[derive(Debug, Clone)]
pub struct FinalizeRewriter {
    verification: Vec<(&'static str, String)>,
    placeholder: String,
    gtag_re: Regex,
}

impl FinalizeRewriter {
    /// Create a finalizer. Fails if the placeholder id makes a bad pattern.
    pub fn new(config: VerificationConfig) -> Result<Self> {
        let mut verification = Vec::new();
        if let Some(token) = config.bing.filter(|t| !t.trim().is_empty()) {
            verification.push(("msvalidate.01", token.trim().to_string()));
        }
        if let Some(token) = config.google.filter(|t| !t.trim().is_empty()) {
            verification.push(("google-site-verification", token.trim().to_string()));
        }

        let id = regex::escape(&config.ga_placeholder);
        let gtag_re = Regex::new(&format!(
            r#"(?is)[ \t]*<script\b[^>]*\ssrc\s*=\s*["']https://www\.googletagmanager\.com/gtag/js\?id={id}["'][^>]*>\s*</script>\s*<script\b[^>]*>.*?gtag\(\s*['"]config['"]\s*,\s*['"]{id}['"]\s*\)\s*;?\s*</script>"#
        ))?;

        Ok(Self {
            verification,
            placeholder: config.ga_placeholder,
            gtag_re,
        })
    }

    fn add_verification(&self, html: String) -> String {
        self.verification
            .iter()
            .fold(html, |html, (name, token)| {
                if markup::meta_content(&html, "name", name).is_some() {
                    return html;
                }
                let tag = format!(r#"<meta name="{name}" content="{}" />"#, escape_html(token));
                markup::insert_after_viewport(&html, &tag).unwrap_or(html)
            })
    }

    fn disable_placeholder_analytics(&self, html: String) -> String {
        if html.contains(GA_DISABLED_MARKER) {
            return html;
        }
        let Some(m) = self.gtag_re.find(&html) else {
            return html;
        };
        let replacement = format!(
            "  {GA_DISABLED_MARKER} (GA4). Replace {} with a real measurement ID and uncomment to enable. -->\n  <!--\n{}\n  -->",
            self.placeholder,
            m.as_str()
        );
        markup::splice(&html, m.range(), &replacement)
    }
}

impl Rewriter for FinalizeRewriter {
    fn name(&self) -> &'static str {
        "finalize"
    }

    fn rewrite(&self, _page: &PageContext, html: &str) -> Result<Option<String>> {
        let out = self.add_verification(html.to_string());
        let out = self.disable_placeholder_analytics(out);
        Ok((out != html).then_some(out))
    }
}
