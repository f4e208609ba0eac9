//! localsite Rewrite Library
//!
//! Idempotent mutations of HTML pages already on disk.
//!
//! # Modules
//!
//! - [`markup`] - Pattern-based HTML primitives
//! - [`engine`] - Rewriter trait and the engine that applies rewriters
//! - [`schema`] - JSON-LD structured data
//! - [`forms`] - Lead form wiring
//! - [`sections`] - Section removal by id or marker
//! - [`localize`] - City page localization
//! - [`finalize`] - Verification tags and placeholder analytics
//! - [`faq`] - Homepage FAQ expansion
//! - [`city_faq`] - City page FAQs
//! - [`social`] - Open Graph, Twitter cards and lazy images
//! - [`clone`] - City pages re-derived from the homepage

pub mod city_faq;
pub mod clone;
pub mod engine;
pub mod error;
pub mod faq;
pub mod finalize;
pub mod forms;
pub mod localize;
pub mod markup;
pub mod schema;
pub mod sections;
pub mod social;

use localsite_core::Config;

pub use city_faq::CityFaqRewriter;
pub use clone::CloneRewriter;
pub use engine::{PageContext, RewriteEngine, RewriteStats, Rewriter};
pub use error::{Result, RewriteError};
pub use faq::FaqRewriter;
pub use finalize::FinalizeRewriter;
pub use forms::FormsRewriter;
pub use localize::LocalizeRewriter;
pub use schema::SchemaRewriter;
pub use sections::{SectionScope, SectionTarget, StripSection};
pub use social::SocialRewriter;

/// The rewriters `rewrite-all` runs, in order.
///
/// Localization is included when any city has a lede, the homepage FAQ
/// expansion when extra questions are configured, and city FAQs when any city
/// has questions. Schema comes last so it sees the final page.
pub fn standard_rewriters(config: &Config) -> Result<Vec<Box<dyn Rewriter>>> {
    let mut rewriters: Vec<Box<dyn Rewriter>> = Vec::new();

    if config.cities.list.iter().any(|c| c.lede.is_some()) {
        rewriters.push(Box::new(LocalizeRewriter::new(config)));
    }
    rewriters.push(Box::new(FormsRewriter::new(config.forms.clone())));
    rewriters.push(Box::new(FinalizeRewriter::new(config.verification.clone())?));
    rewriters.push(Box::new(SocialRewriter::new(config)));
    if !config.faq.extra.is_empty() {
        rewriters.push(Box::new(FaqRewriter::new(config.faq.clone())));
    }
    let city_faq = CityFaqRewriter::new(config);
    if !city_faq.is_empty() {
        rewriters.push(Box::new(city_faq));
    }
    rewriters.push(Box::new(SchemaRewriter::new(config.clone())));

    Ok(rewriters)
}
