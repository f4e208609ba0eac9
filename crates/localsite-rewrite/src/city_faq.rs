//! City page FAQs.
//!
//! Rebuilds the questions in each city page's `<section id="faq">` from the
//! city's own entries followed by the shared `faq.city` entries, and keeps
//! the `schema-faq` JSON-LD block in step.

use std::{collections::HashMap, sync::LazyLock};

use localsite_core::{City, Config, config::FaqEntry};
use regex::{Captures, Regex};

use crate::{
    engine::{PageContext, Rewriter},
    error::{Result, RewriteError},
    faq::{FAQ_SCRIPT_ID, FAQ_SECTION_ID, before_close, details_list, details_runs, faq_schema},
    markup::{self, escape_html},
};

static H2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h2\b([^>]*)>(.*?)</h2>").expect("h2 pattern is valid"));

#[derive(Debug, Clone)]
struct CityFaq {
    heading: Option<String>,
    faqs: Vec<(String, String)>,
}

/// Rewrites city page FAQ lists.
#[derive(Debug, Clone)]
pub struct CityFaqRewriter {
    cities: HashMap<String, CityFaq>,
    answer_style: Option<String>,
}

impl CityFaqRewriter {
    /// Resolve every configured city's questions.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let cities = config
            .cities
            .list
            .iter()
            .map(|entry| {
                let city = City::from_entry(entry, &config.cities.slug_suffix);
                let subst = |text: &str| fill(text, config, &city);
                let faqs = entry
                    .faq
                    .iter()
                    .chain(&config.faq.city)
                    .map(|FaqEntry { question, answer }| {
                        (
                            subst(question.as_str()).trim().to_string(),
                            subst(answer.as_str()).trim().to_string(),
                        )
                    })
                    .filter(|(q, a)| !q.is_empty() && !a.is_empty())
                    .collect();
                let heading = config.faq.city_heading.as_deref().map(subst);
                (entry.slug.clone(), CityFaq { heading, faqs })
            })
            .filter(|(_, faq)| !faq.faqs.is_empty())
            .collect();

        Self {
            cities,
            answer_style: config.faq.answer_style.clone(),
        }
    }

    /// Whether any city has questions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Questions for one city, in page order.
    #[must_use]
    pub fn faqs(&self, slug: &str) -> Option<&[(String, String)]> {
        self.cities.get(slug).map(|faq| faq.faqs.as_slice())
    }

    fn rebuild(&self, faq: &CityFaq, body: &str) -> String {
        let list = details_list(&faq.faqs, self.answer_style.as_deref());
        let runs = details_runs(body);

        let mut body = body.to_string();
        match runs.split_first() {
            Some((first, rest)) => {
                for run in rest.iter().rev() {
                    body = markup::splice(&body, run.clone(), "");
                }
                body = markup::splice(&body, first.clone(), &list);
            }
            None => {
                let close = before_close(&body);
                body = markup::splice(&body, close..close, &format!("{list}\n"));
            }
        }

        match &faq.heading {
            Some(heading) => H2_RE
                .replacen(&body, 1, |caps: &Captures<'_>| {
                    format!("<h2{}>{}</h2>", &caps[1], escape_html(heading))
                })
                .into_owned(),
            None => body,
        }
    }
}

/// Substitute `{city}`, `{nearby}`, `{region}` and `{site}`.
fn fill(text: &str, config: &Config, city: &City) -> String {
    text.replace("{city}", &city.name)
        .replace("{nearby}", city.nearby.as_deref().unwrap_or(config.region_name()))
        .replace("{region}", &config.site.region)
        .replace("{site}", &config.site.name)
}

impl Rewriter for CityFaqRewriter {
    fn name(&self) -> &'static str {
        "city-faq"
    }

    fn applies_to(&self, page: &PageContext) -> bool {
        page.city_slug
            .as_deref()
            .is_some_and(|slug| self.cities.contains_key(slug))
    }

    fn rewrite(&self, page: &PageContext, html: &str) -> Result<Option<String>> {
        let Some(faq) = page.city_slug.as_deref().and_then(|slug| self.cities.get(slug)) else {
            return Ok(None);
        };
        let section = markup::find_section_by_id(html, FAQ_SECTION_ID).ok_or_else(|| {
            RewriteError::missing(page.path(), format!(r#"<section id="{FAQ_SECTION_ID}">"#))
        })?;

        let body = self.rebuild(faq, &html[section.clone()]);
        let out = markup::splice(html, section, &body);
        let out = markup::upsert_script(&out, FAQ_SCRIPT_ID, &faq_schema(&faq.faqs)?);

        Ok((out != html).then_some(out))
    }
}
