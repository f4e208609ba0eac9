//! Homepage FAQ expansion.
//!
//! Merges configured questions into the `<section id="faq">` list and keeps
//! a `FAQPage` JSON-LD block in step with what is visible. The list and
//! schema helpers are shared with the city page FAQ rewriter.

use std::{collections::HashSet, ops::Range, sync::LazyLock};

use localsite_core::config::{FaqConfig, FaqEntry};
use regex::Regex;
use serde_json::json;

use crate::{
    engine::{PageContext, Rewriter},
    error::{Result, RewriteError},
    markup::{self, escape_html},
    schema::{json_ld_script, question},
};

/// Id of the FAQ JSON-LD script.
pub const FAQ_SCRIPT_ID: &str = "schema-faq";

/// Id of the homepage FAQ section.
pub const FAQ_SECTION_ID: &str = "faq";

static DETAILS_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<details\b[^>]*>.*?</details>").expect("details block pattern is valid")
});

/// Expands the homepage FAQ.
#[derive(Debug, Clone)]
pub struct FaqRewriter {
    extra: Vec<FaqEntry>,
    answer_style: Option<String>,
}

impl FaqRewriter {
    /// Create an FAQ rewriter.
    #[must_use]
    pub fn new(faq: FaqConfig) -> Self {
        Self {
            extra: faq.extra,
            answer_style: faq.answer_style,
        }
    }

    /// Extra entries whose question is not among `existing`.
    ///
    /// Questions compare case-insensitively.
    fn new_entries(&self, existing: &[(String, String)]) -> Vec<(String, String)> {
        let mut seen: HashSet<String> = existing
            .iter()
            .map(|(q, _)| q.trim().to_lowercase())
            .collect();

        self.extra
            .iter()
            .filter(|entry| seen.insert(entry.question.trim().to_lowercase()))
            .map(|entry| {
                (
                    entry.question.trim().to_string(),
                    entry.answer.trim().to_string(),
                )
            })
            .collect()
    }

    /// Existing pairs followed by every extra entry whose question is new.
    #[must_use]
    pub fn merge(&self, existing: Vec<(String, String)>) -> Vec<(String, String)> {
        let added = self.new_entries(&existing);
        let mut merged = existing;
        merged.extend(added);
        merged
    }
}

/// One `<details>` element per question.
#[must_use]
pub fn details_list(faqs: &[(String, String)], answer_style: Option<&str>) -> String {
    let style = answer_style
        .map(|s| format!(r#" style="{}""#, escape_html(s)))
        .unwrap_or_default();
    faqs.iter()
        .map(|(question, answer)| {
            format!(
                "<details>\n  <summary><strong>{}</strong></summary>\n  <p{style}>\n    {}\n  </p>\n</details>",
                escape_html(question),
                escape_html(answer),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The `schema-faq` script for `faqs`.
pub fn faq_schema(faqs: &[(String, String)]) -> Result<String> {
    let doc = json!({
        "@context": "https://schema.org",
        "@type": "FAQPage",
        "mainEntity": faqs.iter().map(|(q, a)| question(q, a)).collect::<Vec<_>>(),
    });
    json_ld_script(FAQ_SCRIPT_ID, &doc)
}

/// Runs of `<details>` blocks separated only by whitespace, relative to `body`.
pub(crate) fn details_runs(body: &str) -> Vec<Range<usize>> {
    let mut runs: Vec<Range<usize>> = Vec::new();
    for block in DETAILS_BLOCK_RE.find_iter(body) {
        match runs.last_mut() {
            Some(run) if body[run.end..block.start()].trim().is_empty() => run.end = block.end(),
            _ => runs.push(block.range()),
        }
    }
    runs
}

/// Offset just before the closing tag of `section`, relative to its start.
pub(crate) fn before_close(section: &str) -> usize {
    section.rfind("</").unwrap_or(section.len())
}

impl Rewriter for FaqRewriter {
    fn name(&self) -> &'static str {
        "faq"
    }

    fn applies_to(&self, page: &PageContext) -> bool {
        page.is_home
    }

    /// Each run of questions is rebuilt in place; new questions join the
    /// last run. Markup between runs is kept.
    fn rewrite(&self, page: &PageContext, html: &str) -> Result<Option<String>> {
        let section = markup::find_section_by_id(html, FAQ_SECTION_ID).ok_or_else(|| {
            RewriteError::missing(page.path(), format!(r#"<section id="{FAQ_SECTION_ID}">"#))
        })?;
        let body = &html[section.clone()];
        let style = self.answer_style.as_deref();

        let runs = details_runs(body);
        let groups: Vec<Vec<(String, String)>> = runs
            .iter()
            .map(|run| markup::details_pairs(&body[run.clone()]))
            .collect();
        let existing: Vec<(String, String)> = groups.iter().flatten().cloned().collect();
        let added = self.new_entries(&existing);
        if existing.is_empty() && added.is_empty() {
            return Ok(None);
        }

        let mut out = html.to_string();
        if runs.is_empty() {
            let close = section.start + before_close(body);
            out = markup::splice(&out, close..close, &format!("{}\n", details_list(&added, style)));
        } else {
            let last = runs.len() - 1;
            for (i, (run, group)) in runs.iter().zip(&groups).enumerate().rev() {
                let list = if i == last {
                    let mut all = group.clone();
                    all.extend(added.iter().cloned());
                    details_list(&all, style)
                } else {
                    details_list(group, style)
                };
                out = markup::splice(
                    &out,
                    section.start + run.start..section.start + run.end,
                    &list,
                );
            }
        }

        let mut faqs = existing;
        faqs.extend(added);
        let out = markup::upsert_script(&out, FAQ_SCRIPT_ID, &faq_schema(&faqs)?);

        Ok((out != html).then_some(out))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const HOME: &str = r#"<html><head><title>Home</title></head><body>
<section id="faq" class="section">
  <h2>FAQ</h2>
  <div class="faq-list">
    <details><summary><strong>Do guards work in heavy rain?</strong></summary>
      <p>Yes, when installed correctly.</p>
    </details>
    <details><summary><strong>How long does install take?</strong></summary>
      <p>Usually a single visit.</p>
    </details>
  </div>
</section>
<section id="contact"></section>
</body></html>"#;

    fn home() -> PageContext {
        PageContext {
            rel: PathBuf::from("index.html"),
            url: "https://example.com/".to_string(),
            city_slug: None,
            is_home: true,
        }
    }

    fn rewriter() -> FaqRewriter {
        FaqRewriter::new(FaqConfig {
            extra: vec![
                FaqEntry {
                    question: "DO GUARDS WORK IN HEAVY RAIN?".to_string(),
                    answer: "Duplicate.".to_string(),
                },
                FaqEntry {
                    question: "Will guards cause ice dams?".to_string(),
                    answer: "No. Ice dams come from heat loss & refreezing.".to_string(),
                },
            ],
            answer_style: Some("margin-top:0.4rem".to_string()),
            ..FaqConfig::default()
        })
    }

    #[test]
    fn test_merge_skips_known_questions() {
        let merged = rewriter().merge(vec![(
            "Do guards work in heavy rain?".to_string(),
            "Yes.".to_string(),
        )]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].0, "Will guards cause ice dams?");
    }

    #[test]
    fn test_expands_list_and_schema() {
        let out = rewriter().rewrite(&home(), HOME).unwrap().unwrap();

        assert_eq!(out.matches("<details>").count(), 3);
        assert!(out.contains("<summary><strong>Will guards cause ice dams?</strong></summary>"));
        assert!(out.contains(r#"<p style="margin-top:0.4rem">"#));
        assert!(out.contains("heat loss &amp; refreezing"));
        assert!(!out.contains("Duplicate."));
        assert!(out.contains(r#"<div class="faq-list">"#));
        assert!(out.contains(r#"<section id="contact"></section>"#));

        let script = &out[markup::find_script_by_id(&out, FAQ_SCRIPT_ID).unwrap()];
        assert_eq!(script.matches(r#""@type":"Question""#).count(), 3);
        assert!(out.find(FAQ_SCRIPT_ID).unwrap() < out.find("</head>").unwrap());
    }

    #[test]
    fn test_second_run_is_noop() {
        let rewriter = rewriter();
        let once = rewriter.rewrite(&home(), HOME).unwrap().unwrap();
        assert_eq!(rewriter.rewrite(&home(), &once).unwrap(), None);
    }

    #[test]
    fn test_markup_between_groups_is_kept() {
        let html = r#"<head></head><section id="faq">
  <h3>Installation</h3>
  <details><summary>How long does install take?</summary><p>One visit.</p></details>
  <h3>Winter</h3>
  <p>Iowa winters are hard on gutters.</p>
  <details><summary>Do guards handle snow?</summary><p>Yes.</p></details>
</section>"#;
        let rewriter = rewriter();
        let out = rewriter.rewrite(&home(), html).unwrap().unwrap();

        assert!(out.contains("<h3>Installation</h3>"));
        assert!(out.contains("<h3>Winter</h3>\n  <p>Iowa winters are hard on gutters.</p>"));
        let winter = out.find("<h3>Winter</h3>").unwrap();
        assert!(out.find("How long does install take?").unwrap() < winter);
        assert!(out.find("Do guards handle snow?").unwrap() > winter);
        assert!(out.find("Will guards cause ice dams?").unwrap() > winter);

        assert_eq!(rewriter.rewrite(&home(), &out).unwrap(), None);
    }

    #[test]
    fn test_details_runs() {
        let body = "<details>a</details>\n  <details>b</details><h3>x</h3><details>c</details>";
        let runs = details_runs(body);
        assert_eq!(runs.len(), 2);
        assert_eq!(&body[runs[1].clone()], "<details>c</details>");
    }

    #[test]
    fn test_empty_section_gets_list() {
        let html = r#"<head></head><section id="faq"><h2>FAQ</h2></section>"#;
        let out = rewriter().rewrite(&home(), html).unwrap().unwrap();
        assert!(out.contains("<h2>FAQ</h2><details>"));
        assert!(out.contains("</details>\n</section>"));
    }

    #[test]
    fn test_missing_section_is_an_error() {
        let err = rewriter().rewrite(&home(), "<p>no faq</p>").unwrap_err();
        assert!(err.to_string().contains(r#"<section id="faq">"#));
    }

    #[test]
    fn test_only_homepage() {
        let mut page = home();
        page.is_home = false;
        assert!(!rewriter().applies_to(&page));
    }
}
