//! Lead form wiring.
//!
//! Points every lead form at the lead endpoint and makes sure the page has a
//! hidden honeypot input.

use std::sync::LazyLock;

use localsite_core::config::FormsConfig;
use regex::{NoExpand, Regex};

use crate::{
    engine::{PageContext, Rewriter},
    error::Result,
    markup::{self, attr, escape_html},
};

static FORM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(<form\b[^>]*>)(.*?)</form>").expect("form pattern is valid")
});

static INPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<input\b[^>]*>").expect("input pattern is valid"));

static LEAD_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<(?:input|textarea|select)\b[^>]*\sname\s*=\s*["'](?:name|full_?name|email|phone|tel|telephone)["']"#,
    )
    .expect("lead field pattern is valid")
});

static SUBMIT_BUTTON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<button\b[^>]*\stype\s*=\s*["']submit["'][^>]*>(.*?)</button>"#)
        .expect("submit button pattern is valid")
});

static ONSUBMIT_RE: LazyLock<Regex> = LazyLock::new(|| attr_pattern("onsubmit"));
static ENCTYPE_RE: LazyLock<Regex> = LazyLock::new(|| attr_pattern("enctype"));
static METHOD_RE: LazyLock<Regex> = LazyLock::new(|| attr_pattern("method"));
static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| attr_pattern("action"));
static CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| attr_pattern("accept-charset"));

static SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

fn attr_pattern(name: &str) -> Regex {
    Regex::new(&format!(
        r#"(?is)\s+{name}\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#
    ))
    .expect("attribute pattern is valid")
}

/// Set an attribute on an opening tag, replacing any existing value.
fn set_attr(tag: &str, re: &Regex, name: &str, value: &str) -> String {
    let attribute = format!(r#" {name}="{}""#, escape_html(value));
    if re.is_match(tag) {
        return re.replacen(tag, 1, NoExpand(&attribute)).into_owned();
    }
    let end = tag.len() - 1;
    format!("{}{attribute}>", &tag[..end])
}

/// Rewrites lead forms to post to the lead endpoint.
#[derive(Debug, Clone)]
pub struct FormsRewriter {
    action: String,
    honeypot_field: String,
    submit_text: Option<String>,
}

impl FormsRewriter {
    /// Create a forms rewriter.
    #[must_use]
    pub fn new(forms: FormsConfig) -> Self {
        Self {
            action: forms.action,
            honeypot_field: forms.honeypot_field,
            submit_text: forms.submit_text,
        }
    }

    /// Whether a form looks like the site's lead form.
    #[must_use]
    pub fn is_lead_form(&self, open_tag: &str, body: &str) -> bool {
        let lower = open_tag.to_ascii_lowercase();
        if lower.contains("mailto:") || lower.contains("handlesubmit") {
            return true;
        }
        if attr(open_tag, "action").is_some_and(|a| a == self.action) {
            return true;
        }
        if LEAD_FIELD_RE.is_match(body) {
            return true;
        }
        self.submit_text.as_deref().is_some_and(|text| {
            SUBMIT_BUTTON_RE
                .captures_iter(body)
                .any(|caps| markup::strip_tags(&caps[1]).eq_ignore_ascii_case(text.trim()))
        })
    }

    /// Opening tag with inline handlers removed and method, action and
    /// charset set.
    #[must_use]
    pub fn patch_open_tag(&self, tag: &str) -> String {
        let tag = ONSUBMIT_RE.replace_all(tag, "");
        let tag = ENCTYPE_RE.replace_all(&tag, "");
        let tag = set_attr(&tag, &METHOD_RE, "method", "POST");
        let tag = set_attr(&tag, &ACTION_RE, "action", &self.action);
        let tag = set_attr(&tag, &CHARSET_RE, "accept-charset", "UTF-8");
        SPACE_RE.replace_all(&tag, " ").replace(" >", ">")
    }

    fn honeypot_html(&self) -> String {
        format!(
            r#"
  <div style="position:absolute;left:-10000px;top:auto;width:1px;height:1px;overflow:hidden" aria-hidden="true">
    <label>Leave this field empty <input type="text" name="{}" tabindex="-1" autocomplete="off"></label>
  </div>"#,
            escape_html(&self.honeypot_field)
        )
    }

    fn has_honeypot(&self, html: &str) -> bool {
        INPUT_RE.find_iter(html).any(|m| {
            attr(m.as_str(), "name").is_some_and(|name| name == self.honeypot_field)
        })
    }
}

impl Rewriter for FormsRewriter {
    fn name(&self) -> &'static str {
        "forms"
    }

    fn rewrite(&self, _page: &PageContext, html: &str) -> Result<Option<String>> {
        let mut out = String::with_capacity(html.len() + 512);
        let mut last = 0;
        let mut honeypot_at = None;

        for caps in FORM_RE.captures_iter(html) {
            let (Some(open), Some(body)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if !self.is_lead_form(open.as_str(), body.as_str()) {
                continue;
            }

            out.push_str(&html[last..open.start()]);
            out.push_str(&self.patch_open_tag(open.as_str()));
            if honeypot_at.is_none() {
                honeypot_at = Some(out.len());
            }
            last = open.end();
        }

        let Some(at) = honeypot_at else {
            return Ok(None);
        };
        out.push_str(&html[last..]);

        if !self.has_honeypot(&out) {
            out.insert_str(at, &self.honeypot_html());
        }

        Ok((out != html).then_some(out))
    }
}
