//! Pattern-based HTML text primitives.
//!
//! These work on the markup the generator and the site's hand-written pages
//! produce; they are not a general HTML parser. Tag and attribute names match
//! case-insensitively.

use std::{ops::Range, sync::LazyLock};

use regex::{Captures, Regex};

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s([a-z][a-z0-9_:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute pattern is valid")
});

static SECTION_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<section\b[^>]*>").expect("section pattern is valid"));

static SECTION_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(/)?section\b[^>]*>").expect("section tag pattern is valid")
});

static SCRIPT_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<script\b[^>]*>").expect("script pattern is valid"));

static META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<meta\b[^>]*>").expect("meta pattern is valid"));

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<link\b[^>]*>").expect("link pattern is valid"));

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("title pattern is valid"));

static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1\b([^>]*)>(.*?)</h1>").expect("h1 pattern is valid"));

static DETAILS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<details\b[^>]*>\s*<summary\b[^>]*>(.*?)</summary>(.*?)</details>")
        .expect("details pattern is valid")
});

static SCRIPT_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("script block pattern is valid")
});

static STYLE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style\b[^>]*>.*?</style>").expect("style block pattern is valid")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

static WS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});")
        .expect("entity pattern is valid")
});

/// Value of attribute `name` in an opening tag.
#[must_use]
pub fn attr(tag: &str, name: &str) -> Option<String> {
    ATTR_RE
        .captures_iter(tag)
        .find(|caps| caps[1].eq_ignore_ascii_case(name))
        .map(|caps| {
            caps.get(2)
                .or_else(|| caps.get(3))
                .map_or_else(String::new, |m| m.as_str().to_string())
        })
}

/// Replace `range` of `html` with `replacement`.
#[must_use]
pub fn splice(html: &str, range: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(html.len() + replacement.len());
    out.push_str(&html[..range.start]);
    out.push_str(replacement);
    out.push_str(&html[range.end..]);
    out
}

/// End offset of the section opened at `start`, counting nested sections.
fn section_end(html: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for caps in SECTION_TAG_RE.captures_iter(&html[start..]) {
        let tag = caps.get(0)?;
        if caps.get(1).is_some() {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(start + tag.end());
            }
        } else {
            depth += 1;
        }
    }
    None
}

/// Byte range of `<section id="id">` through its matching `</section>`.
#[must_use]
pub fn find_section_by_id(html: &str, id: &str) -> Option<Range<usize>> {
    let open = SECTION_OPEN_RE
        .find_iter(html)
        .find(|m| attr(m.as_str(), "id").as_deref() == Some(id))?;
    let end = section_end(html, open.start())?;
    Some(open.start()..end)
}

/// Remove `<section id="id">` and everything inside it.
///
/// Returns `None` when no such section exists or it is never closed.
#[must_use]
pub fn remove_section_by_id(html: &str, id: &str) -> Option<String> {
    let range = find_section_by_id(html, id)?;
    Some(splice(html, range, ""))
}

/// Byte range of the innermost section enclosing offset `idx`.
fn enclosing_section(html: &str, idx: usize) -> Option<Range<usize>> {
    let openings: Vec<usize> = SECTION_OPEN_RE
        .find_iter(&html[..idx])
        .map(|m| m.start())
        .collect();

    openings.iter().rev().find_map(|&start| {
        section_end(html, start)
            .filter(|&end| end > idx)
            .map(|end| start..end)
    })
}

/// Range from `start` through the section that opens right after `end`,
/// trailing whitespace included.
fn section_after(html: &str, start: usize, end: usize) -> Option<Range<usize>> {
    let rest = &html[end..];
    let open = end + (rest.len() - rest.trim_start().len());
    SECTION_OPEN_RE
        .find(&html[open..])
        .filter(|m| m.start() == 0)?;
    let close = section_end(html, open)?;
    let tail = &html[close..];
    Some(start..close + (tail.len() - tail.trim_start().len()))
}

/// Remove the innermost section enclosing an occurrence of `marker`.
///
/// Occurrences outside every section, such as in a meta description, are
/// skipped.
#[must_use]
pub fn remove_section_containing(html: &str, marker: &str) -> Option<String> {
    if marker.is_empty() {
        return None;
    }
    html.match_indices(marker)
        .find_map(|(idx, _)| enclosing_section(html, idx))
        .map(|range| splice(html, range, ""))
}

/// Remove the block `marker` labels.
///
/// A marker followed directly by a `<section>`, such as an HTML comment,
/// goes together with that section. Otherwise the innermost section
/// enclosing the marker goes.
#[must_use]
pub fn remove_marked_section(html: &str, marker: &str) -> Option<String> {
    if marker.is_empty() {
        return None;
    }
    html.match_indices(marker)
        .find_map(|(idx, m)| {
            section_after(html, idx, idx + m.len()).or_else(|| enclosing_section(html, idx))
        })
        .map(|range| splice(html, range, ""))
}

/// Text of the `<title>` element.
#[must_use]
pub fn title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .map(|caps| strip_tags(&caps[1]))
        .filter(|t| !t.is_empty())
}

fn find_meta<'h>(html: &'h str, key_attr: &str, key: &str) -> Option<regex::Match<'h>> {
    META_RE.find_iter(html).find(|m| {
        attr(m.as_str(), key_attr).is_some_and(|v| v.eq_ignore_ascii_case(key))
    })
}

/// Content of the meta tag whose `key_attr` (`name` or `property`) equals `key`.
#[must_use]
pub fn meta_content(html: &str, key_attr: &str, key: &str) -> Option<String> {
    find_meta(html, key_attr, key)
        .and_then(|m| attr(m.as_str(), "content"))
        .map(|c| unescape_html(c.trim()))
        .filter(|c| !c.is_empty())
}

/// Content of `<meta name="description">`.
#[must_use]
pub fn meta_description(html: &str) -> Option<String> {
    meta_content(html, "name", "description")
}

fn find_canonical(html: &str) -> Option<regex::Match<'_>> {
    LINK_RE.find_iter(html).find(|m| {
        attr(m.as_str(), "rel").is_some_and(|rel| rel.eq_ignore_ascii_case("canonical"))
    })
}

/// Href of `<link rel="canonical">`.
#[must_use]
pub fn canonical(html: &str) -> Option<String> {
    find_canonical(html)
        .and_then(|m| attr(m.as_str(), "href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// Plain text of the first `<h1>`.
#[must_use]
pub fn first_h1_text(html: &str) -> Option<String> {
    H1_RE
        .captures(html)
        .map(|caps| strip_tags(&caps[2]))
        .filter(|t| !t.is_empty())
}

/// Question and answer text of every `<details><summary>` pair.
#[must_use]
pub fn details_pairs(html: &str) -> Vec<(String, String)> {
    DETAILS_RE
        .captures_iter(html)
        .map(|caps| (strip_tags(&caps[1]), strip_tags(&caps[2])))
        .filter(|(q, a)| !q.is_empty() && !a.is_empty())
        .collect()
}

/// Replace the title text, inserting a `<title>` when there is none.
#[must_use]
pub fn replace_title(html: &str, text: &str) -> String {
    let tag = format!("<title>{}</title>", escape_html(text));
    match TITLE_RE.find(html) {
        Some(m) => splice(html, m.range(), &tag),
        None => insert_before_head_close(html, &tag),
    }
}

/// Set a meta tag's content, inserting the tag when it is missing.
#[must_use]
pub fn upsert_meta(html: &str, key_attr: &str, key: &str, content: &str) -> String {
    let tag = format!(
        r#"<meta {key_attr}="{key}" content="{}">"#,
        escape_html(content)
    );
    match find_meta(html, key_attr, key) {
        Some(m) => splice(html, m.range(), &tag),
        None => insert_before_head_close(html, &tag),
    }
}

/// Set `<meta name="description">`.
#[must_use]
pub fn upsert_meta_description(html: &str, description: &str) -> String {
    upsert_meta(html, "name", "description", description)
}

/// Set `<link rel="canonical">`.
#[must_use]
pub fn upsert_canonical(html: &str, url: &str) -> String {
    let tag = format!(r#"<link rel="canonical" href="{}">"#, escape_html(url));
    match find_canonical(html) {
        Some(m) => splice(html, m.range(), &tag),
        None => insert_before_head_close(html, &tag),
    }
}

/// Replace the first `<h1>`'s content, keeping its attributes.
#[must_use]
pub fn replace_first_h1(html: &str, text: &str) -> String {
    H1_RE
        .replacen(html, 1, |caps: &Captures<'_>| {
            format!("<h1{}>{}</h1>", &caps[1], escape_html(text))
        })
        .into_owned()
}

/// Insert `block` on its own line before `</head>`, else before `</body>`,
/// else at the end.
#[must_use]
pub fn insert_before_head_close(html: &str, block: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.find("</head>").or_else(|| lower.find("</body>")) {
        Some(i) => splice(html, i..i, &format!("{block}\n")),
        None => format!("{html}\n{block}\n"),
    }
}

/// Insert `snippet` on a new line after the viewport meta tag.
#[must_use]
pub fn insert_after_viewport(html: &str, snippet: &str) -> Option<String> {
    let m = find_meta(html, "name", "viewport")?;
    Some(splice(html, m.end()..m.end(), &format!("\n  {snippet}")))
}

/// Byte range of the `<script>` element with the given id.
#[must_use]
pub fn find_script_by_id(html: &str, id: &str) -> Option<Range<usize>> {
    let open = SCRIPT_OPEN_RE
        .find_iter(html)
        .find(|m| attr(m.as_str(), "id").as_deref() == Some(id))?;
    let close = html[open.end()..].to_ascii_lowercase().find("</script>")?;
    Some(open.start()..open.end() + close + "</script>".len())
}

/// Replace the script with id `id` by `block`, or insert `block` into the head.
#[must_use]
pub fn upsert_script(html: &str, id: &str, block: &str) -> String {
    match find_script_by_id(html, id) {
        Some(range) => splice(html, range, block),
        None => insert_before_head_close(html, block),
    }
}

/// Visible text of a fragment: scripts and styles dropped, tags removed,
/// entities decoded and whitespace collapsed.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    let text = SCRIPT_BLOCK_RE.replace_all(html, "");
    let text = STYLE_BLOCK_RE.replace_all(&text, "");
    let text = unescape_html(&TAG_RE.replace_all(&text, " "));
    WS_RE.replace_all(&text, " ").trim().to_string()
}

/// Escape text for use in element content or a quoted attribute.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decode numeric and common named character references.
#[must_use]
pub fn unescape_html(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                "middot" => Some('\u{b7}'),
                "ndash" => Some('\u{2013}'),
                "mdash" => Some('\u{2014}'),
                "lsquo" => Some('\u{2018}'),
                "rsquo" => Some('\u{2019}'),
                "ldquo" => Some('\u{201c}'),
                "rdquo" => Some('\u{201d}'),
                "hellip" => Some('\u{2026}'),
                "copy" => Some('\u{a9}'),
                "reg" => Some('\u{ae}'),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Convert CRLF and lone CR line endings to LF.
#[must_use]
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
