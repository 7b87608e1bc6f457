//! Tag scanner.
//!
//! Masking replaces template syntax, HTML comments and `<script>`/`<style>`
//! bodies with spaces (newlines are kept), so the masked text has the same
//! byte length and line structure as the source.

use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(/?)([A-Za-z][A-Za-z0-9:-]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
        .expect("tag pattern is valid")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern is valid")
});

/// Region delimiters that are blanked out entirely.
const MASKED_REGIONS: &[(&str, &str)] = &[
    ("<!--", "-->"),
    ("{{", "}}"),
    ("{%", "%}"),
    ("{#", "#}"),
];

/// Elements whose bodies are not HTML.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// How an attribute value was quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Double,
    Single,
    None,
}

/// An attribute on a scanned tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr<'a> {
    /// Attribute name as written
    pub name: &'a str,

    /// Attribute value, if any
    pub value: Option<&'a str>,

    /// Quoting style of the value
    pub quote: Quote,

    /// Byte offset of the attribute name
    pub offset: usize,
}

/// A scanned start or end tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag<'a> {
    /// Tag name as written
    pub name: &'a str,

    /// `</name>`
    pub closing: bool,

    /// `<name />`
    pub self_closing: bool,

    /// Attributes in source order
    pub attrs: Vec<Attr<'a>>,

    /// Byte offset of the `<`
    pub offset: usize,
}

impl Tag<'_> {
    /// Look up an attribute by case-insensitive name.
    pub fn attr(&self, name: &str) -> Option<&Attr<'_>> {
        self.attrs.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }
}

/// Blank out template syntax, comments and raw-text bodies.
pub fn mask(source: &str) -> String {
    let lower = source.to_ascii_lowercase();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;

    while i < source.len() {
        let tail = &source[i..];

        if let Some(len) = masked_region_len(tail) {
            blank(&mut out, &source[i..i + len]);
            i += len;
            continue;
        }

        if let Some((open_len, body_len)) = raw_text_lens(&lower[i..]) {
            out.push_str(&source[i..i + open_len]);
            blank(&mut out, &source[i + open_len..i + open_len + body_len]);
            i += open_len + body_len;
            continue;
        }

        let ch = tail.chars().next().unwrap_or(' ');
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

fn blank(out: &mut String, region: &str) {
    for ch in region.chars() {
        if ch == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
        }
    }
}

/// Length of a masked region starting at `tail`, if one starts there and is terminated.
fn masked_region_len(tail: &str) -> Option<usize> {
    MASKED_REGIONS.iter().find_map(|(open, close)| {
        if !tail.starts_with(open) {
            return None;
        }
        tail[open.len()..]
            .find(close)
            .map(|end| open.len() + end + close.len())
    })
}

/// For `<script ...>body</script>`, the lengths of the opening tag and of the body.
fn raw_text_lens(lower_tail: &str) -> Option<(usize, usize)> {
    let name = RAW_TEXT_ELEMENTS.iter().find(|name| {
        lower_tail
            .strip_prefix('<')
            .and_then(|t| t.strip_prefix(**name))
            .and_then(|t| t.chars().next())
            .is_some_and(|c| c == '>' || c.is_ascii_whitespace())
    })?;

    let open_len = lower_tail.find('>')? + 1;
    let closing = format!("</{}", name);
    let body_len = lower_tail[open_len..]
        .find(&closing)
        .unwrap_or(lower_tail.len() - open_len);

    Some((open_len, body_len))
}

/// Scan all start and end tags in already-masked text.
pub fn scan_tags(masked: &str) -> Vec<Tag<'_>> {
    TAG_RE
        .captures_iter(masked)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(2)?;
            let attr_section = caps.get(3)?;
            let closing = !caps[1].is_empty();
            let self_closing = attr_section.as_str().trim_end().ends_with('/');

            let attrs = if closing {
                Vec::new()
            } else {
                scan_attrs(attr_section.as_str(), attr_section.start())
            };

            Some(Tag {
                name: name.as_str(),
                closing,
                self_closing,
                attrs,
                offset: whole.start(),
            })
        })
        .collect()
}

fn scan_attrs(section: &str, base: usize) -> Vec<Attr<'_>> {
    ATTR_RE
        .captures_iter(section)
        .filter_map(|caps| {
            let name = caps.get(1)?;
            let (value, quote) = if let Some(v) = caps.get(2) {
                (Some(v.as_str()), Quote::Double)
            } else if let Some(v) = caps.get(3) {
                (Some(v.as_str()), Quote::Single)
            } else if let Some(v) = caps.get(4) {
                (Some(v.as_str()), Quote::None)
            } else {
                (None, Quote::None)
            };

            Some(Attr {
                name: name.as_str(),
                value,
                quote,
                offset: base + name.start(),
            })
        })
        .collect()
}

/// Convert a byte offset into a 1-based (line, column) pair.
pub fn position(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn masks_template_syntax_and_keeps_length() {
        let source = "<p>{{ title }}</p>\n{% if x %}<b>{% endif %}";
        let masked = mask(source);

        assert_eq!(masked.len(), source.len());
        assert_eq!(masked, "<p>           </p>\n          <b>           ");
    }

    #[test]
    fn masks_comments_across_lines() {
        let source = "<!-- <img>\n<img> -->\n<div>";
        let masked = mask(source);

        assert_eq!(masked.lines().count(), 3);
        assert!(!masked.contains("img"));
        assert!(masked.ends_with("<div>"));
    }

    #[test]
    fn masks_script_bodies_but_not_tags() {
        let source = "<script>if (a<b) {}</script>";
        let masked = mask(source);

        assert!(masked.starts_with("<script>"));
        assert!(masked.ends_with("</script>"));
        assert!(!masked.contains("a<b"));
    }

    #[test]
    fn leaves_unterminated_regions_alone() {
        let source = "<p>{{ oops</p>";
        assert_eq!(mask(source), source);
    }

    #[test]
    fn masks_multibyte_text_inside_regions() {
        let source = "{# čeština #}<p>";
        let masked = mask(source);

        assert_eq!(masked.len(), source.len());
        assert!(masked.ends_with("<p>"));
    }

    #[test]
    fn scans_tags_and_attributes() {
        let source = r#"<a href="/x" class='y' hidden data-n=3>go</a><br/>"#;
        let tags = scan_tags(source);

        assert_eq!(tags.len(), 3);

        let a = &tags[0];
        assert_eq!(a.name, "a");
        assert!(!a.closing);
        assert_eq!(a.attrs.len(), 4);
        assert_eq!(a.attrs[0].value, Some("/x"));
        assert_eq!(a.attrs[0].quote, Quote::Double);
        assert_eq!(a.attrs[1].quote, Quote::Single);
        assert_eq!(a.attrs[2].value, None);
        assert_eq!(a.attrs[3].quote, Quote::None);
        assert_eq!(a.attrs[0].offset, 3);

        assert!(tags[1].closing);
        assert!(tags[2].self_closing);
    }

    #[test]
    fn quoted_angle_brackets_stay_inside_tag() {
        let tags = scan_tags(r#"<img alt="a > b" src="x.png">"#);

        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].attr("src").and_then(|a| a.value), Some("x.png"));
    }

    #[test]
    fn ignores_doctype() {
        assert!(scan_tags("<!DOCTYPE html>").is_empty());
    }

    #[test]
    fn computes_positions() {
        let source = "ab\ncd<x>";
        assert_eq!(position(source, 0), (1, 1));
        assert_eq!(position(source, 5), (2, 3));
    }
}
