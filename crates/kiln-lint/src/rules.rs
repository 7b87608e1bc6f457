//! Lint rules and their configuration.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::scanner::{position, scan_tags, Quote, Tag};

static ATTR_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*(?:[-:][a-z0-9]+)*$").expect("attribute name pattern is valid")
});

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose end tag may be omitted.
const OPTIONAL_END_ELEMENTS: &[&str] = &[
    "li", "dt", "dd", "p", "rt", "rp", "optgroup", "option", "colgroup", "caption", "thead",
    "tbody", "tfoot", "tr", "td", "th", "html", "head", "body",
];

/// A lint rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    AttrBans,
    AttrNameStyle,
    AttrNoDup,
    AttrQuoteStyle,
    IdNoDup,
    ImgReqAlt,
    ImgReqSrc,
    LineEndStyle,
    TagBans,
    TagNameLowercase,
    IndentStyle,
    LineNoTrailingWhitespace,
    TagClose,
}

impl Rule {
    pub const ALL: &'static [Rule] = &[
        Rule::AttrBans,
        Rule::AttrNameStyle,
        Rule::AttrNoDup,
        Rule::AttrQuoteStyle,
        Rule::IdNoDup,
        Rule::ImgReqAlt,
        Rule::ImgReqSrc,
        Rule::LineEndStyle,
        Rule::TagBans,
        Rule::TagNameLowercase,
        Rule::IndentStyle,
        Rule::LineNoTrailingWhitespace,
        Rule::TagClose,
    ];

    /// Rule identifier as used in config files and reports.
    pub fn id(self) -> &'static str {
        match self {
            Rule::AttrBans => "attr-bans",
            Rule::AttrNameStyle => "attr-name-style",
            Rule::AttrNoDup => "attr-no-dup",
            Rule::AttrQuoteStyle => "attr-quote-style",
            Rule::IdNoDup => "id-no-dup",
            Rule::ImgReqAlt => "img-req-alt",
            Rule::ImgReqSrc => "img-req-src",
            Rule::LineEndStyle => "line-end-style",
            Rule::TagBans => "tag-bans",
            Rule::TagNameLowercase => "tag-name-lowercase",
            Rule::IndentStyle => "indent-style",
            Rule::LineNoTrailingWhitespace => "line-no-trailing-whitespace",
            Rule::TagClose => "tag-close",
        }
    }

    /// Short issue code.
    pub fn code(self) -> &'static str {
        match self {
            Rule::AttrBans => "E001",
            Rule::AttrNameStyle => "E002",
            Rule::AttrNoDup => "E003",
            Rule::AttrQuoteStyle => "E005",
            Rule::IdNoDup => "E012",
            Rule::ImgReqAlt => "E013",
            Rule::ImgReqSrc => "E014",
            Rule::LineEndStyle => "E015",
            Rule::TagBans => "E016",
            Rule::TagNameLowercase => "E017",
            Rule::IndentStyle => "E024",
            Rule::LineNoTrailingWhitespace => "E028",
            Rule::TagClose => "E042",
        }
    }

    /// Find a rule by identifier.
    pub fn from_id(id: &str) -> Option<Rule> {
        Rule::ALL.iter().copied().find(|r| r.id() == id)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A single lint finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
    /// Human-readable message
    pub message: String,
    /// Violated rule
    pub rule: Rule,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, col {}\t\t{} [{}:{}]",
            self.line,
            self.column,
            self.message,
            self.rule.id(),
            self.rule.code()
        )
    }
}

/// Linter configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LintConfig {
    /// Rule identifiers to skip
    pub disabled: Vec<String>,

    /// Attributes rejected by `attr-bans`
    pub attr_bans: Vec<String>,

    /// Tags rejected by `tag-bans`
    pub tag_bans: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            disabled: Vec::new(),
            attr_bans: [
                "align",
                "background",
                "bgcolor",
                "border",
                "frameborder",
                "longdesc",
                "marginwidth",
                "marginheight",
                "scrolling",
                "style",
                "width",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            tag_bans: ["style", "b", "i"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Rule checks over one source file.
pub(crate) struct Checker<'c> {
    config: &'c LintConfig,
    enabled: HashSet<Rule>,
}

impl<'c> Checker<'c> {
    pub(crate) fn new(config: &'c LintConfig, enabled: HashSet<Rule>) -> Self {
        Self { config, enabled }
    }

    fn on(&self, rule: Rule) -> bool {
        self.enabled.contains(&rule)
    }

    /// Run all enabled rules. `masked` must come from [`crate::mask`] applied to `source`.
    pub(crate) fn check(&self, source: &str, masked: &str) -> Vec<Issue> {
        let mut issues = Vec::new();
        let tags = scan_tags(masked);

        self.check_lines(source, &mut issues);

        let mut ids: HashMap<&str, usize> = HashMap::new();
        let mut open: Vec<(String, usize)> = Vec::new();

        for tag in &tags {
            self.check_tag_name(source, tag, &mut issues);
            if tag.closing {
                self.check_close(source, tag, &mut open, &mut issues);
                continue;
            }
            self.check_attrs(source, tag, &mut ids, &mut issues);
            self.check_element(source, tag, &mut issues);

            let name = tag.name.to_ascii_lowercase();
            if !tag.self_closing && !VOID_ELEMENTS.contains(&name.as_str()) {
                open.push((name, tag.offset));
            }
        }

        if self.on(Rule::TagClose) {
            for (name, offset) in open {
                if !OPTIONAL_END_ELEMENTS.contains(&name.as_str()) {
                    push(
                        &mut issues,
                        source,
                        offset,
                        Rule::TagClose,
                        format!("Tag <{}> is not closed", name),
                    );
                }
            }
        }

        issues.sort_by_key(|i| (i.line, i.column));
        issues
    }

    fn check_lines(&self, source: &str, issues: &mut Vec<Issue>) {
        for (idx, raw) in source.split('\n').enumerate() {
            let line = idx + 1;
            let text = raw.strip_suffix('\r').unwrap_or(raw);

            if raw.ends_with('\r') && self.on(Rule::LineEndStyle) {
                issues.push(Issue {
                    line,
                    column: text.chars().count() + 1,
                    message: "Line ending does not match format: lf".to_string(),
                    rule: Rule::LineEndStyle,
                });
            }

            let content = text.trim_end_matches([' ', '\t']);
            if content.len() != text.len() && self.on(Rule::LineNoTrailingWhitespace) {
                issues.push(Issue {
                    line,
                    column: content.chars().count() + 1,
                    message: "Line has trailing whitespace".to_string(),
                    rule: Rule::LineNoTrailingWhitespace,
                });
            }

            let indent: String = text.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
            if indent.contains(' ') && indent.contains('\t') && self.on(Rule::IndentStyle) {
                issues.push(Issue {
                    line,
                    column: 1,
                    message: "Indentation mixes tabs and spaces".to_string(),
                    rule: Rule::IndentStyle,
                });
            }
        }
    }

    fn check_tag_name(&self, source: &str, tag: &Tag<'_>, issues: &mut Vec<Issue>) {
        if self.on(Rule::TagNameLowercase) && tag.name.chars().any(|c| c.is_ascii_uppercase()) {
            push(
                issues,
                source,
                tag.offset,
                Rule::TagNameLowercase,
                format!("Tag name <{}> must be lowercase", tag.name),
            );
        }
    }

    fn check_attrs<'t>(
        &self,
        source: &str,
        tag: &Tag<'t>,
        ids: &mut HashMap<&'t str, usize>,
        issues: &mut Vec<Issue>,
    ) {
        let mut seen: HashSet<String> = HashSet::new();

        for attr in &tag.attrs {
            let lower = attr.name.to_ascii_lowercase();

            if self.on(Rule::AttrBans) && self.config.attr_bans.iter().any(|b| b == &lower) {
                push(
                    issues,
                    source,
                    attr.offset,
                    Rule::AttrBans,
                    format!("Attribute `{}` is banned", lower),
                );
            }

            if self.on(Rule::AttrNameStyle) && !ATTR_NAME_RE.is_match(attr.name) {
                push(
                    issues,
                    source,
                    attr.offset,
                    Rule::AttrNameStyle,
                    format!("Attribute name `{}` must be lowercase and dash-separated", attr.name),
                );
            }

            if !seen.insert(lower.clone()) && self.on(Rule::AttrNoDup) {
                push(
                    issues,
                    source,
                    attr.offset,
                    Rule::AttrNoDup,
                    format!("Duplicate attribute `{}`", lower),
                );
            }

            if attr.value.is_some()
                && attr.quote != Quote::Double
                && self.on(Rule::AttrQuoteStyle)
            {
                push(
                    issues,
                    source,
                    attr.offset,
                    Rule::AttrQuoteStyle,
                    format!("Value of `{}` must be double-quoted", attr.name),
                );
            }

            if lower == "id" && self.on(Rule::IdNoDup) {
                // Template-generated ids are blank after masking.
                if let Some(value) = attr.value.map(str::trim).filter(|v| !v.is_empty()) {
                    if ids.insert(value, attr.offset).is_some() {
                        push(
                            issues,
                            source,
                            attr.offset,
                            Rule::IdNoDup,
                            format!("Duplicate id `{}`", value),
                        );
                    }
                }
            }
        }
    }

    fn check_element(&self, source: &str, tag: &Tag<'_>, issues: &mut Vec<Issue>) {
        let name = tag.name.to_ascii_lowercase();

        if self.on(Rule::TagBans) && self.config.tag_bans.iter().any(|b| b == &name) {
            push(issues, source, tag.offset, Rule::TagBans, format!("Tag <{}> is banned", name));
        }

        if name == "img" {
            if self.on(Rule::ImgReqAlt) && tag.attr("alt").is_none() {
                push(
                    issues,
                    source,
                    tag.offset,
                    Rule::ImgReqAlt,
                    "<img> must have an `alt` attribute".to_string(),
                );
            }
            if self.on(Rule::ImgReqSrc) && tag.attr("src").is_none() {
                push(
                    issues,
                    source,
                    tag.offset,
                    Rule::ImgReqSrc,
                    "<img> must have a `src` attribute".to_string(),
                );
            }
        }
    }

    fn check_close(
        &self,
        source: &str,
        tag: &Tag<'_>,
        open: &mut Vec<(String, usize)>,
        issues: &mut Vec<Issue>,
    ) {
        let name = tag.name.to_ascii_lowercase();

        match open.iter().rposition(|(n, _)| *n == name) {
            Some(idx) => {
                for (unclosed, offset) in open.drain(idx..).skip(1) {
                    if self.on(Rule::TagClose)
                        && !OPTIONAL_END_ELEMENTS.contains(&unclosed.as_str())
                    {
                        push(
                            issues,
                            source,
                            offset,
                            Rule::TagClose,
                            format!("Tag <{}> is not closed", unclosed),
                        );
                    }
                }
            }
            None => {
                if self.on(Rule::TagClose) && !OPTIONAL_END_ELEMENTS.contains(&name.as_str()) {
                    push(
                        issues,
                        source,
                        tag.offset,
                        Rule::TagClose,
                        format!("Stray closing tag </{}>", name),
                    );
                }
            }
        }
    }
}

fn push(issues: &mut Vec<Issue>, source: &str, offset: usize, rule: Rule, message: String) {
    let (line, column) = position(source, offset);
    issues.push(Issue {
        line,
        column,
        message,
        rule,
    });
}
