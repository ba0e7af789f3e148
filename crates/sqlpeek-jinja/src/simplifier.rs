//! Conditional block simplification
//!
//! Resolves every top-level `{% if %}` block to either its first branch or
//! nothing, without evaluating the guard. Guards are classified by keyword:
//! debug-ish guards are dropped, everything else is kept so the demo SQL
//! shows as much of the query as possible.
//!
//! The scan is flat: the template is cut into text runs and tags, and a
//! single depth counter tracks nesting. Tags are found inside lines, so a
//! block that opens and closes on the same line as other SQL resolves the
//! same way a multi-line block does.
//!
//! Blocks nested inside a kept block are not classified. Their tags are left
//! for [`ConditionalSimplifier::strip_conditional_tags`], which keeps the
//! first branch of each.

use regex::Regex;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{%[-+]?\s*(.*?)\s*[-+]?%\}").unwrap());

static ELSE_BRANCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{%[-+]?\s*else\s*[-+]?%\}.*?(\{%[-+]?\s*endif\s*[-+]?%\})").unwrap()
});

static ELIF_BRANCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{%[-+]?\s*elif\b[^%]*%\}.*?(\{%[-+]?\s*endif\s*[-+]?%\})").unwrap()
});

static IF_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{%[-+]?\s*if\b[^%]*%\}").unwrap());

static ENDIF_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%[-+]?\s*endif\s*[-+]?%\}").unwrap());

static BRANCH_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%[-+]?\s*(?:else|elif)\b[^%]*%\}").unwrap());

static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").unwrap());

/// Guards mentioning any of these are dropped
const EXCLUDE_KEYWORDS: &[&str] = &[
    "debug", "dev", "test", "development", "verbose", "logging", "trace",
];

/// Guards that look like optional filters or clauses
const INCLUDE_KEYWORDS: &[&str] = &[
    "show_", "enable_", "has_", "is_", "filter_", "include_",
    "!=", ">=", "<=", ">", "<", "not null", "is not",
    "limit", "offset", "order", "group", "where",
];

/// Whether a conditional block makes it into the demo SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Keep the first branch; `matched` is the include keyword, if any
    Include { matched: Option<&'static str> },

    /// Drop the whole block
    Exclude { matched: &'static str },
}

impl GuardDecision {
    pub fn is_include(&self) -> bool {
        matches!(self, GuardDecision::Include { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind<'a> {
    If(&'a str),
    Elif,
    Else,
    Endif,
    Other,
}

#[derive(Debug, Clone, Copy)]
enum Segment<'a> {
    Text(&'a str),
    Tag { kind: TagKind<'a>, raw: &'a str },
}

impl<'a> Segment<'a> {
    fn raw(&self) -> &'a str {
        match self {
            Segment::Text(text) => *text,
            Segment::Tag { raw, .. } => *raw,
        }
    }

    fn kind(&self) -> Option<TagKind<'a>> {
        match self {
            Segment::Text(_) => None,
            Segment::Tag { kind, .. } => Some(*kind),
        }
    }
}

/// Heuristic conditional block simplifier
pub struct ConditionalSimplifier;

impl ConditionalSimplifier {
    /// Resolve conditional blocks and return tag-free template text
    pub fn simplify(template: &str) -> String {
        let segments = Self::segments(template);
        let mut output = String::with_capacity(template.len());
        let mut i = 0;

        while i < segments.len() {
            let segment = segments[i];
            i += 1;

            let Some(TagKind::If(guard)) = segment.kind() else {
                output.push_str(segment.raw());
                continue;
            };

            let decision = Self::classify_guard(guard);
            tracing::debug!(guard, ?decision, "conditional block");

            // Emit the first branch of an included block, skip the rest
            // up to the matching endif
            let mut keeping = decision.is_include();
            let mut depth = 0usize;

            while i < segments.len() {
                let inner = segments[i];
                i += 1;

                match inner.kind() {
                    Some(TagKind::If(_)) => depth += 1,
                    Some(TagKind::Endif) if depth == 0 => break,
                    Some(TagKind::Endif) => depth -= 1,
                    Some(TagKind::Elif | TagKind::Else) if depth == 0 => {
                        keeping = false;
                        continue;
                    }
                    _ => {}
                }

                if keeping {
                    output.push_str(inner.raw());
                }
            }
        }

        Self::tidy(&Self::strip_conditional_tags(&output))
    }

    /// Classify a guard; exclude keywords are checked before include keywords
    pub fn classify_guard(guard: &str) -> GuardDecision {
        let guard = guard.to_lowercase();

        if let Some(keyword) = EXCLUDE_KEYWORDS.iter().copied().find(|k| guard.contains(k)) {
            return GuardDecision::Exclude { matched: keyword };
        }

        let matched = INCLUDE_KEYWORDS.iter().copied().find(|k| guard.contains(k));
        GuardDecision::Include { matched }
    }

    /// Remove any conditional tags left in the text
    ///
    /// `else`/`elif` branches are dropped up to the next endif, then the
    /// remaining `if`/`endif` and orphan branch tags are removed.
    pub fn strip_conditional_tags(text: &str) -> String {
        let text = ELSE_BRANCH.replace_all(text, "$1");
        let text = ELIF_BRANCH.replace_all(&text, "$1");
        let text = IF_TAG.replace_all(&text, "");
        let text = ENDIF_TAG.replace_all(&text, "");
        BRANCH_TAG.replace_all(&text, "").into_owned()
    }

    /// Collapse blank-line runs and trim every line at both ends
    fn tidy(text: &str) -> String {
        let collapsed = BLANK_RUN.replace_all(text, "\n\n");

        collapsed
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    /// Cut the template into text runs and `{% ... %}` tags
    fn segments(template: &str) -> Vec<Segment<'_>> {
        let mut segments = Vec::new();
        let mut last = 0;

        for capture in TAG.captures_iter(template) {
            let (Some(whole), Some(inner)) = (capture.get(0), capture.get(1)) else {
                continue;
            };

            if whole.start() > last {
                segments.push(Segment::Text(&template[last..whole.start()]));
            }

            segments.push(Segment::Tag {
                kind: Self::tag_kind(inner.as_str()),
                raw: whole.as_str(),
            });
            last = whole.end();
        }

        if last < template.len() {
            segments.push(Segment::Text(&template[last..]));
        }

        segments
    }

    fn tag_kind(inner: &str) -> TagKind<'_> {
        let keyword_end = inner
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(inner.len());

        match &inner[..keyword_end] {
            "if" => TagKind::If(inner[keyword_end..].trim()),
            "elif" => TagKind::Elif,
            "else" => TagKind::Else,
            "endif" => TagKind::Endif,
            _ => TagKind::Other,
        }
    }
}
