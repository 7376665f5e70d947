//! Wikitext -> fixed-width plain-text conversion.
//!
//! This is the whole-document pipeline: document-level cleanup passes run
//! first (comments, file/category links, collapsible wrappers, templates,
//! table extraction), then each remaining line is classified and rendered,
//! then blank runs are collapsed. The output is a flat list of tagged lines
//! ready for a paged fixed-width display.
//!
//! Conversion never fails. Malformed markup degrades to whatever readable
//! text can be salvaged, and all output text is printable ASCII with no
//! embedded newlines.

use crate::normalize::normalize_unicode;
use crate::strip::{self, strip_inline_markup};
use crate::table::format_table;
use crate::wrap::word_wrap;

/// Display role of one output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    /// Body text. Blank lines are `Normal` with empty text.
    Normal,
    Heading2,
    Heading3,
    Heading4,
}

/// One line of converted output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub kind: LineType,
}

impl Line {
    pub fn normal(text: impl Into<String>) -> Self {
        Line {
            text: text.into(),
            kind: LineType::Normal,
        }
    }

    pub fn blank() -> Self {
        Line::normal("")
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty() && self.kind == LineType::Normal
    }
}

/// Convert a full wikitext document to display lines wrapped at `width`.
pub fn wiki_to_lines(input: &str, width: usize) -> Vec<Line> {
    let mut text = normalize_unicode(input);
    // bare carriage returns count as line breaks, not text.
    text = text.replace("\r\n", "\n").replace('\r', "\n");
    text = remove_magic_words(&text);
    text = remove_html_comments(&text);
    text = remove_media_links(&text, "[[File:");
    text = remove_media_links(&text, "[[Image:");
    text = remove_category_links(&text);
    text = promote_collapsible_captions(&text);
    text = remove_div_tags(&text);
    text = strip::remove_templates(&text);
    let (text, tables) = extract_tables(&text);

    let mut out: Vec<Line> = Vec::new();
    let mut counter = 0usize;

    for raw in text.lines() {
        let line = raw.trim_end();
        let trimmed = line.trim();

        if let Some(table) = table_placeholder(trimmed, &tables) {
            out.push(Line::blank());
            for table_line in format_table(table) {
                for wrapped in word_wrap(&table_line, width) {
                    out.push(Line::normal(wrapped));
                }
            }
            out.push(Line::blank());
            continue;
        }

        // headings are matched before markup stripping, anchored at column
        // 0 on the right-trimmed line. longest marker first so "====" is
        // not read as "==".
        let heading = [
            ("====", LineType::Heading4),
            ("===", LineType::Heading3),
            ("==", LineType::Heading2),
        ]
        .into_iter()
        .find_map(|(marker, kind)| parse_heading(line, marker).map(|text| (text, kind)));
        if let Some((text, kind)) = heading {
            out.push(Line::blank());
            out.push(Line { text, kind });
            out.push(Line::blank());
            counter = 0;
            continue;
        }

        // everything else is classified on the stripped text, so markers
        // revealed by stripping still count and lines that strip to
        // nothing become blanks.
        let stripped = strip_inline_markup(line);

        if stripped.is_empty() {
            out.push(Line::blank());
            counter = 0;
            continue;
        }

        let rendered = if let Some(rest) = stripped.strip_prefix("***") {
            format!("      - {}", rest.trim_start())
        } else if let Some(rest) = stripped.strip_prefix("**") {
            format!("    - {}", rest.trim_start())
        } else if let Some(rest) = stripped.strip_prefix('*') {
            format!("  - {}", rest.trim_start())
        } else if let Some(rest) = stripped.strip_prefix("##") {
            // nested ordered items render as sub-bullets; "##*" likewise.
            let rest = rest.strip_prefix('*').unwrap_or(rest);
            format!("    - {}", rest.trim_start())
        } else if let Some(rest) = stripped.strip_prefix('#') {
            counter += 1;
            format!("  {counter}. {}", rest.trim_start())
        } else if let Some((term, def)) = parse_definition(&stripped) {
            format!("{term}: {def}")
        } else {
            stripped
        };

        for wrapped in word_wrap(&rendered, width) {
            out.push(Line::normal(wrapped));
        }
    }

    collapse_blank_runs(&mut out);
    trim_blank_edges(&mut out);
    out
}

/// `; term : definition` lines. The term must be non-empty.
fn parse_definition(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix(';')?;
    let colon = rest.find(':')?;
    let term = rest[..colon].trim();
    if term.is_empty() {
        return None;
    }
    Some((term, rest[colon + 1..].trim_start()))
}

/// `== text ==` style headings; `marker` is the run to match on both ends.
fn parse_heading(line: &str, marker: &str) -> Option<String> {
    if line.len() > 2 * marker.len()
        && line.starts_with(marker)
        && line.ends_with(marker)
    {
        let inner = &line[marker.len()..line.len() - marker.len()];
        Some(strip_inline_markup(inner.trim()))
    } else {
        None
    }
}

/// Remove `__TOC__`, `__NOTOC__` and other magic words.
fn remove_magic_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("__") {
        let after = &rest[pos + 2..];
        let word_end = after
            .find(|c: char| !c.is_ascii_uppercase())
            .unwrap_or(after.len());
        if word_end > 0 && after[word_end..].starts_with("__") {
            out.push_str(&rest[..pos]);
            rest = &after[word_end + 2..];
        } else {
            out.push_str(&rest[..pos + 2]);
            rest = &rest[pos + 2..];
        }
    }
    out.push_str(rest);
    out
}

fn remove_html_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("<!--") {
        match rest[pos + 4..].find("-->") {
            Some(end) => {
                out.push_str(&rest[..pos]);
                rest = &rest[pos + 4 + end + 3..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Remove `[[File:...]]` / `[[Image:...]]` links, case-insensitively. The
/// body may contain '|' parameters but no ']'.
fn remove_media_links(text: &str, prefix: &str) -> String {
    let lower = text.to_lowercase();
    let prefix_lower = prefix.to_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut seg = 0usize;
    let mut search = 0usize;
    while let Some(rel) = lower[search..].find(&prefix_lower) {
        let pos = search + rel;
        let body_start = pos + prefix.len();
        match text[body_start..].find(']') {
            Some(close) if text[body_start + close..].starts_with("]]") => {
                out.push_str(&text[seg..pos]);
                seg = body_start + close + 2;
                search = seg;
            }
            _ => search = pos + prefix.len(),
        }
    }
    out.push_str(&text[seg..]);
    out
}

fn remove_category_links(text: &str) -> String {
    remove_media_links(text, "[[Category:")
}

/// Replace collapsible-div wrappers with a level-3 heading built from their
/// expand caption. Page authors use these as section headers for optional
/// content, so the caption is worth keeping.
fn promote_collapsible_captions(text: &str) -> String {
    let mut out = String::new();
    let mut rest = text;
    loop {
        let lower = rest.to_lowercase();
        let Some(pos) = lower.find("<div") else {
            break;
        };
        let after_tag = &rest[pos..];
        let Some(tag_end) = after_tag.find('>') else {
            out.push_str(&rest[..pos + 4]);
            rest = &rest[pos + 4..];
            continue;
        };
        let tag = &after_tag[..tag_end + 1];
        let tag_lower = tag.to_lowercase();
        let caption = tag_lower
            .find("class=\"mw-collapsible")
            .and_then(|class_at| {
                let expand_rel = tag_lower[class_at..].find("data-expandtext=\"")?;
                let value_start = class_at + expand_rel + "data-expandtext=\"".len();
                let value_end = tag[value_start..].find('"')?;
                Some(&tag[value_start..value_start + value_end])
            });
        out.push_str(&rest[..pos]);
        if let Some(caption) = caption {
            out.push_str(&format!("\n=== {caption} ===\n"));
        }
        rest = &rest[pos + tag_end + 1..];
    }
    out.push_str(rest);
    out
}

/// Drop remaining `<div ...>` and `</div>` tags, keeping their content.
fn remove_div_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let lower = rest.to_lowercase();
        let open = lower.find("<div");
        let close = lower.find("</div");
        let pos = match (open, close) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => break,
        };
        match rest[pos..].find('>') {
            Some(end) => {
                out.push_str(&rest[..pos]);
                rest = &rest[pos + end + 1..];
            }
            None => {
                out.push_str(&rest[..pos + 1]);
                rest = &rest[pos + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Pull `{|...|}` table blocks out of the text, leaving one placeholder
/// line per table so the line loop can render them in place.
fn extract_tables(text: &str) -> (String, Vec<String>) {
    let mut tables = Vec::new();
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("{|") {
        match rest[pos..].find("|}") {
            Some(end) => {
                let block = &rest[pos..pos + end + 2];
                out.push_str(&rest[..pos]);
                out.push_str(&format!("\n__TABLE_{}__\n", tables.len()));
                tables.push(block.to_string());
                rest = &rest[pos + end + 2..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    (out, tables)
}

fn table_placeholder<'a>(line: &str, tables: &'a [String]) -> Option<&'a str> {
    let n = line
        .strip_prefix("__TABLE_")?
        .strip_suffix("__")?
        .parse::<usize>()
        .ok()?;
    tables.get(n).map(String::as_str)
}

/// Collapse runs of 3+ blank lines down to 2.
fn collapse_blank_runs(lines: &mut Vec<Line>) {
    let mut run = 0usize;
    lines.retain(|line| {
        if line.is_blank() {
            run += 1;
            run <= 2
        } else {
            run = 0;
            true
        }
    });
}

fn trim_blank_edges(lines: &mut Vec<Line>) {
    while lines.first().is_some_and(|l| l.text.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.text.is_empty()) {
        lines.pop();
    }
}
