//! Section extraction for redirects that target a page fragment.
//!
//! A redirect like `Save States -> Settings#Save States` should show only
//! the `Save States` section of the Settings page. Extraction works on raw
//! wikitext, before conversion, so the extracted slice runs through the
//! same pipeline as a whole page.

use crate::strip;

/// Extract the section named by `fragment` from `wikitext`.
///
/// Matching is case-insensitive and treats underscores in the fragment as
/// spaces (URL fragments carry them). The returned slice starts at the
/// matched heading line and ends just before the next heading of the same
/// or higher level. Returns `None` when no heading matches.
pub fn extract_section(wikitext: &str, fragment: &str) -> Option<String> {
    let target = fragment.replace('_', " ").trim().to_lowercase();
    if target.is_empty() {
        return None;
    }

    let mut captured: Vec<&str> = Vec::new();
    let mut capture_level: Option<usize> = None;

    for line in wikitext.lines() {
        if let Some((level, inner)) = parse_heading_line(line) {
            if let Some(active) = capture_level {
                if level <= active {
                    break;
                }
            } else if clean_heading(inner).to_lowercase() == target {
                capture_level = Some(level);
            }
        }
        if capture_level.is_some() {
            captured.push(line);
        }
    }

    if captured.is_empty() {
        None
    } else {
        Some(captured.join("\n"))
    }
}

/// Parse `== text ==` into (level, inner text). The level is the shorter of
/// the two `=` runs, both of which must be at least 2 long, and the runs
/// must not overlap.
fn parse_heading_line(line: &str) -> Option<(usize, &str)> {
    let line = line.trim_end();
    let leading = line.chars().take_while(|&c| c == '=').count();
    let trailing = line.chars().rev().take_while(|&c| c == '=').count();
    if leading < 2 || trailing < 2 {
        return None;
    }
    let level = leading.min(trailing);
    if 2 * level >= line.len() {
        return None;
    }
    let inner = line[level..line.len() - level].trim();
    if inner.is_empty() {
        return None;
    }
    Some((level, inner))
}

/// Reduce a heading's wikitext to comparable plain text: quote markers
/// removed, links resolved to their display text.
fn clean_heading(inner: &str) -> String {
    let text = strip::remove_quote_runs(inner);
    let text = strip::resolve_piped_links(&text);
    strip::resolve_plain_links(&text).trim().to_string()
}
