//! Inline wikitext markup removal.
//!
//! Turns one line (or table cell) of raw markup into plain ASCII text.
//! Pass order is load-bearing: later passes assume the removals performed
//! by earlier ones. Link patterns are tried most-specific first so that
//! navigation artifacts (`[[#anchor|Link]]`, footnote asterisks) are
//! dropped before generic link resolution can render them as text.

use crate::normalize::normalize_unicode;

/// Number of template-removal passes. Templates nested deeper than this
/// are left as literal text.
pub(crate) const TEMPLATE_PASSES: usize = 3;

/// Strip inline wikitext markup, keeping readable text.
pub fn strip_inline_markup(text: &str) -> String {
    // 1. template transclusions, bounded nesting.
    let mut text = remove_templates(text);

    // 2. line breaks become a separator; remaining tags keep their content.
    text = replace_br_tags(&text, " / ");
    text = remove_html_tags(&text);

    // 3. bold/italic quote runs.
    text = remove_quote_runs(&text);

    // 4. wiki UI artifacts: [[#anchor|Link]] and [[#anchor| * ]] footnotes.
    text = strip_anchor_links(&text, |display| display == "Link");
    text = strip_anchor_links(&text, |display| display.trim() == "*");

    // 5. internal links, then stray leftover closing brackets.
    text = resolve_anchor_links(&text);
    text = resolve_piped_links(&text);
    text = resolve_plain_links(&text);
    text = text.replace("]]", "");

    // 6. external links and bare URLs.
    text = resolve_labeled_external_links(&text);
    text = remove_bracketed_urls(&text);
    text = remove_bare_urls(&text);

    // 7. character references.
    text = decode_numeric_entities(&text);
    text = decode_named_entities(&text);

    // 8. whitespace cleanup.
    collapse_spaces(&text).trim().to_string()
}

/// Remove `{{...}}` transclusions, innermost first, for a bounded number of
/// passes.
pub(crate) fn remove_templates(text: &str) -> String {
    let mut out = text.to_string();
    for _ in 0..TEMPLATE_PASSES {
        let next = remove_innermost_templates(&out);
        if next == out {
            break;
        }
        out = next;
    }
    out
}

/// Remove every `{{...}}` whose body contains no further braces.
fn remove_innermost_templates(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut seg = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'{' && bytes.get(i + 1) == Some(&b'{') {
            let mut j = i + 2;
            let mut end = None;
            while j < bytes.len() {
                match bytes[j] {
                    b'{' => break,
                    b'}' => {
                        if bytes.get(j + 1) == Some(&b'}') {
                            end = Some(j + 2);
                        }
                        break;
                    }
                    _ => j += 1,
                }
            }
            if let Some(end) = end {
                out.push_str(&text[seg..i]);
                seg = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }
    out.push_str(&text[seg..]);
    out
}

/// Replace `<br>`, `<br/>`, `<br />` (any case) with `rep`.
fn replace_br_tags(text: &str, rep: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut seg = 0usize;
    let mut i = 0usize;
    while i + 3 <= bytes.len() {
        if bytes[i] == b'<'
            && bytes[i + 1].eq_ignore_ascii_case(&b'b')
            && bytes[i + 2].eq_ignore_ascii_case(&b'r')
        {
            let mut j = i + 3;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'/' {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'>' {
                out.push_str(&text[seg..i]);
                out.push_str(rep);
                seg = j + 1;
                i = j + 1;
                continue;
            }
        }
        i += 1;
    }
    out.push_str(&text[seg..]);
    out
}

/// Drop all remaining tag-like markup (`<tag ...>`, `</tag>`), keeping the
/// content between tags. Unterminated tags are left as literal text.
fn remove_html_tags(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut seg = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            let mut j = i + 1;
            if bytes.get(j) == Some(&b'/') {
                j += 1;
            }
            if bytes.get(j).is_some_and(|b| b.is_ascii_alphabetic())
                && let Some(rel) = text[j..].find('>')
            {
                out.push_str(&text[seg..i]);
                seg = j + rel + 1;
                i = seg;
                continue;
            }
        }
        i += 1;
    }
    out.push_str(&text[seg..]);
    out
}

/// Remove runs of 2-3 quote characters (wiki bold/italic markers).
///
/// Longer runs are consumed three at a time, so a run of length `n` leaves
/// one quote behind exactly when `n % 3 == 1`.
pub(crate) fn remove_quote_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\'' {
            let mut n = 1usize;
            while chars.peek() == Some(&'\'') {
                chars.next();
                n += 1;
            }
            if n == 1 || n % 3 == 1 {
                out.push('\'');
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Parse `[[#anchor|display]]` starting just past `[[#`. Returns the display
/// text and the number of bytes consumed after the `[[#` prefix.
fn parse_anchor_link(s: &str) -> Option<(&str, usize)> {
    let pipe = find_before(s, '|', ']')?;
    let rest = &s[pipe + 1..];
    let close = rest.find("]]")?;
    let display = &rest[..close];
    if display.is_empty() || display.contains(']') {
        return None;
    }
    Some((display, pipe + 1 + close + 2))
}

/// Index of `needle` in `s`, but only if it occurs before any `stop` char.
fn find_before(s: &str, needle: char, stop: char) -> Option<usize> {
    for (i, ch) in s.char_indices() {
        if ch == needle {
            return Some(i);
        }
        if ch == stop {
            return None;
        }
    }
    None
}

/// Drop `[[#anchor|display]]` links whose display text is a UI artifact.
fn strip_anchor_links(text: &str, is_artifact: impl Fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("[[#") {
        let after = &rest[pos + 3..];
        match parse_anchor_link(after) {
            Some((display, consumed)) if is_artifact(display) => {
                out.push_str(&rest[..pos]);
                rest = &after[consumed..];
            }
            _ => {
                out.push_str(&rest[..pos + 3]);
                rest = &rest[pos + 3..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Resolve `[[#anchor|display]]` to its display text.
fn resolve_anchor_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("[[#") {
        let after = &rest[pos + 3..];
        match parse_anchor_link(after) {
            Some((display, consumed)) => {
                out.push_str(&rest[..pos]);
                out.push_str(display);
                rest = &after[consumed..];
            }
            None => {
                out.push_str(&rest[..pos + 3]);
                rest = &rest[pos + 3..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Resolve `[[target|display]]` to its display text.
pub(crate) fn resolve_piped_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("[[") {
        let after = &rest[pos + 2..];
        let parsed = find_before(after, '|', ']').and_then(|pipe| {
            let tail = &after[pipe + 1..];
            let close = tail.find("]]")?;
            let display = &tail[..close];
            if display.is_empty() || display.contains(']') {
                return None;
            }
            Some((display, pipe + 1 + close + 2))
        });
        match parsed {
            Some((display, consumed)) => {
                out.push_str(&rest[..pos]);
                out.push_str(display);
                rest = &after[consumed..];
            }
            None => {
                out.push_str(&rest[..pos + 2]);
                rest = &rest[pos + 2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Resolve `[[target]]` to its target text.
pub(crate) fn resolve_plain_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("[[") {
        let after = &rest[pos + 2..];
        let parsed = after.find("]]").and_then(|close| {
            let inner = &after[..close];
            if inner.is_empty() || inner.contains(']') {
                return None;
            }
            Some((inner, close + 2))
        });
        match parsed {
            Some((inner, consumed)) => {
                out.push_str(&rest[..pos]);
                out.push_str(inner);
                rest = &after[consumed..];
            }
            None => {
                out.push_str(&rest[..pos + 2]);
                rest = &rest[pos + 2..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn url_prefix_len(s: &str) -> Option<usize> {
    if s.starts_with("https://") {
        Some("https://".len())
    } else if s.starts_with("http://") {
        Some("http://".len())
    } else {
        None
    }
}

/// Resolve `[url label]` to its label.
fn resolve_labeled_external_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("[http") {
        let after = &rest[pos + 1..];
        let parsed = url_prefix_len(after).and_then(|scheme| {
            // the URL itself: at least one more char, no whitespace or ']'.
            let tail = &after[scheme..];
            let url_end = tail
                .char_indices()
                .find(|(_, c)| c.is_whitespace() || *c == ']')
                .map(|(i, _)| i)
                .unwrap_or(tail.len());
            if url_end == 0 || !tail[url_end..].starts_with(' ') {
                return None;
            }
            let label_tail = &tail[url_end + 1..];
            let close = label_tail.find(']')?;
            let label = &label_tail[..close];
            if label.is_empty() {
                return None;
            }
            Some((label, scheme + url_end + 1 + close + 1))
        });
        match parsed {
            Some((label, consumed)) => {
                out.push_str(&rest[..pos]);
                out.push_str(label);
                rest = &after[consumed..];
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

/// Remove label-less `[url]` links entirely.
fn remove_bracketed_urls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("[http") {
        let after = &rest[pos + 1..];
        let parsed = url_prefix_len(after).and_then(|scheme| {
            let tail = &after[scheme..];
            let close = tail.find(']')?;
            if close == 0 {
                return None;
            }
            Some(scheme + close + 1)
        });
        match parsed {
            Some(consumed) => {
                out.push_str(&rest[..pos]);
                rest = &after[consumed..];
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

/// Remove bare URLs (scheme through the next whitespace).
fn remove_bare_urls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let pos = match (rest.find("http://"), rest.find("https://")) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let Some(pos) = pos else {
            break;
        };
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let end = tail
            .char_indices()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, _)| i)
            .unwrap_or(tail.len());
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}

/// Decode `&#NNN;` and `&#xHH;` character references. Invalid or overflowing
/// values decode to `?`. Decoded characters outside printable ASCII are
/// re-normalized (or dropped) so output stays displayable.
fn decode_numeric_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("&#") {
        let after = &rest[pos + 2..];
        let body_end = after
            .char_indices()
            .find(|(_, c)| !c.is_ascii_alphanumeric())
            .map(|(i, _)| i)
            .unwrap_or(after.len());
        let body = &after[..body_end];
        let is_ref = !body.is_empty()
            && after[body_end..].starts_with(';')
            && body
                .strip_prefix('x')
                .unwrap_or(body)
                .chars()
                .all(|c| c.is_ascii_hexdigit());
        if !is_ref {
            out.push_str(&rest[..pos + 2]);
            rest = &rest[pos + 2..];
            continue;
        }
        out.push_str(&rest[..pos]);
        push_decoded_char(&mut out, body);
        rest = &after[body_end + 1..];
    }
    out.push_str(rest);
    out
}

fn push_decoded_char(out: &mut String, body: &str) {
    let value = match body.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => body.parse::<u32>(),
    };
    match value.ok().and_then(char::from_u32) {
        Some(ch) if (' '..='~').contains(&ch) => out.push(ch),
        Some(ch) => {
            for mapped in normalize_unicode(&ch.to_string()).chars() {
                if (' '..='~').contains(&mapped) {
                    out.push(mapped);
                }
            }
        }
        None => out.push('?'),
    }
}

/// Decode the five supported named entities, exactly one level each.
fn decode_named_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&nbsp;", " ")
}

/// Collapse runs of 2+ spaces to a single space.
fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for ch in text.chars() {
        if ch == ' ' {
            if !prev_space {
                out.push(ch);
            }
            prev_space = true;
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_are_removed_up_to_three_levels() {
        assert_eq!(strip_inline_markup("a {{tpl|x=1}} b"), "a b");
        assert_eq!(strip_inline_markup("a {{o|{{m|{{i}}}}}} b"), "a b");
    }

    #[test]
    fn templates_nested_too_deep_leave_residue() {
        let out = strip_inline_markup("{{a|{{b|{{c|{{d}}}}}}}}");
        assert!(out.contains("{{"), "expected residual braces, got {out:?}");
    }

    #[test]
    fn br_tags_become_separators() {
        assert_eq!(strip_inline_markup("one<br>two<BR/>three<br />four"), "one / two / three / four");
    }

    #[test]
    fn html_tags_are_stripped_keeping_content() {
        assert_eq!(strip_inline_markup("<center>text</center>"), "text");
        assert_eq!(strip_inline_markup("a <span class=\"x\">b</span> c"), "a b c");
    }

    #[test]
    fn unterminated_tag_is_left_as_text() {
        assert_eq!(strip_inline_markup("a <center b"), "a <center b");
    }

    #[test]
    fn bold_and_italic_markers_are_removed() {
        assert_eq!(strip_inline_markup("'''bold''' and ''italic''"), "bold and italic");
        assert_eq!(strip_inline_markup("'''''both'''''"), "both");
    }

    #[test]
    fn single_quotes_survive() {
        assert_eq!(strip_inline_markup("it's fine"), "it's fine");
    }

    #[test]
    fn navigation_link_artifacts_are_dropped() {
        assert_eq!(strip_inline_markup("Before [[#Top|Link]] after"), "Before after");
        assert_eq!(strip_inline_markup("Note[[#fn1| * ]] here"), "Note here");
    }

    #[test]
    fn anchor_links_keep_display_text() {
        assert_eq!(strip_inline_markup("See [[#Setup|the setup section]]."), "See the setup section.");
    }

    #[test]
    fn internal_links_resolve_to_display_or_target() {
        assert_eq!(strip_inline_markup("[[Controls|the controls]]"), "the controls");
        assert_eq!(strip_inline_markup("[[Netplay]]"), "Netplay");
    }

    #[test]
    fn stray_closing_brackets_are_cleaned_up() {
        assert_eq!(strip_inline_markup("broken]] link"), "broken link");
    }

    #[test]
    fn external_links_resolve_to_label_or_nothing() {
        assert_eq!(strip_inline_markup("[https://example.com the site]"), "the site");
        assert_eq!(strip_inline_markup("see [https://example.com] now"), "see now");
        assert_eq!(strip_inline_markup("go to https://example.com/x today"), "go to today");
    }

    #[test]
    fn numeric_entities_decode() {
        assert_eq!(strip_inline_markup("&#42;"), "*");
        assert_eq!(strip_inline_markup("&#x2A;"), "*");
        assert_eq!(strip_inline_markup("&#99999999;"), "?");
    }

    #[test]
    fn non_ascii_entities_are_normalized() {
        // HORIZONTAL ELLIPSIS via entity, then the fixed table.
        assert_eq!(strip_inline_markup("wait&#x2026;"), "wait...");
    }

    #[test]
    fn named_entities_decode_one_level() {
        assert_eq!(strip_inline_markup("&amp;amp;"), "&amp;");
        assert_eq!(strip_inline_markup("a&nbsp;b &lt;x&gt; &quot;q&quot;"), "a b <x> \"q\"");
    }

    #[test]
    fn whitespace_collapses_and_trims() {
        assert_eq!(strip_inline_markup("  a    b  "), "a b");
    }
}
