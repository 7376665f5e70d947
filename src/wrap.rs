//! Fixed-width word wrapping with indent-aware continuation lines.

/// Wrap a single logical line to `width` columns.
///
/// If the text already fits it is returned unchanged. Otherwise the line is
/// broken at the last space at or before the width boundary; when no such
/// space exists past the indent, the line is hard-broken exactly at the
/// width column (a single over-long token). Continuation lines reuse the
/// detected leading indent plus two extra spaces.
///
/// Stateless and deterministic; every produced line has trailing whitespace
/// trimmed.
pub fn word_wrap(text: &str, width: usize) -> Vec<String> {
    if text.chars().count() <= width {
        return vec![text.to_string()];
    }

    let stripped = text.trim_start();
    let indent = &text[..text.len() - stripped.len()];
    let cont_indent = format!("{}  ", indent);

    // a width that fits inside the continuation indent cannot make progress.
    let width = width.max(cont_indent.chars().count() + 1);

    let mut lines = Vec::new();
    let mut remaining = text.to_string();
    let mut first = true;

    while remaining.chars().count() > width {
        let window_end = char_boundary(&remaining, width + 1);
        let indent_len = if first { indent.len() } else { cont_indent.len() };
        let break_at = match remaining[..window_end].rfind(' ') {
            Some(at) if at > indent_len => at,
            _ => char_boundary(&remaining, width),
        };
        lines.push(remaining[..break_at].trim_end().to_string());
        remaining = format!("{}{}", cont_indent, remaining[break_at..].trim_start());
        first = false;
    }

    if !remaining.trim().is_empty() {
        lines.push(remaining.trim_end().to_string());
    }

    lines
}

/// Byte offset of the `n`-th character, or the end of the string.
fn char_boundary(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}
