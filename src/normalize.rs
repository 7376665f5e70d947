//! Unicode -> printable-ASCII normalization.
//!
//! The target display is an 8x8 bitmap font covering ASCII 32-126 only, so
//! every character must end up in that range or be dropped. Normalization
//! runs over whole documents before line splitting, so newlines pass
//! through untouched.

/// Replace non-ASCII characters with printable-ASCII equivalents.
///
/// Three stages per character, in order:
/// 1. a fixed substitution table for characters that deserve an exact
///    rendering (smart quotes, dashes, arrows, console button glyphs, ...);
/// 2. a name-based fallback driven by the Unicode character database;
/// 3. silently drop anything still unmatched (emoji, decorative icons).
///
/// Deterministic and side-effect free.
pub fn normalize_unicode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if let Some(rep) = fixed_replacement(ch) {
            out.push_str(rep);
        } else if ch == '\n' || ch == '\r' || (' '..='~').contains(&ch) {
            out.push(ch);
        } else if let Some(rep) = name_fallback(ch) {
            out.push(rep);
        }
    }
    out
}

fn fixed_replacement(ch: char) -> Option<&'static str> {
    let rep = match ch {
        // smart quotes and apostrophes (backtick included: the font draws it badly)
        '\u{2018}' | '\u{2019}' | '\u{00B4}' | '`' => "'",
        '\u{201C}' | '\u{201D}' => "\"",
        // dashes
        '\u{2013}' | '\u{2012}' => "-",
        '\u{2014}' => "--",
        // spaces; TAB maps to a plain space so output stays inside 32..=126
        '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\t' => " ",
        // arrows
        '\u{2190}' => "<-",
        '\u{2192}' => "->",
        '\u{2191}' => "^",
        '\u{2193}' => "v",
        '\u{21D2}' => "=>",
        // console button glyphs (Cross, Circle, Square, Triangle)
        '\u{2716}' => "X",
        '\u{2B24}' => "O",
        '\u{25FC}' => "[]",
        '\u{25B2}' => "/\\",
        // other common symbols
        '\u{2022}' => "-",
        '\u{2026}' => "...",
        '\u{00D7}' => "x",
        '\u{2714}' => "[x]",
        '\u{2718}' => "[ ]",
        '\u{2605}' | '\u{2606}' => "*",
        '\u{00A9}' => "(c)",
        '\u{00AE}' => "(R)",
        '\u{2122}' => "(TM)",
        '\u{00BD}' => "1/2",
        '\u{00BC}' => "1/4",
        '\u{00BE}' => "3/4",
        // hamburger menu
        '\u{2630}' => "#",
        _ => return None,
    };
    Some(rep)
}

/// Classify a leftover character by its Unicode name.
///
/// Keyword order matters: "arrow" wins over "dash" for characters like
/// LEFT RIGHT ARROW WITH STROKE whose names contain several keywords.
fn name_fallback(ch: char) -> Option<char> {
    let name = unicode_names2::name(ch)?.to_string().to_ascii_lowercase();
    if name.contains("arrow") {
        Some('>')
    } else if name.contains("bullet") || name.contains("dot") {
        Some('-')
    } else if name.contains("star") {
        Some('*')
    } else if name.contains("check") || name.contains("ballot") {
        Some('x')
    } else if name.contains("cross") {
        Some('X')
    } else if name.contains("dash") || name.contains("hyphen") {
        Some('-')
    } else if name.contains("space") {
        Some(' ')
    } else if name.contains("quotation") || name.contains("apostrophe") {
        Some('\'')
    } else {
        None
    }
}
