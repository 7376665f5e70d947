//! Wiki table rendering as indented label/value text.
//!
//! A 74-column display has no room for columnar layout, so tables become a
//! vertical record per row: the first cell labels the record and the
//! remaining cells are listed under it, paired with the header row's cell
//! text when one exists.

use crate::strip::strip_inline_markup;

enum TableItem {
    Caption(String),
    Row(Vec<String>),
}

/// Render one `{|...|}` table block as plain-text lines.
///
/// The input is the full block including the `{|` and `|}` delimiter lines.
/// Malformed rows degrade to whatever cells were recognized; the function
/// never fails.
pub fn format_table(block: &str) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    let mut items: Vec<TableItem> = Vec::new();
    let mut current_row: Vec<String> = Vec::new();
    let mut in_header = false;

    let flush = |row: &mut Vec<String>, in_header: &mut bool, items: &mut Vec<TableItem>, headers: &mut Vec<String>| {
        if !row.is_empty() {
            if *in_header {
                *headers = std::mem::take(row);
            } else {
                items.push(TableItem::Row(std::mem::take(row)));
            }
        }
        *in_header = false;
    };

    for raw in block.lines() {
        let line = raw.trim();
        if line.starts_with("{|") || line.starts_with("|}") {
            continue;
        }
        if let Some(caption) = line.strip_prefix("|+") {
            let caption = strip_inline_markup(caption);
            if !caption.is_empty() {
                items.push(TableItem::Caption(caption));
            }
        } else if line.starts_with("|-") {
            flush(&mut current_row, &mut in_header, &mut items, &mut headers);
        } else if let Some(rest) = line.strip_prefix('!') {
            in_header = true;
            let rest = rest.trim_start_matches('!');
            for cell in rest.split("||") {
                let cell = strip_inline_markup(cell);
                // header cells may carry attributes before a '|'.
                let cell = match cell.split_once('|') {
                    Some((_, text)) => text.trim().to_string(),
                    None => cell,
                };
                current_row.push(cell);
            }
        } else if let Some(rest) = line.strip_prefix('|') {
            for cell in rest.split("||") {
                let cell = strip_inline_markup(cell);
                // discard what looks like a cell attribute prefix, keep
                // legitimate '|'-containing text.
                let cell = match cell.split_once('|') {
                    Some((prefix, text))
                        if prefix.contains('=') || prefix.trim().starts_with("class") =>
                    {
                        text.trim().to_string()
                    }
                    _ => cell,
                };
                current_row.push(cell);
            }
        }
        // anything else inside the block (attribute lines, stray text) is
        // not cell data; skip it.
    }
    flush(&mut current_row, &mut in_header, &mut items, &mut headers);

    let mut out = Vec::new();
    for item in items {
        match item {
            TableItem::Caption(caption) => {
                out.push(format!("  [{caption}]"));
                out.push(String::new());
            }
            TableItem::Row(cells) => {
                if headers.is_empty() {
                    out.push(format!("  {}", cells.join(" | ")));
                } else {
                    let label = cells
                        .first()
                        .filter(|c| !c.is_empty())
                        .map(String::as_str)
                        .unwrap_or("(unnamed)");
                    out.push(format!("  {label}:"));
                    for (i, cell) in cells.iter().enumerate().skip(1) {
                        if cell.is_empty() {
                            continue;
                        }
                        match headers.get(i) {
                            Some(header) if !header.is_empty() => {
                                out.push(format!("    {header}: {cell}"));
                            }
                            _ => out.push(format!("    {cell}")),
                        }
                    }
                    out.push(String::new());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headered_table_renders_label_value_records() {
        let block = "{| class=\"wikitable\"\n\
                     ! Game || Year || Rating\n\
                     |-\n\
                     | Pitfall || 1982 || A\n\
                     |-\n\
                     | H.E.R.O. || 1984 || B\n\
                     |}";
        let out = format_table(block);
        assert_eq!(
            out,
            vec![
                "  Pitfall:",
                "    Year: 1982",
                "    Rating: A",
                "",
                "  H.E.R.O.:",
                "    Year: 1984",
                "    Rating: B",
                "",
            ]
        );
    }

    #[test]
    fn headerless_rows_join_with_pipes() {
        let block = "{|\n| a || b\n|-\n| c || d\n|}";
        assert_eq!(format_table(block), vec!["  a | b", "  c | d"]);
    }

    #[test]
    fn caption_is_bracketed() {
        let block = "{|\n|+ Supported systems\n| one\n|}";
        let out = format_table(block);
        assert_eq!(out[0], "  [Supported systems]");
        assert_eq!(out[1], "");
    }

    #[test]
    fn cell_attributes_are_discarded() {
        let block = "{|\n! Name || style=\"width:5em\" | Status\n|-\n\
                     | style=\"color:red\" | Core || class=\"good\" | Works\n|}";
        let out = format_table(block);
        assert_eq!(out, vec!["  Core:", "    Status: Works", ""]);
    }

    #[test]
    fn pipe_inside_plain_text_survives() {
        // no '=' and no "class" prefix: the '|' belongs to the text.
        let block = "{|\n! A || B\n|-\n| Shift|Ctrl || x\n|}";
        let out = format_table(block);
        assert_eq!(out[0], "  Shift|Ctrl:");
    }

    #[test]
    fn empty_first_cell_gets_unnamed_label() {
        let block = "{|\n! K || V\n|-\n| || val\n|}";
        let out = format_table(block);
        assert_eq!(out, vec!["  (unnamed):", "    V: val", ""]);
    }

    #[test]
    fn markup_in_cells_is_stripped() {
        let block = "{|\n! H1 || H2\n|-\n| '''Bold''' || [[Target|link text]]\n|}";
        let out = format_table(block);
        assert_eq!(out, vec!["  Bold:", "    H2: link text", ""]);
    }

    #[test]
    fn unterminated_table_degrades_gracefully() {
        let block = "{|\n! A || B\n|-\n| x || y";
        let out = format_table(block);
        assert_eq!(out, vec!["  x:", "    B: y", ""]);
    }

    #[test]
    fn empty_table_produces_no_lines() {
        assert!(format_table("{|\n|}").is_empty());
    }
}
