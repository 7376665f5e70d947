//! Generated C header output.
//!
//! The display firmware consumes the converted wiki as a compiled-in data
//! table: one `static const` line array per page plus a master page table.
//! Everything emitted inside string literals is printable ASCII.

use crate::convert::{Line, LineType};
use crate::normalize::normalize_unicode;
use time::macros::format_description;
use time::OffsetDateTime;

/// One converted page, ready for emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub lines: Vec<Line>,
}

fn line_type_code(kind: LineType) -> u8 {
    match kind {
        LineType::Normal => 0,
        LineType::Heading2 => 1,
        LineType::Heading3 => 2,
        LineType::Heading4 => 3,
    }
}

/// Escape a string for a C string literal, hard-filtered to ASCII 32-126.
pub fn escape_c_string(s: &str) -> String {
    let s = normalize_unicode(s).replace('\\', "\\\\").replace('"', "\\\"");
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            ' '..='~' => out.push(ch),
            _ => {}
        }
    }
    out
}

fn build_date_utc() -> String {
    let format = format_description!("[year]-[month]-[day]");
    OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_else(|_| "1970-01-01".to_string())
}

/// Generate the full `wiki_data.h` content for the given pages.
pub fn generate_header(pages: &[Page]) -> String {
    generate_header_dated(pages, &build_date_utc())
}

fn generate_header_dated(pages: &[Page], build_date: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    out.push("/* AUTO-GENERATED by wiki2txt -- DO NOT EDIT */".to_string());
    out.push(format!("/* Built: {build_date} */"));
    out.push("#ifndef WIKI_DATA_H".to_string());
    out.push("#define WIKI_DATA_H".to_string());
    out.push(String::new());
    out.push(format!("#define WIKI_PAGE_COUNT {}", pages.len()));
    out.push(format!("#define WIKI_BUILD_DATE \"{build_date}\""));
    out.push(String::new());
    out.push("/* Line types */".to_string());
    out.push("#define LINE_NORMAL 0".to_string());
    out.push("#define LINE_H2     1".to_string());
    out.push("#define LINE_H3     2".to_string());
    out.push("#define LINE_H4     3".to_string());
    out.push(String::new());
    out.push("typedef struct {".to_string());
    out.push("    const char *text;".to_string());
    out.push("    int type;".to_string());
    out.push("} wiki_line_t;".to_string());
    out.push(String::new());
    out.push("typedef struct {".to_string());
    out.push("    const char *title;".to_string());
    out.push("    const wiki_line_t *lines;".to_string());
    out.push("    int line_count;".to_string());
    out.push("} wiki_page_t;".to_string());
    out.push(String::new());

    for (i, page) in pages.iter().enumerate() {
        out.push(format!("/* Page {i}: {} */", page.title));
        out.push(format!("static const wiki_line_t page_{i}_lines[] = {{"));
        for line in &page.lines {
            out.push(format!(
                "    {{\"{}\", {}}},",
                escape_c_string(&line.text),
                line_type_code(line.kind)
            ));
        }
        out.push("};".to_string());
        out.push(String::new());
    }

    out.push("static const wiki_page_t wiki_pages[WIKI_PAGE_COUNT] = {".to_string());
    for (i, page) in pages.iter().enumerate() {
        out.push(format!(
            "    {{\"{}\", page_{i}_lines, {}}},",
            escape_c_string(&page.title),
            page.lines.len()
        ));
    }
    out.push("};".to_string());
    out.push(String::new());
    out.push("#endif /* WIKI_DATA_H */".to_string());

    out.join("\n") + "\n"
}
