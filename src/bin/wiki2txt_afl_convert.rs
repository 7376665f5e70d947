//! AFL++ fuzz target for `wiki2txt`.
//!
//! This binary is intentionally stdin-driven, so it can be used with AFL++.
//! Build and run it via `cargo-afl`:
//!
//! ```bash
//! cargo install cargo-afl
//!
//! cargo afl build --release --features afl_fuzz --bin wiki2txt_afl_convert
//!
//! mkdir -p fuzz/afl/out
//!
//! cargo afl fuzz \
//!   -i fuzz/afl/in \
//!   -o fuzz/afl/out \
//!   target/release/wiki2txt_afl_convert
//! ```
//!
//! Rust panics normally unwind and exit with a non-crashing status code.
//! AFL++ only treats crashes as signals/aborts. We therefore catch any unwind
//! and turn it into `abort()`.

use std::io::Read;

use wiki2txt::convert::{wiki_to_lines, LineType};

const WIDTH: usize = 74;

const MAX_INPUT_LEN: usize = 1_000_000; // 1MB guardrail; AFL++ will typically cap this anyway.

fn run_one_input(data: &[u8]) {
    if data.len() > MAX_INPUT_LEN {
        // guardrail: avoid pathological OOM / quadratic behavior on enormous inputs.
        return;
    }

    // wikitext should be UTF-8, but AFL++ will happily hand us arbitrary bytes.
    // lossy conversion keeps the harness total (no early returns that reduce coverage).
    let src = String::from_utf8_lossy(data).to_string();

    let lines = wiki_to_lines(&src, WIDTH);

    // invariants that must hold for any input (valid or invalid):
    // - every output char is printable ASCII, no embedded newlines
    // - body lines never exceed the width (single-token hard breaks land
    //   exactly on it)
    // - blank runs are capped at 2 and never touch the edges
    for line in &lines {
        for ch in line.text.chars() {
            assert!(
                (' '..='~').contains(&ch),
                "non-printable char {ch:?} in output"
            );
        }
        if line.kind == LineType::Normal {
            assert!(
                line.text.chars().count() <= WIDTH,
                "body line longer than width: {:?}",
                line.text
            );
        }
    }

    let mut blank_run = 0usize;
    for line in &lines {
        if line.is_blank() {
            blank_run += 1;
            assert!(blank_run <= 2, "blank run longer than 2");
        } else {
            blank_run = 0;
        }
    }
    if let Some(first) = lines.first() {
        assert!(!first.text.is_empty(), "leading blank line");
    }
    if let Some(last) = lines.last() {
        assert!(!last.text.is_empty(), "trailing blank line");
    }

    // conversion must be deterministic.
    assert_eq!(lines, wiki_to_lines(&src, WIDTH));
}

fn main() {
    let mut data = Vec::new();
    std::io::stdin().read_to_end(&mut data).unwrap();

    // convert any panic into an abort().
    if std::panic::catch_unwind(|| run_one_input(&data)).is_err() {
        std::process::abort();
    }
}
