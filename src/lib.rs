//! wiki2txt: MediaWiki markup -> fixed-width plain text for a small display.
//!
//! Goals:
//! - convert wiki pages to 74-column ASCII text with tagged headings
//! - fetch pages over the MediaWiki API / edit pages, with an on-disk cache
//! - order pages for a table of contents and emit them as a C header
//! - degrade gracefully: a broken page becomes a placeholder, never an abort
//!
//! The conversion pipeline itself lives in [`convert`] and is pure; this
//! module is the orchestration around it (discovery, fetching, caching,
//! ordering, emission).

use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use deunicode::deunicode;
use walkdir::WalkDir;

pub mod config;
pub mod convert;
pub mod emit;
pub mod normalize;
pub mod section;
pub mod strip;
pub mod table;
pub mod wiki;
pub mod wrap;

use config::BuildConfig;
use convert::{wiki_to_lines, Line};
use emit::Page;
use wiki::Redirect;

/// Shown when a page could not be fetched or came back empty.
pub const PAGE_UNAVAILABLE: &str = "(Page content unavailable)";
/// Shown when a section redirect's target page has no usable wikitext.
pub const SECTION_UNAVAILABLE: &str = "(Section content unavailable)";
/// Shown when the named section does not exist on the target page.
pub const SECTION_NOT_FOUND: &str = "(Section not found)";

fn placeholder_page(title: &str, message: &str) -> Page {
    Page {
        title: title.to_string(),
        lines: vec![Line::normal(message)],
    }
}

/// Turn a page title into a safe cache file stem.
pub fn sanitize_article_id(raw_title: &str) -> String {
    let mut id = deunicode(raw_title.trim()).replace(' ', "_");
    id = id.replace(['/', '\\'], "_");
    if id.is_empty() {
        id = "Untitled".to_string();
    }
    id
}

fn cache_path(cache_dir: &Path, title: &str) -> PathBuf {
    cache_dir.join(format!("{}.wiki", sanitize_article_id(title)))
}

/// Read a cached page, tolerating invalid UTF-8 from manual edits.
fn read_cached(path: &Path) -> Result<String, Box<dyn Error>> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(&e.into_bytes()).to_string()))
}

/// Get a page's wikitext, from the cache when present. The second value is
/// true when a network fetch happened (the caller throttles those).
fn load_or_fetch(
    cfg: &BuildConfig,
    title: &str,
) -> Result<(String, bool), Box<dyn Error>> {
    let path = cache_path(Path::new(&cfg.cache_dir), title);
    if path.exists() {
        return Ok((read_cached(&path)?, false));
    }
    let text = wiki::fetch_and_save(&cfg.index_url, title, &path)?;
    Ok((text, true))
}

/// Order titles for the table of contents.
///
/// Preferred titles come first, in their given order, each immediately
/// followed by its section-redirect children (sorted). Remaining content
/// pages follow alphabetically, children likewise attached.
pub fn order_pages(
    content_titles: &[String],
    section_redirects: &HashMap<String, Redirect>,
    preferred: &[String],
) -> Vec<String> {
    let mut remaining: BTreeSet<&str> = content_titles.iter().map(String::as_str).collect();

    let mut parent_children: HashMap<&str, Vec<&str>> = HashMap::new();
    for (source, redirect) in section_redirects {
        parent_children
            .entry(redirect.target.as_str())
            .or_default()
            .push(source.as_str());
    }
    for children in parent_children.values_mut() {
        children.sort_unstable();
    }

    let mut ordered: Vec<String> = Vec::new();
    let push_with_children = |title: &str, ordered: &mut Vec<String>| {
        ordered.push(title.to_string());
        if let Some(children) = parent_children.get(title) {
            ordered.extend(children.iter().map(|c| c.to_string()));
        }
    };

    for title in preferred {
        if remaining.remove(title.as_str()) {
            push_with_children(title.as_str(), &mut ordered);
        }
    }
    // BTreeSet iteration gives the alphabetical second pass.
    for &title in &remaining {
        push_with_children(title, &mut ordered);
    }

    ordered
}

fn eprint_progress(start: Instant, count: usize, total: usize, what: &str) {
    let total_ms = start.elapsed().as_millis();
    let mins = total_ms / 60_000;
    let secs = (total_ms % 60_000) / 1_000;
    let ms = total_ms % 1_000;
    eprintln!(
        "[{:>4}/{:>4}] [{:02}:{:02}.{:03}] {}",
        count, total, mins, secs, ms, what
    );
}

/// Full pipeline: discover, resolve redirects, fetch (cache-aware),
/// convert, order and emit the header.
pub fn build_book(cfg: &BuildConfig) -> Result<(), Box<dyn Error>> {
    let start_time = Instant::now();

    eprintln!("Discovering pages via {} ...", cfg.api_url);
    let all_titles = wiki::discover_all_pages(&cfg.api_url)?;
    eprintln!("  found {} pages", all_titles.len());

    eprintln!("Resolving redirects ...");
    let redirects = wiki::resolve_redirects(&cfg.api_url, &all_titles)?;

    let content_titles: Vec<String> = all_titles
        .iter()
        .filter(|t| !redirects.contains_key(*t) && !cfg.exclude_pages.contains(*t))
        .cloned()
        .collect();

    // a redirect with a fragment gets its own page built from the target's
    // section; a plain alias is skipped, its target is already included.
    let mut section_redirects: HashMap<String, Redirect> = HashMap::new();
    let mut alias_count = 0usize;
    for (source, redirect) in redirects {
        if redirect.fragment.is_some() {
            section_redirects.insert(source, redirect);
        } else {
            alias_count += 1;
        }
    }
    eprintln!(
        "  {} content pages, {} section redirects, {} aliases skipped",
        content_titles.len(),
        section_redirects.len(),
        alias_count
    );

    let ordered = order_pages(&content_titles, &section_redirects, &cfg.preferred_order);

    fs::create_dir_all(&cfg.cache_dir)?;

    let mut wikitext_by_title: HashMap<String, String> = HashMap::new();
    let mut pages_by_title: HashMap<String, Page> = HashMap::new();

    let total = content_titles.len();
    for (i, title) in content_titles.iter().enumerate() {
        match load_or_fetch(cfg, title) {
            Ok((wikitext, fetched)) => {
                let page = if wikitext.trim().is_empty() {
                    eprintln!("  WARNING: empty content for {title:?}");
                    placeholder_page(title, PAGE_UNAVAILABLE)
                } else {
                    Page {
                        title: title.clone(),
                        lines: wiki_to_lines(&wikitext, cfg.line_width),
                    }
                };
                wikitext_by_title.insert(title.clone(), wikitext);
                pages_by_title.insert(title.clone(), page);
                eprint_progress(start_time, i + 1, total, title);
                if fetched {
                    thread::sleep(Duration::from_millis(cfg.request_delay_ms));
                }
            }
            Err(e) => {
                eprintln!("  WARNING: fetch failed for {title:?}: {e}");
                pages_by_title.insert(title.clone(), placeholder_page(title, PAGE_UNAVAILABLE));
            }
        }
    }

    for (source, redirect) in &section_redirects {
        let fragment = redirect.fragment.as_deref().unwrap_or_default();
        let page = match wikitext_by_title.get(&redirect.target) {
            None => {
                eprintln!(
                    "  WARNING: no wikitext for target {:?}, skipping {source:?}",
                    redirect.target
                );
                placeholder_page(source, SECTION_UNAVAILABLE)
            }
            Some(wikitext) => match section::extract_section(wikitext, fragment) {
                None => {
                    eprintln!(
                        "  WARNING: section {fragment:?} not found in {:?}",
                        redirect.target
                    );
                    placeholder_page(source, SECTION_NOT_FOUND)
                }
                Some(section_text) => Page {
                    title: source.clone(),
                    lines: wiki_to_lines(&section_text, cfg.line_width),
                },
            },
        };
        pages_by_title.insert(source.clone(), page);
    }

    let pages: Vec<Page> = ordered
        .iter()
        .filter_map(|title| pages_by_title.remove(title))
        .collect();

    write_header(&pages, Path::new(&cfg.output))?;

    let total_lines: usize = pages.iter().map(|p| p.lines.len()).sum();
    eprintln!(
        "Done. {} pages, {} total lines in {:.3}s. Output: {}",
        pages.len(),
        total_lines,
        start_time.elapsed().as_secs_f64(),
        cfg.output
    );
    Ok(())
}

/// Rebuild the header from an existing cache directory, no network.
pub fn regenerate_from_cache(
    cache_dir: &Path,
    output: &Path,
    width: usize,
) -> Result<(), Box<dyn Error>> {
    let start_time = Instant::now();

    if !cache_dir.exists() {
        return Err(format!("cache directory not found: {}", cache_dir.display()).into());
    }

    let mut entries: Vec<_> = WalkDir::new(cache_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == "wiki")
        })
        .collect();

    entries.sort_by(|a, b| a.path().cmp(b.path()));

    let total = entries.len();
    let mut pages = Vec::with_capacity(total);

    for (i, entry) in entries.iter().enumerate() {
        let path = entry.path();
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .replace('_', " ");

        let wikitext = read_cached(path)?;
        let page = if wikitext.trim().is_empty() {
            placeholder_page(&title, PAGE_UNAVAILABLE)
        } else {
            Page {
                title: title.clone(),
                lines: wiki_to_lines(&wikitext, width),
            }
        };
        pages.push(page);
        eprint_progress(start_time, i + 1, total, &title);
    }

    write_header(&pages, output)?;

    eprintln!(
        "Done. Regenerated {} pages in {:.3}s.",
        total,
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

fn write_header(pages: &[Page], output: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, emit::generate_header(pages))?;
    Ok(())
}

/// Fetch (cache-aware) and convert a single page; returns its plain text.
pub fn convert_page(cfg: &BuildConfig, title: &str) -> Result<String, Box<dyn Error>> {
    fs::create_dir_all(&cfg.cache_dir)?;
    let (wikitext, _) = load_or_fetch(cfg, title)?;
    if wikitext.trim().is_empty() {
        return Ok(PAGE_UNAVAILABLE.to_string());
    }
    let lines = wiki_to_lines(&wikitext, cfg.line_width);
    Ok(lines
        .into_iter()
        .map(|l| l.text)
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirect(target: &str, fragment: &str) -> Redirect {
        Redirect {
            target: target.to_string(),
            fragment: Some(fragment.to_string()),
        }
    }

    #[test]
    fn sanitize_replaces_separators_and_spaces() {
        assert_eq!(sanitize_article_id("How To Play"), "How_To_Play");
        assert_eq!(sanitize_article_id("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_article_id("  "), "Untitled");
    }

    #[test]
    fn sanitize_transliterates_non_ascii() {
        assert_eq!(sanitize_article_id("Café Games"), "Cafe_Games");
    }

    #[test]
    fn preferred_pages_come_first_in_given_order() {
        let content = ["Alpha", "Settings", "Controls"].map(String::from);
        let preferred = ["Controls", "Settings"].map(String::from);
        let ordered = order_pages(&content, &HashMap::new(), &preferred);
        assert_eq!(ordered, vec!["Controls", "Settings", "Alpha"]);
    }

    #[test]
    fn section_redirect_children_follow_their_parent_sorted() {
        let content = ["Settings", "Zulu"].map(String::from);
        let preferred = ["Settings".to_string()];
        let mut redirects = HashMap::new();
        redirects.insert("Save States".to_string(), redirect("Settings", "Save States"));
        redirects.insert("Audio".to_string(), redirect("Settings", "Audio"));
        let ordered = order_pages(&content, &redirects, &preferred);
        assert_eq!(ordered, vec!["Settings", "Audio", "Save States", "Zulu"]);
    }

    #[test]
    fn unpreferred_pages_sort_alphabetically_with_children() {
        let content = ["Zulu", "Mango"].map(String::from);
        let mut redirects = HashMap::new();
        redirects.insert("Zulu Tips".to_string(), redirect("Zulu", "Tips"));
        let ordered = order_pages(&content, &redirects, &[]);
        assert_eq!(ordered, vec!["Mango", "Zulu", "Zulu Tips"]);
    }

    #[test]
    fn preferred_titles_absent_from_content_are_ignored() {
        let content = ["Alpha"].map(String::from);
        let preferred = ["Ghost", "Alpha"].map(String::from);
        let ordered = order_pages(&content, &HashMap::new(), &preferred);
        assert_eq!(ordered, vec!["Alpha"]);
    }
}
