//! MediaWiki access: page discovery, redirect resolution, wikitext fetch.
//!
//! Discovery and redirect resolution go through the `api.php` JSON API.
//! Raw wikitext comes from the edit page (`index.php?...&action=edit`),
//! scraped out of the edit textarea. That route works on wikis where the
//! raw-export endpoints are disabled, which is why it is used for
//! everything.

use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use reqwest::Url;
use scraper::{Html, Selector};
use serde::Deserialize;

/// A resolved redirect: where it points, and optionally which section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    pub fragment: Option<String>,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(rename = "continue")]
    cont: Option<ContinueToken>,
    query: Option<QueryBody>,
}

#[derive(Deserialize)]
struct ContinueToken {
    apcontinue: Option<String>,
}

#[derive(Deserialize)]
struct QueryBody {
    #[serde(default)]
    allpages: Vec<PageEntry>,
    #[serde(default)]
    redirects: Vec<RedirectEntry>,
}

#[derive(Deserialize)]
struct PageEntry {
    title: String,
}

#[derive(Deserialize)]
struct RedirectEntry {
    from: String,
    to: String,
    tofragment: Option<String>,
}

fn api_get(api_url: &str, params: &[(&str, &str)]) -> Result<ApiResponse, Box<dyn Error>> {
    let mut url = Url::parse(api_url)?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("format", "json");
        for (key, value) in params {
            query.append_pair(key, value);
        }
    }

    let resp = reqwest::blocking::get(url.clone())?;
    if !resp.status().is_success() {
        return Err(format!("GET {url} returned {}", resp.status()).into());
    }
    let body = resp.text()?;
    Ok(serde_json::from_str(&body)?)
}

/// List every main-namespace page title, following `apcontinue` pagination.
pub fn discover_all_pages(api_url: &str) -> Result<Vec<String>, Box<dyn Error>> {
    let mut titles = Vec::new();
    let mut cont: Option<String> = None;

    loop {
        let mut params = vec![
            ("action", "query"),
            ("list", "allpages"),
            ("aplimit", "500"),
            ("apnamespace", "0"),
        ];
        if let Some(token) = cont.as_deref() {
            params.push(("apcontinue", token));
        }

        let resp = api_get(api_url, &params)?;
        if let Some(query) = resp.query {
            titles.extend(query.allpages.into_iter().map(|p| p.title));
        }
        cont = resp.cont.and_then(|c| c.apcontinue);
        if cont.is_none() {
            return Ok(titles);
        }
    }
}

/// Ask the API which of `titles` are redirects, in batches of 50 (the API
/// limit for the `titles` parameter).
pub fn resolve_redirects(
    api_url: &str,
    titles: &[String],
) -> Result<HashMap<String, Redirect>, Box<dyn Error>> {
    let mut redirects = HashMap::new();

    for chunk in titles.chunks(50) {
        let joined = chunk.join("|");
        let params = [
            ("action", "query"),
            ("titles", joined.as_str()),
            ("redirects", "1"),
        ];
        let resp = api_get(api_url, &params)?;
        let Some(query) = resp.query else {
            continue;
        };
        for entry in query.redirects {
            redirects.insert(
                entry.from,
                Redirect {
                    target: entry.to,
                    fragment: entry.tofragment,
                },
            );
        }
    }

    Ok(redirects)
}

pub fn build_edit_url(index_url: &str, title: &str) -> Result<Url, Box<dyn Error>> {
    let mut url = Url::parse(index_url)?;
    url.query_pairs_mut()
        .append_pair("title", title)
        .append_pair("action", "edit");
    Ok(url)
}

/// Pull the raw wikitext out of an edit page's textarea.
pub fn extract_wikitext_from_edit_html(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    // the edit box has a stable id on stock MediaWiki; fall back to the
    // first textarea for skinned installs.
    let primary = Selector::parse("textarea#wpTextbox1").ok()?;
    let fallback = Selector::parse("textarea").ok()?;

    let textarea = doc
        .select(&primary)
        .next()
        .or_else(|| doc.select(&fallback).next())?;

    let inner = textarea.inner_html();
    Some(html_escape::decode_html_entities(&inner).into_owned())
}

/// Fetch one page's wikitext via its edit page.
pub fn fetch_wikitext(index_url: &str, title: &str) -> Result<String, Box<dyn Error>> {
    let url = build_edit_url(index_url, title)?;
    let resp = reqwest::blocking::get(url.clone())?;
    if !resp.status().is_success() {
        return Err(format!("GET {url} returned {}", resp.status()).into());
    }
    let html = resp.text()?;
    extract_wikitext_from_edit_html(&html)
        .ok_or_else(|| format!("no edit textarea found for {title:?}").into())
}

/// Fetch one page's wikitext and save it under `path`.
pub fn fetch_and_save(
    index_url: &str,
    title: &str,
    path: &Path,
) -> Result<String, Box<dyn Error>> {
    let text = fetch_wikitext(index_url, title)?;
    fs::write(path, &text)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_url_carries_title_and_action() {
        let url = build_edit_url("https://www.emuvr.net/w/index.php", "How To Play").unwrap();
        let s = url.as_str();
        assert!(s.starts_with("https://www.emuvr.net/w/index.php?"));
        assert!(s.contains("title=How+To+Play"));
        assert!(s.contains("action=edit"));
    }

    #[test]
    fn textarea_with_id_is_preferred() {
        let html = r#"<html><body>
            <textarea name="other">decoy</textarea>
            <textarea id="wpTextbox1" name="wpTextbox1">== Real ==</textarea>
        </body></html>"#;
        assert_eq!(
            extract_wikitext_from_edit_html(html).unwrap(),
            "== Real =="
        );
    }

    #[test]
    fn first_textarea_is_the_fallback() {
        let html = "<html><body><textarea name=\"x\">content here</textarea></body></html>";
        assert_eq!(
            extract_wikitext_from_edit_html(html).unwrap(),
            "content here"
        );
    }

    #[test]
    fn textarea_content_is_entity_decoded() {
        let html = "<textarea id=\"wpTextbox1\">a &amp;&amp; b &lt;tag&gt;</textarea>";
        assert_eq!(
            extract_wikitext_from_edit_html(html).unwrap(),
            "a && b <tag>"
        );
    }

    #[test]
    fn page_without_textarea_yields_none() {
        assert!(extract_wikitext_from_edit_html("<html><body>login required</body></html>").is_none());
    }

    #[test]
    fn allpages_response_parses() {
        let body = r#"{
            "continue": { "apcontinue": "Netplay", "continue": "-||" },
            "query": { "allpages": [
                { "pageid": 1, "ns": 0, "title": "Controls" },
                { "pageid": 2, "ns": 0, "title": "FAQ" }
            ] }
        }"#;
        let resp: ApiResponse = serde_json::from_str(body).unwrap();
        let titles: Vec<_> = resp.query.unwrap().allpages.into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Controls", "FAQ"]);
        assert_eq!(resp.cont.unwrap().apcontinue.as_deref(), Some("Netplay"));
    }

    #[test]
    fn redirects_response_parses_with_and_without_fragment() {
        let body = r#"{
            "query": { "redirects": [
                { "from": "Save States", "to": "Settings", "tofragment": "Save States" },
                { "from": "Gamepads", "to": "Controls" }
            ], "pages": {} }
        }"#;
        let resp: ApiResponse = serde_json::from_str(body).unwrap();
        let redirects = resp.query.unwrap().redirects;
        assert_eq!(redirects[0].tofragment.as_deref(), Some("Save States"));
        assert_eq!(redirects[1].from, "Gamepads");
        assert_eq!(redirects[1].to, "Controls");
        assert!(redirects[1].tofragment.is_none());
    }

    #[test]
    fn response_without_query_parses() {
        let resp: ApiResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.query.is_none());
        assert!(resp.cont.is_none());
    }
}
