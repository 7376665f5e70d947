//! Build configuration, loadable from a YAML file.

use std::error::Error;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Everything the full build needs to know. Every field has a default, so
/// an empty (or absent) config file produces a working build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// MediaWiki API endpoint.
    pub api_url: String,
    /// MediaWiki index.php, used for edit-page wikitext fetches.
    pub index_url: String,
    /// Display column width.
    pub line_width: usize,
    /// Directory for cached `.wiki` files.
    pub cache_dir: String,
    /// Generated header path.
    pub output: String,
    /// Titles to place first, in this order.
    pub preferred_order: Vec<String>,
    /// Titles to leave out entirely.
    pub exclude_pages: Vec<String>,
    /// Pause between network fetches, in milliseconds.
    pub request_delay_ms: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            api_url: "https://www.emuvr.net/w/api.php".to_string(),
            index_url: "https://www.emuvr.net/w/index.php".to_string(),
            line_width: 74,
            cache_dir: "cache/wiki".to_string(),
            output: "src/wiki_data.h".to_string(),
            preferred_order: [
                "Updates",
                "Installation Guide",
                "How To Play",
                "Controls",
                "Customization",
                "Netplay",
                "Light Guns",
                "Room Saving",
                "Playing Videos and Music",
                "DOSBox Games",
                "Adding DOSBox Games",
                "Keyboard and Mouse Input For Games",
                "Settings",
                "FAQ",
                "Troubleshooting",
            ]
            .map(String::from)
            .to_vec(),
            exclude_pages: vec!["Main Page".to_string()],
            request_delay_ms: 500,
        }
    }
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("read {}: {e}", path.display()))?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, Box<dyn Error>> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let cfg = BuildConfig::default();
        assert_eq!(cfg.line_width, 74);
        assert!(cfg.api_url.ends_with("api.php"));
        assert_eq!(cfg.exclude_pages, vec!["Main Page"]);
        assert!(cfg.preferred_order.contains(&"FAQ".to_string()));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let cfg: BuildConfig =
            serde_yaml::from_str("line_width: 40\ncache_dir: /tmp/wiki\n").unwrap();
        assert_eq!(cfg.line_width, 40);
        assert_eq!(cfg.cache_dir, "/tmp/wiki");
        assert_eq!(cfg.request_delay_ms, 500);
        assert!(!cfg.preferred_order.is_empty());
    }

    #[test]
    fn empty_yaml_is_all_defaults() {
        let cfg: BuildConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg.output, "src/wiki_data.h");
    }
}
