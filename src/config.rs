use crate::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Crawl settings loaded from a YAML file. Key names keep the upper-case
/// convention used by the site config files under `config/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    #[serde(rename = "BASE_URL")]
    pub base_url: String,

    #[serde(rename = "SITEMAP_URL", default)]
    pub sitemap_url: Option<String>,

    /// Headers applied to plain HTTP fetches (sitemaps, listing pages).
    /// The browser sessions carry their own user agent.
    #[serde(rename = "HEADERS", default)]
    pub headers: HashMap<String, String>,

    #[serde(rename = "TIMEOUT", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(rename = "SAVE_ROOT_DIR", default = "default_save_root")]
    pub save_root_dir: PathBuf,

    /// JSON cookie export installed before paginated capture runs.
    #[serde(rename = "COOKIES_FILE", default)]
    pub cookies_file: Option<PathBuf>,

    #[serde(rename = "MAX_PAGES", default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_save_root() -> PathBuf {
    PathBuf::from("./data")
}

fn default_max_pages() -> usize {
    10
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn results_dir(&self) -> PathBuf {
        self.save_root_dir.join("result")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.save_root_dir.join("logs")
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.save_root_dir.join("pages")
    }
}

pub fn load_config(path: &Path) -> Result<CrawlerConfig> {
    let text = std::fs::read_to_string(path)?;
    let config = serde_yaml::from_str(&text)?;
    Ok(config)
}

/// Creates `dir` (and any missing parents) and hands it back.
pub fn prepare_folder(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let yaml = r#"
BASE_URL: "https://hiring.cafe/jobs/it"
SITEMAP_URL: "https://hiring.cafe/sitemap.xml"
HEADERS:
  User-Agent: "test-agent"
TIMEOUT: 30000
SAVE_ROOT_DIR: "./out"
MAX_PAGES: 5
"#;
        let config: CrawlerConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.base_url, "https://hiring.cafe/jobs/it");
        assert_eq!(
            config.sitemap_url.as_deref(),
            Some("https://hiring.cafe/sitemap.xml")
        );
        assert_eq!(config.headers.get("User-Agent").unwrap(), "test-agent");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.save_root_dir, PathBuf::from("./out"));
        assert_eq!(config.max_pages, 5);
        assert!(config.cookies_file.is_none());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: CrawlerConfig =
            serde_yaml::from_str("BASE_URL: \"https://hiring.cafe/jobs\"").unwrap();

        assert!(config.sitemap_url.is_none());
        assert!(config.headers.is_empty());
        assert_eq!(config.timeout_ms, 60_000);
        assert_eq!(config.save_root_dir, PathBuf::from("./data"));
        assert_eq!(config.max_pages, 10);
    }

    #[test]
    fn derived_dirs_hang_off_the_save_root() {
        let config: CrawlerConfig =
            serde_yaml::from_str("BASE_URL: \"x\"\nSAVE_ROOT_DIR: \"/tmp/crawl\"").unwrap();

        assert_eq!(config.results_dir(), PathBuf::from("/tmp/crawl/result"));
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/crawl/logs"));
        assert_eq!(config.pages_dir(), PathBuf::from("/tmp/crawl/pages"));
    }

    #[test]
    fn prepare_folder_creates_nested_dirs() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("a/b/c");

        let created = prepare_folder(&target).unwrap();

        assert_eq!(created, target);
        assert!(target.is_dir());
    }
}
