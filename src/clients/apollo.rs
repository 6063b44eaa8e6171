use crate::browser::{poll_until, BrowserCrawler};
use crate::config::CrawlerConfig;
use crate::utils::human_delay;
use crate::writer::save_page_html;
use crate::Result;
use headless_chrome::protocol::cdp::Network::CookieParam;
use headless_chrome::Tab;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

const NEXT_BUTTON_SELECTOR: &str = r#"button[aria-label="Next"]"#;

// Class of the active-page number in the pagination control.
const PAGE_INDICATOR_CLASS: &str = "zp_CsEot";

/// Settings for one Apollo company-listing capture.
#[derive(Debug, Clone)]
pub struct ApolloCrawlConfig {
    pub start_url: String,
    pub max_pages: usize,
    pub cookies_file: Option<PathBuf>,
    pub pages_dir: PathBuf,
}

impl From<&CrawlerConfig> for ApolloCrawlConfig {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            start_url: config.base_url.clone(),
            max_pages: config.max_pages,
            cookies_file: config.cookies_file.clone(),
            pages_dir: config.pages_dir(),
        }
    }
}

/// Captures the rendered markup of Apollo's paginated company listing for
/// offline parsing. The listing sits behind a login, so a cookie export
/// from a live session is installed before navigating.
pub struct ApolloClient {
    config: ApolloCrawlConfig,
}

impl BrowserCrawler for ApolloClient {}

impl ApolloClient {
    pub fn new(config: ApolloCrawlConfig) -> Self {
        Self { config }
    }

    /// Snapshots every page up to `max_pages`, clicking through the
    /// pagination control between captures. Returns the saved paths.
    pub fn capture_pages(&self) -> Result<Vec<PathBuf>> {
        let browser = self.create_browser()?;
        let tab = browser.new_tab()?;

        if let Some(cookies_file) = &self.config.cookies_file {
            match load_cookie_params(cookies_file) {
                Ok(cookies) => {
                    tab.set_cookies(cookies)?;
                    info!("🍪 installed cookies from {}", cookies_file.display());
                }
                Err(error) => {
                    warn!("⚠️ cookie file unusable, continuing anonymously: {error}")
                }
            }
        }

        tab.navigate_to(&self.config.start_url)?;
        tab.wait_until_navigated()?;
        tab.wait_for_element("body")?;
        // The listing is client rendered; give it time to hydrate.
        thread::sleep(Duration::from_secs(15));

        let mut saved = Vec::new();
        for page in 1..=self.config.max_pages {
            let html = tab.get_content()?;
            let path = self
                .config
                .pages_dir
                .join(format!("apollo_page_{page}.html"));
            save_page_html(&html, &path)?;
            info!("💾 page {page}/{}: {}", self.config.max_pages, path.display());
            saved.push(path);

            if page == self.config.max_pages {
                break;
            }
            if !advance_page(&tab, page + 1)? {
                info!("pagination ended after page {page}");
                break;
            }
        }
        Ok(saved)
    }
}

/// Clicks "Next" and waits for the active-page indicator to read
/// `next_page`. `Ok(false)` means the control is gone or never advanced.
fn advance_page(tab: &Arc<Tab>, next_page: usize) -> Result<bool> {
    let next_button = match tab.find_element(NEXT_BUTTON_SELECTOR) {
        Ok(button) => button,
        Err(_) => return Ok(false),
    };
    if next_button.click().is_err() {
        return Ok(false);
    }

    let indicator = format!(
        "//span[contains(@class, '{PAGE_INDICATOR_CLASS}')][normalize-space(text()) = '{next_page}']"
    );
    let appeared = poll_until(Duration::from_secs(60), Duration::from_millis(500), || {
        tab.find_element_by_xpath(&indicator).ok().map(|_| ())
    })
    .is_some();

    if appeared {
        thread::sleep(Duration::from_secs(5));
        human_delay(8.0, 14.0);
    }
    Ok(appeared)
}

/// Reads a browser-extension cookie export and reshapes it for the CDP
/// cookie call: `expirationDate` becomes `expires`, and sameSite values
/// outside the protocol's {Strict, Lax, None} fall back to Lax.
fn load_cookie_params(path: &Path) -> Result<Vec<CookieParam>> {
    let text = std::fs::read_to_string(path)?;
    let mut entries: Vec<Value> = serde_json::from_str(&text)?;

    for entry in &mut entries {
        let Some(object) = entry.as_object_mut() else {
            continue;
        };
        if let Some(same_site) = object.get("sameSite").and_then(Value::as_str) {
            let normalized = normalize_same_site(same_site);
            object.insert("sameSite".to_string(), Value::String(normalized));
        }
        if let Some(expiration) = object.remove("expirationDate") {
            object.entry("expires").or_insert(expiration);
        }
    }

    let cookies = serde_json::from_value(Value::Array(entries))?;
    Ok(cookies)
}

fn normalize_same_site(value: &str) -> String {
    match value.to_lowercase().as_str() {
        "strict" => "Strict",
        "none" | "no_restriction" => "None",
        _ => "Lax",
    }
    .to_string()
}
