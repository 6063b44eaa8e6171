use crate::browser::poll_until;
use headless_chrome::{Browser, Element, Tab};
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Recovers a company's external website from a live job detail view.
///
/// Interaction comes first: click a "Website"-labeled control and watch for
/// a popup, an in-place navigation, or a static attribute on the control.
/// Static markup fallbacks follow. Every step rejects URLs on the board's
/// own domain, so failure at one step only hands off to the next.
#[derive(Debug, Clone)]
pub struct WebsiteResolver {
    own_domain: String,
    popup_wait: Duration,
    settle: Duration,
}

impl WebsiteResolver {
    pub fn new(own_domain: impl Into<String>) -> Self {
        Self {
            own_domain: own_domain.into(),
            popup_wait: Duration::from_secs(4),
            settle: Duration::from_millis(1500),
        }
    }

    /// Full chain against a live tab.
    pub fn resolve(&self, browser: &Browser, tab: &Arc<Tab>) -> Option<String> {
        if let Some(url) = self.resolve_interactive(browser, tab) {
            return Some(url);
        }
        let html = tab.get_content().ok()?;
        self.resolve_from_html(&html)
    }

    fn resolve_interactive(&self, browser: &Browser, tab: &Arc<Tab>) -> Option<String> {
        let control = self.find_website_control(tab)?;

        let url_before = tab.get_url();
        let known_targets = open_target_ids(browser);

        if control.click().is_err() {
            return self.static_attribute_url(&control);
        }

        if let Some(url) = self.popup_url(browser, &known_targets) {
            return Some(url);
        }

        thread::sleep(self.settle);
        let url_after = tab.get_url();
        if url_after != url_before {
            if let Some(url) = self.accept_external(&url_after) {
                return Some(url);
            }
        }

        self.static_attribute_url(&control)
    }

    fn find_website_control<'a>(&self, tab: &'a Arc<Tab>) -> Option<Element<'a>> {
        let xpath_candidates = [
            "//button[contains(normalize-space(.), 'Website')]",
            "//a[contains(normalize-space(.), 'Website')]",
            "//*[@role='button'][contains(normalize-space(.), 'Website')]",
        ];
        for query in xpath_candidates {
            if let Ok(element) = tab.find_element_by_xpath(query) {
                return Some(element);
            }
        }
        tab.find_element(r#"[data-test="company-website"]"#).ok()
    }

    /// Waits for a browsing context that was not open before the click,
    /// reads its resolved URL, and closes it.
    fn popup_url(&self, browser: &Browser, known_targets: &[String]) -> Option<String> {
        let popup = poll_until(self.popup_wait, Duration::from_millis(250), || {
            new_tab_since(browser, known_targets)
        })?;

        thread::sleep(self.settle);
        let url = popup.get_url();
        let _ = popup.close(true);

        self.accept_external(&url)
    }

    fn static_attribute_url(&self, element: &Element<'_>) -> Option<String> {
        let attributes = element.get_attributes().ok()??;
        for pair in attributes.chunks(2) {
            if let [name, value] = pair {
                if matches!(name.as_str(), "href" | "data-href" | "data-url") {
                    if let Some(url) = self.accept_external(value) {
                        return Some(url);
                    }
                }
            }
        }
        None
    }

    /// Static fallback chain over a page snapshot: a "Website"-labeled
    /// anchor, then a hyperlink next to website-ish text, then the first
    /// external hyperlink anywhere.
    pub fn resolve_from_html(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        self.labeled_anchor(&document)
            .or_else(|| self.anchor_near_website_text(&document))
            .or_else(|| self.first_external_anchor(&document))
    }

    fn labeled_anchor(&self, document: &Html) -> Option<String> {
        let selector = Selector::parse("a[href]").unwrap();
        document
            .select(&selector)
            .filter(|anchor| {
                anchor
                    .text()
                    .collect::<String>()
                    .to_lowercase()
                    .contains("website")
            })
            .filter_map(|anchor| anchor.value().attr("href"))
            .find_map(|href| self.accept_external(href))
    }

    fn anchor_near_website_text(&self, document: &Html) -> Option<String> {
        let candidate_selector = Selector::parse("button, div, span").unwrap();
        let anchor_selector = Selector::parse("a[href]").unwrap();

        for candidate in document.select(&candidate_selector) {
            let text = candidate.text().collect::<String>().to_lowercase();
            if !text.contains("website") {
                continue;
            }
            let Some(parent) = candidate.parent().and_then(ElementRef::wrap) else {
                continue;
            };
            for anchor in parent.select(&anchor_selector) {
                if let Some(url) = anchor
                    .value()
                    .attr("href")
                    .and_then(|href| self.accept_external(href))
                {
                    return Some(url);
                }
            }
        }
        None
    }

    fn first_external_anchor(&self, document: &Html) -> Option<String> {
        let selector = Selector::parse("a[href]").unwrap();
        document
            .select(&selector)
            .filter_map(|anchor| anchor.value().attr("href"))
            .find_map(|href| self.accept_external(href))
    }

    /// Accepts only http(s) URLs whose host is outside the board's domain.
    fn accept_external(&self, candidate: &str) -> Option<String> {
        let url = Url::parse(candidate).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let host = url.host_str()?;
        let own = self.own_domain.as_str();
        if host == own || host.ends_with(&format!(".{own}")) {
            debug!("rejecting own-domain url {candidate}");
            return None;
        }
        Some(url.into())
    }
}

fn open_target_ids(browser: &Browser) -> Vec<String> {
    browser
        .get_tabs()
        .lock()
        .map(|tabs| tabs.iter().map(|tab| tab.get_target_id().clone()).collect())
        .unwrap_or_default()
}

fn new_tab_since(browser: &Browser, known_targets: &[String]) -> Option<Arc<Tab>> {
    let tabs = browser.get_tabs().lock().ok()?;
    tabs.iter()
        .find(|tab| !known_targets.contains(tab.get_target_id()))
        .cloned()
}
