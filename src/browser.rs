use crate::{CrawlError, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsString;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Browser bootstrap shared by all site clients.
pub trait BrowserCrawler {
    fn user_agent(&self) -> &str {
        DEFAULT_USER_AGENT
    }

    fn window_size(&self) -> (u32, u32) {
        (1440, 900)
    }

    fn create_browser(&self) -> Result<Browser> {
        let user_agent = OsString::from(format!("--user-agent={}", self.user_agent()));
        let automation = OsString::from("--disable-blink-features=AutomationControlled");

        Browser::new(LaunchOptions {
            headless: true,
            window_size: Some(self.window_size()),
            args: vec![&user_agent, &automation],
            ..Default::default()
        })
        .map_err(Into::into)
    }
}

/// Scrolls down by a fraction of the viewport height.
pub fn scroll_by_viewport_fraction(tab: &Arc<Tab>, fraction: f64) -> Result<()> {
    tab.evaluate(
        &format!("window.scrollBy(0, window.innerHeight * {fraction})"),
        false,
    )?;
    Ok(())
}

pub fn scroll_to_top(tab: &Arc<Tab>) -> Result<()> {
    tab.evaluate("window.scrollTo(0, 0)", false)?;
    Ok(())
}

/// Current document scroll height, fed to the stability predicate.
pub fn page_scroll_height(tab: &Arc<Tab>) -> Result<f64> {
    let object = tab.evaluate("document.body.scrollHeight", false)?;
    Ok(object.value.and_then(|value| value.as_f64()).unwrap_or(0.0))
}

/// Clicks the first button, link, or button-role element whose text
/// contains `label`.
pub fn click_by_text(tab: &Arc<Tab>, label: &str) -> Result<()> {
    let query = format!(
        "//button[contains(normalize-space(.), '{label}')] \
         | //a[contains(normalize-space(.), '{label}')] \
         | //*[@role='button'][contains(normalize-space(.), '{label}')]"
    );
    tab.find_element_by_xpath(&query)?.click()?;
    Ok(())
}

/// Polls `probe` until it yields a value or `timeout` elapses.
pub fn poll_until<T>(
    timeout: Duration,
    interval: Duration,
    mut probe: impl FnMut() -> Option<T>,
) -> Option<T> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = probe() {
            return Some(value);
        }
        if Instant::now() >= deadline {
            return None;
        }
        std::thread::sleep(interval);
    }
}

/// Bounded wait for an XPath target to appear.
pub fn wait_for_xpath(tab: &Arc<Tab>, query: &str, timeout: Duration) -> Result<()> {
    poll_until(timeout, Duration::from_millis(250), || {
        tab.find_element_by_xpath(query).ok().map(|_| ())
    })
    .ok_or_else(|| CrawlError::MissingContent(format!("xpath target {query}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_returns_as_soon_as_the_probe_succeeds() {
        let mut calls = 0;
        let value = poll_until(Duration::from_secs(1), Duration::from_millis(1), || {
            calls += 1;
            (calls == 3).then_some(calls)
        });

        assert_eq!(value, Some(3));
    }

    #[test]
    fn poll_gives_up_after_the_timeout() {
        let value: Option<()> =
            poll_until(Duration::from_millis(5), Duration::from_millis(1), || None);

        assert!(value.is_none());
    }
}
