use crate::browser::BrowserCrawler;
use crate::config::CrawlerConfig;
use crate::detail::DetailExtractor;
use crate::discovery::{DiscoveryTuning, LinkDiscovery, PassStrategy};
use crate::error::CrawlError;
use crate::models::LocationLink;
use crate::sitemap::{collect_sitemap_urls, extract_location_links, HttpFetcher, SitemapFetcher};
use crate::Result;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

const LISTING_CARD_SELECTOR: &str = "div.infinite-scroll-component div.grid > div.relative";
const JOB_LINK_PATTERN: &str = "/viewjob/";

// Chevron-right icon inside the enabled per-card carousel control.
const CAROUSEL_NEXT_SELECTOR: &str = "button:not([disabled]):has(svg path[d*='7.5 7.5-7.5'])";

const OWN_DOMAIN: &str = "hiring.cafe";

/// Settings for one hiring.cafe run.
#[derive(Debug, Clone)]
pub struct HiringCafeCrawlConfig {
    pub base_url: String,
    pub sitemap_url: Option<String>,
    pub headers: HashMap<String, String>,
    pub timeout: Duration,
    pub strategy: PassStrategy,
}

impl Default for HiringCafeCrawlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://hiring.cafe".to_string(),
            sitemap_url: None,
            headers: HashMap::new(),
            timeout: Duration::from_secs(60),
            strategy: PassStrategy::ZigZag { passes: 2 },
        }
    }
}

impl From<&CrawlerConfig> for HiringCafeCrawlConfig {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            sitemap_url: config.sitemap_url.clone(),
            headers: config.headers.clone(),
            timeout: config.timeout(),
            ..Self::default()
        }
    }
}

pub struct HiringCafeClient {
    config: HiringCafeCrawlConfig,
}

impl HiringCafeClient {
    pub fn new(config: HiringCafeCrawlConfig) -> Self {
        Self { config }
    }

    /// Walks the sitemap tree and scrapes the location anchors off every
    /// listed page. Browser-free: these pages render their links server
    /// side.
    pub fn collect_location_links(&self) -> Result<Vec<LocationLink>> {
        let sitemap_url = self
            .config
            .sitemap_url
            .as_deref()
            .ok_or_else(|| CrawlError::MissingContent("SITEMAP_URL config entry".to_string()))?;
        let fetcher = HttpFetcher::new(&self.config.headers, self.config.timeout)?;

        let page_urls = collect_sitemap_urls(&fetcher, sitemap_url);
        info!("🗺️ sitemap yielded {} location pages", page_urls.len());

        let mut links = Vec::new();
        for page_url in &page_urls {
            match fetcher.fetch(page_url) {
                Ok(html) => links.extend(extract_location_links(&html, page_url)),
                Err(error) => warn!("❌ location page fetch failed for {page_url}: {error}"),
            }
        }
        Ok(links)
    }
}

impl BrowserCrawler for HiringCafeClient {}

impl LinkDiscovery for HiringCafeClient {
    fn listing_url(&self) -> &str {
        &self.config.base_url
    }

    fn card_selector(&self) -> &str {
        LISTING_CARD_SELECTOR
    }

    fn job_link_pattern(&self) -> &str {
        JOB_LINK_PATTERN
    }

    fn carousel_next_selector(&self) -> Option<&str> {
        Some(CAROUSEL_NEXT_SELECTOR)
    }

    fn discovery_tuning(&self) -> DiscoveryTuning {
        DiscoveryTuning {
            strategy: self.config.strategy,
            ..DiscoveryTuning::default()
        }
    }
}

impl DetailExtractor for HiringCafeClient {
    fn own_domain(&self) -> &str {
        OWN_DOMAIN
    }
}
