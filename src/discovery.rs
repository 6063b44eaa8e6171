use crate::browser::{
    page_scroll_height, scroll_by_viewport_fraction, scroll_to_top, BrowserCrawler,
};
use crate::Result;
use headless_chrome::{Element, Tab};
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// SHA-256 hex of a card's rendered markup.
pub fn fingerprint(markup: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(markup.as_bytes());
    hex::encode(hasher.finalize())
}

/// Card states already processed in this run, keyed by markup hash.
#[derive(Debug, Default)]
pub struct CardTracker {
    seen: HashSet<String>,
}

impl CardTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the markup and reports whether it was new.
    pub fn remember(&mut self, markup: &str) -> bool {
        self.seen.insert(fingerprint(markup))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Unique job links, normalized by joining each href against the listing
/// URL. Iteration order is sorted.
#[derive(Debug)]
pub struct JobLinkSet {
    base: Url,
    links: BTreeSet<String>,
}

impl JobLinkSet {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            links: BTreeSet::new(),
        }
    }

    /// Joins `href` against the base and inserts the absolute URL. Reports
    /// whether the link was new. Unjoinable hrefs are dropped.
    pub fn insert_href(&mut self, href: &str) -> bool {
        match self.base.join(href) {
            Ok(absolute) => self.links.insert(absolute.into()),
            Err(error) => {
                debug!("dropping unjoinable href {href}: {error}");
                false
            }
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.links.contains(url)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn into_sorted(self) -> Vec<String> {
        self.links.into_iter().collect()
    }
}

/// Height-stability termination predicate: a scroll pass is exhausted once
/// the page height has stopped growing for `threshold` consecutive
/// observations.
#[derive(Debug)]
pub struct ScrollStability {
    threshold: u32,
    last_height: f64,
    stable_rounds: u32,
}

impl ScrollStability {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            last_height: 0.0,
            stable_rounds: 0,
        }
    }

    /// Feeds one height observation; reports whether the pass is settled.
    pub fn observe(&mut self, height: f64) -> bool {
        if height > self.last_height {
            self.last_height = height;
            self.stable_rounds = 0;
        } else {
            self.stable_rounds += 1;
        }
        self.is_settled()
    }

    pub fn is_settled(&self) -> bool {
        self.stable_rounds >= self.threshold
    }
}

/// Alternates card harvesting with scrolling until the page height stops
/// growing or the round cap is exhausted, then harvests once more. Content
/// mounted by the settling scroll is only rendered after it.
fn harvest_scroll_rounds<E>(
    stable_rounds: u32,
    max_rounds: u32,
    mut harvest: impl FnMut() -> std::result::Result<(), E>,
    mut scroll: impl FnMut(u32) -> std::result::Result<f64, E>,
) -> std::result::Result<(), E> {
    let mut stability = ScrollStability::new(stable_rounds);

    for round in 1..=max_rounds {
        harvest()?;
        if stability.observe(scroll(round)?) {
            break;
        }
    }
    harvest()
}

/// One forward sweep, or repeated top-to-bottom sweeps to re-trigger
/// virtualization for cards the browser unmounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStrategy {
    SinglePass,
    ZigZag { passes: u32 },
}

impl PassStrategy {
    pub fn pass_count(self) -> u32 {
        match self {
            Self::SinglePass => 1,
            Self::ZigZag { passes } => passes.max(1),
        }
    }
}

/// Knobs for the scroll discovery loop.
#[derive(Debug, Clone)]
pub struct DiscoveryTuning {
    pub initial_settle: Duration,
    pub scroll_fraction: f64,
    pub scroll_settle: Duration,
    pub stable_rounds: u32,
    pub max_rounds: u32,
    pub carousel_click_cap: u32,
    pub carousel_settle: Duration,
    pub strategy: PassStrategy,
}

impl Default for DiscoveryTuning {
    fn default() -> Self {
        Self {
            initial_settle: Duration::from_secs(4),
            scroll_fraction: 0.9,
            scroll_settle: Duration::from_secs(2),
            stable_rounds: 3,
            max_rounds: 40,
            carousel_click_cap: 24,
            carousel_settle: Duration::from_millis(1300),
            strategy: PassStrategy::ZigZag { passes: 2 },
        }
    }
}

/// Mutable state for one discovery run, threaded through the engine.
#[derive(Debug)]
pub struct DiscoveryRun {
    pub cards: CardTracker,
    pub links: JobLinkSet,
    pub cards_processed: usize,
}

impl DiscoveryRun {
    pub fn new(base: Url) -> Self {
        Self {
            cards: CardTracker::new(),
            links: JobLinkSet::new(base),
            cards_processed: 0,
        }
    }
}

/// Hrefs inside one card's markup that match the job-detail pattern.
pub fn extract_job_hrefs(card_markup: &str, pattern: &str) -> Vec<String> {
    let fragment = Html::parse_fragment(card_markup);
    let anchor_selector = Selector::parse("a[href]").unwrap();
    fragment
        .select(&anchor_selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| href.contains(pattern))
        .map(str::to_string)
        .collect()
}

/// Scroll-driven link discovery over an infinite-scroll listing page.
///
/// Implementors supply the site-specific selectors; the engine loop with
/// its dedup, carousel expansion, and termination logic lives in the
/// default methods.
pub trait LinkDiscovery: BrowserCrawler {
    fn listing_url(&self) -> &str;

    /// Selector for one listing card in the rendered grid.
    fn card_selector(&self) -> &str;

    /// Substring identifying job-detail hrefs within a card.
    fn job_link_pattern(&self) -> &str;

    /// Selector for a card's carousel "next" control, if the site has one.
    fn carousel_next_selector(&self) -> Option<&str> {
        None
    }

    fn discovery_tuning(&self) -> DiscoveryTuning {
        DiscoveryTuning::default()
    }

    /// Runs the full discovery loop and returns the sorted unique job
    /// links. Only session establishment can fail; once the listing page
    /// is up, extraction degrades per card instead of erroring.
    fn discover_job_links(&self) -> Result<Vec<String>> {
        let tuning = self.discovery_tuning();
        let browser = self.create_browser()?;
        let tab = browser.new_tab()?;

        info!("🌐 opening listing page {}", self.listing_url());
        tab.navigate_to(self.listing_url())?;
        tab.wait_until_navigated()?;
        tab.wait_for_element_with_custom_timeout(self.card_selector(), Duration::from_secs(15))?;
        thread::sleep(tuning.initial_settle);

        let base = Url::parse(self.listing_url())?;
        let mut run = DiscoveryRun::new(base);

        let passes = tuning.strategy.pass_count();
        for pass in 1..=passes {
            if pass > 1 {
                info!("🔁 rescrolling from the top (pass {pass}/{passes})");
                scroll_to_top(&tab)?;
                thread::sleep(tuning.scroll_settle);
            }
            self.run_scroll_pass(&tab, &tuning, &mut run, pass)?;
        }

        info!(
            "🔗 discovery finished: {} unique job links from {} cards",
            run.links.len(),
            run.cards_processed
        );
        Ok(run.links.into_sorted())
    }

    /// One sweep: harvest the rendered cards, scroll, settle, observe the
    /// height, until it stops growing or the round cap is hit. One last
    /// harvest follows the settling scroll.
    fn run_scroll_pass(
        &self,
        tab: &Arc<Tab>,
        tuning: &DiscoveryTuning,
        run: &mut DiscoveryRun,
        pass: u32,
    ) -> Result<()> {
        harvest_scroll_rounds(
            tuning.stable_rounds,
            tuning.max_rounds,
            || {
                let new_links = self.extract_rendered_cards(tab, tuning, run)?;
                if new_links > 0 {
                    debug!("+{new_links} links, {} total", run.links.len());
                }
                Ok(())
            },
            |round| {
                scroll_by_viewport_fraction(tab, tuning.scroll_fraction)?;
                thread::sleep(tuning.scroll_settle);

                let height = page_scroll_height(tab)?;
                info!("🌀 pass {pass} round {round}: height {height:.0}");
                Ok(height)
            },
        )
    }

    /// Extraction pass over the currently rendered cards. Returns how many
    /// new links were found.
    fn extract_rendered_cards(
        &self,
        tab: &Arc<Tab>,
        tuning: &DiscoveryTuning,
        run: &mut DiscoveryRun,
    ) -> Result<usize> {
        let cards = match tab.find_elements(self.card_selector()) {
            Ok(cards) => cards,
            Err(_) => return Ok(0),
        };

        let mut new_links = 0;
        for card in cards {
            let markup = match card.get_content() {
                Ok(markup) => markup,
                Err(error) => {
                    debug!("card markup unavailable, skipping: {error}");
                    continue;
                }
            };
            if !run.cards.remember(&markup) {
                continue;
            }
            run.cards_processed += 1;
            debug!("card {}: {} bytes", run.cards_processed, markup.len());

            for href in extract_job_hrefs(&markup, self.job_link_pattern()) {
                if run.links.insert_href(&href) {
                    new_links += 1;
                }
            }

            if let Some(next_selector) = self.carousel_next_selector() {
                new_links += self.expand_carousel(&card, next_selector, tuning, run);
            }
        }
        Ok(new_links)
    }

    /// Clicks a card's carousel "next" control until the markup stops
    /// changing, the control disappears, or the click budget runs out,
    /// harvesting links after every click. Each intermediate state is
    /// remembered so later sweeps skip it.
    fn expand_carousel(
        &self,
        card: &Element<'_>,
        next_selector: &str,
        tuning: &DiscoveryTuning,
        run: &mut DiscoveryRun,
    ) -> usize {
        let mut new_links = 0;
        let mut last_hash = card.get_content().ok().map(|markup| fingerprint(&markup));

        for click in 1..=tuning.carousel_click_cap {
            let next_button = match card.find_element(next_selector) {
                Ok(button) => button,
                Err(_) => break,
            };
            if next_button.click().is_err() {
                break;
            }
            thread::sleep(tuning.carousel_settle);

            let markup = match card.get_content() {
                Ok(markup) => markup,
                Err(error) => {
                    debug!("carousel markup unavailable after click {click}: {error}");
                    break;
                }
            };
            let hash = fingerprint(&markup);
            if last_hash.as_deref() == Some(hash.as_str()) {
                break;
            }
            last_hash = Some(hash);
            run.cards.remember(&markup);

            for href in extract_job_hrefs(&markup, self.job_link_pattern()) {
                if run.links.insert_href(&href) {
                    new_links += 1;
                }
            }
        }
        new_links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://hiring.cafe/jobs/it").unwrap()
    }

    #[test]
    fn identical_markup_is_skipped_on_the_second_sighting() {
        let mut cards = CardTracker::new();
        let markup = r#"<div class="relative"><a href="/viewjob/1">Job</a></div>"#;

        assert!(cards.remember(markup));
        assert!(!cards.remember(markup));
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn one_byte_difference_means_a_distinct_fingerprint() {
        let left = fingerprint("<div>a</div>");
        let right = fingerprint("<div>b</div>");

        assert_ne!(left, right);
        assert_eq!(left.len(), 64);
    }

    #[test]
    fn href_join_is_idempotent() {
        let mut links = JobLinkSet::new(base());

        assert!(links.insert_href("/viewjob/abc"));
        assert!(!links.insert_href("/viewjob/abc"));
        assert!(!links.insert_href("https://hiring.cafe/viewjob/abc"));
        assert_eq!(links.len(), 1);
        assert!(links.contains("https://hiring.cafe/viewjob/abc"));
    }

    #[test]
    fn unjoinable_hrefs_are_dropped() {
        let mut links = JobLinkSet::new(base());

        assert!(!links.insert_href("https://"));
        assert!(links.is_empty());
    }

    #[test]
    fn links_come_out_sorted() {
        let mut links = JobLinkSet::new(base());
        links.insert_href("/viewjob/zeta");
        links.insert_href("/viewjob/alpha");
        links.insert_href("/viewjob/mid");

        assert_eq!(
            links.into_sorted(),
            vec![
                "https://hiring.cafe/viewjob/alpha",
                "https://hiring.cafe/viewjob/mid",
                "https://hiring.cafe/viewjob/zeta",
            ]
        );
    }

    #[test]
    fn stability_settles_after_the_threshold() {
        let mut stability = ScrollStability::new(3);

        assert!(!stability.observe(100.0));
        assert!(!stability.observe(200.0));
        assert!(!stability.observe(200.0));
        assert!(!stability.observe(200.0));
        assert!(stability.observe(200.0));
        assert!(stability.is_settled());
    }

    #[test]
    fn renewed_growth_resets_the_stable_counter() {
        let mut stability = ScrollStability::new(2);

        stability.observe(100.0);
        stability.observe(100.0);
        assert!(!stability.is_settled());

        stability.observe(300.0);
        assert!(!stability.observe(300.0));
        assert!(stability.observe(300.0));
    }

    #[test]
    fn one_more_harvest_follows_the_settling_scroll() {
        let mut harvests = 0;
        let mut heights = [150.0, 300.0, 300.0, 300.0, 300.0].into_iter();

        let outcome: std::result::Result<(), ()> = harvest_scroll_rounds(
            3,
            40,
            || {
                harvests += 1;
                Ok(())
            },
            |_| Ok(heights.next().unwrap()),
        );

        assert!(outcome.is_ok());
        // five scroll rounds, each preceded by a harvest, plus the one
        // after the settling scroll
        assert_eq!(harvests, 6);
    }

    #[test]
    fn round_cap_exhaustion_still_ends_with_a_harvest() {
        let mut harvests = 0;
        let mut scrolls = 0;

        let outcome: std::result::Result<(), ()> = harvest_scroll_rounds(
            3,
            4,
            || {
                harvests += 1;
                Ok(())
            },
            |round| {
                scrolls += 1;
                Ok(f64::from(round) * 100.0)
            },
        );

        assert!(outcome.is_ok());
        assert_eq!(scrolls, 4);
        assert_eq!(harvests, 5);
    }

    #[test]
    fn scroll_errors_abort_the_pass() {
        let mut harvests = 0;

        let outcome = harvest_scroll_rounds(
            3,
            40,
            || {
                harvests += 1;
                Ok(())
            },
            |_| Err("viewport gone"),
        );

        assert_eq!(outcome, Err("viewport gone"));
        assert_eq!(harvests, 1);
    }

    #[test]
    fn only_matching_hrefs_are_extracted_from_a_card() {
        let markup = r#"<div class="relative">
<a href="/viewjob/one">One</a>
<a href="/company/acme">Acme</a>
<a href="/viewjob/two">Two</a>
</div>"#;

        let hrefs = extract_job_hrefs(markup, "/viewjob/");
        assert_eq!(hrefs, vec!["/viewjob/one", "/viewjob/two"]);
    }

    #[test]
    fn pass_strategy_counts() {
        assert_eq!(PassStrategy::SinglePass.pass_count(), 1);
        assert_eq!(PassStrategy::ZigZag { passes: 3 }.pass_count(), 3);
        assert_eq!(PassStrategy::ZigZag { passes: 0 }.pass_count(), 1);
    }
}
