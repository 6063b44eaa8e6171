use crate::browser::{click_by_text, BrowserCrawler};
use crate::error::CrawlError;
use crate::models::{CompanyInfo, Extracted, JobRecord};
use crate::retry::with_attempts;
use crate::sections::{parse_company_info_table, parse_job_description, parse_job_sections};
use crate::website::WebsiteResolver;
use crate::Result;
use chrono::Local;
use headless_chrome::Tab;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Knobs for one detail-page visit.
#[derive(Debug, Clone)]
pub struct DetailTuning {
    pub page_settle: Duration,
    pub panel_wait: Duration,
    pub panel_settle: Duration,
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for DetailTuning {
    fn default() -> Self {
        Self {
            page_settle: Duration::from_secs(3),
            panel_wait: Duration::from_secs(10),
            panel_settle: Duration::from_millis(1500),
            retry_attempts: 3,
            retry_backoff: Duration::from_secs(2),
        }
    }
}

/// Drives one job detail page: default-tab sections, the "Company Info"
/// and "Job Description" panels, and the external website control.
///
/// Only session establishment fails the visit; every field degrades to
/// its sentinel on its own, so one broken panel never costs the record.
pub trait DetailExtractor: BrowserCrawler {
    /// Host whose links never count as the company website.
    fn own_domain(&self) -> &str;

    fn company_info_label(&self) -> &str {
        "Company Info"
    }

    fn job_description_label(&self) -> &str {
        "Job Description"
    }

    fn company_info_table_selector(&self) -> &str {
        "table.table-auto"
    }

    fn detail_tuning(&self) -> DetailTuning {
        DetailTuning::default()
    }

    fn extract_job(&self, job_url: &str) -> Result<JobRecord> {
        let tuning = self.detail_tuning();
        let browser = self.create_browser()?;
        let tab = browser.new_tab()?;

        tab.navigate_to(job_url)?;
        tab.wait_until_navigated()?;
        tab.wait_for_element("body")?;
        thread::sleep(tuning.page_settle);

        let mut record = JobRecord::new(job_url);

        match tab.get_content() {
            Ok(html) => {
                record.apply_sections(parse_job_sections(&html, Local::now().naive_local()));
            }
            Err(error) => warn!("⚠️ could not snapshot {job_url}: {error}"),
        }

        match with_attempts(tuning.retry_attempts, tuning.retry_backoff, || {
            self.open_company_info(&tab)
        }) {
            Ok(info) => record.company_info = info,
            Err(error) => warn!("⚠️ company info stayed empty for {job_url}: {error}"),
        }

        match self.open_job_description(&tab) {
            Ok(description) => record.job_description = description,
            Err(error) => warn!("⚠️ job description unavailable for {job_url}: {error}"),
        }

        record.company_website = WebsiteResolver::new(self.own_domain())
            .resolve(&browser, &tab)
            .into();

        Ok(record)
    }

    /// Opens the company panel and parses its profile table. An empty table
    /// is an error so the retry wrapper gives slow-rendering pages another
    /// chance.
    fn open_company_info(&self, tab: &Arc<Tab>) -> Result<CompanyInfo> {
        let tuning = self.detail_tuning();
        click_by_text(tab, self.company_info_label())?;
        tab.wait_for_element_with_custom_timeout(
            self.company_info_table_selector(),
            tuning.panel_wait,
        )?;
        thread::sleep(tuning.panel_settle);

        let html = tab.get_content()?;
        parse_company_info_table(&html)
            .ok_or_else(|| CrawlError::MissingContent("company info table rendered empty".into()))
    }

    fn open_job_description(&self, tab: &Arc<Tab>) -> Result<Extracted> {
        let tuning = self.detail_tuning();
        click_by_text(tab, self.job_description_label())?;
        thread::sleep(tuning.panel_settle);

        let html = tab.get_content()?;
        parse_job_description(&html)
            .map(Extracted::text)
            .ok_or_else(|| CrawlError::MissingContent("job description container missing".into()))
    }
}
