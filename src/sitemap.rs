use crate::models::LocationLink;
use crate::Result;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;
use url::Url;

const MAX_SITEMAP_DEPTH: u32 = 8;

/// Fetch seam so sitemap traversal can run against fixtures.
pub trait SitemapFetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Plain HTTP fetcher carrying the configured headers on every request.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(headers: &HashMap<String, String>, timeout: Duration) -> Result<Self> {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    header_map.insert(name, value);
                }
                _ => warn!("skipping invalid header {name}"),
            }
        }

        let client = Client::builder()
            .default_headers(header_map)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl SitemapFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        Ok(self.client.get(url).send()?.error_for_status()?.text()?)
    }
}

enum SitemapKind {
    Index,
    UrlSet,
    Unknown,
}

fn classify(xml: &str) -> SitemapKind {
    if xml.contains("<sitemapindex") {
        SitemapKind::Index
    } else if xml.contains("<urlset") {
        SitemapKind::UrlSet
    } else {
        SitemapKind::Unknown
    }
}

/// Every `<loc>` value in the document, in order. Sitemap files are flat
/// enough that a tag scan beats a full XML parse.
pub fn extract_loc_values(xml: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find("<loc>") {
        rest = &rest[start + "<loc>".len()..];
        let Some(end) = rest.find("</loc>") else {
            break;
        };
        values.push(rest[..end].trim().to_string());
        rest = &rest[end + "</loc>".len()..];
    }
    values
}

/// Walks an index/urlset tree down to the leaf page URLs. Fetch failures
/// and unrecognized documents skip that branch instead of failing the walk.
pub fn collect_sitemap_urls(fetcher: &dyn SitemapFetcher, root_url: &str) -> Vec<String> {
    let mut urls = Vec::new();
    collect_into(fetcher, root_url, 0, &mut urls);
    urls
}

fn collect_into(fetcher: &dyn SitemapFetcher, url: &str, depth: u32, urls: &mut Vec<String>) {
    if depth > MAX_SITEMAP_DEPTH {
        warn!("sitemap nesting exceeded {MAX_SITEMAP_DEPTH} levels at {url}, stopping");
        return;
    }

    let xml = match fetcher.fetch(url) {
        Ok(xml) => xml,
        Err(error) => {
            warn!("❌ sitemap fetch failed for {url}: {error}");
            return;
        }
    };

    match classify(&xml) {
        SitemapKind::Index => {
            for child in extract_loc_values(&xml) {
                collect_into(fetcher, &child, depth + 1, urls);
            }
        }
        SitemapKind::UrlSet => urls.extend(extract_loc_values(&xml)),
        SitemapKind::Unknown => warn!("unrecognized sitemap document at {url}"),
    }
}

/// Location anchors on a sitemap-listed page, resolved against the page
/// URL. Labels keep the site's underscore convention.
pub fn extract_location_links(page_html: &str, page_url: &str) -> Vec<LocationLink> {
    let base = match Url::parse(page_url) {
        Ok(base) => base,
        Err(error) => {
            warn!("bad location page url {page_url}: {error}");
            return Vec::new();
        }
    };

    let document = Html::parse_document(page_html);
    let selector =
        Selector::parse(r"a.text-blue-600.hover\:text-blue-800.underline.text-sm").unwrap();

    document
        .select(&selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let absolute = base.join(href).ok()?;
            let label = anchor
                .text()
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if label.is_empty() {
                return None;
            }
            Some(LocationLink {
                job_location_url: absolute.into(),
                location: label.replace(' ', "_"),
                extracted_sitemap_url: page_url.to_string(),
            })
        })
        .collect()
}
