use crate::dates::normalize_posted_date;
use crate::models::{CompanyInfo, Extracted, JobSections};
use chrono::NaiveDateTime;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

const WORK_MODES: [&str; 3] = ["Remote", "Onsite", "Hybrid"];

const EMPLOYMENT_TYPES: [&str; 5] = [
    "Full Time",
    "Part Time",
    "Temporary",
    "Contract",
    "All Commitments Available",
];

// Two path fragments of the map-pin icon marking the location block.
const LOCATION_PIN_PATHS: [&str; 2] = ["M15 10.5a3 3 0", "M19.5 10.5c0 7.142"];

const LOCATION_PLACEHOLDERS: [&str; 2] = ["loading...", "hiringcafe"];

const MULTI_LINK_LABELS: [&str; 2] = ["Industries", "Activities"];
const LINKEDIN_LABEL: &str = "Linkedin Url";

/// Parses the default-tab snapshot of a job page. Every lookup is
/// independent: a missing anchor leaves only its own field at the sentinel.
/// `reference` is the instant relative posted dates are measured against.
pub fn parse_job_sections(html: &str, reference: NaiveDateTime) -> JobSections {
    let document = Html::parse_document(html);

    let (location, location_choices) = match extract_location(&document) {
        Some(text) => split_location_choices(&text),
        None => (Extracted::missing(), Vec::new()),
    };

    JobSections {
        job_title: extract_title(&document).into(),
        company: extract_company(&document).into(),
        location,
        location_choices,
        salary: extract_salary(&document).into(),
        work_mode: extract_leaf_span_with_vocab(&document, &WORK_MODES).into(),
        employment_type: extract_leaf_span_with_vocab(&document, &EMPLOYMENT_TYPES).into(),
        posted_date: extract_posted_date(&document, reference).into(),
        responsibilities: extract_text_after_header(&document, "Responsibilities").into(),
        requirements: extract_text_after_header(&document, "Requirements Summary").into(),
    }
}

/// Parses the company profile table from the "Company Info" tab snapshot.
/// Returns `None` when the table is absent or contributed no rows, so
/// callers can retry.
pub fn parse_company_info_table(html: &str) -> Option<CompanyInfo> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table.table-auto").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();
    let anchor_selector = Selector::parse("a").unwrap();

    let table = document.select(&table_selector).next()?;
    let mut info = CompanyInfo::new();

    for row in table.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.len() < 2 {
            continue;
        }

        let label = joined_text(cells[0]);
        if label.is_empty() {
            continue;
        }

        let value_cell = cells[1];
        let value = if MULTI_LINK_LABELS.contains(&label.as_str()) {
            let links: Vec<String> = value_cell
                .select(&anchor_selector)
                .map(joined_text)
                .filter(|text| !text.is_empty())
                .collect();
            if links.is_empty() {
                joined_text(value_cell)
            } else {
                links.join(", ")
            }
        } else if label == LINKEDIN_LABEL {
            value_cell
                .select(&anchor_selector)
                .next()
                .and_then(|anchor| anchor.value().attr("href"))
                .map(str::to_string)
                .unwrap_or_else(|| joined_text(value_cell))
        } else {
            joined_text(value_cell)
        };

        info.insert(label, value);
    }

    if info.is_empty() {
        None
    } else {
        Some(info)
    }
}

/// Text of the "Job Description" tab's content container.
pub fn parse_job_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div.flex.flex-col").unwrap();
    let container = document.select(&selector).next()?;
    non_empty(joined_text(container))
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("h2.font-extrabold").unwrap();
    let heading = document.select(&selector).next()?;
    non_empty(joined_text(heading))
}

fn extract_company(document: &Html) -> Option<String> {
    let selector = Selector::parse("span.text-xl.font-semibold.text-gray-700").unwrap();
    let span = document.select(&selector).next()?;
    non_empty(joined_text(span).replace('@', ""))
}

fn extract_salary(document: &Html) -> Option<String> {
    let selector = Selector::parse("span").unwrap();
    document
        .select(&selector)
        .filter(|span| is_leaf(*span))
        .map(joined_text)
        .find(|text| text.contains('$'))
}

fn extract_leaf_span_with_vocab(document: &Html, vocabulary: &[&str]) -> Option<String> {
    let selector = Selector::parse("span").unwrap();
    document
        .select(&selector)
        .filter(|span| is_leaf(*span))
        .map(joined_text)
        .find(|text| vocabulary.iter().any(|word| text.contains(word)))
}

/// The location sits next to a map-pin icon; the first non-placeholder span
/// inside that icon's container is the location text.
fn extract_location(document: &Html) -> Option<String> {
    let container_selector = Selector::parse("div.flex").unwrap();
    let path_selector = Selector::parse("svg path").unwrap();
    let span_selector = Selector::parse("span").unwrap();

    for container in document.select(&container_selector) {
        let path_data: String = container
            .select(&path_selector)
            .filter_map(|path| path.value().attr("d"))
            .collect::<Vec<_>>()
            .join(" ");
        if !LOCATION_PIN_PATHS
            .iter()
            .all(|fragment| path_data.contains(fragment))
        {
            continue;
        }

        for span in container.select(&span_selector) {
            let text = joined_text(span);
            if text.is_empty() {
                continue;
            }
            let lowered = text.to_lowercase();
            if LOCATION_PLACEHOLDERS
                .iter()
                .any(|placeholder| lowered.contains(placeholder))
            {
                continue;
            }
            return Some(text);
        }
    }
    None
}

/// Splits `A or B` alternants into a choice list, keeping the first as the
/// primary location. A single location is its own one-element list.
fn split_location_choices(text: &str) -> (Extracted, Vec<String>) {
    let choices: Vec<String> = text
        .split(" or ")
        .map(|choice| choice.trim().to_string())
        .filter(|choice| !choice.is_empty())
        .collect();

    if choices.is_empty() {
        (Extracted::missing(), Vec::new())
    } else {
        (Extracted::text(choices[0].clone()), choices)
    }
}

fn extract_posted_date(document: &Html, reference: NaiveDateTime) -> Option<String> {
    let posted_word = Regex::new(r"(?i)\bposted\b").unwrap();
    let selector = Selector::parse("span, p, div").unwrap();

    let label = document
        .select(&selector)
        .filter(|element| {
            let own_text: String = element
                .children()
                .filter_map(|child| child.value().as_text())
                .map(|text| &**text)
                .collect();
            posted_word.is_match(&own_text)
        })
        .map(joined_text)
        .next()?;

    normalize_posted_date(&label, reference)
}

/// The section body is the span immediately following its header span in
/// document order.
fn extract_text_after_header(document: &Html, header: &str) -> Option<String> {
    let selector = Selector::parse("span").unwrap();
    let spans: Vec<ElementRef> = document.select(&selector).collect();
    let header_lower = header.to_lowercase();

    let position = spans
        .iter()
        .position(|span| is_leaf(*span) && joined_text(*span).to_lowercase().contains(&header_lower))?;

    spans
        .get(position + 1)
        .map(|span| joined_text(*span))
        .and_then(non_empty)
}

fn joined_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_leaf(element: ElementRef<'_>) -> bool {
    element.children().all(|child| !child.value().is_element())
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
