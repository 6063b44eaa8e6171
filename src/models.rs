use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Marker written in place of any field the page did not yield.
pub const NOT_AVAILABLE: &str = "N/A";

/// One field scraped from a rendered page. Missing values serialize as the
/// `"N/A"` sentinel so every record always carries the full column set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted(Option<String>);

impl Extracted {
    pub fn missing() -> Self {
        Self(None)
    }

    /// Trims the value; blank text counts as missing.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Self(None)
        } else {
            Self(Some(trimmed.to_string()))
        }
    }

    pub fn is_missing(&self) -> bool {
        self.0.is_none()
    }

    /// The extracted text, or the sentinel.
    pub fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<Option<String>> for Extracted {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(text) => Self::text(text),
            None => Self(None),
        }
    }
}

impl From<String> for Extracted {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<&str> for Extracted {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl fmt::Display for Extracted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Extracted {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Company profile table keyed by row label. Serializes as a JSON object, or
/// as the sentinel string when nothing was captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyInfo(BTreeMap<String, String>);

impl CompanyInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.0.insert(label.into(), value.into());
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.0.get(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(label, value)| (label.as_str(), value.as_str()))
    }
}

impl Serialize for CompanyInfo {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.0.is_empty() {
            serializer.serialize_str(NOT_AVAILABLE)
        } else {
            let mut map = serializer.serialize_map(Some(self.0.len()))?;
            for (label, value) in &self.0 {
                map.serialize_entry(label, value)?;
            }
            map.end()
        }
    }
}

/// Fields rendered on the job page's default tab, as returned by the section
/// parser. Merged into a [`JobRecord`] via [`JobRecord::apply_sections`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSections {
    pub job_title: Extracted,
    pub company: Extracted,
    pub location: Extracted,
    pub location_choices: Vec<String>,
    pub salary: Extracted,
    pub work_mode: Extracted,
    pub employment_type: Extracted,
    pub posted_date: Extracted,
    pub responsibilities: Extracted,
    pub requirements: Extracted,
}

/// One fully extracted job posting. Total over its field set: every field is
/// present in the serialized output, sentinel-filled where extraction failed.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub job_url: String,
    pub job_title: Extracted,
    pub company: Extracted,
    pub location: Extracted,
    pub location_choices: Vec<String>,
    pub salary: Extracted,
    pub work_mode: Extracted,
    pub employment_type: Extracted,
    pub posted_date: Extracted,
    pub responsibilities: Extracted,
    pub requirements: Extracted,
    pub company_info: CompanyInfo,
    pub job_description: Extracted,
    pub company_website: Extracted,
}

impl JobRecord {
    pub fn new(job_url: impl Into<String>) -> Self {
        Self {
            job_url: job_url.into(),
            job_title: Extracted::missing(),
            company: Extracted::missing(),
            location: Extracted::missing(),
            location_choices: Vec::new(),
            salary: Extracted::missing(),
            work_mode: Extracted::missing(),
            employment_type: Extracted::missing(),
            posted_date: Extracted::missing(),
            responsibilities: Extracted::missing(),
            requirements: Extracted::missing(),
            company_info: CompanyInfo::new(),
            job_description: Extracted::missing(),
            company_website: Extracted::missing(),
        }
    }

    pub fn apply_sections(&mut self, sections: JobSections) {
        self.job_title = sections.job_title;
        self.company = sections.company;
        self.location = sections.location;
        self.location_choices = sections.location_choices;
        self.salary = sections.salary;
        self.work_mode = sections.work_mode;
        self.employment_type = sections.employment_type;
        self.posted_date = sections.posted_date;
        self.responsibilities = sections.responsibilities;
        self.requirements = sections.requirements;
    }
}

/// One row of the sitemap location table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationLink {
    pub job_location_url: String,
    pub location: String,
    pub extracted_sitemap_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn blank_text_counts_as_missing() {
        assert!(Extracted::text("   ").is_missing());
        assert!(Extracted::from(None).is_missing());
        assert_eq!(Extracted::text("  Remote  ").as_str(), "Remote");
    }

    #[test]
    fn fresh_record_serializes_every_sentinel() {
        let record = JobRecord::new("https://hiring.cafe/viewjob/abc");
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["job_url"], "https://hiring.cafe/viewjob/abc");
        assert_eq!(value["job_title"], "N/A");
        assert_eq!(value["salary"], "N/A");
        assert_eq!(value["company_info"], "N/A");
        assert_eq!(value["company_website"], "N/A");
        assert_eq!(value["location_choices"], json!([]));
    }

    #[test]
    fn populated_company_info_serializes_as_map() {
        let mut info = CompanyInfo::new();
        info.insert("Industries", "Software, Fintech");
        info.insert("Company Size", "51-200");

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(
            value,
            json!({"Company Size": "51-200", "Industries": "Software, Fintech"})
        );
    }

    #[test]
    fn applying_sections_fills_the_record() {
        let mut record = JobRecord::new("https://hiring.cafe/viewjob/abc");
        record.apply_sections(JobSections {
            job_title: "Backend Engineer".into(),
            company: "Acme".into(),
            location: "Berlin".into(),
            location_choices: vec!["Berlin".into(), "Remote".into()],
            salary: "$100k".into(),
            ..JobSections::default()
        });

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["job_title"], "Backend Engineer");
        assert_eq!(value["company"], "Acme");
        assert_eq!(value["location_choices"], json!(["Berlin", "Remote"]));
        assert_eq!(value["work_mode"], "N/A");
        assert!(matches!(value["company_info"], Value::String(_)));
    }
}
