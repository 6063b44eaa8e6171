use crate::models::{JobRecord, LocationLink};
use crate::Result;
use sha2::{Digest, Sha256};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Stable filename key for a job URL.
pub fn url_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Snapshot of the discovered links, sorted, pretty-printed. Rewritten
/// whole on every call so a crashed run keeps its last good checkpoint.
pub fn save_links_checkpoint(links: &[String], file_path: &Path) -> Result<()> {
    let mut sorted: Vec<&String> = links.iter().collect();
    sorted.sort();

    let file = File::create(file_path)?;
    serde_json::to_writer_pretty(file, &sorted)?;
    Ok(())
}

/// Writes one record to `<dir>/<sha256(job_url)>.json` and returns the path.
pub fn save_job_record(record: &JobRecord, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(format!("{}.json", url_key(&record.job_url)));
    let file = File::create(&path)?;
    serde_json::to_writer_pretty(file, record)?;
    Ok(path)
}

/// Appends location rows, writing the CSV header only when the file is new
/// or empty.
pub fn append_location_links(links: &[LocationLink], file_path: &Path) -> Result<()> {
    let write_header = match fs::metadata(file_path) {
        Ok(metadata) => metadata.len() == 0,
        Err(_) => true,
    };

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(file_path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);

    for link in links {
        writer.serialize(link)?;
    }
    writer.flush()?;
    Ok(())
}

/// Raw page snapshot for offline parsing.
pub fn save_page_html(html: &str, file_path: &Path) -> Result<()> {
    fs::write(file_path, html)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn checkpoint_comes_out_sorted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("job_links.json");
        let links = vec![
            "https://hiring.cafe/viewjob/zeta".to_string(),
            "https://hiring.cafe/viewjob/alpha".to_string(),
        ];

        save_links_checkpoint(&links, &path).unwrap();

        let restored: Vec<String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            restored,
            vec![
                "https://hiring.cafe/viewjob/alpha",
                "https://hiring.cafe/viewjob/zeta",
            ]
        );
    }

    #[test]
    fn record_filename_is_the_url_hash() {
        let dir = tempdir().unwrap();
        let record = JobRecord::new("https://hiring.cafe/viewjob/abc");

        let path = save_job_record(&record, dir.path()).unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name.len(), 64 + ".json".len());
        assert_eq!(name, format!("{}.json", url_key(&record.job_url)));

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["job_url"], "https://hiring.cafe/viewjob/abc");
        assert_eq!(value["job_title"], "N/A");
    }

    #[test]
    fn header_is_written_once_across_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("location_links.csv");
        let rows = vec![LocationLink {
            job_location_url: "https://hiring.cafe/jobs-in-oslo".to_string(),
            location: "Oslo".to_string(),
            extracted_sitemap_url: "https://hiring.cafe/locations".to_string(),
        }];

        append_location_links(&rows, &path).unwrap();
        append_location_links(&rows, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let header_count = text
            .lines()
            .filter(|line| line.starts_with("job_location_url"))
            .count();
        assert_eq!(header_count, 1);
        assert_eq!(text.lines().count(), 3);
    }
}
