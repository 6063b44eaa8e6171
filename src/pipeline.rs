use crate::detail::DetailExtractor;
use crate::discovery::LinkDiscovery;
use crate::utils::random_delay;
use crate::writer::{save_job_record, save_links_checkpoint};
use crate::Result;
use std::path::Path;
use tracing::{error, info};

/// Counters for one end-to-end run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    pub saved: usize,
    pub failed: usize,
}

/// Entry state: no links collected yet.
#[derive(Default)]
pub struct CrawlPipeline;

impl CrawlPipeline {
    pub fn new() -> Self {
        Self
    }

    /// Runs link discovery and moves to the linked state.
    pub fn discover<C: LinkDiscovery>(self, client: &C) -> Result<PipelineWithLinks> {
        let links = client.discover_job_links()?;
        Ok(PipelineWithLinks { links })
    }

    /// Seeds the pipeline from an already saved link list.
    pub fn with_links(self, links: Vec<String>) -> PipelineWithLinks {
        PipelineWithLinks { links }
    }
}

#[must_use = "a linked pipeline does nothing until .extract_each() runs"]
pub struct PipelineWithLinks {
    links: Vec<String>,
}

impl PipelineWithLinks {
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Persists the link list. A failed checkpoint is logged but never
    /// stops the run.
    pub fn checkpoint(self, path: &Path) -> Self {
        match save_links_checkpoint(&self.links, path) {
            Ok(()) => info!(
                "✅ checkpointed {} links to {}",
                self.links.len(),
                path.display()
            ),
            Err(error) => error!("❌ link checkpoint failed: {error}"),
        }
        self
    }

    /// Visits every link in order, persisting each record as it lands. A
    /// failed job is logged and skipped so the rest of the list survives.
    pub fn extract_each<C: DetailExtractor>(self, client: &C, results_dir: &Path) -> RunSummary {
        let total = self.links.len();
        let mut summary = RunSummary {
            discovered: total,
            ..RunSummary::default()
        };

        for (index, job_url) in self.links.iter().enumerate() {
            info!("📦 job {}/{total}: {job_url}", index + 1);
            let outcome = client
                .extract_job(job_url)
                .and_then(|record| save_job_record(&record, results_dir));
            match outcome {
                Ok(path) => {
                    summary.saved += 1;
                    info!("💾 saved {}", path.display());
                }
                Err(error) => {
                    summary.failed += 1;
                    error!("❌ job failed, skipping {job_url}: {error}");
                }
            }
            if index + 1 < total {
                random_delay();
            }
        }

        info!(
            "🏁 run complete: {} discovered, {} saved, {} failed",
            summary.discovered, summary.saved, summary.failed
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn seeded_links_survive_the_checkpoint() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("job_links.json");

        let pipeline = CrawlPipeline::new()
            .with_links(vec![
                "https://hiring.cafe/viewjob/b".to_string(),
                "https://hiring.cafe/viewjob/a".to_string(),
            ])
            .checkpoint(&path);

        assert_eq!(pipeline.links().len(), 2);
        let restored: Vec<String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored[0], "https://hiring.cafe/viewjob/a");
    }

    #[test]
    fn checkpoint_to_an_unwritable_path_keeps_the_links() {
        let pipeline = CrawlPipeline::new()
            .with_links(vec!["https://hiring.cafe/viewjob/a".to_string()])
            .checkpoint(Path::new("/definitely/not/a/dir/links.json"));

        assert_eq!(pipeline.links().len(), 1);
    }
}
