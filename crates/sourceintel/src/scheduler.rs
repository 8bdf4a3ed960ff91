//! Sequential batch ingestion of URLs.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::adapter::{parse_web_url, DriveOutcome, IngestionDriver};
use crate::broadcast::PipelineEvent;
use crate::gateway::AnalysisType;
use crate::job::{JobKind, JobPayload, JobRecord, JobStatus};

/// Outcome of one batch once every item is terminal or skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub batch_id: String,
    pub job_ids: Vec<String>,
    pub completed: usize,
    pub failed: usize,
    /// Items removed (or otherwise no longer pending) before their turn.
    pub skipped: usize,
}

/// Keeps entries that parse as absolute http(s) URLs, trimmed, in order.
pub fn accepted_urls<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    urls.into_iter()
        .filter_map(|raw| {
            let raw = raw.as_ref();
            match parse_web_url(raw) {
                Ok(_) => Some(raw.trim().to_string()),
                Err(e) => {
                    if !raw.trim().is_empty() {
                        log::debug!("Dropping batch entry: {}", e);
                    }
                    None
                }
            }
        })
        .collect()
}

/// Drives batch jobs one at a time through the URL adapter.
pub struct BatchScheduler {
    driver: Arc<IngestionDriver>,
    delay: Duration,
}

impl BatchScheduler {
    pub fn new(driver: Arc<IngestionDriver>, delay: Duration) -> Self {
        Self { driver, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Creates one pending `batch-url` job per accepted URL, in input order.
    pub fn enqueue<I, S>(&self, urls: I, analysis_type: AnalysisType) -> Vec<JobRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        accepted_urls(urls)
            .into_iter()
            .map(|url| {
                self.driver
                    .store()
                    .create(JobKind::BatchUrl, JobPayload::url(url, analysis_type))
            })
            .collect()
    }

    /// Runs the jobs strictly in order, pausing `delay` after each item that
    /// actually ran before starting the next. Failures do not stop the batch.
    pub async fn run(&self, batch_id: String, job_ids: Vec<String>) -> BatchReport {
        let mut report = BatchReport {
            batch_id,
            job_ids: job_ids.clone(),
            ..BatchReport::default()
        };
        log::info!(
            "Batch {} started with {} item(s)",
            report.batch_id,
            job_ids.len()
        );

        let mut ran_previous = false;
        for id in &job_ids {
            if !self.is_pending(id) {
                report.skipped += 1;
                continue;
            }
            if ran_previous && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.driver.run(id).await {
                DriveOutcome::Completed => report.completed += 1,
                DriveOutcome::Failed => report.failed += 1,
                DriveOutcome::Ignored => report.skipped += 1,
            }
            ran_previous = true;
        }

        log::info!(
            "Batch {} finished: {} completed, {} failed, {} skipped",
            report.batch_id,
            report.completed,
            report.failed,
            report.skipped
        );
        self.driver
            .store()
            .events()
            .send(PipelineEvent::BatchCompleted(report.clone()));
        report
    }

    fn is_pending(&self, id: &str) -> bool {
        self.driver
            .store()
            .get(id)
            .is_some_and(|job| job.status == JobStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_urls_filters_and_keeps_order() {
        let urls = accepted_urls([
            "https://a.com",
            "",
            "   ",
            "not-a-url",
            "ftp://files.example.com",
            " https://b.com/offer ",
        ]);
        assert_eq!(urls, vec!["https://a.com", "https://b.com/offer"]);
    }

    #[test]
    fn test_accepted_urls_from_lines() {
        let text = "https://a.com\n\nwww.no-scheme.com\nhttp://c.com\n";
        assert_eq!(
            accepted_urls(text.lines()),
            vec!["https://a.com", "http://c.com"]
        );
    }
}
