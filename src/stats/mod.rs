use chrono::{DateTime, Duration, Utc};
use log::warn;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct ScrapingStats {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub retry_count: usize,
    pub bytes_downloaded: usize,
    pub status_codes: HashMap<u16, usize>,
    pub retry_reasons: HashMap<String, usize>,
    pub average_response_time: f64, // in milliseconds
    pub pages_parsed: usize,
    pub products_extracted: usize,
    pub products_without_price: usize,
    pub extraction_errors: usize,
    pub fetch_failures: usize,
    pub robots_skipped: usize,
    pub storage_errors: usize,
}

#[derive(Debug, Clone)]
pub struct StatsTracker {
    stats: Arc<RwLock<ScrapingStats>>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(ScrapingStats {
                start_time: Utc::now(),
                end_time: None,
                total_requests: 0,
                successful_requests: 0,
                failed_requests: 0,
                retry_count: 0,
                bytes_downloaded: 0,
                status_codes: HashMap::new(),
                retry_reasons: HashMap::new(),
                average_response_time: 0.0,
                pages_parsed: 0,
                products_extracted: 0,
                products_without_price: 0,
                extraction_errors: 0,
                fetch_failures: 0,
                robots_skipped: 0,
                storage_errors: 0,
            })),
        }
    }

    pub fn record_request(&self, status: u16, size: usize, duration: Duration) {
        let mut stats = self.stats.write();
        stats.total_requests += 1;

        if status < 400 {
            stats.successful_requests += 1;
        } else {
            stats.failed_requests += 1;
        }

        *stats.status_codes.entry(status).or_insert(0) += 1;
        stats.bytes_downloaded += size;

        let current_total = stats.average_response_time * (stats.total_requests - 1) as f64;
        let new_duration = duration.num_milliseconds() as f64;
        stats.average_response_time = (current_total + new_duration) / stats.total_requests as f64;
    }

    pub fn record_retry(&self, category: String) {
        let mut stats = self.stats.write();
        stats.retry_count += 1;
        *stats.retry_reasons.entry(category).or_insert(0) += 1;
    }

    pub fn record_page(&self, products: usize, without_price: usize, errors: usize) {
        let mut stats = self.stats.write();
        stats.pages_parsed += 1;
        stats.products_extracted += products;
        stats.products_without_price += without_price;
        stats.extraction_errors += errors;
    }

    pub fn increment_fetch_failures(&self) {
        self.stats.write().fetch_failures += 1;
    }

    pub fn increment_robots_skipped(&self) {
        self.stats.write().robots_skipped += 1;
    }

    pub fn increment_storage_errors(&self) {
        self.stats.write().storage_errors += 1;
    }

    pub fn finish(&self) {
        self.stats.write().end_time = Some(Utc::now());
    }

    pub fn get_stats(&self) -> ScrapingStats {
        self.stats.read().clone()
    }

    /// Writes the end-of-run summary to stderr.
    pub fn print_summary(&self) {
        if let Err(e) = self.write_summary(&mut std::io::stderr().lock()) {
            warn!("Could not print statistics: {}", e);
        }
    }

    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let stats = self.stats.read();
        let duration = stats
            .end_time
            .unwrap_or_else(Utc::now)
            .signed_duration_since(stats.start_time);

        writeln!(out, "\nScraping Statistics:")?;
        writeln!(out, "===================")?;
        writeln!(out, "Duration: {} seconds", duration.num_seconds())?;
        writeln!(out, "Total Requests: {}", stats.total_requests)?;
        writeln!(out, "Successful Requests: {}", stats.successful_requests)?;
        writeln!(out, "Failed Requests: {}", stats.failed_requests)?;
        writeln!(out, "Retry Count: {}", stats.retry_count)?;
        writeln!(
            out,
            "Data Downloaded: {:.2} MB",
            stats.bytes_downloaded as f64 / 1_000_000.0
        )?;
        writeln!(
            out,
            "Average Response Time: {:.2}ms",
            stats.average_response_time
        )?;
        writeln!(out, "Pages Parsed: {}", stats.pages_parsed)?;
        writeln!(
            out,
            "Products: {} ({} without price)",
            stats.products_extracted, stats.products_without_price
        )?;
        writeln!(out, "Extraction Errors: {}", stats.extraction_errors)?;
        writeln!(out, "Fetch Failures: {}", stats.fetch_failures)?;
        writeln!(out, "Skipped by robots.txt: {}", stats.robots_skipped)?;
        writeln!(out, "Storage Errors: {}", stats.storage_errors)?;

        writeln!(out, "\nStatus Codes:")?;
        for (code, count) in &stats.status_codes {
            writeln!(out, "  {}: {}", code, count)?;
        }

        if !stats.retry_reasons.is_empty() {
            writeln!(out, "\nRetry Reasons:")?;
            for (reason, count) in &stats.retry_reasons {
                writeln!(out, "  {}: {}", reason, count)?;
            }
        }
        Ok(())
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_request_updates_average() {
        let tracker = StatsTracker::new();
        tracker.record_request(200, 1_000, Duration::milliseconds(100));
        tracker.record_request(404, 10, Duration::milliseconds(300));

        let stats = tracker.get_stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.successful_requests, 1);
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.bytes_downloaded, 1_010);
        assert_eq!(stats.status_codes.get(&404), Some(&1));
        assert!((stats.average_response_time - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clones_share_counters() {
        let tracker = StatsTracker::new();
        let clone = tracker.clone();
        clone.record_page(3, 1, 1);
        clone.increment_fetch_failures();

        let stats = tracker.get_stats();
        assert_eq!(stats.pages_parsed, 1);
        assert_eq!(stats.products_extracted, 3);
        assert_eq!(stats.products_without_price, 1);
        assert_eq!(stats.extraction_errors, 1);
        assert_eq!(stats.fetch_failures, 1);
    }

    #[test]
    fn test_summary_lists_failure_counters() {
        let tracker = StatsTracker::new();
        tracker.increment_storage_errors();
        tracker.increment_storage_errors();
        tracker.increment_robots_skipped();
        tracker.finish();

        let mut out = Vec::new();
        tracker.write_summary(&mut out).unwrap();
        let summary = String::from_utf8(out).unwrap();

        assert!(summary.contains("Storage Errors: 2\n"), "{summary}");
        assert!(summary.contains("Skipped by robots.txt: 1\n"), "{summary}");
    }
}
