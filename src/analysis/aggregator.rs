//! Histogram and summary statistics.
//!
//! This module provides pure functions over the fetched record collection:
//! fixed-width histogram bucketing plus mean and median. All of them are
//! deterministic given identical input order and never fail on any input.

use crate::models::{Histogram, StatementRecord, SummaryStats};

/// Fixed-width histogram configuration.
#[derive(Debug, Clone, Copy)]
pub struct HistogramConfig {
    /// Counts at or above this value land in the overflow bucket.
    pub cap: u64,
    /// Width of each regular bucket.
    pub bin_size: u64,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            cap: 200,
            bin_size: 10,
        }
    }
}

impl HistogramConfig {
    /// Number of regular buckets (the overflow bucket comes on top).
    pub fn num_bins(&self) -> usize {
        (self.cap / self.bin_size) as usize
    }

    /// Validate the configuration.
    ///
    /// The cap must be a positive multiple of the bucket width so every
    /// regular bucket covers a full range.
    pub fn validate(&self) -> Result<(), String> {
        if self.bin_size == 0 {
            return Err("Bucket width must be at least 1".to_string());
        }
        if self.cap < self.bin_size {
            return Err("Cap must be at least the bucket width".to_string());
        }
        if self.cap % self.bin_size != 0 {
            return Err("Cap must be a multiple of the bucket width".to_string());
        }
        Ok(())
    }
}

/// Bucket all records into a fixed-width histogram with an overflow bucket.
///
/// A record with `count >= cap` lands in the overflow bucket; any other
/// record lands in bucket `count / bin_size`. Labels are the covered ranges
/// (`"0–10"`, `"10–20"`, ..., `"{cap}+"`).
pub fn compute_histogram(records: &[StatementRecord], config: &HistogramConfig) -> Histogram {
    let num_bins = config.num_bins();
    let mut bins = vec![0u64; num_bins];
    let mut overflow = 0u64;

    for record in records {
        if record.count >= config.cap {
            overflow += 1;
        } else {
            bins[(record.count / config.bin_size) as usize] += 1;
        }
    }

    let mut bucket_labels: Vec<String> = (0..num_bins as u64)
        .map(|i| format!("{}–{}", i * config.bin_size, (i + 1) * config.bin_size))
        .collect();
    bucket_labels.push(format!("{}+", config.cap));

    let mut bucket_counts = bins;
    bucket_counts.push(overflow);

    Histogram {
        bucket_labels,
        bucket_counts,
    }
}

/// Arithmetic mean of the record counts; 0 for an empty collection.
pub fn compute_mean(records: &[StatementRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }

    let sum: f64 = records.iter().map(|r| r.count as f64).sum();
    sum / records.len() as f64
}

/// Median of the record counts; 0 for an empty collection.
///
/// Odd-length collections yield the middle element, even-length the average
/// of the two central elements. Full precision; rounding is left to the
/// report layer.
pub fn compute_median(records: &[StatementRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }

    let mut counts: Vec<u64> = records.iter().map(|r| r.count).collect();
    counts.sort_unstable();

    let mid = counts.len() / 2;
    if counts.len() % 2 == 1 {
        counts[mid] as f64
    } else {
        (counts[mid - 1] as f64 + counts[mid] as f64) / 2.0
    }
}

/// Mean and median together.
pub fn summary_stats(records: &[StatementRecord]) -> SummaryStats {
    SummaryStats {
        mean: compute_mean(records),
        median: compute_median(records),
    }
}

/// The `n` records with the highest counts (count descending, then id).
pub fn top_records(records: &[StatementRecord], n: usize) -> Vec<&StatementRecord> {
    let mut sorted: Vec<&StatementRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));
    sorted.truncate(n);
    sorted
}
