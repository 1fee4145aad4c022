//! Data models for the statement dashboard.
//!
//! This module contains the wire-level page shapes returned by the
//! statistics API and the derived structures (histogram, summary stats,
//! snapshot, fetch state) handed to the report layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// One paper's statement-count record as returned by the API.
///
/// Only `count` feeds the aggregation; `id` and `title` are carried for the
/// report's top-papers table. Records are immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementRecord {
    /// Paper identifier.
    #[serde(default)]
    pub id: String,
    /// Paper title.
    #[serde(default)]
    pub title: String,
    /// Number of statements attached to the paper.
    ///
    /// Deserialized leniently: missing, null, or non-numeric values coerce
    /// to 0 rather than failing the page decode.
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: u64,
}

impl StatementRecord {
    /// Creates a record with only a count (id and title empty).
    #[allow(dead_code)] // Fixture constructor for tests
    pub fn with_count(count: u64) -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            count,
        }
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_count(&value))
}

/// The treat-as-zero coercion policy for the `count` field.
///
/// Numbers keep their value (negatives clamp to 0, fractions floor);
/// numeric strings parse; everything else is 0.
pub fn coerce_count(value: &serde_json::Value) -> u64 {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f > 0.0 {
                    f as u64
                } else {
                    0
                }
            } else {
                0
            }
        }
        serde_json::Value::String(s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() && f > 0.0 => f as u64,
            _ => 0,
        },
        _ => 0,
    }
}

/// Pagination metadata attached to each page response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMeta {
    /// Requested page size.
    #[serde(default)]
    #[allow(dead_code)] // Wire metadata, echoed by the server
    pub size: Option<u32>,
    /// Total records across all pages.
    #[serde(default)]
    pub total_elements: Option<u64>,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: Option<u32>,
    /// Index of this page.
    #[serde(default)]
    #[allow(dead_code)] // Wire metadata, echoed by the server
    pub number: Option<u32>,
}

/// One page of the `/api/statements` response.
///
/// Transient: its content is appended to the record collection right after
/// decode and the struct is dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageResponse {
    /// Records in this page, in server order.
    #[serde(default)]
    pub content: Vec<StatementRecord>,
    /// Pagination metadata. Absent metadata means a single page.
    #[serde(default)]
    pub page: Option<PageMeta>,
}

impl PageResponse {
    /// Server-reported page count; 0 when the metadata is absent.
    pub fn total_pages(&self) -> u32 {
        self.page.as_ref().and_then(|m| m.total_pages).unwrap_or(0)
    }

    /// Server-reported total record count, if present.
    pub fn total_elements(&self) -> Option<u64> {
        self.page.as_ref().and_then(|m| m.total_elements)
    }
}

/// Fixed-width histogram with a trailing overflow bucket.
///
/// `bucket_labels` and `bucket_counts` are parallel vectors of identical
/// length; the final element of each is the overflow bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    /// Human-readable bucket ranges, e.g. `"0–10"`, last is `"200+"`.
    pub bucket_labels: Vec<String>,
    /// Records per bucket, same order as the labels.
    pub bucket_counts: Vec<u64>,
}

impl Histogram {
    /// Total records across all buckets (equals the collection length).
    pub fn total(&self) -> u64 {
        self.bucket_counts.iter().sum()
    }

    /// Records in the overflow bucket.
    pub fn overflow(&self) -> u64 {
        self.bucket_counts.last().copied().unwrap_or(0)
    }
}

/// Summary statistics over the record collection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Arithmetic mean of the counts; 0 for an empty collection.
    pub mean: f64,
    /// Median of the counts; 0 for an empty collection.
    pub median: f64,
}

/// The results of one successful fetch-aggregate cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// All fetched records, in page order then intra-page order.
    pub records: Vec<StatementRecord>,
    /// Histogram over the record counts.
    pub histogram: Histogram,
    /// Mean and median of the record counts.
    pub stats: SummaryStats,
    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
    /// Number of page requests issued.
    pub pages_fetched: u32,
    /// Wall-clock duration of the cycle in seconds.
    pub duration_seconds: f64,
}

/// Process lifecycle of a fetch-aggregate cycle.
///
/// `Ready` holds the last successfully computed snapshot; `Failed` holds the
/// error message and nothing else, since partial data from a failed attempt
/// is never retained.
#[derive(Debug, Clone)]
pub enum FetchState {
    /// No cycle has been started.
    Idle,
    /// A cycle is in flight.
    Loading,
    /// The last cycle succeeded.
    Ready(Snapshot),
    /// The last cycle failed.
    Failed {
        /// The surfaced error message, verbatim.
        message: String,
    },
}

impl FetchState {
    /// Short machine-friendly name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            FetchState::Idle => "idle",
            FetchState::Loading => "loading",
            FetchState::Ready(_) => "ready",
            FetchState::Failed { .. } => "failed",
        }
    }

    /// Whether this state carries a usable snapshot.
    #[allow(dead_code)] // Utility accessor
    pub fn is_ready(&self) -> bool {
        matches!(self, FetchState::Ready(_))
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_decode_plain() {
        let record: StatementRecord =
            serde_json::from_str(r#"{"id": "P1", "title": "Paper One", "count": 12}"#).unwrap();
        assert_eq!(record.id, "P1");
        assert_eq!(record.title, "Paper One");
        assert_eq!(record.count, 12);
    }

    #[test]
    fn test_record_decode_missing_count() {
        let record: StatementRecord =
            serde_json::from_str(r#"{"id": "P1", "title": "Paper One"}"#).unwrap();
        assert_eq!(record.count, 0);
    }

    #[test]
    fn test_record_decode_malformed_count() {
        for body in [
            r#"{"count": null}"#,
            r#"{"count": "not a number"}"#,
            r#"{"count": [1, 2]}"#,
            r#"{"count": {"value": 3}}"#,
            r#"{"count": -5}"#,
        ] {
            let record: StatementRecord = serde_json::from_str(body).unwrap();
            assert_eq!(record.count, 0, "body: {}", body);
        }
    }

    #[test]
    fn test_record_decode_numeric_variants() {
        let record: StatementRecord = serde_json::from_str(r#"{"count": 7.9}"#).unwrap();
        assert_eq!(record.count, 7);

        let record: StatementRecord = serde_json::from_str(r#"{"count": "42"}"#).unwrap();
        assert_eq!(record.count, 42);
    }

    #[test]
    fn test_page_decode_full() {
        let page: PageResponse = serde_json::from_str(
            r#"{
                "content": [{"id": "P1", "title": "A", "count": 7}],
                "page": {"size": 50, "total_elements": 1, "total_pages": 1, "number": 0}
            }"#,
        )
        .unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.total_pages(), 1);
        assert_eq!(page.total_elements(), Some(1));
    }

    #[test]
    fn test_page_decode_missing_fields() {
        let page: PageResponse = serde_json::from_str("{}").unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.total_pages(), 0);
        assert_eq!(page.total_elements(), None);

        let page: PageResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(page.content.is_empty());
        assert_eq!(page.total_pages(), 0);
    }

    #[test]
    fn test_histogram_totals() {
        let histogram = Histogram {
            bucket_labels: vec!["0–10".to_string(), "10+".to_string()],
            bucket_counts: vec![3, 2],
        };
        assert_eq!(histogram.total(), 5);
        assert_eq!(histogram.overflow(), 2);
    }

    #[test]
    fn test_fetch_state_names() {
        assert_eq!(FetchState::Idle.to_string(), "idle");
        assert_eq!(FetchState::Loading.to_string(), "loading");
        assert_eq!(
            FetchState::Failed {
                message: "boom".to_string()
            }
            .to_string(),
            "failed"
        );
        assert!(!FetchState::Idle.is_ready());
    }
}
