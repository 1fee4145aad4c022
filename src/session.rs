//! Fetch-cycle state machine.
//!
//! A `Session` owns the explicit process state (`Idle`, `Loading`, `Ready`,
//! `Failed`) instead of scattering loading/error flags. One `refresh` drives
//! a full fetch-aggregate cycle: the previous snapshot survives while the new
//! cycle is in flight and is replaced only when the new one succeeds; a
//! failure drops everything, so `Failed` never shows stale data.

use crate::analysis::{self, HistogramConfig};
use crate::fetch::{fetch_all, PageSource};
use crate::models::{FetchState, Snapshot};
use chrono::Utc;
use std::time::Instant;
use tracing::{info, warn};

/// Drives fetch-aggregate cycles and holds their state.
pub struct Session {
    histogram_config: HistogramConfig,
    state: FetchState,
}

impl Session {
    /// Create an idle session.
    pub fn new(histogram_config: HistogramConfig) -> Self {
        Self {
            histogram_config,
            state: FetchState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Run one fetch-aggregate cycle; inspect the result via [`Self::state`].
    ///
    /// `on_page` is forwarded to the fetch loop for progress reporting.
    pub async fn refresh<S: PageSource>(
        &mut self,
        source: &S,
        max_pages: u32,
        on_page: impl FnMut(u32, u32),
    ) {
        // The previous snapshot stays alive until the cycle resolves.
        let previous = std::mem::replace(&mut self.state, FetchState::Loading);
        let started = Instant::now();

        match fetch_all(source, max_pages, on_page).await {
            Ok(outcome) => {
                let histogram =
                    analysis::compute_histogram(&outcome.records, &self.histogram_config);
                let stats = analysis::summary_stats(&outcome.records);

                info!(
                    "Aggregated {} records: mean {:.2}, median {:.2}",
                    outcome.records.len(),
                    stats.mean,
                    stats.median
                );

                self.state = FetchState::Ready(Snapshot {
                    records: outcome.records,
                    histogram,
                    stats,
                    fetched_at: Utc::now(),
                    pages_fetched: outcome.pages_fetched,
                    duration_seconds: started.elapsed().as_secs_f64(),
                });
            }
            Err(e) => {
                warn!("Fetch cycle failed: {}", e);
                self.state = FetchState::Failed {
                    message: e.to_string(),
                };
            }
        }

        drop(previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::models::{PageMeta, PageResponse, StatementRecord};

    struct StaticSource {
        pages: Vec<Result<PageResponse, u16>>,
    }

    impl PageSource for StaticSource {
        async fn page(&self, index: u32) -> Result<PageResponse, FetchError> {
            match &self.pages[index as usize] {
                Ok(page) => Ok(page.clone()),
                Err(status) => Err(FetchError::Http {
                    status: reqwest::StatusCode::from_u16(*status).unwrap(),
                    url: "http://fake/api/statements".to_string(),
                }),
            }
        }
    }

    fn single_page(counts: &[u64]) -> PageResponse {
        PageResponse {
            content: counts
                .iter()
                .map(|&c| StatementRecord::with_count(c))
                .collect(),
            page: Some(PageMeta {
                total_pages: Some(1),
                ..PageMeta::default()
            }),
        }
    }

    #[test]
    fn test_refresh_reaches_ready() {
        let source = StaticSource {
            pages: vec![Ok(single_page(&[0, 15, 205]))],
        };
        let mut session = Session::new(HistogramConfig::default());
        assert_eq!(session.state().name(), "idle");

        tokio_test::block_on(session.refresh(&source, 1000, |_, _| {}));
        match session.state() {
            FetchState::Ready(snapshot) => {
                assert_eq!(snapshot.records.len(), 3);
                assert_eq!(snapshot.histogram.total(), 3);
                assert_eq!(snapshot.stats.median, 15.0);
                assert_eq!(snapshot.pages_fetched, 1);
            }
            other => panic!("expected ready, got {}", other),
        }
    }

    #[test]
    fn test_refresh_failure_reaches_failed() {
        let source = StaticSource {
            pages: vec![Err(500)],
        };
        let mut session = Session::new(HistogramConfig::default());

        tokio_test::block_on(session.refresh(&source, 1000, |_, _| {}));
        match session.state() {
            FetchState::Failed { message } => assert!(message.contains("500")),
            other => panic!("expected failed, got {}", other),
        }
    }

    #[test]
    fn test_failed_refresh_drops_previous_snapshot() {
        let good = StaticSource {
            pages: vec![Ok(single_page(&[7]))],
        };
        let bad = StaticSource {
            pages: vec![Err(503)],
        };
        let mut session = Session::new(HistogramConfig::default());

        tokio_test::block_on(session.refresh(&good, 1000, |_, _| {}));
        assert!(session.state().is_ready());

        tokio_test::block_on(session.refresh(&bad, 1000, |_, _| {}));
        assert_eq!(session.state().name(), "failed");
    }

    #[test]
    fn test_refresh_replaces_previous_snapshot() {
        let first = StaticSource {
            pages: vec![Ok(single_page(&[7]))],
        };
        let second = StaticSource {
            pages: vec![Ok(single_page(&[1, 2, 3]))],
        };
        let mut session = Session::new(HistogramConfig::default());

        tokio_test::block_on(session.refresh(&first, 1000, |_, _| {}));
        tokio_test::block_on(session.refresh(&second, 1000, |_, _| {}));

        match session.state() {
            FetchState::Ready(snapshot) => assert_eq!(snapshot.records.len(), 3),
            other => panic!("expected ready, got {}", other),
        }
    }
}
