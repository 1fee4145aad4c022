//! Paginated fetching from the statements API.
//!
//! This module provides the sequential page-by-page fetch loop and the
//! HTTP client that feeds it.

pub mod client;

pub use client::{fetch_all, FetchError, FetchOptions, FetchOutcome, PageSource, StatementClient};
