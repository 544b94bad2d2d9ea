//! # placeharvest
//!
//! Harvests business listings (name, address, phone, rating, services, ...)
//! from a map search by driving a headless Chrome.
//!
//! ## Architecture
//!
//! ```text
//! API / CLI → JobManager → FeedScroller → ListingReconciler → Export
//! ```
//!
//! - [`scraper`]: browser session, feed scrolling, per-listing extraction, jobs
//! - [`api`]: axum routes for starting, polling, cancelling and exporting
//! - [`export`]: text, CSV and JSON renderings of the results
//!
//! ## Quick Start
//!
//! ```bash
//! # One search in the foreground
//! placeharvest search bakery Lisbon -n 20 -f csv
//!
//! # HTTP API on 0.0.0.0:5000
//! placeharvest serve
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires the loaded config to a
/// [`JobManager`](scraper::JobManager).
pub mod app;

/// HTTP API built on axum.
pub mod api;

/// Configuration management.
///
/// Loads from `~/.config/placeharvest/config.toml`: scraper timings,
/// on-page queries, service keywords and the server address.
pub mod config;

/// Command-line interface using clap.
///
/// - `serve [--bind ADDR]` - Run the HTTP API
/// - `search <CATEGORY> <LOCATION>` - One-shot search with export
/// - `config [--show]` - Show the config file
pub mod cli;

/// Core domain models.
///
/// - [`ListingRecord`](domain::ListingRecord): one deduplicated business
/// - [`IdentityKey`](domain::IdentityKey): normalized (name, address, phone)
/// - [`SearchParams`](domain::SearchParams) and [`JobStatus`](domain::JobStatus)
pub mod domain;

pub mod export;

/// Browser-driven harvesting.
///
/// - [`BrowserSession`](scraper::BrowserSession): chromiumoxide page driver
/// - [`FeedScroller`](scraper::FeedScroller): collects candidate links
/// - [`ListingReconciler`](scraper::ListingReconciler): extracts and deduplicates
/// - [`JobManager`](scraper::JobManager): single background job
pub mod scraper;
