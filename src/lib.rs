//! # Tagscroll
//!
//! Search a booru-style post API by tags and browse the results in a
//! terminal view that scrolls itself.
//!
//! ## Architecture
//!
//! A search flows through a small pipeline:
//!
//! ```text
//! Tags → EndpointBuilder → FetchOrchestrator → Normalizer → SearchSink
//!                                                              ↑
//!                                               ScrollScheduler (auto-scroll)
//! ```
//!
//! The direct API URL is tried first, then the same URL through each relay
//! prefix. Transport failures fall through to the next candidate; an explicit
//! rejection from the API ends the search.
//!
//! ## Quick Start
//!
//! ```bash
//! # Print posts for a tag query
//! tagscroll search cat_ears solo
//!
//! # Show which URLs a search would try
//! tagscroll endpoints cat_ears solo
//!
//! # Launch the TUI
//! tagscroll tui cat_ears
//!
//! # Run the local relay
//! tagscroll proxy --port 8000
//! ```

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) wires configuration, the HTTP fetcher and
/// the endpoint builder together.
pub mod app;

/// Command-line interface using clap.
///
/// - `search <tags...> [--json]` - Fetch and print posts
/// - `endpoints <tags...>` - Print candidate URLs
/// - `tui [tags...]` - Launch the TUI
/// - `proxy` - Run the local relay server
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/tagscroll/config.toml`: API endpoint and relays,
/// scroll timing, relay server, colors and keybindings.
pub mod config;

/// Core domain models.
///
/// - [`Tags`](domain::Tags): A validated tag query
/// - [`Post`](domain::Post): A normalized post record
pub mod domain;

/// Candidate URL construction for a tag search.
pub mod endpoint;

/// HTTP fetching and endpoint fallback.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for raw GETs
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`FetchOrchestrator`](fetcher::FetchOrchestrator): Tries candidates in order
pub mod fetcher;

/// Record extraction and post normalization.
pub mod normalizer;

/// Local relay server built on axum.
pub mod proxy;

/// Response classification and API error detection.
pub mod response;

/// Timer-driven cyclic auto-scroll.
pub mod scroll;

/// The search lifecycle and its output seam.
pub mod search;

/// Terminal user interface.
///
/// Search field on top, scrolling post cards below, status bar at the
/// bottom. Keybindings: `/` search, j/k scroll, n/p page, a toggles
/// auto-scroll, o opens the top post, R repeats the search, q quits.
pub mod tui;
