//! # boardsync
//!
//! A client-side sync layer for a GitHub-backed discussion board.
//!
//! ## Architecture
//!
//! ```text
//! Presenter → Gateway → { Cache, IdentityStore } → GitHub clients → RequestExecutor
//! ```
//!
//! Reads go through the cache and try the GraphQL API before the REST issues
//! API. Writes are validated locally, require a signed-in session, and
//! invalidate cached listings once they succeed.
//!
//! ## Quick Start
//!
//! ```bash
//! # Sign in (the token is read from stdin when omitted)
//! boardsync login
//!
//! # List discussions in a category
//! boardsync list --category ideas
//!
//! # Read one with its comments
//! boardsync show 42
//!
//! # Reply
//! boardsync comment 42 "Thanks, that fixed it"
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`cache`]: In-memory TTL cache for fetched content
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: TOML configuration
//! - [`domain`]: Discussions, comments, identities
//! - [`fetcher`]: HTTP execution with timeouts, retries and error classification
//! - [`gateway`]: Cached, protocol-agnostic board access
//! - [`github`]: GraphQL and REST clients
//! - [`identity`]: Credential and session lifecycle
//! - [`presenter`]: View state and user intents
//! - [`store`]: Durable key/value storage
//! - [`validation`]: Input rules for posts and comments

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together storage, the
/// HTTP executor, both GitHub clients, the identity store, cache and gateway.
pub mod app;

/// In-memory content cache keyed by string with per-entry expiry.
pub mod cache;

/// Command-line interface using clap.
///
/// - `login [token]` / `logout` / `whoami`
/// - `list [--category] [--page] [--search]`
/// - `show <number>`
/// - `comment <number> <body>`
/// - `create --title --body [--category] [--tags]`
/// - `react <number> <reaction>`
/// - `delete <number>`
pub mod cli;

/// Configuration loaded from `~/.config/boardsync/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Discussion`](domain::Discussion) and [`Comment`](domain::Comment)
/// - [`Credential`](domain::Credential): bearer token with redacted `Debug`
/// - [`Identity`](domain::Identity) and [`LoginSyncMarker`](domain::LoginSyncMarker)
pub mod domain;

/// HTTP request execution.
///
/// [`RequestExecutor`](fetcher::RequestExecutor) applies per-attempt
/// timeouts, linear-backoff retries for transient failures, and maps HTTP
/// statuses onto [`SyncError`](app::SyncError).
pub mod fetcher;

pub mod gateway;

/// GitHub protocol clients.
///
/// - [`GraphqlClient`](github::GraphqlClient): discussions via GraphQL
/// - [`RestClient`](github::RestClient): issues, comments, reactions, profile
/// - [`DiscussionSource`](github::DiscussionSource): the seam the gateway falls back across
pub mod github;

pub mod identity;

pub mod presenter;

/// Durable key/value storage.
///
/// - [`Storage`](store::Storage): get/set/remove by key
/// - [`SqliteStorage`](store::SqliteStorage): SQLite implementation shared between processes
pub mod store;

pub mod validation;

#[cfg(test)]
mod testing;
