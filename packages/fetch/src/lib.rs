#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Fetch driver for the official Yu-Gi-Oh! card database.
//!
//! Crawls talk to the site only through the [`PageFetcher`] trait, which
//! returns raw HTML. [`DbClient`] is the `reqwest` implementation;
//! [`session`] bootstraps the cookies the FAQ pages require and
//! [`Politeness`] spaces requests out.

pub mod client;
pub mod delay;
pub mod retry;
pub mod session;
pub mod url;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use client::DbClient;
pub use delay::Politeness;
pub use session::Session;

/// Errors from talking to the card database.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a status that is not worth retrying, or
    /// kept failing until the retries ran out.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// No session cookies could be obtained.
    #[error("Session error: {message}")]
    Session { message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Paginated search listings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ListKind {
    /// Card search results, 100 cards per page, card-id descending.
    Cards,
    /// FAQ search results, newest update first.
    Faq,
}

/// Per-id detail pages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetailKind {
    /// A card's Q&A page, which carries the supplement text.
    Supplement,
    /// One FAQ entry.
    Faq,
}

/// Source of raw HTML for crawls.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Obtains whatever session state later requests need. Called once
    /// before crawls that hit FAQ pages.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Session`] if no session could be established.
    async fn establish_session(&mut self) -> Result<(), FetchError>;

    /// Fetches page `page` (1-based) of a listing.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails after retries.
    async fn fetch_list_page(&self, kind: ListKind, page: u32) -> Result<String, FetchError>;

    /// Fetches the detail page for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails after retries.
    async fn fetch_detail(&self, kind: DetailKind, id: &str) -> Result<String, FetchError>;
}
