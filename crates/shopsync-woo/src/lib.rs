//! WooCommerce REST API client.
//!
//! One [`WooClient`] per configured store. All calls authenticate with the
//! consumer key/secret pair in the query string and speak the `wc/v3` JSON
//! surface. Retry policy lives in [`retry`] so callers decide how much
//! patience each call site deserves.

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::WooClient;
pub use error::WooError;
pub use retry::{backoff_delay_ms, is_retriable, retry_with_backoff};
pub use types::{
    CategoryRefPayload, PayloadDimensions, ProductPayload, RemoteCategoryRef, RemoteDimensions,
    RemoteOrder, RemoteProduct, WooConfig,
};
