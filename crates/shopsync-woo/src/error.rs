use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned by the WooCommerce API client.
#[derive(Debug, Error)]
pub enum WooError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-2xx status. The body is kept verbatim
    /// because WooCommerce puts its error code and message there.
    #[error("request rejected with status {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured store URL is not a parseable base URL.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}
