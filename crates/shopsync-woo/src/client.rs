//! HTTP client for the WooCommerce REST API.
//!
//! Wraps `reqwest` with credential handling and typed response
//! deserialization. Non-2xx responses never surface as bare HTTP errors:
//! the status and body are captured into [`WooError::Rejected`] so callers
//! can tell a 404 from a 500 when deciding whether to retry.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::WooError;
use crate::types::{ProductPayload, RemoteOrder, RemoteProduct, WooConfig};

const API_PREFIX: &str = "wp-json/wc/v3";

/// Client for one WooCommerce store.
///
/// Use [`WooClient::new`] for production or [`WooClient::with_base_url`] to
/// point at a mock server in tests.
pub struct WooClient {
    client: Client,
    consumer_key: String,
    consumer_secret: String,
    base_url: Url,
}

impl WooClient {
    /// Creates a client from store connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`WooError::Transport`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`WooError::InvalidBaseUrl`] if the
    /// configured store URL does not parse.
    pub fn new(config: &WooConfig) -> Result<Self, WooError> {
        Self::with_base_url(config, &config.base_url)
    }

    /// Creates a client with an explicit base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`WooClient::new`].
    pub fn with_base_url(config: &WooConfig, base_url: &str) -> Result<Self, WooError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(!config.ssl_verify)
            .user_agent("shopsync/0.1")
            .build()?;

        // Normalise to exactly one trailing slash so path joins append to the
        // store root instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|_| WooError::InvalidBaseUrl(base_url.to_string()))?;

        Ok(Self {
            client,
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            base_url,
        })
    }

    /// Fetches one page of products.
    ///
    /// # Errors
    ///
    /// - [`WooError::Transport`] on network failure or timeout.
    /// - [`WooError::Rejected`] on a non-2xx response.
    /// - [`WooError::Deserialize`] if the body does not match the expected shape.
    pub async fn list_products(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RemoteProduct>, WooError> {
        let url = self.build_url(
            "products",
            &[("page", &page.to_string()), ("per_page", &per_page.to_string())],
        );
        let context = format!("list_products(page={page})");
        self.decode(self.client.get(url), &context).await
    }

    /// Fetches a single product by its remote id.
    ///
    /// # Errors
    ///
    /// As for [`WooClient::list_products`]; an unknown id surfaces as
    /// [`WooError::Rejected`] with a 404 status.
    pub async fn get_product(&self, woo_id: i64) -> Result<RemoteProduct, WooError> {
        let url = self.build_url(&format!("products/{woo_id}"), &[]);
        let context = format!("get_product(id={woo_id})");
        self.decode(self.client.get(url), &context).await
    }

    /// Creates a product on the store and returns the record the store
    /// persisted, including the new remote id.
    ///
    /// # Errors
    ///
    /// As for [`WooClient::list_products`].
    pub async fn create_product(&self, payload: &ProductPayload) -> Result<RemoteProduct, WooError> {
        let url = self.build_url("products", &[]);
        let context = format!("create_product(sku={})", payload.sku);
        self.decode(self.client.post(url).json(payload), &context).await
    }

    /// Updates an existing remote product in place.
    ///
    /// # Errors
    ///
    /// As for [`WooClient::list_products`].
    pub async fn update_product(
        &self,
        woo_id: i64,
        payload: &ProductPayload,
    ) -> Result<RemoteProduct, WooError> {
        let url = self.build_url(&format!("products/{woo_id}"), &[]);
        let context = format!("update_product(id={woo_id})");
        self.decode(self.client.put(url).json(payload), &context).await
    }

    /// Deletes a remote product. `force` skips the store's trash bin.
    ///
    /// # Errors
    ///
    /// As for [`WooClient::list_products`].
    pub async fn delete_product(&self, woo_id: i64, force: bool) -> Result<(), WooError> {
        let url = self.build_url(
            &format!("products/{woo_id}"),
            &[("force", if force { "true" } else { "false" })],
        );
        let context = format!("delete_product(id={woo_id})");
        self.send(self.client.delete(url), &context).await?;
        Ok(())
    }

    /// Fetches one page of orders.
    ///
    /// # Errors
    ///
    /// As for [`WooClient::list_products`].
    pub async fn list_orders(&self, page: u32, per_page: u32) -> Result<Vec<RemoteOrder>, WooError> {
        let url = self.build_url(
            "orders",
            &[("page", &page.to_string()), ("per_page", &per_page.to_string())],
        );
        let context = format!("list_orders(page={page})");
        self.decode(self.client.get(url), &context).await
    }

    /// Sets the status of a remote order.
    ///
    /// # Errors
    ///
    /// As for [`WooClient::list_products`].
    pub async fn update_order_status(
        &self,
        woo_id: i64,
        status: &str,
    ) -> Result<RemoteOrder, WooError> {
        let url = self.build_url(&format!("orders/{woo_id}"), &[]);
        let context = format!("update_order_status(id={woo_id})");
        let body = serde_json::json!({ "status": status });
        self.decode(self.client.put(url).json(&body), &context).await
    }

    /// Probes the store with a minimal products request. Never errors; any
    /// failure reads as "not reachable" and is logged at debug.
    pub async fn test_connection(&self) -> bool {
        match self.list_products(1, 1).await {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(error = %err, "store connection probe failed");
                false
            }
        }
    }

    /// Builds a full request URL under `wp-json/wc/v3` with the consumer
    /// credentials and any extra parameters percent-encoded into the query.
    fn build_url(&self, path: &str, extra: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        // Always Ok for http(s) URLs.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(API_PREFIX.split('/'))
                .extend(path.split('/'));
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("consumer_key", &self.consumer_key);
            pairs.append_pair("consumer_secret", &self.consumer_secret);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// Sends the request and returns the raw body of a 2xx response.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<String, WooError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::debug!(%status, context, "store rejected request");
            return Err(WooError::Rejected { status, body });
        }
        Ok(body)
    }

    /// Sends the request and deserializes the 2xx body into `T`.
    async fn decode<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T, WooError> {
        let body = self.send(request, context).await?;
        serde_json::from_str(&body).map_err(|e| WooError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }
}
