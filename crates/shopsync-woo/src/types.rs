//! Wire types for the WooCommerce REST API (`wp-json/wc/v3`).
//!
//! Inbound shapes are deliberately lenient: WooCommerce serializes prices as
//! strings, sends `""` for unset decimals, and omits fields freely depending
//! on store plugins, so every field defaults and decimals go through
//! [`lenient_decimal`].

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Connection settings for a WooCommerce store.
#[derive(Clone)]
pub struct WooConfig {
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub timeout_secs: u64,
    pub ssl_verify: bool,
}

/// Accepts a decimal as a JSON string, a JSON number, `""`, or `null`.
/// Anything unparseable reads as absent rather than failing the whole row.
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        Some(serde_json::Value::Number(n)) => n.to_string().parse().ok(),
        _ => None,
    })
}

/// A product as WooCommerce returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteProduct {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub regular_price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub manage_stock: bool,
    #[serde(default)]
    pub stock_quantity: Option<i32>,
    #[serde(default)]
    pub stock_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub weight: Option<Decimal>,
    #[serde(default)]
    pub dimensions: Option<RemoteDimensions>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub catalog_visibility: Option<String>,
    #[serde(default)]
    pub categories: Vec<RemoteCategoryRef>,
    #[serde(default)]
    pub images: serde_json::Value,
    #[serde(default)]
    pub meta_data: serde_json::Value,
}

impl RemoteProduct {
    /// `stock_status` collapses to a boolean; a missing field reads as in
    /// stock, matching the platform default.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.stock_status.as_deref().unwrap_or("instock") == "instock"
    }

    /// The price to persist locally: the regular price, falling back to the
    /// computed `price` field when the store omits it.
    #[must_use]
    pub fn effective_regular_price(&self) -> Decimal {
        self.regular_price
            .or(self.price)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteDimensions {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub length: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub width: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub height: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCategoryRef {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// An order as WooCommerce returns it. Only the fields the catalog cares
/// about; line items and addresses stay on the remote side.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteOrder {
    pub id: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total: Option<Decimal>,
}

/// Outbound product body for create and update calls.
///
/// `Decimal` fields serialize as JSON strings, which is the shape WooCommerce
/// expects for money. Optional fields are omitted entirely rather than sent
/// as null so the store keeps its current values.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPayload {
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub sku: String,
    pub regular_price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Decimal>,
    pub manage_stock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<PayloadDimensions>,
    pub status: String,
    pub featured: bool,
    pub catalog_visibility: String,
    pub categories: Vec<CategoryRefPayload>,
    pub images: serde_json::Value,
    pub meta_data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayloadDimensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRefPayload {
    pub id: i64,
}
