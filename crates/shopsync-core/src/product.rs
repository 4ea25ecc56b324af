//! Catalog domain primitives shared by the store, the sync engine, and the
//! HTTP layer: lifecycle enums, stock operations, and the pricing and
//! availability rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product lifecycle status. Values map 1:1 onto the remote platform's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Draft,
    Pending,
    Private,
    Publish,
}

impl ProductStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Pending => "pending",
            ProductStatus::Private => "private",
            ProductStatus::Publish => "publish",
        }
    }

    /// Parses a status string. Unknown values fall back to `Draft`, matching
    /// how inbound remote records with missing/odd statuses are absorbed.
    #[must_use]
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "pending" => ProductStatus::Pending,
            "private" => ProductStatus::Private,
            "publish" => ProductStatus::Publish,
            _ => ProductStatus::Draft,
        }
    }

    /// Strict parse for API input, where an unknown status is a caller error.
    #[must_use]
    pub fn parse_strict(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ProductStatus::Draft),
            "pending" => Some(ProductStatus::Pending),
            "private" => Some(ProductStatus::Private),
            "publish" => Some(ProductStatus::Publish),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog visibility, passed through to the remote platform unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogVisibility {
    Visible,
    Catalog,
    Search,
    Hidden,
}

impl CatalogVisibility {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogVisibility::Visible => "visible",
            CatalogVisibility::Catalog => "catalog",
            CatalogVisibility::Search => "search",
            CatalogVisibility::Hidden => "hidden",
        }
    }

    #[must_use]
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "catalog" => CatalogVisibility::Catalog,
            "search" => CatalogVisibility::Search,
            "hidden" => CatalogVisibility::Hidden,
            _ => CatalogVisibility::Visible,
        }
    }

    #[must_use]
    pub fn parse_strict(s: &str) -> Option<Self> {
        match s {
            "visible" => Some(CatalogVisibility::Visible),
            "catalog" => Some(CatalogVisibility::Catalog),
            "search" => Some(CatalogVisibility::Search),
            "hidden" => Some(CatalogVisibility::Hidden),
            _ => None,
        }
    }
}

impl std::fmt::Display for CatalogVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stock quantity mutation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockOperation {
    Set,
    Add,
    Subtract,
}

impl StockOperation {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "set" => Some(StockOperation::Set),
            "add" => Some(StockOperation::Add),
            "subtract" => Some(StockOperation::Subtract),
            _ => None,
        }
    }
}

/// Physical dimensions, kept as decimals so they serialize as exact strings
/// on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Decimal>,
}

impl Dimensions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length.is_none() && self.width.is_none() && self.height.is_none()
    }
}

/// One image descriptor in a product's ordered image list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub src: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alt: String,
}

/// Uppercases and trims a SKU. All SKUs pass through here before persistence.
#[must_use]
pub fn normalize_sku(sku: &str) -> String {
    sku.trim().to_uppercase()
}

/// Derives the base of an auto-generated SKU: the first six alphanumeric
/// characters of the name, uppercased. Names with no alphanumerics get a
/// generic base so the counter suffix still produces a usable code.
#[must_use]
pub fn sku_base(name: &str) -> String {
    let base: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(6)
        .collect::<String>()
        .to_uppercase();
    if base.is_empty() {
        "SKU".to_string()
    } else {
        base
    }
}

/// Produces the `counter`-th candidate for a generated SKU, e.g. `WIDGET001`.
#[must_use]
pub fn sku_candidate(base: &str, counter: u32) -> String {
    format!("{base}{counter:03}")
}

/// The price a buyer actually pays: the sale price when present and positive,
/// otherwise the regular price.
#[must_use]
pub fn effective_price(price: Decimal, sale_price: Option<Decimal>) -> Decimal {
    match sale_price {
        Some(sale) if sale > Decimal::ZERO => sale,
        _ => price,
    }
}

/// Whether a product can currently be sold: flagged in stock, published, and
/// (when stock is managed) holding a positive quantity.
#[must_use]
pub fn is_available(
    in_stock: bool,
    status: ProductStatus,
    manage_stock: bool,
    stock_quantity: Option<i32>,
) -> bool {
    if !in_stock || status != ProductStatus::Publish {
        return false;
    }
    if manage_stock && stock_quantity.unwrap_or(0) <= 0 {
        return false;
    }
    true
}
