use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shopsync_core::{CatalogVisibility, Dimensions, ProductImage, ProductStatus};

/// A row from the `products` table.
///
/// `dimensions`, `meta_data`, and `images` are stored as JSONB and decoded
/// lazily through the helper methods; the sync mapping and the HTTP layer
/// are the only consumers of their typed shapes.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub sku: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    /// Meaningful only while `manage_stock` is true; NULL otherwise.
    pub stock_quantity: Option<i32>,
    pub manage_stock: bool,
    pub in_stock: bool,
    pub weight: Option<Decimal>,
    pub dimensions: Option<serde_json::Value>,
    pub status: String,
    pub featured: bool,
    pub catalog_visibility: String,
    pub meta_data: serde_json::Value,
    pub images: serde_json::Value,
    /// Remote platform identifier, set once the first outbound create lands.
    pub woo_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProductRow {
    #[must_use]
    pub fn status(&self) -> ProductStatus {
        ProductStatus::parse_lossy(&self.status)
    }

    #[must_use]
    pub fn visibility(&self) -> CatalogVisibility {
        CatalogVisibility::parse_lossy(&self.catalog_visibility)
    }

    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        shopsync_core::effective_price(self.price, self.sale_price)
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        shopsync_core::is_available(
            self.in_stock,
            self.status(),
            self.manage_stock,
            self.stock_quantity,
        )
    }

    /// Decodes the JSONB dimensions column; malformed payloads read as absent.
    #[must_use]
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Decodes the JSONB image list; malformed entries read as an empty list.
    #[must_use]
    pub fn images(&self) -> Vec<ProductImage> {
        serde_json::from_value(self.images.clone()).unwrap_or_default()
    }
}

/// Input for [`create_product`](super::create_product).
///
/// `sku: None` triggers auto-generation from the name.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub manage_stock: bool,
    pub in_stock: bool,
    pub weight: Option<Decimal>,
    pub dimensions: Option<Dimensions>,
    pub status: ProductStatus,
    pub featured: bool,
    pub catalog_visibility: CatalogVisibility,
    pub meta_data: serde_json::Value,
    pub images: Vec<ProductImage>,
    /// Present on inbound-sync creates, absent on local creates.
    pub woo_id: Option<i64>,
}

impl Default for NewProduct {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            short_description: String::new(),
            sku: None,
            price: Decimal::ZERO,
            sale_price: None,
            stock_quantity: None,
            manage_stock: false,
            in_stock: true,
            weight: None,
            dimensions: None,
            status: ProductStatus::Draft,
            featured: false,
            catalog_visibility: CatalogVisibility::Visible,
            meta_data: serde_json::Value::Array(vec![]),
            images: Vec::new(),
            woo_id: None,
        }
    }
}

// Option<Option<T>> is intentional: outer None = "not in request" (keep current),
// Some(None) = "explicitly cleared", Some(Some(v)) = "set to value" (PATCH semantics).
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub sale_price: Option<Option<Decimal>>,
    pub stock_quantity: Option<Option<i32>>,
    pub manage_stock: Option<bool>,
    pub in_stock: Option<bool>,
    pub weight: Option<Option<Decimal>>,
    pub dimensions: Option<Option<Dimensions>>,
    pub status: Option<ProductStatus>,
    pub featured: Option<bool>,
    pub catalog_visibility: Option<CatalogVisibility>,
    pub meta_data: Option<serde_json::Value>,
    pub images: Option<Vec<ProductImage>>,
}
