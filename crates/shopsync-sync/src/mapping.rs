//! Field mapping between catalog rows and WooCommerce wire shapes.
//!
//! Outbound payloads omit optional fields instead of sending nulls; inbound
//! rows are normalized aggressively so a sloppy remote record can never
//! violate a local invariant (sale price below price, non-negative managed
//! stock, known status values).

use rust_decimal::Decimal;

use shopsync_core::{CatalogVisibility, Dimensions, ProductStatus};
use shopsync_db::{NewProduct, ProductPatch, ProductRow};
use shopsync_woo::{
    CategoryRefPayload, PayloadDimensions, ProductPayload, RemoteDimensions, RemoteProduct,
};

/// Builds the outbound payload for a product.
///
/// `category_woo_ids` are the remote ids of the product's categories;
/// categories that were never pushed are already absent from the slice.
#[must_use]
pub fn to_remote(product: &ProductRow, category_woo_ids: &[i64]) -> ProductPayload {
    ProductPayload {
        name: product.name.clone(),
        description: product.description.clone(),
        short_description: product.short_description.clone(),
        sku: product.sku.clone(),
        regular_price: product.price,
        sale_price: product.sale_price.filter(|p| *p > Decimal::ZERO),
        manage_stock: product.manage_stock,
        stock_quantity: if product.manage_stock {
            product.stock_quantity
        } else {
            None
        },
        weight: product.weight,
        dimensions: product
            .dimensions()
            .filter(|d| !d.is_empty())
            .map(payload_dimensions),
        status: product.status.clone(),
        featured: product.featured,
        catalog_visibility: product.catalog_visibility.clone(),
        categories: category_woo_ids
            .iter()
            .map(|id| CategoryRefPayload { id: *id })
            .collect(),
        images: product.images.clone(),
        meta_data: product.meta_data.clone(),
    }
}

/// Builds the insert input for a remote product with no local counterpart.
///
/// The remote id is carried immediately so a re-run matches the row instead
/// of creating a duplicate. An empty remote SKU triggers local generation.
#[must_use]
pub fn from_remote(remote: &RemoteProduct) -> NewProduct {
    let price = remote.effective_regular_price();
    NewProduct {
        name: remote.name.clone(),
        description: remote.description.clone(),
        short_description: remote.short_description.clone(),
        sku: if remote.sku.trim().is_empty() {
            None
        } else {
            Some(remote.sku.clone())
        },
        price,
        sale_price: clamp_sale_price(remote.sale_price, price),
        stock_quantity: inbound_quantity(remote),
        manage_stock: remote.manage_stock,
        in_stock: remote.in_stock(),
        weight: remote.weight,
        dimensions: remote.dimensions.as_ref().map(core_dimensions),
        status: ProductStatus::parse_lossy(remote.status.as_deref().unwrap_or("draft")),
        featured: remote.featured,
        catalog_visibility: CatalogVisibility::parse_lossy(
            remote.catalog_visibility.as_deref().unwrap_or("visible"),
        ),
        meta_data: remote.meta_data.clone(),
        images: images_value(&remote.images),
        woo_id: Some(remote.id),
    }
}

/// Builds the overwrite patch applied when a remote product already has a
/// local row. Every mapped field is written; the remote copy wins.
#[must_use]
pub fn remote_patch(remote: &RemoteProduct) -> ProductPatch {
    let price = remote.effective_regular_price();
    ProductPatch {
        name: Some(remote.name.clone()),
        description: Some(remote.description.clone()),
        short_description: Some(remote.short_description.clone()),
        // An empty remote SKU keeps the local one.
        sku: Some(remote.sku.clone()).filter(|s| !s.trim().is_empty()),
        price: Some(price),
        sale_price: Some(clamp_sale_price(remote.sale_price, price)),
        stock_quantity: Some(inbound_quantity(remote)),
        manage_stock: Some(remote.manage_stock),
        in_stock: Some(remote.in_stock()),
        weight: Some(remote.weight),
        dimensions: Some(remote.dimensions.as_ref().map(core_dimensions)),
        status: Some(ProductStatus::parse_lossy(
            remote.status.as_deref().unwrap_or("draft"),
        )),
        featured: Some(remote.featured),
        catalog_visibility: Some(CatalogVisibility::parse_lossy(
            remote.catalog_visibility.as_deref().unwrap_or("visible"),
        )),
        meta_data: Some(remote.meta_data.clone()),
        // Remote image lists reference store-hosted media; overwriting the
        // local list with them would break local uploads still being pushed.
        images: None,
    }
}

/// A sale price only survives when it is positive and strictly below the
/// regular price; anything else reads as "no sale".
fn clamp_sale_price(sale_price: Option<Decimal>, price: Decimal) -> Option<Decimal> {
    sale_price.filter(|s| *s > Decimal::ZERO && *s < price)
}

/// Managed stock always carries a quantity locally; a missing or negative
/// remote quantity reads as zero.
fn inbound_quantity(remote: &RemoteProduct) -> Option<i32> {
    if remote.manage_stock {
        Some(remote.stock_quantity.unwrap_or(0).max(0))
    } else {
        None
    }
}

fn payload_dimensions(d: Dimensions) -> PayloadDimensions {
    PayloadDimensions {
        length: d.length,
        width: d.width,
        height: d.height,
    }
}

fn core_dimensions(d: &RemoteDimensions) -> Dimensions {
    Dimensions {
        length: d.length,
        width: d.width,
        height: d.height,
    }
}

fn images_value(images: &serde_json::Value) -> Vec<shopsync_core::ProductImage> {
    serde_json::from_value(images.clone()).unwrap_or_default()
}
