//! Catalog store integration tests. Each test gets a fresh migrated database
//! via `#[sqlx::test]`.

use rust_decimal::Decimal;
use shopsync_core::{ProductStatus, StockOperation};
use shopsync_db::{DbError, NewProduct, ProductFilters, ProductPatch, SortBy, SortDirection};
use sqlx::PgPool;

fn dec(s: &str) -> Decimal {
    s.parse().expect("decimal literal")
}

fn widget(name: &str, sku: &str, price: &str) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        sku: Some(sku.to_string()),
        price: dec(price),
        status: ProductStatus::Publish,
        ..NewProduct::default()
    }
}

// ---------------------------------------------------------------------------
// create / update / delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_normalizes_sku_to_uppercase(pool: PgPool) {
    let row = shopsync_db::create_product(&pool, &widget("Widget", "wid-001", "10.00"))
        .await
        .expect("create");
    assert_eq!(row.sku, "WID-001");
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_rejects_duplicate_sku_among_live_rows(pool: PgPool) {
    shopsync_db::create_product(&pool, &widget("Widget A", "WID-001", "10.00"))
        .await
        .expect("first create");

    let result = shopsync_db::create_product(&pool, &widget("Widget B", "wid-001", "12.00")).await;
    assert!(matches!(result, Err(DbError::DuplicateSku)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn soft_deleted_row_releases_its_sku(pool: PgPool) {
    let first = shopsync_db::create_product(&pool, &widget("Widget", "WID-001", "10.00"))
        .await
        .expect("create");
    shopsync_db::soft_delete_product(&pool, first.id)
        .await
        .expect("delete");

    let second = shopsync_db::create_product(&pool, &widget("Widget v2", "WID-001", "11.00")).await;
    assert!(second.is_ok(), "soft-deleted SKU should be reusable");
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_generates_sku_from_name_when_absent(pool: PgPool) {
    let mut new = widget("Widget", "unused", "10.00");
    new.sku = None;
    let row = shopsync_db::create_product(&pool, &new).await.expect("create");
    assert_eq!(row.sku, "WIDGET001");

    let mut again = widget("Widget", "unused", "10.00");
    again.sku = None;
    let row2 = shopsync_db::create_product(&pool, &again)
        .await
        .expect("second create");
    assert_eq!(row2.sku, "WIDGET002", "generated SKU must be deduplicated");
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_rejects_sale_price_at_or_above_price(pool: PgPool) {
    let mut new = widget("Widget", "WID-001", "10.00");
    new.sale_price = Some(dec("10.00"));
    assert!(matches!(
        shopsync_db::create_product(&pool, &new).await,
        Err(DbError::SalePriceNotBelow)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_nulls_quantity_when_stock_unmanaged(pool: PgPool) {
    let mut new = widget("Widget", "WID-001", "10.00");
    new.manage_stock = false;
    new.stock_quantity = Some(42);
    let row = shopsync_db::create_product(&pool, &new).await.expect("create");
    assert_eq!(row.stock_quantity, None);
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_requires_quantity_when_stock_managed(pool: PgPool) {
    let mut new = widget("Widget", "WID-001", "10.00");
    new.manage_stock = true;
    new.stock_quantity = None;
    assert!(matches!(
        shopsync_db::create_product(&pool, &new).await,
        Err(DbError::MissingStockQuantity)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_merges_sparse_fields(pool: PgPool) {
    let row = shopsync_db::create_product(&pool, &widget("Widget", "WID-001", "10.00"))
        .await
        .expect("create");

    let patch = ProductPatch {
        price: Some(dec("12.50")),
        sale_price: Some(Some(dec("9.99"))),
        ..ProductPatch::default()
    };
    let updated = shopsync_db::update_product(&pool, row.id, &patch)
        .await
        .expect("update");

    assert_eq!(updated.price, dec("12.50"));
    assert_eq!(updated.sale_price, Some(dec("9.99")));
    assert_eq!(updated.name, "Widget", "untouched fields survive");
    assert_eq!(updated.effective_price(), dec("9.99"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_rejects_sku_change_onto_existing_sku(pool: PgPool) {
    shopsync_db::create_product(&pool, &widget("A", "SKU-A", "10.00"))
        .await
        .expect("create a");
    let b = shopsync_db::create_product(&pool, &widget("B", "SKU-B", "10.00"))
        .await
        .expect("create b");

    let patch = ProductPatch {
        sku: Some("sku-a".to_string()),
        ..ProductPatch::default()
    };
    assert!(matches!(
        shopsync_db::update_product(&pool, b.id, &patch).await,
        Err(DbError::DuplicateSku)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_missing_product_is_not_found(pool: PgPool) {
    let result = shopsync_db::update_product(&pool, 9999, &ProductPatch::default()).await;
    assert!(matches!(result, Err(DbError::NotFound)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn delete_blocked_while_order_items_reference_product(pool: PgPool) {
    let row = shopsync_db::create_product(&pool, &widget("Widget", "WID-001", "10.00"))
        .await
        .expect("create");

    let order_id: i64 = sqlx::query_scalar("INSERT INTO orders DEFAULT VALUES RETURNING id")
        .fetch_one(&pool)
        .await
        .expect("insert order");
    sqlx::query(
        "INSERT INTO order_items (order_id, product_id, quantity, unit_price) \
         VALUES ($1, $2, 1, 10.00)",
    )
    .bind(order_id)
    .bind(row.id)
    .execute(&pool)
    .await
    .expect("insert order item");

    assert!(matches!(
        shopsync_db::soft_delete_product(&pool, row.id).await,
        Err(DbError::HasReferences)
    ));
    assert!(
        shopsync_db::find_product(&pool, row.id)
            .await
            .expect("find")
            .is_some(),
        "product must survive a blocked delete"
    );
}

// ---------------------------------------------------------------------------
// stock mutation
// ---------------------------------------------------------------------------

async fn stocked_product(pool: &PgPool, quantity: i32) -> i64 {
    let mut new = widget("Widget", "WID-001", "10.00");
    new.manage_stock = true;
    new.stock_quantity = Some(quantity);
    shopsync_db::create_product(pool, &new)
        .await
        .expect("create stocked product")
        .id
}

#[sqlx::test(migrations = "../../migrations")]
async fn add_increases_quantity_and_sets_in_stock(pool: PgPool) {
    let id = stocked_product(&pool, 3).await;
    let row = shopsync_db::mutate_stock(&pool, id, 5, StockOperation::Add)
        .await
        .expect("add");
    assert_eq!(row.stock_quantity, Some(8));
    assert!(row.in_stock);
}

#[sqlx::test(migrations = "../../migrations")]
async fn subtract_below_zero_fails_and_preserves_quantity(pool: PgPool) {
    let id = stocked_product(&pool, 3).await;
    let result = shopsync_db::mutate_stock(&pool, id, 5, StockOperation::Subtract).await;
    assert!(matches!(result, Err(DbError::NegativeStock)));

    let row = shopsync_db::find_product(&pool, id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(row.stock_quantity, Some(3), "failed mutation must not write");
}

#[sqlx::test(migrations = "../../migrations")]
async fn set_to_zero_clears_in_stock(pool: PgPool) {
    let id = stocked_product(&pool, 9).await;
    let row = shopsync_db::mutate_stock(&pool, id, 0, StockOperation::Set)
        .await
        .expect("set");
    assert_eq!(row.stock_quantity, Some(0));
    assert!(!row.in_stock);
}

#[sqlx::test(migrations = "../../migrations")]
async fn mutation_on_unmanaged_product_fails(pool: PgPool) {
    let row = shopsync_db::create_product(&pool, &widget("Widget", "WID-001", "10.00"))
        .await
        .expect("create");
    let result = shopsync_db::mutate_stock(&pool, row.id, 1, StockOperation::Add).await;
    assert!(matches!(result, Err(DbError::StockNotManaged)));
}

#[sqlx::test(migrations = "../../migrations")]
async fn concurrent_subtracts_cannot_both_drain_the_same_stock(pool: PgPool) {
    let id = stocked_product(&pool, 10).await;

    // Two racing subtractions of 6 from 10: exactly one may win.
    let (a, b) = tokio::join!(
        shopsync_db::mutate_stock(&pool, id, 6, StockOperation::Subtract),
        shopsync_db::mutate_stock(&pool, id, 6, StockOperation::Subtract),
    );
    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one subtract must succeed: {a:?} {b:?}");

    let row = shopsync_db::find_product(&pool, id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(row.stock_quantity, Some(4));
}

// ---------------------------------------------------------------------------
// listing filters
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn listing_defaults_to_published_products(pool: PgPool) {
    shopsync_db::create_product(&pool, &widget("Live", "SKU-A", "10.00"))
        .await
        .expect("create live");
    let mut draft = widget("Draft", "SKU-B", "10.00");
    draft.status = ProductStatus::Draft;
    shopsync_db::create_product(&pool, &draft)
        .await
        .expect("create draft");

    let page = shopsync_db::list_products(&pool, &ProductFilters::default())
        .await
        .expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Live");
}

#[sqlx::test(migrations = "../../migrations")]
async fn listing_filters_compose_conjunctively(pool: PgPool) {
    let mut cheap = widget("Cheap Widget", "SKU-A", "5.00");
    cheap.featured = true;
    shopsync_db::create_product(&pool, &cheap).await.expect("a");

    let mut pricey = widget("Pricey Widget", "SKU-B", "50.00");
    pricey.featured = true;
    shopsync_db::create_product(&pool, &pricey).await.expect("b");

    let mut plain = widget("Plain Widget", "SKU-C", "5.00");
    plain.featured = false;
    shopsync_db::create_product(&pool, &plain).await.expect("c");

    let filters = ProductFilters {
        featured: Some(true),
        price_max: Some(dec("10.00")),
        ..ProductFilters::default()
    };
    let page = shopsync_db::list_products(&pool, &filters).await.expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Cheap Widget");
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_matches_name_description_or_sku(pool: PgPool) {
    let mut a = widget("Alpha", "SKU-A", "10.00");
    a.description = "contains gadget somewhere".to_string();
    shopsync_db::create_product(&pool, &a).await.expect("a");
    shopsync_db::create_product(&pool, &widget("Gadget Pro", "SKU-B", "10.00"))
        .await
        .expect("b");
    shopsync_db::create_product(&pool, &widget("Unrelated", "GADGET-SKU", "10.00"))
        .await
        .expect("c");
    shopsync_db::create_product(&pool, &widget("Nothing Here", "SKU-D", "10.00"))
        .await
        .expect("d");

    let filters = ProductFilters {
        search: Some("gadget".to_string()),
        ..ProductFilters::default()
    };
    let page = shopsync_db::list_products(&pool, &filters).await.expect("list");
    assert_eq!(page.total, 3, "search is case-insensitive across all three columns");
}

#[sqlx::test(migrations = "../../migrations")]
async fn in_stock_filter_applies_availability_scope(pool: PgPool) {
    let mut drained = widget("Drained", "SKU-A", "10.00");
    drained.manage_stock = true;
    drained.stock_quantity = Some(0);
    shopsync_db::create_product(&pool, &drained).await.expect("a");

    let mut unmanaged = widget("Unmanaged", "SKU-B", "10.00");
    unmanaged.manage_stock = false;
    shopsync_db::create_product(&pool, &unmanaged).await.expect("b");

    let filters = ProductFilters {
        in_stock: Some(true),
        ..ProductFilters::default()
    };
    let page = shopsync_db::list_products(&pool, &filters).await.expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Unmanaged");
}

#[sqlx::test(migrations = "../../migrations")]
async fn pagination_reports_totals_and_sorts_by_price(pool: PgPool) {
    for (i, price) in ["30.00", "10.00", "20.00"].iter().enumerate() {
        shopsync_db::create_product(&pool, &widget(&format!("P{i}"), &format!("SKU-{i}"), price))
            .await
            .expect("create");
    }

    let filters = ProductFilters {
        sort_by: SortBy::Price,
        sort_direction: SortDirection::Desc,
        per_page: 2,
        ..ProductFilters::default()
    };
    let page = shopsync_db::list_products(&pool, &filters).await.expect("list");
    assert_eq!(page.total, 3);
    assert_eq!(page.last_page, 2);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].price, dec("30.00"));
    assert_eq!(page.items[1].price, dec("20.00"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn category_filter_scopes_to_membership(pool: PgPool) {
    let cat = shopsync_db::create_category(&pool, "Beverages", "beverages", None, Some(77), 0)
        .await
        .expect("category");
    let inside = shopsync_db::create_product(&pool, &widget("Inside", "SKU-A", "10.00"))
        .await
        .expect("a");
    shopsync_db::create_product(&pool, &widget("Outside", "SKU-B", "10.00"))
        .await
        .expect("b");
    shopsync_db::set_product_categories(&pool, inside.id, &[cat.id])
        .await
        .expect("assign");

    let filters = ProductFilters {
        category_id: Some(cat.id),
        ..ProductFilters::default()
    };
    let page = shopsync_db::list_products(&pool, &filters).await.expect("list");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Inside");

    let woo_ids = shopsync_db::category_woo_ids_for_product(&pool, inside.id)
        .await
        .expect("woo ids");
    assert_eq!(woo_ids, vec![77]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn featured_products_exclude_unavailable_ones(pool: PgPool) {
    let mut live = widget("Live", "SKU-A", "10.00");
    live.featured = true;
    shopsync_db::create_product(&pool, &live).await.expect("a");

    let mut drained = widget("Drained", "SKU-B", "10.00");
    drained.featured = true;
    drained.manage_stock = true;
    drained.stock_quantity = Some(0);
    drained.in_stock = false;
    shopsync_db::create_product(&pool, &drained).await.expect("b");

    let rows = shopsync_db::featured_products(&pool, 10).await.expect("featured");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Live");
}

#[sqlx::test(migrations = "../../migrations")]
async fn low_stock_lists_managed_products_under_threshold(pool: PgPool) {
    let mut low = widget("Low", "SKU-A", "10.00");
    low.manage_stock = true;
    low.stock_quantity = Some(2);
    shopsync_db::create_product(&pool, &low).await.expect("a");

    let mut fine = widget("Fine", "SKU-B", "10.00");
    fine.manage_stock = true;
    fine.stock_quantity = Some(50);
    shopsync_db::create_product(&pool, &fine).await.expect("b");

    let rows = shopsync_db::low_stock_products(&pool, 5).await.expect("low stock");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Low");
}

// ---------------------------------------------------------------------------
// sync task queue
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn tasks_for_one_product_claim_in_enqueue_order(pool: PgPool) {
    let product = shopsync_db::create_product(&pool, &widget("Widget", "SKU-A", "10.00"))
        .await
        .expect("create");
    let first = shopsync_db::enqueue_sync_task(&pool, product.id).await.expect("t1");
    let second = shopsync_db::enqueue_sync_task(&pool, product.id).await.expect("t2");

    let claimed = shopsync_db::next_sync_task(&pool)
        .await
        .expect("claim")
        .expect("task available");
    assert_eq!(claimed.id, first.id);

    // While the first is running, its sibling must not be claimable.
    assert!(
        shopsync_db::next_sync_task(&pool).await.expect("claim").is_none(),
        "single-flight per product"
    );

    shopsync_db::complete_sync_task(&pool, claimed.id).await.expect("complete");
    let next = shopsync_db::next_sync_task(&pool)
        .await
        .expect("claim")
        .expect("second task");
    assert_eq!(next.id, second.id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn tasks_for_different_products_claim_independently(pool: PgPool) {
    let a = shopsync_db::create_product(&pool, &widget("A", "SKU-A", "10.00"))
        .await
        .expect("a");
    let b = shopsync_db::create_product(&pool, &widget("B", "SKU-B", "10.00"))
        .await
        .expect("b");
    shopsync_db::enqueue_sync_task(&pool, a.id).await.expect("t1");
    shopsync_db::enqueue_sync_task(&pool, b.id).await.expect("t2");

    let first = shopsync_db::next_sync_task(&pool).await.expect("claim").expect("one");
    let second = shopsync_db::next_sync_task(&pool).await.expect("claim").expect("two");
    assert_ne!(first.product_id, second.product_id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn retried_task_waits_out_its_backoff(pool: PgPool) {
    let product = shopsync_db::create_product(&pool, &widget("Widget", "SKU-A", "10.00"))
        .await
        .expect("create");
    shopsync_db::enqueue_sync_task(&pool, product.id).await.expect("enqueue");

    let task = shopsync_db::next_sync_task(&pool).await.expect("claim").expect("task");
    shopsync_db::retry_sync_task(&pool, task.id, "connection reset", 60_000)
        .await
        .expect("retry");

    assert!(
        shopsync_db::next_sync_task(&pool).await.expect("claim").is_none(),
        "task scheduled a minute out must not be claimable now"
    );

    let row = shopsync_db::find_sync_task(&pool, task.id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(row.state, "pending");
    assert_eq!(row.attempts, 1);
    assert_eq!(row.last_error.as_deref(), Some("connection reset"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn failed_task_is_terminal_and_unblocks_siblings(pool: PgPool) {
    let product = shopsync_db::create_product(&pool, &widget("Widget", "SKU-A", "10.00"))
        .await
        .expect("create");
    shopsync_db::enqueue_sync_task(&pool, product.id).await.expect("t1");
    let sibling = shopsync_db::enqueue_sync_task(&pool, product.id).await.expect("t2");

    let task = shopsync_db::next_sync_task(&pool).await.expect("claim").expect("task");
    shopsync_db::fail_sync_task(&pool, task.id, "rejected by remote")
        .await
        .expect("fail");

    let next = shopsync_db::next_sync_task(&pool).await.expect("claim").expect("sibling");
    assert_eq!(next.id, sibling.id);

    let row = shopsync_db::find_sync_task(&pool, task.id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(row.state, "failed");
}
