//! End-to-end sync engine tests: real database via `#[sqlx::test]`, store
//! mocked with wiremock.

use serde_json::json;
use sqlx::PgPool;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopsync_core::ProductStatus;
use shopsync_db::NewProduct;
use shopsync_sync::{process_next_task, sync_from_remote, TaskOutcome, WorkerOptions};
use shopsync_woo::{WooClient, WooConfig};

fn client_for(server: &MockServer) -> WooClient {
    let config = WooConfig {
        base_url: server.uri(),
        consumer_key: "ck_test".to_string(),
        consumer_secret: "cs_test".to_string(),
        timeout_secs: 5,
        ssl_verify: true,
    };
    WooClient::new(&config).expect("client")
}

fn options() -> WorkerOptions {
    WorkerOptions {
        max_attempts: 3,
        // Large base so a rescheduled task is visibly in the future.
        backoff_base_ms: 60_000,
        ..WorkerOptions::default()
    }
}

async fn seed_product(pool: &PgPool, name: &str, sku: &str) -> shopsync_db::ProductRow {
    let new = NewProduct {
        name: name.to_string(),
        sku: Some(sku.to_string()),
        price: "19.99".parse().unwrap(),
        status: ProductStatus::Publish,
        ..NewProduct::default()
    };
    shopsync_db::create_product(pool, &new).await.expect("seed product")
}

// ---------------------------------------------------------------------------
// outbound
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn first_push_creates_remotely_and_records_the_woo_id(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 77 })))
        .expect(1)
        .mount(&server)
        .await;

    let product = seed_product(&pool, "Widget", "WID-001").await;
    let task = shopsync_db::enqueue_sync_task(&pool, product.id).await.expect("enqueue");

    let outcome = process_next_task(&pool, &client_for(&server), &options())
        .await
        .expect("process");
    assert_eq!(outcome, Some(TaskOutcome::Completed));

    let row = shopsync_db::find_product(&pool, product.id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(row.woo_id, Some(77));

    assert!(
        shopsync_db::find_sync_task(&pool, task.id)
            .await
            .expect("find task")
            .is_none(),
        "completed tasks leave no residue"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn later_pushes_update_the_existing_remote_product(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/wp-json/wc/v3/products/77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 77 })))
        .expect(1)
        .mount(&server)
        .await;

    let product = seed_product(&pool, "Widget", "WID-001").await;
    shopsync_db::set_woo_id(&pool, product.id, 77).await.expect("set woo id");
    shopsync_db::enqueue_sync_task(&pool, product.id).await.expect("enqueue");

    let outcome = process_next_task(&pool, &client_for(&server), &options())
        .await
        .expect("process");
    assert_eq!(outcome, Some(TaskOutcome::Completed));
}

#[sqlx::test(migrations = "../../migrations")]
async fn server_error_reschedules_with_backoff(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let product = seed_product(&pool, "Widget", "WID-001").await;
    let task = shopsync_db::enqueue_sync_task(&pool, product.id).await.expect("enqueue");

    let client = client_for(&server);
    let outcome = process_next_task(&pool, &client, &options()).await.expect("process");
    assert_eq!(outcome, Some(TaskOutcome::Retried));

    let row = shopsync_db::find_sync_task(&pool, task.id)
        .await
        .expect("find task")
        .expect("still queued");
    assert_eq!(row.state, "pending");
    assert_eq!(row.attempts, 1);
    assert!(row.last_error.as_deref().unwrap_or("").contains("503"));

    assert_eq!(
        process_next_task(&pool, &client, &options()).await.expect("process"),
        None,
        "rescheduled task must wait out its delay"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn client_rejection_fails_the_task_without_retrying(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/products"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "woocommerce_rest_invalid_product",
            "message": "Invalid product."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let product = seed_product(&pool, "Widget", "WID-001").await;
    let task = shopsync_db::enqueue_sync_task(&pool, product.id).await.expect("enqueue");

    let outcome = process_next_task(&pool, &client_for(&server), &options())
        .await
        .expect("process");
    assert_eq!(outcome, Some(TaskOutcome::Failed));

    let row = shopsync_db::find_sync_task(&pool, task.id)
        .await
        .expect("find task")
        .expect("kept for inspection");
    assert_eq!(row.state, "failed");
}

#[sqlx::test(migrations = "../../migrations")]
async fn task_for_a_deleted_product_is_discarded_silently(pool: PgPool) {
    let server = MockServer::start().await;
    // No mocks mounted: any request would 404 and fail the test below.

    let product = seed_product(&pool, "Widget", "WID-001").await;
    shopsync_db::enqueue_sync_task(&pool, product.id).await.expect("enqueue");
    shopsync_db::soft_delete_product(&pool, product.id).await.expect("delete");

    let outcome = process_next_task(&pool, &client_for(&server), &options())
        .await
        .expect("process");
    assert_eq!(outcome, Some(TaskOutcome::Discarded));
}

// ---------------------------------------------------------------------------
// inbound
// ---------------------------------------------------------------------------

fn remote_page(body: serde_json::Value) -> Mock {
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
}

#[sqlx::test(migrations = "../../migrations")]
async fn inbound_run_is_idempotent_across_reruns(pool: PgPool) {
    let server = MockServer::start().await;
    remote_page(json!([
            { "id": 101, "name": "Remote One", "sku": "R-1", "regular_price": "10.00" },
            { "id": 102, "name": "Remote Two", "sku": "R-2", "regular_price": "20.00" }
        ]))
    .mount(&server)
    .await;

    let client = client_for(&server);
    let first = sync_from_remote(&pool, &client, 1, 50).await.expect("first run");
    assert_eq!(first.created, 2);
    assert_eq!(first.updated, 0);
    assert!(first.errors.is_empty());

    let second = sync_from_remote(&pool, &client, 1, 50).await.expect("second run");
    assert_eq!(second.created, 0, "rerun must match by woo_id, not duplicate");
    assert_eq!(second.updated, 2);

    let row = shopsync_db::find_product_by_woo_id(&pool, 101)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(row.name, "Remote One");
    assert_eq!(row.price, "10.00".parse().unwrap());
}

#[sqlx::test(migrations = "../../migrations")]
async fn inbound_failure_of_one_item_spares_the_rest(pool: PgPool) {
    // Item 202 reuses item 201's SKU, so its create must fail while 201 and
    // 203 land.
    let server = MockServer::start().await;
    remote_page(json!([
            { "id": 201, "name": "Good", "sku": "SHARED", "regular_price": "10.00" },
            { "id": 202, "name": "Clash", "sku": "SHARED", "regular_price": "11.00" },
            { "id": 203, "name": "Also Good", "sku": "R-3", "regular_price": "12.00" }
        ]))
    .mount(&server)
    .await;

    let report = sync_from_remote(&pool, &client_for(&server), 1, 50)
        .await
        .expect("run");
    assert_eq!(report.created, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].woo_id, 202);

    assert!(shopsync_db::find_product_by_woo_id(&pool, 203)
        .await
        .expect("find")
        .is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn inbound_updates_overwrite_local_edits(pool: PgPool) {
    let product = seed_product(&pool, "Local Name", "WID-001").await;
    shopsync_db::set_woo_id(&pool, product.id, 301).await.expect("set woo id");

    let server = MockServer::start().await;
    remote_page(json!([
            { "id": 301, "name": "Remote Name", "sku": "WID-001", "regular_price": "99.00" }
        ]))
    .mount(&server)
    .await;

    let report = sync_from_remote(&pool, &client_for(&server), 1, 50)
        .await
        .expect("run");
    assert_eq!(report.updated, 1);

    let row = shopsync_db::find_product(&pool, product.id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(row.name, "Remote Name", "remote copy wins");
    assert_eq!(row.price, "99.00".parse().unwrap());
}
