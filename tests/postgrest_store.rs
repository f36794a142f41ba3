use daylog::{
    config::{StoreBackend, StoreConfig},
    entries::repo_types::{NewEntry, Source},
    estimator::ParsedFood,
    store::{EntryStore, PostgrestStore, StoreError},
    tenant::TenantKey,
};
use serde_json::{json, Value};
use time::macros::datetime;
use uuid::Uuid;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const KEY: &str = "tenant-key-0123456789";

fn store(server: &MockServer) -> PostgrestStore {
    PostgrestStore::new(
        reqwest::Client::new(),
        &StoreConfig {
            backend: StoreBackend::Postgrest,
            supabase_url: Some(format!("{}/", server.uri())),
            service_role_key: Some("service-key".into()),
            database_url: None,
            table: "day_entries".into(),
        },
    )
}

fn tenant() -> TenantKey {
    TenantKey::parse(KEY).unwrap()
}

fn stored_row(id: &str, item: &str, at: &str) -> Value {
    json!({
        "id": id, "sync_key": KEY, "day_key": "2024-01-15", "consumed_at": at,
        "item": item, "qty": 1, "unit": "slice", "calories_kcal": 80,
        "protein_g": 3, "carbs_g": 15, "fat_g": 1, "source": "ai", "meta": null
    })
}

#[tokio::test]
async fn list_filters_by_tenant_and_day_in_order() {
    let server = MockServer::start().await;
    // rows from older clients can carry non-UUID ids
    let (a, b) = (Uuid::new_v4().to_string(), "1700000000000-abc123".to_string());
    Mock::given(method("GET"))
        .and(path("/rest/v1/day_entries"))
        .and(query_param("select", "*"))
        .and(query_param("sync_key", format!("eq.{KEY}")))
        .and(query_param("day_key", "eq.2024-01-15"))
        .and(query_param("order", "consumed_at.asc"))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            stored_row(&a, "toast", "2024-01-15T15:00:00+00:00"),
            stored_row(&b, "jam", "2024-01-15T15:01:00+00:00"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = store(&server)
        .list_by_day(&tenant(), "2024-01-15".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(rows.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), [a, b]);
    assert_eq!(rows[0].source, Source::Ai);
}

#[tokio::test]
async fn insert_posts_one_batch_with_representation() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4().to_string();
    Mock::given(method("POST"))
        .and(path("/rest/v1/day_entries"))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            stored_row(&id, "toast", "2024-01-15T15:00:00+00:00")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let entries = vec![
        NewEntry {
            day_key: "2024-01-15".parse().unwrap(),
            consumed_at: datetime!(2024-01-15 15:00 UTC),
            source: Source::Ai,
            food: ParsedFood {
                item: "toast".into(),
                qty: 1.0,
                unit: "slice".into(),
                calories_kcal: 80.0,
                protein_g: 3.0,
                carbs_g: 15.0,
                fat_g: 1.0,
                assumptions: None,
            },
        },
        NewEntry {
            day_key: "2024-01-15".parse().unwrap(),
            consumed_at: datetime!(2024-01-15 15:00 UTC),
            source: Source::Manual,
            food: ParsedFood {
                item: "jam".into(),
                qty: 1.0,
                unit: "tbsp".into(),
                calories_kcal: 50.0,
                protein_g: 0.0,
                carbs_g: 13.0,
                fat_g: 0.0,
                assumptions: Some(vec!["strawberry".into()]),
            },
        },
    ];
    let stored = store(&server).insert_many(&tenant(), entries).await.unwrap();
    assert_eq!(stored[0].id, id);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["sync_key"], KEY);
    assert_eq!(rows[0]["day_key"], "2024-01-15");
    assert_eq!(rows[0]["meta"], Value::Null);
    assert_eq!(rows[1]["source"], "manual");
    assert_eq!(rows[1]["meta"], json!({ "assumptions": ["strawberry"] }));
    assert_ne!(rows[0]["id"], rows[1]["id"]);
}

#[tokio::test]
async fn empty_insert_makes_no_call() {
    let server = MockServer::start().await;
    let stored = store(&server).insert_many(&tenant(), Vec::new()).await.unwrap();
    assert!(stored.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn deletes_are_scoped_to_the_tenant() {
    let server = MockServer::start().await;
    let id = "1700000000000-abc123";
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/day_entries"))
        .and(query_param("id", format!("eq.{id}")))
        .and(query_param("sync_key", format!("eq.{KEY}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/day_entries"))
        .and(query_param("sync_key", format!("eq.{KEY}")))
        .and(query_param("day_key", "lt.2024-01-13"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let s = store(&server);
    s.delete_by_id(&tenant(), id).await.unwrap();
    s.delete_before(&tenant(), "2024-01-13".parse().unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn backend_status_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/day_entries"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = store(&server)
        .list_by_day(&tenant(), "2024-01-15".parse().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Status { status: 503, .. }));
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn probe_distinguishes_missing_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/day_entries"))
        .and(query_param("select", "id"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "relation \"public.day_entries\" does not exist"
        })))
        .mount(&server)
        .await;

    let health = store(&server).probe().await;
    assert!(health.reachable);
    assert!(!health.table_exists);
    assert_eq!(health.status, 404);
    assert_eq!(
        health.error.as_deref(),
        Some("relation \"public.day_entries\" does not exist")
    );
}
