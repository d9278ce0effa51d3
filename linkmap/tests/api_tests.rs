// HTTP surface tests, driven through the router without binding a socket

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use linkmap::{AppState, create_router};
use linkmap_core::data::{Database, PageRecord};
use linkmap_core::model::LinkEdge;
use linkmap_core::RoleStyles;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

fn page(id: i64, url: &str, title: Option<&str>, weight: i32) -> PageRecord {
    PageRecord {
        id,
        url: url.to_string(),
        title: title.map(str::to_string),
        weight,
    }
}

/// 1 -> 2 (7), 1 -> 3 (2), 2 -> 3 (9), 4 on its own.
fn test_app() -> (TempDir, Router) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("api.db");
    let db = Database::new(&db_path).unwrap();
    db.apply_ingest(
        &[
            page(1, "https://alpha.example/", Some("Alpha"), 10),
            page(2, "https://beta.example/", Some("Beta"), 7),
            page(3, "https://gamma.example/", None, 11),
            page(4, "https://delta.example/", Some("Delta"), 1),
        ],
        &[
            LinkEdge {
                from: 1,
                to: 2,
                weight: 7,
            },
            LinkEdge {
                from: 1,
                to: 3,
                weight: 2,
            },
            LinkEdge {
                from: 2,
                to: 3,
                weight: 9,
            },
        ],
    )
    .unwrap();

    let app = create_router(AppState::new(db_path, RoleStyles::default()), &[]);
    (temp_dir, app)
}

fn json_request(method: &str, uri: &str, body: Value, owner: Option<Uuid>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(owner) = owner {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", owner));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, owner: Option<Uuid>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(owner) = owner {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", owner));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn node_ids(body: &Value, field: &str) -> Vec<i64> {
    body[field]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_ping() {
    let (_dir, app) = test_app();
    let (status, body) = send(&app, get_request("/ping", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_search_matches_title_and_url() {
    let (_dir, app) = test_app();

    let (status, body) = send(
        &app,
        json_request("POST", "/api/search", json!({ "text": "beta" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"], 2);
    assert_eq!(hits[0]["url"], "https://beta.example/");
}

#[tokio::test]
async fn test_search_without_hits_is_empty_list() {
    let (_dir, app) = test_app();
    let (status, body) = send(
        &app,
        json_request("POST", "/api/search", json!({ "text": "nowhere" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_search_bad_body_is_bad_request() {
    let (_dir, app) = test_app();
    let (status, body) = send(
        &app,
        json_request("POST", "/api/search", json!({ "words": "beta" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Bad Request"));
}

#[tokio::test]
async fn test_graph_by_url_keeps_significant_links() {
    let (_dir, app) = test_app();
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/graph",
            json!({ "query": "https://alpha.example/" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let ids = node_ids(&body, "nodes");
    assert_eq!(ids[0], 1);
    assert!(ids.contains(&2));
    assert!(!ids.contains(&3));

    let edges = body["edges"].as_array().unwrap();
    assert!(edges.iter().all(|e| e["dashes"] == true));
    assert!(edges.iter().any(|e| e["from"] == 1 && e["to"] == 2));
    assert!(body.get("nodes_list").is_none());
}

#[tokio::test]
async fn test_graph_by_id_isolated_seed_gets_layout_loop() {
    let (_dir, app) = test_app();
    let (status, body) = send(
        &app,
        json_request("POST", "/api/graph/id", json!({ "query": 4 }), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(node_ids(&body, "nodes"), vec![4]);
    assert_eq!(body["edges"], json!([{ "from": 4, "to": 4, "dashes": false }]));
}

#[tokio::test]
async fn test_graph_unknown_seed_is_no_content() {
    let (_dir, app) = test_app();
    let (status, body) = send(
        &app,
        json_request("POST", "/api/graph/id", json!({ "query": 99 }), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_full_graph_holds_only_linked_pages() {
    let (_dir, app) = test_app();
    let (status, body) = send(&app, get_request("/api/graph/full", None)).await;
    assert_eq!(status, StatusCode::OK);
    let mut ids = node_ids(&body, "nodes");
    ids.sort();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_source_by_url_and_id() {
    let (_dir, app) = test_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/source",
            json!({ "query": "https://gamma.example/" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 3);
    // No title stored, so the url stands in
    assert_eq!(body["label"], "https://gamma.example/");

    let (status, body) = send(
        &app,
        json_request("POST", "/api/source/id", json!({ "query": 2 }), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "https://beta.example/");
    assert_eq!(body["label"], "Beta");
    assert_eq!(body["value"], 7);
}

#[tokio::test]
async fn test_card_lifecycle() {
    let (_dir, app) = test_app();
    let owner = Uuid::new_v4();
    let card_id = Uuid::new_v4();
    let card = json!({
        "graph_id": card_id,
        "description": "alpha and delta",
        "sources": [{ "id": 4, "num": 0 }, { "id": 1, "num": 1 }]
    });

    let (status, body) = send(&app, json_request("POST", "/api/cards", card.clone(), Some(owner))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["graph_id"], card_id.to_string());
    assert_eq!(body["cnt"], 2);

    let (status, body) = send(&app, get_request("/api/cards", Some(owner))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["description"], "alpha and delta");

    // Another owner sees nothing
    let (_, body) = send(&app, get_request("/api/cards", Some(Uuid::new_v4()))).await;
    assert_eq!(body, json!([]));

    let (status, _) = send(&app, json_request("POST", "/api/cards", card, Some(owner))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/cards/recall",
            json!({ "graph_id": card_id }),
            Some(Uuid::new_v4()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(node_ids(&body, "nodes_list"), vec![4, 1]);
    let ids = node_ids(&body, "nodes");
    assert!(ids.contains(&1) && ids.contains(&2) && ids.contains(&4));

    let (status, body) = send(
        &app,
        json_request("DELETE", "/api/cards", json!({ "graph_id": card_id }), Some(owner)),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, json!([]));

    let (status, body) = send(
        &app,
        json_request("DELETE", "/api/cards", json!({ "graph_id": card_id }), Some(owner)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_card_delete_by_other_owner_is_not_found() {
    let (_dir, app) = test_app();
    let owner = Uuid::new_v4();
    let card_id = Uuid::new_v4();
    let card = json!({ "graph_id": card_id, "sources": [{ "id": 1, "num": 0 }] });

    let (status, _) = send(&app, json_request("POST", "/api/cards", card, Some(owner))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        json_request(
            "DELETE",
            "/api/cards",
            json!({ "graph_id": card_id }),
            Some(Uuid::new_v4()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, get_request("/api/cards", Some(owner))).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_card_with_unknown_node_is_bad_request() {
    let (_dir, app) = test_app();
    let card = json!({ "graph_id": Uuid::new_v4(), "sources": [{ "id": 77, "num": 0 }] });
    let (status, _) = send(&app, json_request("POST", "/api/cards", card, Some(Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cards_require_identity() {
    let (_dir, app) = test_app();

    let (status, body) = send(&app, get_request("/api/cards", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].is_string());

    let request = Request::builder()
        .method("GET")
        .uri("/api/cards")
        .header(header::AUTHORIZATION, "Bearer not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_observations_feed_live_snapshot() {
    let (_dir, app) = test_app();
    let batch = json!([
        { "url_from": "https://a.example/", "url_from_id": 1, "url_to": "https://b.example/", "url_to_id": 2, "cnt": 3 },
        { "url_from": "https://c.example/", "url_from_id": 3, "url_to": "https://b.example/", "url_to_id": 2, "cnt": 4 }
    ]);

    let (status, body) = send(&app, json_request("POST", "/api/observations", batch, None)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["accepted"], 2);

    let (status, body) = send(
        &app,
        get_request("/api/live?query=https%3A%2F%2Fb.example%2F", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let nodes = body.as_array().unwrap();
    let ids: Vec<i64> = nodes.iter().map(|n| n["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let styles = RoleStyles::default();
    assert_eq!(nodes[1]["value"], 7);
    assert_eq!(nodes[1]["color"]["background"], styles.matched.background);
    assert_eq!(nodes[0]["color"]["background"], styles.neighbor.background);
}

#[tokio::test]
async fn test_invalid_observation_rejects_whole_batch() {
    let (_dir, app) = test_app();
    let batch = json!([
        { "url_from": "https://a.example/", "url_from_id": 1, "url_to": "https://b.example/", "url_to_id": 2, "cnt": 3 },
        { "url_from": "https://a.example/", "url_from_id": 1, "url_to": "https://c.example/", "url_to_id": 3, "cnt": -1 }
    ]);

    let (status, _) = send(&app, json_request("POST", "/api/observations", batch, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, get_request("/api/live", None)).await;
    assert_eq!(body, json!([]));
}
