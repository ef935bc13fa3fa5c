// SPDX-License-Identifier: PMPL-1.0-or-later
//! End-to-end router tests: permission management, gating, submission and
//! review over HTTP.

use assetcheck_api::{build_router, ApiConfig, AppState, ErrorResponse, USER_ID_HEADER};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

const ADMIN: &str = "root";
const BOUNDARY: &str = "assetcheck-test-boundary";

fn app() -> Router {
    let config = ApiConfig {
        bootstrap_admins: vec![ADMIN.to_string()],
        max_image_bytes: 64,
        ..ApiConfig::default()
    };
    build_router(AppState::in_memory(config))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, user: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(USER_ID_HEADER, user)
        .body(Body::empty())
        .unwrap()
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a str, &'a [u8]),
}

fn multipart(user: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, content_type, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/audit-logs")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(USER_ID_HEADER, user)
        .body(Body::from(body))
        .unwrap()
}

async fn grant(app: &Router, user: &str, actions: &[&str]) {
    let permissions: Vec<Value> = actions
        .iter()
        .map(|a| json!({"action": a, "effect": "Allow"}))
        .collect();
    let (status, _) = send(
        app,
        json_request(
            Method::PUT,
            &format!("/api/v1/users/{}/permissions", user),
            Some(ADMIN),
            json!({ "permissions": permissions }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn submit_simple(app: &Router, user: &str) -> Value {
    let (status, body) = send(
        app,
        multipart(
            user,
            &[
                Part::Text("assetId", "A-100"),
                Part::Text(
                    "proposedChanges",
                    r#"{"name":"","description":"new text","purchaseValue":null,"year":"2019-06-15T00:00:00.000Z"}"#,
                ),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

// ===========================================================================
// Identity and permissions
// ===========================================================================

#[tokio::test]
async fn test_missing_identity_is_401() {
    let app = app();
    let request = Request::builder()
        .uri("/api/v1/audit-logs")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = serde_json::from_value(body).unwrap();
    assert_eq!(error.code, 401);
}

#[tokio::test]
async fn test_catalog_lists_actions_in_order() {
    let app = app();
    let request = Request::builder()
        .uri("/api/v1/permissions/catalog")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], json!(1));
    assert_eq!(body["actions"][0], json!("allAccess"));
    assert_eq!(body["actions"].as_array().unwrap().len(), 28);
    assert_eq!(body["groups"][0]["name"], json!("Dashboard"));
}

#[tokio::test]
async fn test_replace_permissions_normalizes_and_rejects_unknown() {
    let app = app();

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v1/users/alice/permissions",
            Some(ADMIN),
            json!({"permissions": [{"action": "city:view", "effect": "Allow"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["permissions"].as_array().unwrap();
    assert_eq!(entries.len(), 28);
    assert!(entries.contains(&json!({"action": "city:view", "effect": "Allow"})));
    assert!(entries.contains(&json!({"action": "allAccess", "effect": "Deny"})));

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v1/users/alice/permissions",
            Some(ADMIN),
            json!({"permissions": [{"action": "city:delete", "effect": "Allow"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, get("/api/v1/users/alice/permissions", ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], json!("alice"));

    let (status, _) = send(&app, get("/api/v1/users/bob/permissions", ADMIN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_applies_editor_rules() {
    let app = app();
    let uri = "/api/v1/users/carol/permissions";

    let (status, body) = send(
        &app,
        json_request(
            Method::PATCH,
            uri,
            Some(ADMIN),
            json!({"edits": [{"op": "toggle", "action": "allAccess"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["effect"] == json!("Allow")));

    let (_, body) = send(
        &app,
        json_request(
            Method::PATCH,
            uri,
            Some(ADMIN),
            json!({"edits": [{"op": "toggle", "action": "allAccess"}]}),
        ),
    )
    .await;
    let entries = body["permissions"].as_array().unwrap();
    assert_eq!(entries[0], json!({"action": "allAccess", "effect": "Deny"}));
    assert!(entries[1..].iter().all(|p| p["effect"] == json!("Allow")));

    let (status, _) = send(
        &app,
        json_request(
            Method::PATCH,
            uri,
            Some(ADMIN),
            json!({"edits": [{"op": "setGroup", "group": "Vendors", "effect": "Allow"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_permission_endpoints_are_gated() {
    let app = app();
    grant(&app, "viewer", &["userMaster:view"]).await;

    let (status, _) = send(&app, get("/api/v1/users/viewer/permissions", "viewer")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v1/users/viewer/permissions",
            Some("viewer"),
            json!({"permissions": [{"action": "allAccess", "effect": "Allow"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!(403));
}

// ===========================================================================
// Audit workflow
// ===========================================================================

#[tokio::test]
async fn test_submit_sanitizes_and_stores_pending_log() {
    let app = app();
    grant(&app, "auditor", &["assetMaster:view"]).await;

    let log = submit_simple(&app, "auditor").await;
    assert_eq!(log["reviewStatus"], json!("pending"));
    assert_eq!(log["createdBy"], json!("auditor"));
    assert_eq!(log["assetId"], json!("A-100"));
    assert_eq!(log["auditorRemark"], json!(""));
    assert_eq!(
        log["proposedChanges"],
        json!({"description": "new text", "year": 2019})
    );
}

#[tokio::test]
async fn test_submit_with_evidence() {
    let app = app();
    grant(&app, "auditor", &["assetMaster:view"]).await;

    let (status, log) = send(
        &app,
        multipart(
            "auditor",
            &[
                Part::Text("assetId", "A-7"),
                Part::Text("auditorRemark", "tag replaced"),
                Part::Text("proposedChanges", r#"{"room":"B12"}"#),
                Part::File("currentAssetImage", "now.jpg", "image/jpeg", &[0xFF, 0xD8, 0xFF]),
                Part::File("auditImages", "tag.png", "image/png", &[0x89, 0x50]),
                Part::File("auditImages", "", "application/octet-stream", &[]),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", log);
    assert_eq!(log["currentAssetImage"]["fileName"], json!("now.jpg"));
    assert_eq!(log["currentAssetImage"]["size"], json!(3));
    assert_eq!(log["auditImages"].as_array().unwrap().len(), 1);
    assert_eq!(log["auditorRemark"], json!("tag replaced"));
}

#[tokio::test]
async fn test_submit_validation_errors() {
    let app = app();
    grant(&app, "auditor", &["assetMaster:view"]).await;

    let (status, _) = send(
        &app,
        multipart("auditor", &[Part::Text("proposedChanges", r#"{"room":"B12"}"#)]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let img: &[u8] = &[1, 2];
    let (status, _) = send(
        &app,
        multipart(
            "auditor",
            &[
                Part::Text("assetId", "A-1"),
                Part::File("auditImages", "1.png", "image/png", img),
                Part::File("auditImages", "2.png", "image/png", img),
                Part::File("auditImages", "3.png", "image/png", img),
                Part::File("auditImages", "4.png", "image/png", img),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        multipart(
            "auditor",
            &[
                Part::Text("assetId", "A-1"),
                Part::File("currentAssetImage", "big.png", "image/png", &[0u8; 65]),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        multipart(
            "auditor",
            &[Part::Text("assetId", "A-1"), Part::Text("proposedChanges", "[]")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_requires_asset_master_view() {
    let app = app();
    let (status, _) = send(
        &app,
        multipart("stranger", &[Part::Text("assetId", "A-1")]),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_review_flow() {
    let app = app();
    grant(&app, "auditor", &["assetMaster:view"]).await;
    grant(&app, "reviewer", &["auditReport:view", "auditReport:edit"]).await;

    let log = submit_simple(&app, "auditor").await;
    let id = log["id"].as_str().unwrap().to_string();
    let review_uri = format!("/api/v1/audit-logs/{}/review", id);

    // The auditor may not review.
    let (status, _) = send(
        &app,
        json_request(Method::PUT, &review_uri, Some("auditor"), json!({"reviewStatus": "approved"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            &review_uri,
            Some("reviewer"),
            json!({"reviewStatus": "rejected", "rejectedRemark": ""}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, reviewed) = send(
        &app,
        json_request(
            Method::PUT,
            &review_uri,
            Some("reviewer"),
            json!({"reviewStatus": "rejected", "rejectedRemark": "too old"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviewed["reviewStatus"], json!("rejected"));
    assert_eq!(reviewed["rejectedRemark"], json!("too old"));
    assert_eq!(reviewed["reviewedBy"], json!("reviewer"));

    let (status, body) = send(
        &app,
        json_request(Method::PUT, &review_uri, Some("reviewer"), json!({"reviewStatus": "approved"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!(409));

    let (status, detail) = send(&app, get(&format!("/api/v1/audit-logs/{}", id), "reviewer")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail, reviewed);
}

#[tokio::test]
async fn test_review_body_and_id_errors() {
    let app = app();
    grant(&app, "reviewer", &["auditReport:view", "auditReport:edit"]).await;

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            "/api/v1/audit-logs/not-a-uuid/review",
            Some("reviewer"),
            json!({"reviewStatus": "approved"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = uuid::Uuid::new_v4();
    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/v1/audit-logs/{}/review", missing),
            Some("reviewer"),
            json!({"reviewStatus": "approved"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/v1/audit-logs/{}/review", missing),
            Some("reviewer"),
            json!({"reviewStatus": "pending"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_listing_and_counts() {
    let app = app();
    grant(&app, "auditor", &["assetMaster:view"]).await;
    grant(&app, "reviewer", &["auditReport:view", "auditReport:edit"]).await;

    let first = submit_simple(&app, "auditor").await;
    submit_simple(&app, "auditor").await;
    submit_simple(&app, "auditor").await;

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/api/v1/audit-logs/{}/review", first["id"].as_str().unwrap()),
            Some("reviewer"),
            json!({"reviewStatus": "approved"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, counts) = send(&app, get("/api/v1/audit-logs/counts", "reviewer")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        counts,
        json!({"pending": 2, "approved": 1, "rejected": 0, "total": 3})
    );

    let (status, page) = send(&app, get("/api/v1/audit-logs?status=pending&limit=1", "reviewer")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], json!(2));
    assert_eq!(page["logs"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, get("/api/v1/audit-logs?status=archived", "reviewer")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/v1/audit-logs/counts", "auditor")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[cfg(feature = "persistent")]
#[tokio::test]
async fn test_persistent_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = || ApiConfig {
        bootstrap_admins: vec![ADMIN.to_string()],
        data_dir: Some(dir.path().to_path_buf()),
        ..ApiConfig::default()
    };

    let id = {
        let app = build_router(AppState::open(config()).unwrap());
        grant(&app, "auditor", &["assetMaster:view", "auditReport:view"]).await;
        let log = submit_simple(&app, "auditor").await;
        log["id"].as_str().unwrap().to_string()
    };

    let app = build_router(AppState::open(config()).unwrap());
    let (status, log) = send(&app, get(&format!("/api/v1/audit-logs/{}", id), "auditor")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log["reviewStatus"], json!("pending"));
}
