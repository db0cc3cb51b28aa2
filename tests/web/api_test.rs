#[path = "../common/mod.rs"]
mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use campfire_reports::web::{router, AppState, REMOTE_USER_HEADER};
use common::{artifact_count, build_test_context, TestContext};
use serde_json::{json, Value};
use tower::util::ServiceExt;

fn app(ctx: &TestContext) -> Router {
    router(AppState {
        service: ctx.service.clone(),
    })
}

fn request(method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(REMOTE_USER_HEADER, user);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(ctx: &TestContext, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app(ctx).oneshot(req).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(ctx: &TestContext, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(ctx, req).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn create_template(ctx: &TestContext, owner: &str, body: Value) -> i64 {
    let (status, json) = send_json(
        ctx,
        request(Method::POST, "/api/templates", Some(owner), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_i64().unwrap()
}

// ============================================================================
// Identity
// ============================================================================

#[tokio::test]
async fn test_requests_require_active_user() {
    let ctx = build_test_context();

    for user in [None, Some("nobody"), Some("retired")] {
        let (status, json) =
            send_json(&ctx, request(Method::GET, "/api/templates", user, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json, json!({"error": "Authentication required"}));
    }
}

// ============================================================================
// Templates
// ============================================================================

#[tokio::test]
async fn test_create_and_list_templates() {
    let ctx = build_test_context();
    let id = create_template(
        &ctx,
        "leader",
        json!({"name": "Roster", "output_formats": ["csv"], "available_to": [3]}),
    )
    .await;

    let (status, json) =
        send_json(&ctx, request(Method::GET, "/api/templates", Some("faculty"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "Roster");
    assert_eq!(json[0]["created_by"], 2);
    assert_eq!(json[0]["filters"], json!({}));

    let uri = format!("/api/templates/{id}");
    let (status, json) = send_json(&ctx, request(Method::GET, &uri, Some("camper"), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json, json!({"error": "You do not have access to this report."}));

    let (status, json) = send_json(
        &ctx,
        request(Method::PUT, &uri, Some("faculty"), Some(json!({"description": "Cabins"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["description"], "Cabins");

    let (status, _) =
        send_json(&ctx, request(Method::GET, "/api/templates/999", Some("leader"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_template_validation() {
    let ctx = build_test_context();

    let (status, json) = send_json(
        &ctx,
        request(
            Method::POST,
            "/api/templates",
            Some("leader"),
            Some(json!({"name": "Roster", "available_to": [999]})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("999"));
}

// ============================================================================
// Generation
// ============================================================================

#[tokio::test]
async fn test_generate_and_download() {
    let ctx = build_test_context();
    let id = create_template(&ctx, "leader", json!({"name": "Roster"})).await;

    let (status, json) = send_json(
        &ctx,
        request(
            Method::POST,
            &format!("/api/templates/{id}/generate"),
            Some("leader"),
            Some(json!({
                "filters": r#"{"rows": [{"name": "X", "value": 1}]}"#,
                "output_format": "csv"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Report generated successfully");
    let file_url = json["file_url"].as_str().unwrap().to_string();
    assert!(file_url.starts_with("/media/reports/roster_"));
    assert_eq!(json.as_object().unwrap().len(), 2);

    let response = app(&ctx)
        .oneshot(request(Method::GET, &file_url, Some("leader"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"name,value\r\nX,1\r\n");

    let (status, json) =
        send_json(&ctx, request(Method::GET, "/api/generated", Some("leader"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["template_id"], id);
    assert_eq!(json[0]["filters_applied"], json!({"rows": [{"name": "X", "value": 1}]}));

    let (status, _) = send(&ctx, request(Method::GET, &file_url, None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(
        &ctx,
        request(Method::GET, "/media/reports/missing.csv", Some("leader"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_failures() {
    let ctx = build_test_context();
    let id = create_template(&ctx, "leader", json!({"name": "Roster"})).await;
    let uri = format!("/api/templates/{id}/generate");

    let (status, json) = send_json(
        &ctx,
        request(Method::POST, &uri, Some("camper"), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json, json!({"error": "Access denied"}));

    let (status, json) = send_json(
        &ctx,
        request(Method::POST, &uri, Some("leader"), Some(json!({"filters": "{oops"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"error": "Filters must be valid JSON."}));

    // A body that is not JSON at all gets the same answer.
    let raw = Request::builder()
        .method(Method::POST)
        .uri(&uri)
        .header(REMOTE_USER_HEADER, "leader")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send_json(&ctx, raw).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, json!({"error": "Filters must be valid JSON."}));

    let (status, json) = send_json(
        &ctx,
        request(
            Method::POST,
            &uri,
            Some("leader"),
            Some(json!({"output_format": "markdown"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json,
        json!({"error": "Error generating report: Unsupported format: markdown"})
    );

    assert_eq!(artifact_count(&ctx), 0);
    assert_eq!(ctx.service.store().count_generated_reports().unwrap(), 0);
}

#[tokio::test]
async fn test_generate_accepts_embedded_filters() {
    let ctx = build_test_context();
    let id = create_template(&ctx, "leader", json!({"name": "Roster"})).await;

    let (status, json) = send_json(
        &ctx,
        request(
            Method::POST,
            &format!("/api/templates/{id}/generate"),
            Some("leader"),
            Some(json!({
                "filters": {"rows": [{"name": "X", "value": 2.0}]},
                "output_format": "csv"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let file_url = json["file_url"].as_str().unwrap().to_string();

    let (status, body) = send(&ctx, request(Method::GET, &file_url, Some("leader"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"name,value\r\nX,2.0\r\n");
}

// ============================================================================
// Built-in reports
// ============================================================================

#[tokio::test]
async fn test_builtin_index() {
    let ctx = build_test_context();

    let (status, json) =
        send_json(&ctx, request(Method::GET, "/api/builtin", Some("camper"), None)).await;
    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["faction-enrollments", "facility-directory"]);
    assert_eq!(json[1]["allow_unscoped"], true);
}

#[tokio::test]
async fn test_builtin_detail() {
    let ctx = build_test_context();

    let (status, json) = send_json(
        &ctx,
        request(
            Method::GET,
            "/api/builtin/faction-enrollments?start=2024-06-09",
            Some("leader"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["report"]["name"], "Faction Enrollments");
    assert_eq!(
        json["columns"],
        json!(["Faction", "Facility", "Week", "Quarters", "Start", "End"])
    );
    assert_eq!(
        json["table_rows"],
        json!([["Troop 20", "Pinewood", "Week 1", null, "2024-06-09", "2024-06-15"]])
    );
    assert_eq!(json["rows"][0]["Facility"], "Pinewood");
    assert_eq!(json["filters"]["start"], "2024-06-09");

    let (status, json) = send_json(
        &ctx,
        request(
            Method::GET,
            "/api/builtin/faction-enrollments?start=june",
            Some("leader"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("start"));

    let (status, _) =
        send_json(&ctx, request(Method::GET, "/api/builtin/attendance", Some("leader"), None))
            .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_builtin_export() {
    let ctx = build_test_context();

    let response = app(&ctx)
        .oneshot(request(
            Method::GET,
            "/api/builtin/facility-directory/export",
            Some("member"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"facility-directory.csv\""
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
        &body[..],
        b"Facility,Slug,Organization\r\nRiverbend,riverbend,South Council\r\n"
    );

    let response = app(&ctx)
        .oneshot(request(
            Method::GET,
            "/api/builtin/facility-directory/export/excel?unscoped=1",
            Some("leadadmin"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"facility-directory.xlsx\""
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text.lines().count(), 4);
    assert!(text.starts_with("Facility\tSlug\tOrganization"));
}
