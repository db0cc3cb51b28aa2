#[path = "../common/mod.rs"]
mod common;

use std::collections::BTreeSet;

use campfire_reports::error::ReportError;
use campfire_reports::model::{NewReportTemplate, ReportTemplate, User};
use campfire_reports::service::{FilterPayload, GenerateRequest, GENERATED_MESSAGE};
use common::{artifact_count, build_test_context, TestContext};
use serde_json::json;

fn template_for(ctx: &TestContext, owner: &User, shared_with: &[&User]) -> ReportTemplate {
    let new = NewReportTemplate {
        name: "Cabin Roster".to_string(),
        description: "Who sleeps where".to_string(),
        output_formats: BTreeSet::from(["csv".to_string(), "pdf".to_string()]),
        available_to: shared_with.iter().map(|u| u.id).collect(),
        ..Default::default()
    };
    ctx.service.create_template(owner, &new).unwrap()
}

fn request(filters: Option<&str>, format: Option<&str>) -> GenerateRequest {
    GenerateRequest {
        filters: filters.map(FilterPayload::from),
        output_format: format.map(String::from),
    }
}

fn record_count(ctx: &TestContext) -> usize {
    ctx.service.store().count_generated_reports().unwrap()
}

#[test]
fn test_owner_generates_csv() {
    let ctx = build_test_context();
    let leader = ctx.user("leader");
    let template = template_for(&ctx, &leader, &[]);

    let filters = r#"{"rows": [{"name": "X", "value": 1}]}"#;
    let response = ctx
        .service
        .generate_from_template(&leader, template.id, &request(Some(filters), Some("csv")))
        .unwrap();

    assert_eq!(response.message, GENERATED_MESSAGE);
    assert!(response.file_url.starts_with("/media/reports/cabin-roster_"));
    assert!(response.file_url.ends_with(".csv"));

    let generated = response.report.unwrap();
    assert_eq!(generated.name, "Cabin Roster");
    assert_eq!(generated.template_id, template.id);
    assert_eq!(generated.generated_by, leader.id);
    assert_eq!(generated.filters_applied, json!({"rows": [{"name": "X", "value": 1}]}));

    let content = ctx.service.artifacts().open(&generated.output_file).unwrap();
    assert_eq!(content, b"name,value\r\nX,1\r\n");
    assert_eq!(record_count(&ctx), 1);
}

#[test]
fn test_shared_user_generates_pdf() {
    let ctx = build_test_context();
    let leader = ctx.user("leader");
    let faculty = ctx.user("faculty");
    let template = template_for(&ctx, &leader, &[&faculty]);

    let response = ctx
        .service
        .generate_from_template(&faculty, template.id, &request(None, Some("pdf")))
        .unwrap();

    let generated = response.report.unwrap();
    assert_eq!(generated.filters_applied, json!({}));
    let content = ctx.service.artifacts().open(&generated.output_file).unwrap();
    let content = String::from_utf8(content).unwrap();
    assert_eq!(content.lines().next(), Some("Campfire Connections Report"));
    assert_eq!(content.lines().nth(1), Some("name=Cabin Roster, value=1"));
}

#[test]
fn test_outsider_is_denied_and_nothing_is_written() {
    let ctx = build_test_context();
    let leader = ctx.user("leader");
    let camper = ctx.user("camper");
    let template = template_for(&ctx, &leader, &[]);

    let result = ctx
        .service
        .generate_from_template(&camper, template.id, &request(None, Some("csv")));

    assert!(matches!(result, Err(ReportError::AccessDenied(ref m)) if m == "Access denied"));
    assert_eq!(record_count(&ctx), 0);
    assert_eq!(artifact_count(&ctx), 0);
}

#[test]
fn test_staff_is_not_implicitly_shared() {
    let ctx = build_test_context();
    let leader = ctx.user("leader");
    let director = ctx.user("director");
    let template = template_for(&ctx, &leader, &[]);

    let result = ctx
        .service
        .generate_from_template(&director, template.id, &request(None, None));
    assert!(matches!(result, Err(ReportError::AccessDenied(_))));
}

#[test]
fn test_malformed_filters_are_rejected() {
    let ctx = build_test_context();
    let leader = ctx.user("leader");
    let template = template_for(&ctx, &leader, &[]);

    let result = ctx.service.generate_from_template(
        &leader,
        template.id,
        &request(Some("{rows: [}"), Some("csv")),
    );

    let err = result.unwrap_err();
    assert!(matches!(err, ReportError::InvalidFilters(_)));
    assert_eq!(err.to_string(), "Filters must be valid JSON.");
    assert_eq!(record_count(&ctx), 0);
    assert_eq!(artifact_count(&ctx), 0);
}

#[test]
fn test_unsupported_format_writes_nothing() {
    let ctx = build_test_context();
    let leader = ctx.user("leader");
    let template = template_for(&ctx, &leader, &[]);

    let result = ctx
        .service
        .generate_from_template(&leader, template.id, &request(None, Some("markdown")));

    assert!(matches!(result, Err(ReportError::UnsupportedFormat(_))));
    assert_eq!(record_count(&ctx), 0);
    assert_eq!(artifact_count(&ctx), 0);
}

#[test]
fn test_missing_template() {
    let ctx = build_test_context();
    let leader = ctx.user("leader");

    let result = ctx
        .service
        .generate_from_template(&leader, 999, &request(None, None));
    assert!(matches!(result, Err(ReportError::NotFound { .. })));
}

#[test]
fn test_identical_requests_produce_distinct_artifacts() {
    let ctx = build_test_context();
    let leader = ctx.user("leader");
    let template = template_for(&ctx, &leader, &[]);
    let req = request(None, Some("excel"));

    let first = ctx
        .service
        .generate_from_template(&leader, template.id, &req)
        .unwrap();
    let second = ctx
        .service
        .generate_from_template(&leader, template.id, &req)
        .unwrap();

    assert_ne!(first.file_url, second.file_url);
    assert!(first.file_url.ends_with(".xlsx"));
    assert_eq!(record_count(&ctx), 2);
    assert_eq!(artifact_count(&ctx), 2);

    let log = ctx.service.list_generated_for(&leader).unwrap();
    assert_eq!(log.len(), 2);
    assert!(log[0].id > log[1].id);

    let camper = ctx.user("camper");
    assert!(ctx.service.list_generated_for(&camper).unwrap().is_empty());
}
