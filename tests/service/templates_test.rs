#[path = "../common/mod.rs"]
mod common;

use std::collections::BTreeSet;

use campfire_reports::access::NO_ACCESS_MESSAGE;
use campfire_reports::error::ReportError;
use campfire_reports::model::{Id, NewReportTemplate, TemplateUpdate};
use common::{build_test_context, TestContext};
use serde_json::json;

fn create(ctx: &TestContext, owner: &str, name: &str, shared_with: &[Id]) -> Id {
    let owner = ctx.user(owner);
    let new = NewReportTemplate {
        name: name.to_string(),
        filters: json!({}),
        available_to: shared_with.iter().copied().collect(),
        ..Default::default()
    };
    ctx.service.create_template(&owner, &new).unwrap().id
}

fn names(ctx: &TestContext, username: &str) -> Vec<String> {
    let user = ctx.user(username);
    ctx.service
        .list_templates_for(&user)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect()
}

#[test]
fn test_listing_is_owned_and_shared() {
    let ctx = build_test_context();
    // leader = 2, faculty = 3, camper = 4
    create(&ctx, "leader", "Own", &[2]);
    create(&ctx, "director", "Shared", &[2, 3]);
    create(&ctx, "camper", "Private", &[]);

    assert_eq!(names(&ctx, "leader"), vec!["Own", "Shared"]);
    assert_eq!(names(&ctx, "faculty"), vec!["Shared"]);
    assert_eq!(names(&ctx, "camper"), vec!["Private"]);
    assert!(names(&ctx, "member").is_empty());
}

#[test]
fn test_created_template_round_trips() {
    let ctx = build_test_context();
    let leader = ctx.user("leader");
    let new = NewReportTemplate {
        name: "Swim Tests".to_string(),
        description: "Pending swim checks".to_string(),
        filters: json!({"rows": [{"name": "Ada", "value": 1}]}),
        query: "swim".to_string(),
        output_formats: BTreeSet::from(["csv".to_string()]),
        available_to: BTreeSet::from([3]),
    };
    let created = ctx.service.create_template(&leader, &new).unwrap();

    let loaded = ctx.service.get_template_for(&leader, created.id).unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.created_by, leader.id);
    assert_eq!(loaded.available_to, BTreeSet::from([3]));
    assert_eq!(loaded.filters, json!({"rows": [{"name": "Ada", "value": 1}]}));
}

#[test]
fn test_get_template_access() {
    let ctx = build_test_context();
    let id = create(&ctx, "leader", "Roster", &[3]);

    assert!(ctx.service.get_template_for(&ctx.user("faculty"), id).is_ok());

    let err = ctx
        .service
        .get_template_for(&ctx.user("camper"), id)
        .unwrap_err();
    assert!(matches!(err, ReportError::AccessDenied(ref m) if m == NO_ACCESS_MESSAGE));

    assert!(matches!(
        ctx.service.get_template_for(&ctx.user("leader"), 404),
        Err(ReportError::NotFound { .. })
    ));
}

#[test]
fn test_update_requires_access() {
    let ctx = build_test_context();
    let id = create(&ctx, "leader", "Roster", &[3]);

    let update = TemplateUpdate {
        name: Some("Cabin Roster".to_string()),
        available_to: Some(BTreeSet::from([3, 4])),
        ..Default::default()
    };
    let updated = ctx
        .service
        .update_template(&ctx.user("faculty"), id, &update)
        .unwrap();
    assert_eq!(updated.name, "Cabin Roster");
    assert_eq!(updated.available_to, BTreeSet::from([3, 4]));
    assert!(updated.updated_at >= updated.created_at);

    // The camper was just given access.
    assert_eq!(names(&ctx, "camper"), vec!["Cabin Roster"]);

    let stranger = TemplateUpdate {
        description: Some("hijacked".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        ctx.service.update_template(&ctx.user("member"), id, &stranger),
        Err(ReportError::AccessDenied(_))
    ));
    let unchanged = ctx.service.get_template_for(&ctx.user("leader"), id).unwrap();
    assert_eq!(unchanged.description, "");

    assert!(matches!(
        ctx.service.update_template(&ctx.user("leader"), 404, &stranger),
        Err(ReportError::NotFound { .. })
    ));
}

#[test]
fn test_create_validation() {
    let ctx = build_test_context();
    let leader = ctx.user("leader");

    let blank = NewReportTemplate {
        name: "   ".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        ctx.service.create_template(&leader, &blank),
        Err(ReportError::Validation(_))
    ));

    let ghost = NewReportTemplate {
        name: "Ghosts".to_string(),
        available_to: BTreeSet::from([999]),
        ..Default::default()
    };
    assert!(matches!(
        ctx.service.create_template(&leader, &ghost),
        Err(ReportError::Validation(_))
    ));
    assert!(names(&ctx, "leader").is_empty());
}

#[test]
fn test_authenticate() {
    let ctx = build_test_context();

    assert_eq!(ctx.service.authenticate(Some("leader")).unwrap().id, 2);
    assert_eq!(ctx.service.authenticate(Some(" leader ")).unwrap().id, 2);

    for name in [None, Some(""), Some("  "), Some("nobody"), Some("retired")] {
        assert!(matches!(
            ctx.service.authenticate(name),
            Err(ReportError::Unauthenticated)
        ));
    }
}
