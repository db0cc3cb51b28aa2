#[path = "../common/mod.rs"]
mod common;

use campfire_reports::model::{AdminCapabilities, User};
use campfire_reports::scope::{user_can_unscope, user_scope_filters, ScopeKey, ScopeTarget};
use common::{seeded_store, user};
use serde_json::json;

#[test]
fn test_staff_is_unrestricted() {
    let store = seeded_store();
    let director = user(&store, "director");

    assert!(user_scope_filters(Some(&director), ScopeTarget::Faction).is_empty());
    assert!(user_scope_filters(Some(&director), ScopeTarget::Facility).is_empty());
}

#[test]
fn test_staff_wins_over_profiles() {
    let profiled = |user: User| {
        user.with_leader(Some(20))
            .with_faculty(Some(10))
            .with_attendee(Some(21))
            .with_organization(1)
    };

    for user in [
        profiled(User::new(11, "counselor").with_staff()),
        profiled(User::new(12, "root").with_superuser()),
    ] {
        assert!(user_scope_filters(Some(&user), ScopeTarget::Faction).is_empty());
        assert!(user_scope_filters(Some(&user), ScopeTarget::Facility).is_empty());
    }
}

#[test]
fn test_leader_is_scoped_to_faction() {
    let store = seeded_store();
    let leader = user(&store, "leader");

    let scope = user_scope_filters(Some(&leader), ScopeTarget::Faction);
    assert_eq!(serde_json::to_value(&scope).unwrap(), json!({"faction": 20}));

    // Leader profile wins over the organization fallback for either target.
    let scope = user_scope_filters(Some(&leader), ScopeTarget::Facility);
    assert_eq!(scope.get(ScopeKey::Faction), Some(20));
    assert_eq!(scope.len(), 1);
}

#[test]
fn test_faculty_key_depends_on_target() {
    let store = seeded_store();
    let faculty = user(&store, "faculty");

    let scope = user_scope_filters(Some(&faculty), ScopeTarget::Facility);
    assert_eq!(serde_json::to_value(&scope).unwrap(), json!({"facility": 10}));

    let scope = user_scope_filters(Some(&faculty), ScopeTarget::Faction);
    assert_eq!(
        serde_json::to_value(&scope).unwrap(),
        json!({"week__facility_enrollment__facility": 10})
    );
}

#[test]
fn test_attendee_and_organization_fallbacks() {
    let store = seeded_store();

    let camper = user(&store, "camper");
    let scope = user_scope_filters(Some(&camper), ScopeTarget::Faction);
    assert_eq!(scope.get(ScopeKey::Faction), Some(21));

    let member = user(&store, "member");
    assert_eq!(
        serde_json::to_value(user_scope_filters(Some(&member), ScopeTarget::Facility)).unwrap(),
        json!({"organization": 2})
    );
    assert_eq!(
        serde_json::to_value(user_scope_filters(Some(&member), ScopeTarget::Faction)).unwrap(),
        json!({"faction__organization": 2})
    );
}

#[test]
fn test_profile_without_target_falls_through() {
    // A leader profile with no faction does not match step three.
    let user = User::new(9, "orphan")
        .with_leader(None)
        .with_organization(4);
    let scope = user_scope_filters(Some(&user), ScopeTarget::Faction);
    assert_eq!(scope.get(ScopeKey::FactionOrganization), Some(4));
}

#[test]
fn test_unauthenticated_and_profileless_are_empty() {
    let store = seeded_store();

    assert!(user_scope_filters(None, ScopeTarget::Faction).is_empty());
    let retired = user(&store, "retired");
    assert!(user_scope_filters(Some(&retired), ScopeTarget::Faction).is_empty());
    let drifter = user(&store, "drifter");
    assert!(user_scope_filters(Some(&drifter), ScopeTarget::Facility).is_empty());
}

#[test]
fn test_unscope_eligibility() {
    let store = seeded_store();

    assert!(user_can_unscope(Some(&user(&store, "director"))));
    assert!(user_can_unscope(Some(&user(&store, "leadadmin"))));
    assert!(!user_can_unscope(Some(&user(&store, "leader"))));
    assert!(!user_can_unscope(Some(&user(&store, "retired"))));
    assert!(!user_can_unscope(None));

    let department = User::new(10, "dept").with_admin(AdminCapabilities {
        department_admin: true,
        ..Default::default()
    });
    assert!(user_can_unscope(Some(&department)));
}
