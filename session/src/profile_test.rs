use serde_json::json;
use time::macros::date;

use super::*;

fn record(value: Value) -> ProfileRecord {
    serde_json::from_value(value).expect("profile record")
}

// =============================================================
// from_record
// =============================================================

#[test]
fn student_record_maps_to_student_profile() {
    let profile = UserProfile::from_record(
        "auth-1",
        record(json!({
            "userData": { "userID": 42, "user_name": "Ana", "email": "ana@uni.edu", "role": "student" },
            "roleData": { "studentid": "S-9", "birthday": "2001-04-02", "age": 23 }
        })),
    )
    .unwrap();

    assert_eq!(profile.auth_id, "auth-1");
    assert_eq!(profile.user_id, "42");
    assert_eq!(profile.role(), Role::Student);
    assert_eq!(
        profile.student(),
        Some(&StudentProfile { student_id: "S-9".into(), birthday: Some("2001-04-02".into()), age: Some(23) })
    );
    assert_eq!(profile.landing_route(), "/chat");
}

#[test]
fn admin_record_reads_string_flags() {
    let profile = UserProfile::from_record(
        "auth-2",
        record(json!({
            "userData": { "userID": "u-2", "user_name": "Root", "role": "admin" },
            "roleData": { "adminid": 7, "super_admin": "yes", "isProfile_set": "set" }
        })),
    )
    .unwrap();

    let admin = profile.admin().unwrap();
    assert_eq!(admin.admin_id.as_deref(), Some("7"));
    assert!(admin.super_admin);
    assert!(admin.profile_complete);
    assert!(profile.is_super_admin());
    assert_eq!(profile.landing_route(), "/admin-dashboard");
}

#[test]
fn admin_without_role_data_is_incomplete_regular_admin() {
    let profile = UserProfile::from_record(
        "auth-3",
        record(json!({ "userData": { "userID": "u-3", "user_name": "New", "role": "admin" } })),
    )
    .unwrap();
    assert!(!profile.is_super_admin());
    assert_eq!(profile.landing_route(), "/complete-profile");
}

#[test]
fn missing_role_is_rejected() {
    let err = UserProfile::from_record("a", record(json!({ "userData": { "userID": "u", "user_name": "x" } })))
        .unwrap_err();
    assert_eq!(err, ProfileError::MissingRole);
}

#[test]
fn unknown_role_is_rejected() {
    let err = UserProfile::from_record(
        "a",
        record(json!({ "userData": { "userID": "u", "user_name": "x", "role": "counselor" } })),
    )
    .unwrap_err();
    assert_eq!(err, ProfileError::UnknownRole("counselor".into()));
}

#[test]
fn student_without_role_data_is_rejected() {
    let err = UserProfile::from_record(
        "a",
        record(json!({ "userData": { "userID": "u", "user_name": "x", "role": "student" }, "roleData": null })),
    )
    .unwrap_err();
    assert_eq!(err, ProfileError::MissingRoleData(Role::Student));
}

#[test]
fn user_id_of_wrong_type_fails_to_decode() {
    let result = serde_json::from_value::<ProfileRecord>(json!({ "userData": { "userID": true } }));
    assert!(result.is_err());
}

// =============================================================
// patches and updates
// =============================================================

#[test]
fn apply_patch_overwrites_only_present_fields() {
    let mut profile = UserProfile::from_record(
        "auth-1",
        record(json!({
            "userData": { "userID": "u", "user_name": "Ana", "role": "student", "profile_pic": "old.webp" },
            "roleData": { "studentid": "S-1", "age": 20 }
        })),
    )
    .unwrap();

    profile.apply_patch(&ProfilePatch { user_name: Some("Ana B".into()), age: Some(21), ..ProfilePatch::default() });

    assert_eq!(profile.name, "Ana B");
    assert_eq!(profile.avatar.as_deref(), Some("old.webp"));
    assert_eq!(profile.student().unwrap().age, Some(21));
}

#[test]
fn profile_update_serializes_backend_field_names() {
    let update = ProfileUpdate { name: Some("Ana".into()), avatar: None, birthday: Some("2000-01-31".into()) };
    assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "user_name": "Ana", "birthday": "2000-01-31" }));
}

#[test]
fn profile_update_validation() {
    assert_eq!(ProfileUpdate::default().validated(), Err("Nothing to update."));
    assert_eq!(
        ProfileUpdate { name: Some("   ".into()), ..ProfileUpdate::default() }.validated(),
        Err("Name cannot be empty.")
    );
    assert_eq!(
        ProfileUpdate { birthday: Some("31/01/2000".into()), ..ProfileUpdate::default() }.validated(),
        Err("Birthday must be a valid YYYY-MM-DD date.")
    );
    let ok = ProfileUpdate { name: Some("  Ana ".into()), ..ProfileUpdate::default() }
        .validated()
        .unwrap();
    assert_eq!(ok.name.as_deref(), Some("Ana"));
}

// =============================================================
// age
// =============================================================

#[test]
fn age_counts_completed_years() {
    assert_eq!(age_on(date!(2000 - 06 - 15), date!(2018 - 06 - 14)), 17);
    assert_eq!(age_on(date!(2000 - 06 - 15), date!(2018 - 06 - 15)), 18);
    assert_eq!(age_on(date!(2000 - 06 - 15), date!(2019 - 01 - 01)), 18);
}

#[test]
fn age_of_future_birthday_is_zero() {
    assert_eq!(age_on(date!(2030 - 01 - 01), date!(2024 - 01 - 01)), 0);
}

#[test]
fn parse_birthday_accepts_iso_dates_only() {
    assert_eq!(parse_birthday(" 2001-02-28 "), Some(date!(2001 - 02 - 28)));
    assert_eq!(parse_birthday("2001-02-30"), None);
    assert_eq!(parse_birthday("02/28/2001"), None);
}
