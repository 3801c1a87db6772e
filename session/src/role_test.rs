use super::*;

#[test]
fn role_parse_accepts_known_names_case_insensitively() {
    assert_eq!(Role::parse("student"), Some(Role::Student));
    assert_eq!(Role::parse(" Admin "), Some(Role::Admin));
}

#[test]
fn role_parse_rejects_unknown_and_empty() {
    assert_eq!(Role::parse("teacher"), None);
    assert_eq!(Role::parse(""), None);
}

#[test]
fn role_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Role::Admin).unwrap(), serde_json::json!("admin"));
    let parsed: Role = serde_json::from_value(serde_json::json!("student")).unwrap();
    assert_eq!(parsed, Role::Student);
}

#[test]
fn authenticated_access_permits_every_role() {
    assert!(RouteAccess::Authenticated.permits(Role::Student, false));
    assert!(RouteAccess::Authenticated.permits(Role::Admin, false));
}

#[test]
fn role_access_requires_exact_role() {
    assert!(RouteAccess::STUDENT_ONLY.permits(Role::Student, false));
    assert!(!RouteAccess::STUDENT_ONLY.permits(Role::Admin, true));
    assert!(RouteAccess::ADMIN_ONLY.permits(Role::Admin, false));
    assert!(!RouteAccess::ADMIN_ONLY.permits(Role::Student, false));
}

#[test]
fn super_admin_access_needs_admin_role_and_flag() {
    assert!(RouteAccess::SuperAdmin.permits(Role::Admin, true));
    assert!(!RouteAccess::SuperAdmin.permits(Role::Admin, false));
    assert!(!RouteAccess::SuperAdmin.permits(Role::Student, true));
}
