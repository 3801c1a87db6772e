use session::profile::{AdminProfile, RoleProfile, StudentProfile, UserProfile};
use session::{Session, SessionPhase};

use super::*;

fn signed_in(role: RoleProfile) -> SessionSnapshot {
    SessionSnapshot {
        phase: SessionPhase::Authenticated,
        session: Some(Session {
            subject: "auth-1".to_owned(),
            email: None,
            access_token: "at".to_owned(),
            refresh_token: None,
            issued_at: 0,
            expires_at: 3600,
        }),
        profile: Some(UserProfile {
            auth_id: "auth-1".to_owned(),
            user_id: "7".to_owned(),
            name: "Ada".to_owned(),
            email: None,
            avatar: None,
            role,
        }),
    }
}

#[test]
fn resource_types_get_readable_labels() {
    assert_eq!(type_label("assosiation"), "Association");
    assert_eq!(type_label("consultant"), "Consultant");
    assert_eq!(type_label("hotline"), "Hotline");
    assert_eq!(type_label(""), "");
}

#[test]
fn only_signed_in_admins_can_edit() {
    let admin = AdminProfile { admin_id: None, super_admin: false, profile_complete: true };
    let student = StudentProfile { student_id: "s1".to_owned(), birthday: None, age: None };
    assert!(can_edit(&signed_in(RoleProfile::Admin(admin))));
    assert!(!can_edit(&signed_in(RoleProfile::Student(student))));
    assert!(!can_edit(&SessionSnapshot::signed_out()));
}
