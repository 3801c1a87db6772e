use super::*;

#[test]
fn timestamps_render_to_the_minute() {
    assert_eq!(when(Some("2024-03-05T14:30:59Z")), "2024-03-05 14:30");
    assert_eq!(when(None), "N/A");
    assert_eq!(when(Some("soon")), "soon");
}

#[test]
fn registered_invitations_read_as_active() {
    assert!(status_class(InvitationStatus::Registered).contains("--active"));
    assert_eq!(status_class(InvitationStatus::Unknown), "status-pill");
}
