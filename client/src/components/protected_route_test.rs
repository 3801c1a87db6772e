use super::*;

#[test]
fn requested_location_keeps_query() {
    assert_eq!(requested_location("/view-feedback", ""), "/view-feedback");
    assert_eq!(requested_location("/view-feedback", "?page=2"), "/view-feedback?page=2");
    assert_eq!(requested_location("/view-feedback", "page=2"), "/view-feedback?page=2");
}

#[test]
fn only_redirects_have_targets() {
    assert_eq!(redirect_target(&GuardDecision::Pending), None);
    assert_eq!(redirect_target(&GuardDecision::Render), None);
    assert_eq!(
        redirect_target(&GuardDecision::RedirectLogin { to: "/login?from=%2Fchat".to_owned() }),
        Some("/login?from=%2Fchat")
    );
    assert_eq!(
        redirect_target(&GuardDecision::RedirectUnauthorized { to: "/401-unauthorized".to_owned() }),
        Some("/401-unauthorized")
    );
}
