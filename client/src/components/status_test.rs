use super::*;

#[test]
fn page_label_never_reports_zero_pages() {
    assert_eq!(page_label(1, 0), "Page 1 of 1");
    assert_eq!(page_label(2, 5), "Page 2 of 5");
}

#[test]
fn next_is_available_before_the_last_page() {
    assert!(has_next(1, 2));
    assert!(!has_next(2, 2));
    assert!(!has_next(1, 0));
}
