use super::*;

#[test]
fn unchanged_form_produces_an_empty_update() {
    assert!(changed_fields("Ada", "Ada", "2000-01-01", "2000-01-01").is_empty());
}

#[test]
fn only_edited_fields_are_sent() {
    let update = changed_fields("Ada L", "Ada", "2000-01-01", "2000-01-01");
    assert_eq!(update.name.as_deref(), Some("Ada L"));
    assert_eq!(update.birthday, None);

    let update = changed_fields("Ada", "Ada", "1999-12-31", "");
    assert_eq!(update.name, None);
    assert_eq!(update.birthday.as_deref(), Some("1999-12-31"));
}

#[test]
fn clearing_the_birthday_is_not_an_update() {
    assert!(changed_fields("Ada", "Ada", "", "2000-01-01").is_empty());
}

#[test]
fn initials_take_the_first_two_words() {
    assert_eq!(initials("ada lovelace byron"), "AL");
    assert_eq!(initials(""), "");
}
