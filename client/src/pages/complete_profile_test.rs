use super::*;

#[test]
fn blank_password_fields_keep_the_current_password() {
    let completion = completion_from_form("Ada", "30", "555-0100", "", "").unwrap();
    assert_eq!(completion.age, 30);
    assert_eq!(completion.password, None);
}

#[test]
fn chosen_password_must_be_confirmed() {
    assert_eq!(completion_from_form("Ada", "30", "555", "secret1", "secret2").unwrap_err(), "Passwords don't match");
    let completion = completion_from_form("Ada", "30", "555", "secret1", "secret1").unwrap();
    assert_eq!(completion.password.as_deref(), Some("secret1"));
}

#[test]
fn age_must_be_numeric() {
    assert_eq!(completion_from_form("Ada", "thirty", "555", "", "").unwrap_err(), "Enter your age as a number.");
}
