use super::*;

#[test]
fn credentials_are_trimmed() {
    let creds = validate_credentials("  student@uni.edu ", "hunter2").unwrap();
    assert_eq!(creds.email, "student@uni.edu");
    assert_eq!(creds.password, "hunter2");
}

#[test]
fn blank_fields_are_rejected() {
    assert_eq!(validate_credentials("", "x").unwrap_err(), "Enter your email and password.");
    assert_eq!(validate_credentials("a@b.com", "").unwrap_err(), "Enter your email and password.");
}

#[test]
fn email_without_at_sign_is_rejected() {
    assert_eq!(validate_credentials("abc", "x").unwrap_err(), "Enter a valid email address.");
}

#[test]
fn reset_email_must_be_present() {
    assert_eq!(validate_reset_email("   ").unwrap_err(), "Please enter your email address");
    assert_eq!(validate_reset_email(" a@b.com ").unwrap(), "a@b.com");
}
