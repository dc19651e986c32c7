//! Comprehensive unit tests for validation.rs module

use digital_declutter::error::ErrorKind;
use digital_declutter::models::{ItemDraft, ItemPatch};
use digital_declutter::validation::InputValidator;

#[test]
fn test_validate_email_valid() {
    assert!(InputValidator::validate_email("ana@example.com").is_ok());
    assert!(InputValidator::validate_email("first.last+tag@mail.example.org").is_ok());
}

#[test]
fn test_validate_email_empty() {
    assert!(InputValidator::validate_email("").is_err());
    assert!(InputValidator::validate_email("   ").is_err());
}

#[test]
fn test_validate_email_missing_at() {
    assert!(InputValidator::validate_email("ana.example.com").is_err());
}

#[test]
fn test_validate_email_two_ats() {
    assert!(InputValidator::validate_email("ana@foo@example.com").is_err());
}

#[test]
fn test_validate_email_bad_domain() {
    assert!(InputValidator::validate_email("ana@localhost").is_err());
    assert!(InputValidator::validate_email("ana@").is_err());
}

#[test]
fn test_validate_email_empty_local_part() {
    assert!(InputValidator::validate_email("@example.com").is_err());
}

#[test]
fn test_validate_email_too_long() {
    let email = format!("{}@example.com", "a".repeat(250));
    assert!(InputValidator::validate_email(&email).is_err());
}

#[test]
fn test_validate_password_minimum() {
    assert!(InputValidator::validate_password("").is_err());
    assert!(InputValidator::validate_password("abcde").is_err());
    assert!(InputValidator::validate_password("abcdef").is_ok());
}

#[test]
fn test_validate_item_name() {
    assert!(InputValidator::validate_item_name("Netflix").is_ok());
    assert!(InputValidator::validate_item_name("").is_err());
    assert!(InputValidator::validate_item_name(" \t ").is_err());
    assert!(InputValidator::validate_item_name(&"a".repeat(500)).is_ok());
}

#[test]
fn test_validate_category_free_text() {
    assert!(InputValidator::validate_category("Entertainment").is_ok());
    assert!(InputValidator::validate_category("Home Automation").is_ok());
    assert!(InputValidator::validate_category(" ").is_err());
    assert!(InputValidator::validate_category(&"Streaming ".repeat(20)).is_ok());
}

#[test]
fn test_validate_item_draft() {
    assert!(InputValidator::validate_item_draft(&ItemDraft::new("Netflix", "Entertainment")).is_ok());

    let err = InputValidator::validate_item_draft(&ItemDraft::new("Netflix", "")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut long_notes = ItemDraft::new("Netflix", "Entertainment");
    long_notes.notes = "x".repeat(5000);
    assert!(InputValidator::validate_item_draft(&long_notes).is_ok());
}

#[test]
fn test_validate_item_patch() {
    let rename = ItemPatch {
        name: Some("Netflix Premium".to_string()),
        ..ItemPatch::default()
    };
    assert!(InputValidator::validate_item_patch(&rename).is_ok());

    let blank_category = ItemPatch {
        category: Some(String::new()),
        ..ItemPatch::default()
    };
    assert!(InputValidator::validate_item_patch(&blank_category).is_err());
    assert!(InputValidator::validate_item_patch(&ItemPatch::default()).is_ok());
}

#[test]
fn test_sanitize_text() {
    assert_eq!(InputValidator::sanitize_text("  Netflix  "), "Netflix");
    assert_eq!(InputValidator::sanitize_text("Net\u{0}flix"), "Netflix");
    assert_eq!(InputValidator::sanitize_text("line one\nline two"), "line one\nline two");
    assert_eq!(InputValidator::sanitize_text("\u{7}bell"), "bell");
}
