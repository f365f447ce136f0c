//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("commit rejected".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("commit rejected"));
}

#[test]
fn test_invalid_pass_display() {
    let err = Error::InvalidPass("stale key".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid pass"));
    assert!(display.contains("stale key"));
}

#[test]
fn test_invalid_hierarchy_display() {
    let err = Error::InvalidHierarchy("duplicate child 'Opaque'".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid hierarchy"));
    assert!(display.contains("Opaque"));
}

#[test]
fn test_attachment_resolution_display() {
    let err = Error::AttachmentResolution("Root.Bloom:Input".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Attachment resolution failed"));
    assert!(display.contains("Root.Bloom:Input"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("Engine not initialized".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Initialization failed"));
    assert!(display.contains("Engine not initialized"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::BackendError("x".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let debug1 = format!("{:?}", Error::BackendError("test".to_string()));
    assert!(debug1.contains("BackendError"));

    let debug2 = format!("{:?}", Error::InvalidHierarchy("test".to_string()));
    assert!(debug2.contains("InvalidHierarchy"));

    let debug3 = format!("{:?}", Error::AttachmentResolution("test".to_string()));
    assert!(debug3.contains("AttachmentResolution"));
}

#[test]
fn test_error_clone() {
    let err1 = Error::InvalidPass("test".to_string());
    let err2 = err1.clone();
    assert_eq!(format!("{}", err1), format!("{}", err2));
}

// ============================================================================
// RESULT TYPE TESTS
// ============================================================================

#[test]
fn test_result_type_err() {
    fn returns_error() -> Result<i32> {
        Err(Error::InvalidPass("gone".to_string()))
    }

    match returns_error() {
        Err(e) => assert_eq!(format!("{}", e), "Invalid pass: gone"),
        Ok(_) => panic!("Expected error"),
    }
}

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::BackendError("inner".to_string()))
    }

    fn outer() -> Result<i32> {
        inner()?;
        Ok(42)
    }

    assert!(outer().is_err());
}
