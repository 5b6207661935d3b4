//! Unit tests for error.rs
//!
//! Tests the Error variants and their implementations (Display, Debug, Clone, PartialEq).

use crate::error::{Error, Result};
use crate::graphics_device::ImageLayout;

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("vkQueueSubmit returned ERROR_DEVICE_LOST".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("ERROR_DEVICE_LOST"));
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory;
    assert_eq!(format!("{}", err), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("descriptor set layout is null".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("layout is null"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("no suitable GPU".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Initialization failed"));
    assert!(display.contains("no suitable GPU"));
}

#[test]
fn test_descriptor_pool_exhausted_display() {
    let err = Error::DescriptorPoolExhausted("ERROR_OUT_OF_POOL_MEMORY".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Descriptor pool exhausted"));
    assert!(display.contains("OUT_OF_POOL_MEMORY"));
}

#[test]
fn test_unsupported_layout_transition_display() {
    let err = Error::UnsupportedLayoutTransition {
        from: ImageLayout::PresentSrc,
        to: ImageLayout::TransferDst,
    };
    let display = format!("{}", err);
    assert!(display.contains("Unsupported layout transition"));
    assert!(display.contains("PresentSrc"));
    assert!(display.contains("TransferDst"));
}

#[test]
fn test_invalid_config_display() {
    let err = Error::InvalidConfig("frames_in_flight must be > 0".to_string());
    assert!(format!("{}", err).contains("Invalid configuration"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    let debug = format!("{:?}", Error::DescriptorPoolExhausted("x".to_string()));
    assert!(debug.contains("DescriptorPoolExhausted"));

    let debug = format!("{:?}", Error::OutOfMemory);
    assert!(debug.contains("OutOfMemory"));
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::UnsupportedLayoutTransition {
        from: ImageLayout::Undefined,
        to: ImageLayout::PresentSrc,
    };
    assert_eq!(err.clone(), err);
    assert_ne!(err, Error::OutOfMemory);
}

#[test]
fn test_pool_exhaustion_is_distinct_from_generic_failure() {
    let exhausted = Error::DescriptorPoolExhausted("pool".to_string());
    let generic = Error::BackendError("pool".to_string());
    assert!(matches!(exhausted, Error::DescriptorPoolExhausted(_)));
    assert!(!matches!(generic, Error::DescriptorPoolExhausted(_)));
}

// ============================================================================
// RESULT TYPE TESTS
// ============================================================================

#[test]
fn test_result_type_ok() {
    fn returns_ok() -> Result<i32> {
        Ok(42)
    }

    assert_eq!(returns_ok().unwrap(), 42);
}

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::OutOfMemory)
    }

    fn outer() -> Result<i32> {
        inner()?;
        Ok(42)
    }

    assert_eq!(outer(), Err(Error::OutOfMemory));
}
