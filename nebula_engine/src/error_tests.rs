//! Unit tests for error.rs
//!
//! Tests Display output, fatal classification and the error macros.

use crate::error::{Error, Result};
use crate::renderer::{ShaderStage, UniformType};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("glGetError returned 0x0502".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("0x0502"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_shader_compilation_display() {
    let err = Error::ShaderCompilation {
        stage: ShaderStage::Fragment,
        log: "0:3: error: undeclared identifier".to_string(),
    };
    let display = format!("{}", err);
    assert!(display.contains("Fragment"));
    assert!(display.contains("undeclared identifier"));
}

#[test]
fn test_program_link_display() {
    let err = Error::ProgramLink { log: "missing vertex shader".to_string() };
    assert_eq!(format!("{}", err), "Program link failed: missing vertex shader");
}

#[test]
fn test_context_mismatch_display() {
    let err = Error::ContextMismatch {
        resource: "Buffer".to_string(),
        owner: "main".to_string(),
        current: "loader".to_string(),
    };
    let display = format!("{}", err);
    assert!(display.contains("Buffer belongs to context 'main'"));
    assert!(display.contains("context 'loader' is current"));
}

#[test]
fn test_uniform_type_mismatch_display() {
    let err = Error::UniformTypeMismatch {
        name: "u_color".to_string(),
        expected: UniformType::Vec4,
        found: "Vec3".to_string(),
    };
    let display = format!("{}", err);
    assert!(display.contains("'u_color'"));
    assert!(display.contains("Vec4"));
    assert!(display.contains("Vec3"));
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[test]
fn test_programmer_errors_are_fatal() {
    assert!(Error::NoCurrentContext("x".to_string()).is_fatal());
    assert!(Error::AlreadyMapped("x".to_string()).is_fatal());
    assert!(Error::UniformUnresolved("u".to_string()).is_fatal());
    assert!(Error::VertexAttributeMismatch("x".to_string()).is_fatal());
    assert!(Error::NullResource("x".to_string()).is_fatal());
}

#[test]
fn test_runtime_failures_are_not_fatal() {
    assert!(!Error::ProgramLink { log: String::new() }.is_fatal());
    assert!(!Error::UnsupportedFormat("rgb".to_string()).is_fatal());
    assert!(!Error::InvalidArgument("width".to_string()).is_fatal());
    assert!(!Error::OutOfMemory.is_fatal());
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
fn test_error_clone() {
    let err = Error::InvalidArgument("level 9".to_string());
    let cloned = err.clone();
    assert_eq!(format!("{}", err), format!("{}", cloned));
}

// ============================================================================
// MACROS
// ============================================================================

fn bail_helper(fail: bool) -> Result<u32> {
    if fail {
        crate::engine_bail!("nebula::Test", "failed with {}", 42);
    }
    Ok(7)
}

fn fail_helper() -> Result<()> {
    crate::engine_fail!("nebula::Test", Error::InvalidArgument("bad offset".to_string()));
}

#[test]
fn test_engine_bail_returns_backend_error() {
    assert_eq!(bail_helper(false).unwrap(), 7);
    match bail_helper(true) {
        Err(Error::BackendError(message)) => assert_eq!(message, "failed with 42"),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_engine_err_builds_backend_error() {
    let err = crate::engine_err!("nebula::Test", "buffer {} too small", 3);
    assert!(matches!(err, Error::BackendError(ref m) if m == "buffer 3 too small"));
}

#[test]
fn test_engine_fail_returns_typed_error() {
    assert!(matches!(fail_helper(), Err(Error::InvalidArgument(_))));
}

#[test]
#[should_panic(expected = "Buffer already mapped: buffer #3")]
fn test_engine_fatal_panics_with_message() {
    crate::engine_fatal!("nebula::Test", Error::AlreadyMapped("buffer #3".to_string()));
}
