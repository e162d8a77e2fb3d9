//! Error types for the Nebula engine
//!
//! Two kinds of failure flow through the backend. Expected runtime failures
//! (shader compilation, link, unsupported pixel formats, invalid arguments)
//! are returned as `Err`. Invariant violations caused by the calling code
//! (context mismatch, double map, unresolved uniforms...) are fatal: they
//! are logged at critical severity and the thread panics.

use std::fmt;
use crate::renderer::{ShaderStage, UniformType};

/// Result type for Nebula engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nebula engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (OpenGL, headless, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, program, etc.)
    InvalidResource(String),

    /// Initialization failed (context, renderer, subsystems)
    InitializationFailed(String),

    /// A caller-supplied argument is out of range or inconsistent
    InvalidArgument(String),

    /// The pixel format or image layout cannot be used for this operation
    UnsupportedFormat(String),

    /// A shader stage failed to compile
    ShaderCompilation {
        stage: ShaderStage,
        log: String,
    },

    /// A program failed to link
    ProgramLink {
        log: String,
    },

    /// A resource was created or used with no current context
    NoCurrentContext(String),

    /// A resource was used while an incompatible context is current
    ContextMismatch {
        resource: String,
        owner: String,
        current: String,
    },

    /// A buffer already has an open mapped view
    AlreadyMapped(String),

    /// A reflected uniform or storage block has no value in any state layer
    UniformUnresolved(String),

    /// A resolved uniform value does not match the reflected declaration
    UniformTypeMismatch {
        name: String,
        expected: UniformType,
        found: String,
    },

    /// A program input is not provided by the bound vertex array
    VertexAttributeMismatch(String),

    /// A required resource binding is missing
    NullResource(String),
}

impl Error {
    /// Whether this error reports a programmer error rather than a runtime failure
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::NoCurrentContext(_)
                | Error::ContextMismatch { .. }
                | Error::AlreadyMapped(_)
                | Error::UniformUnresolved(_)
                | Error::UniformTypeMismatch { .. }
                | Error::VertexAttributeMismatch(_)
                | Error::NullResource(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            Error::ShaderCompilation { stage, log } => {
                write!(f, "Shader compilation failed ({:?} stage): {}", stage, log)
            }
            Error::ProgramLink { log } => write!(f, "Program link failed: {}", log),
            Error::NoCurrentContext(msg) => write!(f, "No current context: {}", msg),
            Error::ContextMismatch { resource, owner, current } => write!(
                f,
                "Context mismatch: {} belongs to context '{}' but context '{}' is current",
                resource, owner, current
            ),
            Error::AlreadyMapped(msg) => write!(f, "Buffer already mapped: {}", msg),
            Error::UniformUnresolved(name) => write!(f, "Uniform unresolved: '{}'", name),
            Error::UniformTypeMismatch { name, expected, found } => write!(
                f,
                "Uniform type mismatch: '{}' is declared {:?} but the resolved value is {}",
                name, expected, found
            ),
            Error::VertexAttributeMismatch(msg) => write!(f, "Vertex attribute mismatch: {}", msg),
            Error::NullResource(msg) => write!(f, "Null resource: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an `Error::BackendError` carrying it
///
/// # Example
///
/// ```ignore
/// return Err(engine_err!("nebula::Buffer", "Buffer size {} is too large", size));
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::nebula::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return `Err(Error::BackendError(..))`
///
/// # Example
///
/// ```ignore
/// engine_bail!("nebula::Texture", "Texture must have at least one level");
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log a typed error and return it
///
/// # Example
///
/// ```ignore
/// engine_fail!("nebula::Texture", Error::InvalidArgument("width is 0".to_string()));
/// ```
#[macro_export]
macro_rules! engine_fail {
    ($source:expr, $error:expr) => {{
        let error = $error;
        $crate::engine_error!($source, "{}", error);
        return Err(error);
    }};
}

/// Log a programmer error at critical severity and panic
///
/// # Example
///
/// ```ignore
/// engine_fatal!("nebula::Buffer", Error::AlreadyMapped("buffer #3".to_string()));
/// ```
#[macro_export]
macro_rules! engine_fatal {
    ($source:expr, $error:expr) => {
        $crate::nebula::Engine::fatal($source, $error, file!(), line!())
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
