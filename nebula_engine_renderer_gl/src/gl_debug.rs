/// Driver debug output - forwards KHR_debug messages to the engine logger
///
/// Messages are counted per severity so applications can report how noisy
/// the driver was after a run.

use std::sync::atomic::{AtomicU32, Ordering};
use gl::types::GLenum;
use nebula_engine::{engine_error, engine_trace, engine_warn};

/// Global message counters (thread-safe atomics)
static MESSAGE_STATS: DebugMessageCounter = DebugMessageCounter::new();

/// Snapshot of driver debug message counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugMessageStats {
    /// High severity messages
    pub errors: u32,
    /// Medium and low severity messages
    pub warnings: u32,
    pub notifications: u32,
}

struct DebugMessageCounter {
    errors: AtomicU32,
    warnings: AtomicU32,
    notifications: AtomicU32,
}

impl DebugMessageCounter {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            notifications: AtomicU32::new(0),
        }
    }

    fn snapshot(&self) -> DebugMessageStats {
        DebugMessageStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            notifications: self.notifications.load(Ordering::Relaxed),
        }
    }
}

/// Counts of driver messages received since startup
pub fn debug_message_stats() -> DebugMessageStats {
    MESSAGE_STATS.snapshot()
}

/// Count and log one driver message
#[cfg_attr(not(feature = "gl-debug-output"), allow(dead_code))]
pub(crate) fn record_message(severity: GLenum, id: u32, text: &str) {
    match severity {
        gl::DEBUG_SEVERITY_HIGH => {
            MESSAGE_STATS.errors.fetch_add(1, Ordering::Relaxed);
            engine_error!("nebula::gl", "[0x{:X}] {}", id, text);
        }
        gl::DEBUG_SEVERITY_MEDIUM | gl::DEBUG_SEVERITY_LOW => {
            MESSAGE_STATS.warnings.fetch_add(1, Ordering::Relaxed);
            engine_warn!("nebula::gl", "[0x{:X}] {}", id, text);
        }
        _ => {
            MESSAGE_STATS.notifications.fetch_add(1, Ordering::Relaxed);
            engine_trace!("nebula::gl", "[0x{:X}] {}", id, text);
        }
    }
}

/// Install the debug callback on the current context
#[cfg(feature = "gl-debug-output")]
pub(crate) fn install() -> bool {
    if !gl::DebugMessageCallback::is_loaded() {
        return false;
    }
    unsafe {
        gl::Enable(gl::DEBUG_OUTPUT);
        // Report messages on the thread and call that caused them
        gl::Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
        gl::DebugMessageCallback(Some(on_message), std::ptr::null());
    }
    true
}

#[cfg(not(feature = "gl-debug-output"))]
pub(crate) fn install() -> bool {
    false
}

#[cfg(feature = "gl-debug-output")]
extern "system" fn on_message(
    _source: GLenum,
    _kind: GLenum,
    id: gl::types::GLuint,
    severity: GLenum,
    length: gl::types::GLsizei,
    message: *const gl::types::GLchar,
    _user: *mut std::ffi::c_void,
) {
    if message.is_null() {
        return;
    }
    let text = unsafe {
        if length >= 0 {
            let bytes = std::slice::from_raw_parts(message as *const u8, length as usize);
            String::from_utf8_lossy(bytes).into_owned()
        } else {
            std::ffi::CStr::from_ptr(message).to_string_lossy().into_owned()
        }
    };
    record_message(severity, id, text.trim_end());
}

#[cfg(test)]
#[path = "gl_debug_tests.rs"]
mod tests;
