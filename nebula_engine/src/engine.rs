/// Nebula Engine - process-wide singletons
///
/// Holds the global logger and the context table. The context table is the
/// arena every GPU resource is registered in: a context owns one slot table,
/// and a resource's identity is `(ContextId, ResourceSlot)`.

use std::sync::{OnceLock, PoisonError, RwLock};
use slotmap::SlotMap;
use crate::context::{current_label, ContextId, ResourceKind, ResourceSlot, ShareGroupId};
use crate::error::Error;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global context table
static CONTEXTS: OnceLock<RwLock<SlotMap<ContextId, ContextRecord>>> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())))
}

/// Bookkeeping for one live context
struct ContextRecord {
    label: String,
    share_group: ShareGroupId,
    resources: SlotMap<ResourceSlot, ResourceRecord>,
}

/// A live resource registered in its owning context's slot table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub kind: ResourceKind,
    pub label: String,
}

fn contexts() -> &'static RwLock<SlotMap<ContextId, ContextRecord>> {
    CONTEXTS.get_or_init(|| RwLock::new(SlotMap::with_key()))
}

// ===== PUBLIC API =====

/// Engine singleton manager
///
/// All state is global and thread-safe. The context table never hands out
/// references into itself: callers only receive copies and counts.
pub struct Engine;

impl Engine {
    // ===== CONTEXT TABLE =====

    /// Register a new context and allocate its resource slot table
    pub(crate) fn register_context(label: &str, share_group: ShareGroupId) -> ContextId {
        let mut table = contexts().write().unwrap_or_else(PoisonError::into_inner);
        table.insert(ContextRecord {
            label: label.to_string(),
            share_group,
            resources: SlotMap::with_key(),
        })
    }

    /// Remove a context from the table, returning the resources still alive in it
    pub(crate) fn unregister_context(id: ContextId) -> Vec<ResourceRecord> {
        let mut table = contexts().write().unwrap_or_else(PoisonError::into_inner);
        match table.remove(id) {
            Some(record) => record.resources.into_iter().map(|(_, r)| r).collect(),
            None => Vec::new(),
        }
    }

    /// Register a resource in the slot table of `context`
    pub(crate) fn register_resource(context: ContextId, kind: ResourceKind, label: String) -> Option<ResourceSlot> {
        let mut table = contexts().write().unwrap_or_else(PoisonError::into_inner);
        table
            .get_mut(context)
            .map(|record| record.resources.insert(ResourceRecord { kind, label }))
    }

    /// Release a resource slot. Returns false when the slot or its context is already gone.
    pub(crate) fn release_resource(context: ContextId, slot: ResourceSlot) -> bool {
        let mut table = contexts().write().unwrap_or_else(PoisonError::into_inner);
        table
            .get_mut(context)
            .and_then(|record| record.resources.remove(slot))
            .is_some()
    }

    /// Number of live contexts across the process
    pub fn context_count() -> usize {
        contexts().read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of live resources owned by `context` (0 for unknown contexts)
    pub fn live_resources(context: ContextId) -> usize {
        contexts()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(context)
            .map_or(0, |record| record.resources.len())
    }

    /// Snapshot of the resources owned by `context`
    pub fn resource_records(context: ContextId) -> Vec<ResourceRecord> {
        contexts()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(context)
            .map(|record| record.resources.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Label of a live context
    pub fn context_label(context: ContextId) -> Option<String> {
        contexts()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(context)
            .map(|record| record.label.clone())
    }

    /// Share group of a live context
    pub fn context_share_group(context: ContextId) -> Option<ShareGroupId> {
        contexts()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(context)
            .map(|record| record.share_group)
    }

    // ===== LOGGING =====

    /// Replace the process-wide logger
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nebula_engine::nebula::Engine;
    /// use nebula_engine::nebula::log::{DefaultLogger, LogSeverity};
    ///
    /// // Show pass state transitions and per-draw bindings
    /// Engine::set_logger(DefaultLogger::new(LogSeverity::Trace));
    /// ```
    pub fn set_logger<L: Logger + 'static>(new_logger: L) {
        *logger().write().unwrap_or_else(PoisonError::into_inner) = Box::new(new_logger);
    }

    /// Restore the default console logger
    pub fn reset_logger() {
        Self::set_logger(DefaultLogger::default());
    }

    fn dispatch(entry: LogEntry) {
        logger().read().unwrap_or_else(PoisonError::into_inner).log(&entry.with_context(current_label()));
    }

    /// Log without source location (engine_trace! .. engine_warn!)
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(LogEntry::new(severity, source, message));
    }

    /// Log with file:line (engine_error!, engine_fatal!)
    pub fn log_detailed(severity: LogSeverity, source: &str, message: String, file: &'static str, line: u32) {
        Self::dispatch(LogEntry::new(severity, source, message).with_location(file, line));
    }

    /// Log a programmer error at critical severity, then panic with its message
    ///
    /// Used by engine_fatal!.
    pub fn fatal(source: &str, error: Error, file: &'static str, line: u32) -> ! {
        let message = error.to_string();
        Self::log_detailed(LogSeverity::Critical, source, message.clone(), file, line);
        panic!("{}", message);
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
