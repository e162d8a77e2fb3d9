/// Context module - current context, share groups, resource affinity, semantics

pub mod context;
pub mod semantic;

pub use context::*;
pub use semantic::*;
