/// Program module - compile, link and reflect render/compute programs

pub mod program;
pub mod reflection;

pub use program::*;
pub use reflection::*;
