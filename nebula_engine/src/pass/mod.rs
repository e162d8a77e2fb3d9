/// Pass module - render queue and render/compute execution

pub mod render_queue;
pub mod executor;

pub use render_queue::*;
pub use executor::*;
