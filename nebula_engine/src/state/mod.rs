/// State module - layered uniform and storage block values

pub mod uniform_value;
pub mod state_set;
pub mod mvp_layer;

pub use uniform_value::*;
pub use state_set::*;
pub use mvp_layer::*;
