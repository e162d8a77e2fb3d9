/*!
# Nebula Engine

Graphics backend core of the Nebula rendering engine.

This crate turns abstract rendering intent (buffers, textures, programs,
framebuffers, draw and dispatch requests) into calls against a stateful,
context-bound GPU API. Concrete graphics APIs implement the traits of the
`renderer` module; everything above them is API-independent.

## Architecture

- **Context**: thread-affine execution target; one current per thread
- **Resource**: buffers, vertex arrays, textures, render buffers and
  framebuffers, each bound to the context it was created in
- **Program**: compiled render/compute programs with reflected interfaces
  resolved to semantic ids
- **State**: layered uniform and storage block values
- **Pass**: the per-frame render/compute executor

A headless backend (`renderer::headless`) records every command and is used
by the test suite.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod context;
pub mod renderer;
pub mod resource;
pub mod program;
pub mod state;
pub mod pass;

#[cfg(test)]
mod test_support;

// Main nebula namespace module
pub mod nebula {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::{Engine, ResourceRecord};

    // Context and current-context handling
    pub use crate::context::{current, Context, ContextConfig, CurrentGuard};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Backend contract traits and shared enumerations
    pub mod render {
        pub use crate::renderer::*;
    }

    pub mod context {
        pub use crate::context::*;
    }

    pub mod resource {
        pub use crate::resource::*;
    }

    pub mod program {
        pub use crate::program::*;
    }

    pub mod state {
        pub use crate::state::*;
    }

    pub mod pass {
        pub use crate::pass::*;
    }
}

// Re-export math library at crate root
pub use glam;
