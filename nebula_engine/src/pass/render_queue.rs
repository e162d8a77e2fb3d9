/// Per-frame render queue

use std::sync::Arc;
use glam::Mat4;
use crate::program::Program;
use crate::renderer::Viewport;
use crate::resource::VertexArray;
use crate::state::{MvpLayer, StateSet};

/// Geometry plus its item-level state
#[derive(Debug, Clone)]
pub struct Drawable {
    pub vertex_array: Arc<VertexArray>,
    /// Highest-precedence layer of every draw of this drawable
    pub state: StateSet,
}

impl Drawable {
    pub fn new(vertex_array: Arc<VertexArray>) -> Self {
        Self { vertex_array, state: StateSet::new() }
    }

    pub fn with_state(vertex_array: Arc<VertexArray>, state: StateSet) -> Self {
        Self { vertex_array, state }
    }
}

/// One queued draw
#[derive(Debug, Clone)]
pub struct RenderQueueEntry {
    pub transform: Mat4,
    pub program: Arc<Program>,
    pub drawable: Arc<Drawable>,
}

/// Pass bookkeeping owned by a context
#[derive(Debug)]
pub struct PassState {
    pub(crate) queue: Vec<RenderQueueEntry>,
    pub(crate) default_viewport: Viewport,
    pub(crate) mvp: MvpLayer,
}

impl PassState {
    pub(crate) fn new(default_viewport: Viewport) -> Self {
        Self {
            queue: Vec::new(),
            default_viewport,
            mvp: MvpLayer::new(),
        }
    }
}
