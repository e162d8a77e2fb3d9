//! Resource model
//!
//! Context-bound GPU resources. Every resource registers itself in the slot
//! table of the context current at creation and checks affinity on each call.

pub mod buffer;
pub mod vertex_array;
pub mod texture;
pub mod render_buffer;
pub mod frame_buffer;
pub mod mesh;
pub mod image;

pub use buffer::{grown_capacity, Buffer, DynamicBuffer, MappedView};
pub use vertex_array::{MeshLayout, PrimitiveSet, VertexArray, VertexAttribute, VertexBinding};
pub use texture::{Levels, Texture};
pub use render_buffer::RenderBuffer;
pub use frame_buffer::{Attachment, FrameBuffer};
pub use mesh::{MeshAttribute, MeshData, MeshIndices, MeshPrimitive};
pub use image::ImageData;
