//! Integration tests for the public API with the headless backend
//!
//! No GPU is required: every command is recorded by HeadlessRenderer.

use std::sync::Arc;
use nebula_engine::glam::Mat4;
use nebula_engine::nebula::context::AttributeSemantic;
use nebula_engine::nebula::pass::{compute_workgroups, Drawable};
use nebula_engine::nebula::program::Program;
use nebula_engine::nebula::render::headless::{Command, HeadlessRenderer};
use nebula_engine::nebula::render::{
    AttachmentPoint, MapAccess, PixelFormat, PrimitiveType, ShaderStage, UniformData,
};
use nebula_engine::nebula::resource::{
    Buffer, DynamicBuffer, FrameBuffer, Levels, PrimitiveSet, Texture, VertexArray, VertexAttribute,
};
use nebula_engine::nebula::state::StateSet;
use nebula_engine::nebula::{Context, ContextConfig, Engine, Error};

const VERTEX: &str = r#"
#version 450
in vec3 a_position;
uniform mat4 u_modelViewProjection;
void main() {
    gl_Position = u_modelViewProjection * vec4(a_position, 1.0);
}
"#;

const FRAGMENT: &str = r#"
#version 450
uniform vec4 u_color;
out vec4 fragColor;
void main() {
    fragColor = u_color;
}
"#;

const COMPUTE: &str = r#"
#version 450
layout(local_size_x = 64) in;
layout(std430, binding = 0) buffer Particles {
    vec4 positions[];
};
void main() { }
"#;

fn context(label: &str) -> (Arc<HeadlessRenderer>, Arc<Context>) {
    let renderer = Arc::new(HeadlessRenderer::new());
    let config = ContextConfig { label: label.to_string(), ..ContextConfig::default() };
    let context = Context::new(renderer.clone(), config);
    (renderer, context)
}

fn triangle() -> Arc<VertexArray> {
    let positions: [f32; 9] = [-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0];
    let buffer = Buffer::from_data(bytemuck::cast_slice(&positions)).unwrap();
    let vertex_array = VertexArray::new().unwrap();
    let slot = vertex_array.attach_vertex_buffer(&buffer, 0, 12).unwrap();
    vertex_array.declare_attribute(AttributeSemantic::Position, VertexAttribute::float(slot, 3)).unwrap();
    vertex_array.add_primitive_set(PrimitiveSet::Arrays { primitive: PrimitiveType::Triangles, first: 0, count: 3 });
    vertex_array
}

fn color_of(commands: &[Command], location: i32) -> Vec<UniformData> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::SetUniform { location: l, value } if *l == location => Some(*value),
            _ => None,
        })
        .collect()
}

// ============================================================================
// INTEGRATION TESTS
// ============================================================================

#[test]
fn test_integration_red_triangle_into_offscreen_target() {
    let (renderer, context) = context("scenario_triangle");
    let _guard = context.make_current().unwrap();

    let color = Texture::new_2d(PixelFormat::RGBA8, 2, 2, Levels::Count(1)).unwrap();
    let target = FrameBuffer::new().unwrap();
    target.attach_texture(AttachmentPoint::Color(0), &color, 0, None).unwrap();

    let program = Program::new_render(&[(ShaderStage::Vertex, VERTEX), (ShaderStage::Fragment, FRAGMENT)]).unwrap();
    let mut item = StateSet::new();
    item.set_uniform("u_color", [1.0f32, 0.0, 0.0, 1.0]);

    context.add_entry(Mat4::IDENTITY, Arc::clone(&program), Arc::new(Drawable::with_state(triangle(), item)));
    renderer.clear_commands();
    context.render(&target, None, &StateSet::new()).unwrap();

    let commands = renderer.take_commands();
    let draws: Vec<&Command> = commands.iter().filter(|c| matches!(c, Command::DrawArrays { .. })).collect();
    assert_eq!(draws, vec![&Command::DrawArrays { primitive: PrimitiveType::Triangles, first: 0, count: 3 }]);

    let location = program.uniform("u_color").unwrap().location;
    assert_eq!(color_of(&commands, location), vec![UniformData::Vec4([1.0, 0.0, 0.0, 1.0])]);
}

#[test]
fn test_integration_item_layer_overrides_then_falls_back() {
    let (renderer, context) = context("scenario_layers");
    let _guard = context.make_current().unwrap();

    let program = Program::new_render(&[(ShaderStage::Vertex, VERTEX), (ShaderStage::Fragment, FRAGMENT)]).unwrap();
    let location = program.uniform("u_color").unwrap().location;
    let target = context.default_frame_buffer();
    let mut global = StateSet::new();
    global.set_uniform("u_color", [1.0f32; 4]);

    let mut item = StateSet::new();
    item.set_uniform("u_color", [2.0f32; 4]);
    context.add_entry(Mat4::IDENTITY, Arc::clone(&program), Arc::new(Drawable::with_state(triangle(), item.clone())));
    renderer.clear_commands();
    context.render(&target, None, &global).unwrap();
    assert_eq!(color_of(&renderer.take_commands(), location), vec![UniformData::Vec4([2.0; 4])]);

    item.remove_uniform("u_color");
    context.clear_queue();
    context.add_entry(Mat4::IDENTITY, Arc::clone(&program), Arc::new(Drawable::with_state(triangle(), item)));
    context.render(&target, None, &global).unwrap();
    assert_eq!(color_of(&renderer.take_commands(), location), vec![UniformData::Vec4([1.0; 4])]);
}

#[test]
fn test_integration_resources_follow_their_context() {
    let (renderer, first) = context("scenario_first");
    let shared = Context::new_shared(&first, renderer.clone(), ContextConfig::default());
    let (_other_renderer, other) = context("scenario_other");

    let buffer = {
        let _guard = first.make_current().unwrap();
        Buffer::new(16, None).unwrap()
    };
    assert_eq!(Engine::live_resources(first.id()), 1);
    assert!(!other.is_compatible(buffer.owner().context(), first.share_group()));
    assert!(shared.is_compatible(buffer.owner().context(), first.share_group()));

    {
        let _guard = shared.make_current().unwrap();
        buffer.write(0, &[1, 2, 3, 4]).unwrap();
    }

    let guard = other.make_current().unwrap();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| buffer.read(0, 4)));
    assert!(result.is_err());
    drop(guard);

    let _guard = first.make_current().unwrap();
    assert_eq!(buffer.read(0, 4).unwrap(), vec![1, 2, 3, 4]);
    drop(buffer);
    assert_eq!(Engine::live_resources(first.id()), 0);
}

#[test]
fn test_integration_dynamic_buffer_grows_geometrically() {
    let (_renderer, context) = context("scenario_dynamic");
    let _guard = context.make_current().unwrap();

    let buffer = DynamicBuffer::new(8).unwrap();
    assert_eq!(buffer.append(&[1; 6]).unwrap(), 0);
    assert_eq!(buffer.append(&[2; 6]).unwrap(), 6);
    assert_eq!(buffer.capacity(), 16);
    assert_eq!(buffer.append(&[3; 30]).unwrap(), 12);
    assert_eq!(buffer.capacity(), 42);
    assert_eq!(buffer.size(), 42);
    assert_eq!(buffer.buffer().read(4, 4).unwrap(), vec![1, 1, 2, 2]);
}

#[test]
fn test_integration_buffer_has_one_mapped_view_at_a_time() {
    let (_renderer, context) = context("scenario_map");
    let _guard = context.make_current().unwrap();

    let buffer = Buffer::new(32, None).unwrap();
    {
        let mut view = buffer.map(MapAccess::ReadWrite, 0, 32).unwrap();
        view[0] = 9;
        assert!(matches!(buffer.try_map(MapAccess::ReadOnly, 0, 4), Err(Error::AlreadyMapped(_))));
    }
    assert!(!buffer.is_mapped());
    assert_eq!(buffer.read(0, 1).unwrap(), vec![9]);
}

#[test]
fn test_integration_detaching_a_buffer_drops_its_attributes() {
    let (_renderer, context) = context("scenario_detach");
    let _guard = context.make_current().unwrap();

    let vertex_array = triangle();
    let removed = vertex_array.detach_vertex_buffer(0).unwrap();
    assert_eq!(removed, vec![AttributeSemantic::Position]);
    assert!(vertex_array.attribute(AttributeSemantic::Position).is_none());
}

#[test]
fn test_integration_reflection_reports_declared_interface() {
    let (_renderer, context) = context("scenario_reflection");
    let _guard = context.make_current().unwrap();

    let program = Program::new_render(&[(ShaderStage::Vertex, VERTEX), (ShaderStage::Fragment, FRAGMENT)]).unwrap();
    let mut names: Vec<&str> = program.uniforms().iter().map(|u| u.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["u_color", "u_modelViewProjection"]);
    assert_eq!(program.attributes().len(), 1);
    assert_eq!(program.attributes()[0].semantic, Some(AttributeSemantic::Position));
}

#[test]
fn test_integration_dispatch_covers_every_invocation() {
    let (renderer, context) = context("scenario_dispatch");
    let _guard = context.make_current().unwrap();

    let program = Program::new_compute(COMPUTE).unwrap();
    let mut global = StateSet::new();
    global.set_storage_block("Particles", Buffer::new(1024, None).unwrap());

    renderer.clear_commands();
    context.compute(&program, [130, 1, 1], &global).unwrap();
    assert!(renderer.take_commands().contains(&Command::Dispatch { groups: [3, 1, 1] }));

    context.compute(&program, [0, 1, 1], &global).unwrap();
    assert!(renderer.take_commands().is_empty());
    assert_eq!(compute_workgroups([1, 1, 1], [64, 1, 1]), Some([1, 1, 1]));
}
