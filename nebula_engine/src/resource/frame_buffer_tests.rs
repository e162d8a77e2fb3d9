//! Unit tests for frame_buffer.rs
//!
//! Tests attachment validation, clear recording and the default framebuffer.

use std::sync::Arc;
use crate::error::Error;
use crate::renderer::headless::{Command, HeadlessFrameBuffer, HeadlessSurface};
use crate::renderer::{
    AttachmentPoint, BlendAttachmentState, BlendFactor, ClearColor, ClearMask, ColorWriteMask,
    CompareFunc, CullFace, DepthState, FaceCulling, FrontFace, PixelFormat,
};
use crate::resource::{Attachment, FrameBuffer, Levels, RenderBuffer, Texture};
use crate::resource::frame_buffer::check_point_format;
use crate::test_support::headless_context;

fn backend(frame_buffer: &FrameBuffer) -> &HeadlessFrameBuffer {
    frame_buffer.backend().as_any().downcast_ref::<HeadlessFrameBuffer>().unwrap()
}

// ============================================================================
// FORMAT CHECK TESTS
// ============================================================================

#[test]
fn test_point_format_rules() {
    assert!(check_point_format(AttachmentPoint::Color(0), PixelFormat::RGBA8).is_ok());
    assert!(check_point_format(AttachmentPoint::Color(7), PixelFormat::R32UI).is_ok());
    assert!(check_point_format(AttachmentPoint::Depth, PixelFormat::Depth24Stencil8).is_ok());
    assert!(check_point_format(AttachmentPoint::DepthStencil, PixelFormat::Depth32FStencil8).is_ok());

    let rejected = [
        (AttachmentPoint::Color(8), PixelFormat::RGBA8),
        (AttachmentPoint::Color(0), PixelFormat::Depth24),
        (AttachmentPoint::Depth, PixelFormat::RGBA8),
        (AttachmentPoint::Stencil, PixelFormat::Depth32F),
        (AttachmentPoint::DepthStencil, PixelFormat::Depth24),
    ];
    for (point, format) in rejected {
        assert!(matches!(check_point_format(point, format), Err(Error::UnsupportedFormat(_))));
    }
}

// ============================================================================
// ATTACHMENT TESTS
// ============================================================================

#[test]
fn test_attachments_reach_backend() {
    let (_renderer, context) = headless_context("frame_buffer_attach");
    let _guard = context.make_current().unwrap();

    let color = Texture::new_2d(PixelFormat::RGBA8, 4, 4, Levels::Count(1)).unwrap();
    let depth = RenderBuffer::new(PixelFormat::Depth24Stencil8, 4, 4, 0).unwrap();
    let frame_buffer = FrameBuffer::new().unwrap();

    frame_buffer.attach_texture(AttachmentPoint::Color(2), &color, 0, None).unwrap();
    frame_buffer.attach_render_buffer(AttachmentPoint::DepthStencil, &depth).unwrap();

    assert_eq!(
        frame_buffer.attachment_points(),
        vec![AttachmentPoint::Color(2), AttachmentPoint::DepthStencil]
    );
    let attachments = backend(&frame_buffer).attachments();
    assert!(matches!(
        attachments.get(&AttachmentPoint::Color(2)),
        Some(HeadlessSurface::Texture { level: 0, layer: None, .. })
    ));
    assert!(matches!(attachments.get(&AttachmentPoint::DepthStencil), Some(HeadlessSurface::RenderBuffer(_))));
    assert_eq!(backend(&frame_buffer).draw_buffers(), vec![2]);
    assert_eq!(context.live_resources(), 3);
}

#[test]
fn test_size_is_smallest_attachment() {
    let (_renderer, context) = headless_context("frame_buffer_size");
    let _guard = context.make_current().unwrap();

    let frame_buffer = FrameBuffer::new().unwrap();
    assert_eq!(frame_buffer.size(), None);

    let large = Texture::new_2d(PixelFormat::RGBA8, 8, 8, Levels::Auto).unwrap();
    let small = RenderBuffer::new(PixelFormat::Depth32F, 6, 10, 0).unwrap();
    frame_buffer.attach_texture(AttachmentPoint::Color(0), &large, 1, None).unwrap();
    assert_eq!(frame_buffer.size(), Some((4, 4)));

    frame_buffer.attach_render_buffer(AttachmentPoint::Depth, &small).unwrap();
    assert_eq!(frame_buffer.size(), Some((4, 4)));
    frame_buffer.attach_texture(AttachmentPoint::Color(0), &large, 0, None).unwrap();
    assert_eq!(frame_buffer.size(), Some((6, 8)));
}

#[test]
fn test_attach_rejects_bad_level_and_layer() {
    let (_renderer, context) = headless_context("frame_buffer_bad_attach");
    let _guard = context.make_current().unwrap();

    let frame_buffer = FrameBuffer::new().unwrap();
    let array = Texture::new_2d_array(PixelFormat::RGBA8, 4, 4, 3, Levels::Count(1)).unwrap();

    assert!(matches!(
        frame_buffer.attach_texture(AttachmentPoint::Color(0), &array, 1, None),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        frame_buffer.attach_texture(AttachmentPoint::Color(0), &array, 0, Some(3)),
        Err(Error::InvalidArgument(_))
    ));
    frame_buffer.attach_texture(AttachmentPoint::Color(0), &array, 0, Some(2)).unwrap();

    let depth = Texture::new_2d(PixelFormat::Depth32F, 4, 4, Levels::Count(1)).unwrap();
    assert!(matches!(
        frame_buffer.attach_texture(AttachmentPoint::Color(1), &depth, 0, None),
        Err(Error::UnsupportedFormat(_))
    ));
    assert_eq!(frame_buffer.attachment_points(), vec![AttachmentPoint::Color(0)]);
}

#[test]
fn test_detach() {
    let (_renderer, context) = headless_context("frame_buffer_detach");
    let _guard = context.make_current().unwrap();

    let frame_buffer = FrameBuffer::new().unwrap();
    let color = Texture::new_2d(PixelFormat::RGBA8, 2, 2, Levels::Count(1)).unwrap();
    frame_buffer.attach_texture(AttachmentPoint::Color(0), &color, 0, None).unwrap();
    frame_buffer.attach_texture(AttachmentPoint::Color(1), &color, 0, None).unwrap();
    assert_eq!(backend(&frame_buffer).draw_buffers(), vec![0, 1]);

    assert!(frame_buffer.detach(AttachmentPoint::Color(0)).unwrap());
    assert!(!frame_buffer.detach(AttachmentPoint::Color(0)).unwrap());
    assert!(!frame_buffer.detach(AttachmentPoint::Depth).unwrap());
    assert_eq!(backend(&frame_buffer).draw_buffers(), vec![1]);
    assert!(frame_buffer.attachment(AttachmentPoint::Color(0)).is_none());
    assert!(matches!(frame_buffer.attachment(AttachmentPoint::Color(1)), Some(Attachment::Texture { .. })));
}

#[test]
fn test_attachment_keeps_texture_alive() {
    let (_renderer, context) = headless_context("frame_buffer_keepalive");
    let _guard = context.make_current().unwrap();

    let frame_buffer = FrameBuffer::new().unwrap();
    let color = Texture::new_2d(PixelFormat::RGBA8, 2, 2, Levels::Count(1)).unwrap();
    frame_buffer.attach_texture(AttachmentPoint::Color(0), &color, 0, None).unwrap();
    drop(color);
    assert_eq!(context.live_resources(), 2);

    frame_buffer.detach(AttachmentPoint::Color(0)).unwrap();
    assert_eq!(context.live_resources(), 1);
}

// ============================================================================
// CLEAR TESTS
// ============================================================================

#[test]
fn test_clear_records_selected_attachments() {
    let (renderer, context) = headless_context("frame_buffer_clear");
    let _guard = context.make_current().unwrap();

    let frame_buffer = FrameBuffer::new().unwrap();
    let color = Texture::new_2d(PixelFormat::RGBA8, 2, 2, Levels::Count(1)).unwrap();
    let depth = RenderBuffer::new(PixelFormat::Depth24Stencil8, 2, 2, 0).unwrap();
    frame_buffer.attach_texture(AttachmentPoint::Color(0), &color, 0, None).unwrap();
    frame_buffer.attach_render_buffer(AttachmentPoint::DepthStencil, &depth).unwrap();
    frame_buffer.set_clear_color(0, ClearColor::Float([1.0, 0.0, 0.0, 1.0]));
    frame_buffer.set_clear_depth(0.5);
    frame_buffer.set_clear_stencil(3);

    frame_buffer.clear().unwrap();
    let name = backend(&frame_buffer).name();
    assert_eq!(
        renderer.take_commands(),
        vec![
            Command::BindFrameBuffer { frame_buffer: name },
            Command::ClearColor { attachment: 0, value: ClearColor::Float([1.0, 0.0, 0.0, 1.0]) },
            Command::ClearDepthStencil { depth: Some(0.5), stencil: Some(3) },
        ]
    );

    frame_buffer.set_clear_mask(ClearMask::DEPTH);
    frame_buffer.clear().unwrap();
    assert_eq!(
        renderer.take_commands(),
        vec![
            Command::BindFrameBuffer { frame_buffer: name },
            Command::ClearDepthStencil { depth: Some(0.5), stencil: None },
        ]
    );
}

#[test]
fn test_clear_skips_missing_attachments() {
    let (renderer, context) = headless_context("frame_buffer_clear_missing");
    let _guard = context.make_current().unwrap();

    let frame_buffer = FrameBuffer::new().unwrap();
    let color = Texture::new_2d(PixelFormat::RGBA8UI, 2, 2, Levels::Count(1)).unwrap();
    frame_buffer.attach_texture(AttachmentPoint::Color(1), &color, 0, None).unwrap();
    frame_buffer.set_clear_color(1, ClearColor::UInt([7, 0, 0, 0]));

    frame_buffer.clear().unwrap();
    let commands = renderer.take_commands();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[1], Command::ClearColor { attachment: 1, value: ClearColor::UInt([7, 0, 0, 0]) });
}

#[test]
fn test_clear_color_index_out_of_range() {
    let (_renderer, context) = headless_context("frame_buffer_clear_index");
    let _guard = context.make_current().unwrap();

    let frame_buffer = FrameBuffer::new().unwrap();
    frame_buffer.set_clear_color(8, ClearColor::Int([1, 1, 1, 1]));
    assert_eq!(frame_buffer.clear_color(0), Some(ClearColor::default()));
    assert_eq!(frame_buffer.clear_color(8), None);
}

// ============================================================================
// DEFAULT FRAMEBUFFER TESTS
// ============================================================================

#[test]
fn test_default_frame_buffer_ignores_attachments() {
    let (renderer, context) = headless_context("frame_buffer_default");
    let _guard = context.make_current().unwrap();

    let frame_buffer = context.default_frame_buffer();
    let color = Texture::new_2d(PixelFormat::RGBA8, 2, 2, Levels::Count(1)).unwrap();

    assert!(frame_buffer.is_default());
    frame_buffer.attach_texture(AttachmentPoint::Color(0), &color, 0, None).unwrap();
    assert!(frame_buffer.attachment_points().is_empty());
    assert!(!frame_buffer.detach(AttachmentPoint::Color(0)).unwrap());
    assert_eq!(frame_buffer.size(), None);

    frame_buffer.set_clear_depth(0.25);
    assert_eq!(frame_buffer.clear_depth(), 1.0);

    frame_buffer.clear().unwrap();
    assert_eq!(
        renderer.take_commands(),
        vec![
            Command::BindFrameBuffer { frame_buffer: 0 },
            Command::ClearColor { attachment: 0, value: ClearColor::default() },
            Command::ClearDepthStencil { depth: Some(1.0), stencil: Some(0) },
        ]
    );
    drop(frame_buffer);
    assert_eq!(context.live_resources(), 1);
}

// ============================================================================
// PIPELINE STATE TESTS
// ============================================================================

#[test]
fn test_pipeline_setters() {
    let (_renderer, context) = headless_context("frame_buffer_pipeline");
    let _guard = context.make_current().unwrap();

    let frame_buffer = FrameBuffer::new().unwrap();
    let culling = FaceCulling { enabled: true, face: CullFace::Front, front_face: FrontFace::Clockwise };
    frame_buffer.set_face_culling(culling);
    frame_buffer.set_color_mask(1, ColorWriteMask::NONE);
    frame_buffer.set_color_mask(9, ColorWriteMask::NONE);
    frame_buffer.set_depth_state(DepthState { test_enabled: false, func: CompareFunc::Always, write_enabled: false });
    frame_buffer.set_blend_enabled(true);
    frame_buffer.set_blend_attachment(0, BlendAttachmentState {
        src_color: BlendFactor::SrcAlpha,
        dst_color: BlendFactor::OneMinusSrcAlpha,
        ..BlendAttachmentState::default()
    });
    frame_buffer.set_blend_constant([0.1, 0.2, 0.3, 0.4]);

    let state = frame_buffer.pipeline_state();
    assert_eq!(state.culling, culling);
    assert_eq!(state.color_masks[0], ColorWriteMask::ALL);
    assert_eq!(state.color_masks[1], ColorWriteMask::NONE);
    assert!(!state.depth.test_enabled);
    assert!(state.blend.enabled);
    assert_eq!(state.blend.attachments[0].dst_color, BlendFactor::OneMinusSrcAlpha);
    assert_eq!(state.blend.attachments[1], BlendAttachmentState::default());
    assert_eq!(state.blend.constant, [0.1, 0.2, 0.3, 0.4]);
}

#[test]
fn test_pipeline_state_replaced_whole() {
    let (_renderer, context) = headless_context("frame_buffer_pipeline_state");
    let _guard = context.make_current().unwrap();

    let frame_buffer = FrameBuffer::new().unwrap();
    let mut state = frame_buffer.pipeline_state();
    state.depth.func = CompareFunc::Greater;
    state.color_masks[2] = ColorWriteMask::NONE;
    frame_buffer.set_pipeline_state(state);

    assert_eq!(frame_buffer.pipeline_state(), state);
}

#[test]
fn test_frame_buffer_drop_releases_backend() {
    let (renderer, context) = headless_context("frame_buffer_drop");
    let _guard = context.make_current().unwrap();

    let frame_buffer: Arc<FrameBuffer> = FrameBuffer::new().unwrap();
    assert_eq!(renderer.live_objects(), 1);
    drop(frame_buffer);
    assert_eq!(renderer.live_objects(), 0);
    assert_eq!(context.live_resources(), 0);
}
