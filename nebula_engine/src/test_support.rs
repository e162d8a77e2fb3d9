//! Shared helpers for unit tests

use std::sync::Arc;
use crate::context::{Context, ContextConfig};
use crate::renderer::headless::HeadlessRenderer;

/// A headless renderer and a context wrapping it
pub(crate) fn headless_context(label: &str) -> (Arc<HeadlessRenderer>, Arc<Context>) {
    let renderer = Arc::new(HeadlessRenderer::new());
    let config = ContextConfig {
        label: label.to_string(),
        ..ContextConfig::default()
    };
    let context = Context::new(renderer.clone(), config);
    (renderer, context)
}

pub(crate) const TRIANGLE_VS: &str = r#"
#version 450
in vec3 a_position;
uniform mat4 u_modelViewProjection;
void main() {
    gl_Position = u_modelViewProjection * vec4(a_position, 1.0);
}
"#;

pub(crate) const TRIANGLE_FS: &str = r#"
#version 450
uniform vec4 u_color;
out vec4 fragColor;
void main() {
    fragColor = u_color;
}
"#;
