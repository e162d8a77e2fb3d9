//! Unit tests for glsl_scan.rs
//!
//! Tests declaration extraction, compile failures and std430 block layout.

use crate::renderer::headless::glsl_scan::{parse_type, scan, std430_layout, ScannedInput, ScannedUniform};
use crate::renderer::{ShaderStage, UniformType};

// ============================================================================
// UNIFORMS AND INPUTS
// ============================================================================

#[test]
fn test_scan_vertex_interface() {
    let source = r#"
        #version 450
        layout(location = 3) in vec4 a_color;
        in vec3 a_position, a_normal;
        uniform mat4 u_modelViewProjection;
        uniform float u_weights[4];
        out vec4 v_color;
        void main() {
            v_color = a_color;
            gl_Position = u_modelViewProjection * vec4(a_position, 1.0);
        }
    "#;

    let interface = scan(ShaderStage::Vertex, source).unwrap();
    assert_eq!(interface.inputs, vec![
        ScannedInput { name: "a_color".to_string(), input_type: UniformType::Vec4, location: Some(3) },
        ScannedInput { name: "a_position".to_string(), input_type: UniformType::Vec3, location: None },
        ScannedInput { name: "a_normal".to_string(), input_type: UniformType::Vec3, location: None },
    ]);
    assert_eq!(interface.uniforms, vec![
        ScannedUniform { name: "u_modelViewProjection".to_string(), uniform_type: UniformType::Mat4, array_size: 1 },
        ScannedUniform { name: "u_weights".to_string(), uniform_type: UniformType::Float, array_size: 4 },
    ]);
    assert!(interface.local_size.is_none());
}

#[test]
fn test_fragment_inputs_are_ignored() {
    let source = "in vec2 v_uv; uniform sampler2D u_albedo; out vec4 color; void main() { color = texture(u_albedo, v_uv); }";
    let interface = scan(ShaderStage::Fragment, source).unwrap();
    assert!(interface.inputs.is_empty());
    assert_eq!(interface.uniforms.len(), 1);
    assert_eq!(interface.uniforms[0].uniform_type, UniformType::Sampler2D);
}

#[test]
fn test_comments_and_initializers_are_skipped() {
    let source = r#"
        // uniform float u_commented;
        /* uniform float u_block_commented; */
        uniform vec3 u_tint = vec3(1.0, 0.5, 0.25), u_other;
        uniform highp int u_mode;
        void helper(float x) { }
        void main() { }
    "#;
    let interface = scan(ShaderStage::Fragment, source).unwrap();
    let names: Vec<&str> = interface.uniforms.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["u_tint", "u_other", "u_mode"]);
}

// ============================================================================
// COMPUTE
// ============================================================================

#[test]
fn test_compute_local_size() {
    let source = "layout(local_size_x = 8, local_size_y = 4) in; void main() { }";
    let interface = scan(ShaderStage::Compute, source).unwrap();
    assert_eq!(interface.local_size, Some([8, 4, 1]));
}

#[test]
fn test_compute_local_size_defaults_to_one() {
    let interface = scan(ShaderStage::Compute, "void main() { }").unwrap();
    assert_eq!(interface.local_size, Some([1, 1, 1]));
}

// ============================================================================
// STORAGE BLOCKS
// ============================================================================

#[test]
fn test_scan_storage_block() {
    let source = r#"
        layout(std430, binding = 2) buffer Particles {
            vec3 origin;
            float speed;
            readonly vec4 positions[];
        } particles;
        void main() { }
    "#;
    let interface = scan(ShaderStage::Compute, source).unwrap();
    assert_eq!(interface.blocks.len(), 1);

    let block = &interface.blocks[0];
    assert_eq!(block.name, "Particles");
    assert_eq!(block.binding, 2);
    let offsets: Vec<(&str, u64)> = block.members.iter().map(|m| (m.name.as_str(), m.offset)).collect();
    assert_eq!(offsets, vec![("origin", 0), ("speed", 12), ("positions[0]", 16)]);
    assert_eq!(block.data_size, 16);
}

#[test]
fn test_std430_sized_array_stride() {
    let members = vec![
        ("count".to_string(), UniformType::UInt, None),
        ("values".to_string(), UniformType::Vec3, Some(2)),
        ("scale".to_string(), UniformType::Float, None),
    ];
    let (laid_out, size) = std430_layout(&members).unwrap();
    assert_eq!(laid_out[0].offset, 0);
    assert_eq!(laid_out[1].offset, 16);
    assert_eq!(laid_out[1].name, "values[0]");
    assert_eq!(laid_out[2].offset, 48);
    assert_eq!(size, 64);
}

#[test]
fn test_std430_rejects_misplaced_unsized_array() {
    let members = vec![
        ("items".to_string(), UniformType::Float, Some(0)),
        ("count".to_string(), UniformType::UInt, None),
    ];
    assert!(std430_layout(&members).unwrap_err().contains("must be the last"));
}

#[test]
fn test_std430_rejects_opaque_member() {
    let members = vec![("tex".to_string(), UniformType::Sampler2D, None)];
    assert!(std430_layout(&members).unwrap_err().contains("opaque"));
}

// ============================================================================
// COMPILE ERRORS
// ============================================================================

#[test]
fn test_missing_main_is_an_error() {
    let error = scan(ShaderStage::Fragment, "uniform float x;").unwrap_err();
    assert_eq!(error, "0:0: error: missing entry point 'void main()'");
}

#[test]
fn test_unbalanced_braces_is_an_error() {
    let error = scan(ShaderStage::Fragment, "void main() { if (true) { }").unwrap_err();
    assert!(error.contains("unbalanced braces"));
}

#[test]
fn test_error_directive_reports_line() {
    let error = scan(ShaderStage::Vertex, "#version 450\n#error unsupported path\nvoid main() { }").unwrap_err();
    assert_eq!(error, "0:2: error: #error unsupported path");
}

#[test]
fn test_unknown_type_is_an_error() {
    let error = scan(ShaderStage::Fragment, "uniform half4 u_color; void main() { }").unwrap_err();
    assert!(error.contains("unknown type 'half4'"));
}

#[test]
fn test_parse_type_families() {
    assert_eq!(parse_type(Some("usampler2D")).unwrap(), UniformType::USampler2D);
    assert_eq!(parse_type(Some("image2DArray")).unwrap(), UniformType::Image2DArray);
    assert_eq!(parse_type(Some("mat3")).unwrap(), UniformType::Mat3);
    assert!(parse_type(None).is_err());
}
