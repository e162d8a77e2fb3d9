/// Conversion tables between engine enumerations and GL constants
///
/// Forward tables are arrays indexed by the engine enum's ordinal, so every
/// variant has exactly one GL constant. Reverse lookups return `None` for
/// constants the engine does not know.

use gl::types::{GLbitfield, GLenum};
use nebula_engine::nebula::render::{
    AttachmentPoint, BlendEquation, BlendFactor, CompareFunc, ComponentType, CullFace, Filter,
    FrontFace, ImageAccess, IndexType, MapAccess, MemoryBarrier, PixelFormat, PrimitiveType,
    ShaderStage, StencilOp, Swizzle, TextureType, UniformType, Wrap,
};

/// Declare a forward table and its reverse lookup from one ordered list
macro_rules! conversion_table {
    ($table:ident, $reverse:ident, $enum:ident { $($variant:ident => $gl:ident),* $(,)? }) => {
        pub const $table: [GLenum; $enum::COUNT] = [$(gl::$gl),*];

        pub fn $reverse(value: GLenum) -> Option<$enum> {
            match value {
                $(gl::$gl => Some($enum::$variant),)*
                _ => None,
            }
        }
    };
}

// ===== SCALARS AND FORMATS =====

conversion_table!(COMPONENT_TYPES, component_type_from_gl, ComponentType {
    Byte => BYTE,
    UByte => UNSIGNED_BYTE,
    Short => SHORT,
    UShort => UNSIGNED_SHORT,
    Int => INT,
    UInt => UNSIGNED_INT,
    HalfFloat => HALF_FLOAT,
    Float => FLOAT,
    Double => DOUBLE,
});

conversion_table!(PIXEL_FORMATS, pixel_format_from_gl, PixelFormat {
    R8 => R8,
    RG8 => RG8,
    RGB8 => RGB8,
    RGBA8 => RGBA8,
    SRGB8 => SRGB8,
    SRGB8Alpha8 => SRGB8_ALPHA8,
    R16 => R16,
    RGBA16 => RGBA16,
    R16F => R16F,
    RG16F => RG16F,
    RGB16F => RGB16F,
    RGBA16F => RGBA16F,
    R32F => R32F,
    RG32F => RG32F,
    RGB32F => RGB32F,
    RGBA32F => RGBA32F,
    R11FG11FB10F => R11F_G11F_B10F,
    R8I => R8I,
    R8UI => R8UI,
    R16I => R16I,
    R16UI => R16UI,
    R32I => R32I,
    R32UI => R32UI,
    RG32I => RG32I,
    RG32UI => RG32UI,
    RGBA8I => RGBA8I,
    RGBA8UI => RGBA8UI,
    RGBA32I => RGBA32I,
    RGBA32UI => RGBA32UI,
    Depth16 => DEPTH_COMPONENT16,
    Depth24 => DEPTH_COMPONENT24,
    Depth32F => DEPTH_COMPONENT32F,
    Depth24Stencil8 => DEPTH24_STENCIL8,
    Depth32FStencil8 => DEPTH32F_STENCIL8,
    Stencil8 => STENCIL_INDEX8,
});

/// Client-side (format, type) pair matching each pixel format's stored layout
pub const PIXEL_TRANSFERS: [(GLenum, GLenum); PixelFormat::COUNT] = [
    (gl::RED, gl::UNSIGNED_BYTE),
    (gl::RG, gl::UNSIGNED_BYTE),
    (gl::RGB, gl::UNSIGNED_BYTE),
    (gl::RGBA, gl::UNSIGNED_BYTE),
    (gl::RGB, gl::UNSIGNED_BYTE),
    (gl::RGBA, gl::UNSIGNED_BYTE),
    (gl::RED, gl::UNSIGNED_SHORT),
    (gl::RGBA, gl::UNSIGNED_SHORT),
    (gl::RED, gl::HALF_FLOAT),
    (gl::RG, gl::HALF_FLOAT),
    (gl::RGB, gl::HALF_FLOAT),
    (gl::RGBA, gl::HALF_FLOAT),
    (gl::RED, gl::FLOAT),
    (gl::RG, gl::FLOAT),
    (gl::RGB, gl::FLOAT),
    (gl::RGBA, gl::FLOAT),
    (gl::RGB, gl::UNSIGNED_INT_10F_11F_11F_REV),
    (gl::RED_INTEGER, gl::BYTE),
    (gl::RED_INTEGER, gl::UNSIGNED_BYTE),
    (gl::RED_INTEGER, gl::SHORT),
    (gl::RED_INTEGER, gl::UNSIGNED_SHORT),
    (gl::RED_INTEGER, gl::INT),
    (gl::RED_INTEGER, gl::UNSIGNED_INT),
    (gl::RG_INTEGER, gl::INT),
    (gl::RG_INTEGER, gl::UNSIGNED_INT),
    (gl::RGBA_INTEGER, gl::BYTE),
    (gl::RGBA_INTEGER, gl::UNSIGNED_BYTE),
    (gl::RGBA_INTEGER, gl::INT),
    (gl::RGBA_INTEGER, gl::UNSIGNED_INT),
    (gl::DEPTH_COMPONENT, gl::UNSIGNED_SHORT),
    (gl::DEPTH_COMPONENT, gl::UNSIGNED_INT),
    (gl::DEPTH_COMPONENT, gl::FLOAT),
    (gl::DEPTH_STENCIL, gl::UNSIGNED_INT_24_8),
    (gl::DEPTH_STENCIL, gl::FLOAT_32_UNSIGNED_INT_24_8_REV),
    (gl::STENCIL_INDEX, gl::UNSIGNED_BYTE),
];

/// Client-side format of `components` channels of color data
pub fn color_transfer_format(components: u8, integer: bool) -> Option<GLenum> {
    let format = match (components, integer) {
        (1, false) => gl::RED,
        (2, false) => gl::RG,
        (3, false) => gl::RGB,
        (4, false) => gl::RGBA,
        (1, true) => gl::RED_INTEGER,
        (2, true) => gl::RG_INTEGER,
        (3, true) => gl::RGB_INTEGER,
        (4, true) => gl::RGBA_INTEGER,
        _ => return None,
    };
    Some(format)
}

// ===== TEXTURES AND SAMPLING =====

conversion_table!(TEXTURE_TYPES, texture_type_from_gl, TextureType {
    Texture1D => TEXTURE_1D,
    Texture2D => TEXTURE_2D,
    Texture3D => TEXTURE_3D,
    Cube => TEXTURE_CUBE_MAP,
    Texture1DArray => TEXTURE_1D_ARRAY,
    Texture2DArray => TEXTURE_2D_ARRAY,
    CubeArray => TEXTURE_CUBE_MAP_ARRAY,
    Rect => TEXTURE_RECTANGLE,
});

conversion_table!(WRAPS, wrap_from_gl, Wrap {
    Repeat => REPEAT,
    MirroredRepeat => MIRRORED_REPEAT,
    ClampToEdge => CLAMP_TO_EDGE,
    ClampToBorder => CLAMP_TO_BORDER,
    MirrorClampToEdge => MIRROR_CLAMP_TO_EDGE,
});

conversion_table!(MIN_FILTERS, min_filter_from_gl, Filter {
    Nearest => NEAREST,
    Linear => LINEAR,
    Bilinear => LINEAR_MIPMAP_NEAREST,
    Trilinear => LINEAR_MIPMAP_LINEAR,
});

/// Magnification never reads mip levels
pub const MAG_FILTERS: [GLenum; Filter::COUNT] = [gl::NEAREST, gl::LINEAR, gl::LINEAR, gl::LINEAR];

conversion_table!(SWIZZLES, swizzle_from_gl, Swizzle {
    Red => RED,
    Green => GREEN,
    Blue => BLUE,
    Alpha => ALPHA,
    Zero => ZERO,
    One => ONE,
});

conversion_table!(IMAGE_ACCESSES, image_access_from_gl, ImageAccess {
    ReadOnly => READ_ONLY,
    WriteOnly => WRITE_ONLY,
    ReadWrite => READ_WRITE,
});

// ===== FIXED FUNCTION =====

conversion_table!(COMPARE_FUNCS, compare_func_from_gl, CompareFunc {
    Never => NEVER,
    Less => LESS,
    Equal => EQUAL,
    LessOrEqual => LEQUAL,
    Greater => GREATER,
    NotEqual => NOTEQUAL,
    GreaterOrEqual => GEQUAL,
    Always => ALWAYS,
});

conversion_table!(STENCIL_OPS, stencil_op_from_gl, StencilOp {
    Keep => KEEP,
    Zero => ZERO,
    Replace => REPLACE,
    IncrementAndClamp => INCR,
    DecrementAndClamp => DECR,
    Invert => INVERT,
    IncrementAndWrap => INCR_WRAP,
    DecrementAndWrap => DECR_WRAP,
});

conversion_table!(BLEND_FACTORS, blend_factor_from_gl, BlendFactor {
    Zero => ZERO,
    One => ONE,
    SrcColor => SRC_COLOR,
    OneMinusSrcColor => ONE_MINUS_SRC_COLOR,
    DstColor => DST_COLOR,
    OneMinusDstColor => ONE_MINUS_DST_COLOR,
    SrcAlpha => SRC_ALPHA,
    OneMinusSrcAlpha => ONE_MINUS_SRC_ALPHA,
    DstAlpha => DST_ALPHA,
    OneMinusDstAlpha => ONE_MINUS_DST_ALPHA,
    ConstantColor => CONSTANT_COLOR,
    OneMinusConstantColor => ONE_MINUS_CONSTANT_COLOR,
    ConstantAlpha => CONSTANT_ALPHA,
    OneMinusConstantAlpha => ONE_MINUS_CONSTANT_ALPHA,
    SrcAlphaSaturate => SRC_ALPHA_SATURATE,
});

conversion_table!(BLEND_EQUATIONS, blend_equation_from_gl, BlendEquation {
    Add => FUNC_ADD,
    Subtract => FUNC_SUBTRACT,
    ReverseSubtract => FUNC_REVERSE_SUBTRACT,
    Min => MIN,
    Max => MAX,
});

conversion_table!(CULL_FACES, cull_face_from_gl, CullFace {
    Front => FRONT,
    Back => BACK,
    FrontAndBack => FRONT_AND_BACK,
});

conversion_table!(FRONT_FACES, front_face_from_gl, FrontFace {
    CounterClockwise => CCW,
    Clockwise => CW,
});

// ===== GEOMETRY =====

conversion_table!(PRIMITIVE_TYPES, primitive_type_from_gl, PrimitiveType {
    Points => POINTS,
    Lines => LINES,
    LineStrip => LINE_STRIP,
    LineLoop => LINE_LOOP,
    Triangles => TRIANGLES,
    TriangleStrip => TRIANGLE_STRIP,
    TriangleFan => TRIANGLE_FAN,
    LinesAdjacency => LINES_ADJACENCY,
    TrianglesAdjacency => TRIANGLES_ADJACENCY,
    Patches => PATCHES,
});

conversion_table!(INDEX_TYPES, index_type_from_gl, IndexType {
    U8 => UNSIGNED_BYTE,
    U16 => UNSIGNED_SHORT,
    U32 => UNSIGNED_INT,
});

// ===== PROGRAMS =====

conversion_table!(SHADER_STAGES, shader_stage_from_gl, ShaderStage {
    Vertex => VERTEX_SHADER,
    TessControl => TESS_CONTROL_SHADER,
    TessEvaluation => TESS_EVALUATION_SHADER,
    Geometry => GEOMETRY_SHADER,
    Fragment => FRAGMENT_SHADER,
    Compute => COMPUTE_SHADER,
});

conversion_table!(UNIFORM_TYPES, uniform_type_from_gl, UniformType {
    Float => FLOAT,
    Vec2 => FLOAT_VEC2,
    Vec3 => FLOAT_VEC3,
    Vec4 => FLOAT_VEC4,
    Int => INT,
    IVec2 => INT_VEC2,
    IVec3 => INT_VEC3,
    IVec4 => INT_VEC4,
    UInt => UNSIGNED_INT,
    UVec2 => UNSIGNED_INT_VEC2,
    UVec3 => UNSIGNED_INT_VEC3,
    UVec4 => UNSIGNED_INT_VEC4,
    Bool => BOOL,
    Mat2 => FLOAT_MAT2,
    Mat3 => FLOAT_MAT3,
    Mat4 => FLOAT_MAT4,
    Sampler1D => SAMPLER_1D,
    Sampler2D => SAMPLER_2D,
    Sampler3D => SAMPLER_3D,
    SamplerCube => SAMPLER_CUBE,
    Sampler1DArray => SAMPLER_1D_ARRAY,
    Sampler2DArray => SAMPLER_2D_ARRAY,
    SamplerCubeArray => SAMPLER_CUBE_MAP_ARRAY,
    Sampler2DRect => SAMPLER_2D_RECT,
    Sampler2DShadow => SAMPLER_2D_SHADOW,
    SamplerCubeShadow => SAMPLER_CUBE_SHADOW,
    Sampler2DArrayShadow => SAMPLER_2D_ARRAY_SHADOW,
    ISampler2D => INT_SAMPLER_2D,
    ISampler3D => INT_SAMPLER_3D,
    ISampler2DArray => INT_SAMPLER_2D_ARRAY,
    USampler2D => UNSIGNED_INT_SAMPLER_2D,
    USampler3D => UNSIGNED_INT_SAMPLER_3D,
    USampler2DArray => UNSIGNED_INT_SAMPLER_2D_ARRAY,
    Image1D => IMAGE_1D,
    Image2D => IMAGE_2D,
    Image3D => IMAGE_3D,
    ImageCube => IMAGE_CUBE,
    Image2DArray => IMAGE_2D_ARRAY,
    IImage2D => INT_IMAGE_2D,
    UImage2D => UNSIGNED_INT_IMAGE_2D,
});

// ===== BUFFERS AND FRAMEBUFFERS =====

/// Access bits of `glMapNamedBufferRange`
pub const MAP_ACCESSES: [GLbitfield; MapAccess::COUNT] = [
    gl::MAP_READ_BIT,
    gl::MAP_WRITE_BIT,
    gl::MAP_READ_BIT | gl::MAP_WRITE_BIT,
];

/// Attachment kind base constants, indexed by `AttachmentPoint::ordinal()`
pub const ATTACHMENT_POINTS: [GLenum; 4] = [
    gl::COLOR_ATTACHMENT0,
    gl::DEPTH_ATTACHMENT,
    gl::STENCIL_ATTACHMENT,
    gl::DEPTH_STENCIL_ATTACHMENT,
];

pub fn attachment_point_to_gl(point: AttachmentPoint) -> GLenum {
    match point {
        AttachmentPoint::Color(index) => ATTACHMENT_POINTS[point.ordinal()] + index as GLenum,
        _ => ATTACHMENT_POINTS[point.ordinal()],
    }
}

pub fn attachment_point_from_gl(value: GLenum) -> Option<AttachmentPoint> {
    match value {
        gl::DEPTH_ATTACHMENT => Some(AttachmentPoint::Depth),
        gl::STENCIL_ATTACHMENT => Some(AttachmentPoint::Stencil),
        gl::DEPTH_STENCIL_ATTACHMENT => Some(AttachmentPoint::DepthStencil),
        _ if (gl::COLOR_ATTACHMENT0..=gl::COLOR_ATTACHMENT7).contains(&value) => {
            Some(AttachmentPoint::Color((value - gl::COLOR_ATTACHMENT0) as u8))
        }
        _ => None,
    }
}

/// Engine barrier bits paired with their GL barrier bits
pub const MEMORY_BARRIERS: [(MemoryBarrier, GLbitfield); 10] = [
    (MemoryBarrier::VERTEX_ATTRIB, gl::VERTEX_ATTRIB_ARRAY_BARRIER_BIT),
    (MemoryBarrier::ELEMENT_ARRAY, gl::ELEMENT_ARRAY_BARRIER_BIT),
    (MemoryBarrier::UNIFORM, gl::UNIFORM_BARRIER_BIT),
    (MemoryBarrier::TEXTURE_FETCH, gl::TEXTURE_FETCH_BARRIER_BIT),
    (MemoryBarrier::SHADER_IMAGE_ACCESS, gl::SHADER_IMAGE_ACCESS_BARRIER_BIT),
    (MemoryBarrier::COMMAND, gl::COMMAND_BARRIER_BIT),
    (MemoryBarrier::TEXTURE_UPDATE, gl::TEXTURE_UPDATE_BARRIER_BIT),
    (MemoryBarrier::BUFFER_UPDATE, gl::BUFFER_UPDATE_BARRIER_BIT),
    (MemoryBarrier::FRAMEBUFFER, gl::FRAMEBUFFER_BARRIER_BIT),
    (MemoryBarrier::SHADER_STORAGE, gl::SHADER_STORAGE_BARRIER_BIT),
];

pub fn memory_barrier_to_gl(barrier: MemoryBarrier) -> GLbitfield {
    if barrier.contains(MemoryBarrier::ALL) {
        return gl::ALL_BARRIER_BITS;
    }
    MEMORY_BARRIERS
        .iter()
        .filter(|(flag, _)| barrier.contains(*flag))
        .fold(0, |bits, (_, gl_bit)| bits | gl_bit)
}

#[cfg(test)]
#[path = "gl_conversion_tests.rs"]
mod tests;
