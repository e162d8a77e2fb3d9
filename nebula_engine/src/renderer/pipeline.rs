/// Fixed-function pipeline state cached by framebuffers

/// Maximum number of color attachments of a framebuffer
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

// ===== RASTERIZATION ENUMS =====

/// Faces discarded by face culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullFace {
    Front,
    Back,
    FrontAndBack,
}

impl CullFace {
    pub const COUNT: usize = 3;

    pub const ALL: [CullFace; Self::COUNT] = [CullFace::Front, CullFace::Back, CullFace::FrontAndBack];

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    /// Counter-clockwise vertices define front face
    CounterClockwise,
    /// Clockwise vertices define front face
    Clockwise,
}

impl FrontFace {
    pub const COUNT: usize = 2;

    pub const ALL: [FrontFace; Self::COUNT] = [FrontFace::CounterClockwise, FrontFace::Clockwise];

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

// ===== DEPTH/STENCIL ENUMS =====

/// Comparison function for depth, stencil and shadow-sampler tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    /// Never pass
    Never,
    /// Pass if value < reference
    Less,
    /// Pass if value == reference
    Equal,
    /// Pass if value <= reference
    LessOrEqual,
    /// Pass if value > reference
    Greater,
    /// Pass if value != reference
    NotEqual,
    /// Pass if value >= reference
    GreaterOrEqual,
    /// Always pass
    Always,
}

impl CompareFunc {
    pub const COUNT: usize = 8;

    pub const ALL: [CompareFunc; Self::COUNT] = [
        CompareFunc::Never,
        CompareFunc::Less,
        CompareFunc::Equal,
        CompareFunc::LessOrEqual,
        CompareFunc::Greater,
        CompareFunc::NotEqual,
        CompareFunc::GreaterOrEqual,
        CompareFunc::Always,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

/// Stencil operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    /// Keep current value
    Keep,
    /// Set to zero
    Zero,
    /// Replace with reference value
    Replace,
    /// Increment and clamp to max
    IncrementAndClamp,
    /// Decrement and clamp to zero
    DecrementAndClamp,
    /// Bitwise invert
    Invert,
    /// Increment and wrap around
    IncrementAndWrap,
    /// Decrement and wrap around
    DecrementAndWrap,
}

impl StencilOp {
    pub const COUNT: usize = 8;

    pub const ALL: [StencilOp; Self::COUNT] = [
        StencilOp::Keep,
        StencilOp::Zero,
        StencilOp::Replace,
        StencilOp::IncrementAndClamp,
        StencilOp::DecrementAndClamp,
        StencilOp::Invert,
        StencilOp::IncrementAndWrap,
        StencilOp::DecrementAndWrap,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

// ===== COLOR BLEND ENUMS =====

/// Blend factor for color blending equations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
}

impl BlendFactor {
    pub const COUNT: usize = 15;

    pub const ALL: [BlendFactor; Self::COUNT] = [
        BlendFactor::Zero,
        BlendFactor::One,
        BlendFactor::SrcColor,
        BlendFactor::OneMinusSrcColor,
        BlendFactor::DstColor,
        BlendFactor::OneMinusDstColor,
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha,
        BlendFactor::ConstantColor,
        BlendFactor::OneMinusConstantColor,
        BlendFactor::ConstantAlpha,
        BlendFactor::OneMinusConstantAlpha,
        BlendFactor::SrcAlphaSaturate,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

/// Blend equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    /// result = src * srcFactor + dst * dstFactor
    Add,
    /// result = src * srcFactor - dst * dstFactor
    Subtract,
    /// result = dst * dstFactor - src * srcFactor
    ReverseSubtract,
    /// result = min(src, dst)
    Min,
    /// result = max(src, dst)
    Max,
}

impl BlendEquation {
    pub const COUNT: usize = 5;

    pub const ALL: [BlendEquation; Self::COUNT] = [
        BlendEquation::Add,
        BlendEquation::Subtract,
        BlendEquation::ReverseSubtract,
        BlendEquation::Min,
        BlendEquation::Max,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

// ===== RASTERIZATION STATE =====

/// Face culling state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceCulling {
    pub enabled: bool,
    pub face: CullFace,
    pub front_face: FrontFace,
}

impl Default for FaceCulling {
    fn default() -> Self {
        Self {
            enabled: false,
            face: CullFace::Back,
            front_face: FrontFace::CounterClockwise,
        }
    }
}

// ===== DEPTH/STENCIL STATE =====

/// Depth testing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    /// Enable depth testing
    pub test_enabled: bool,
    /// Depth comparison function
    pub func: CompareFunc,
    /// Enable writing to the depth buffer
    pub write_enabled: bool,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test_enabled: true,
            func: CompareFunc::Less,
            write_enabled: true,
        }
    }
}

/// Stencil state for one face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilFaceState {
    /// Comparison function
    pub func: CompareFunc,
    /// Reference value for compare/replace
    pub reference: i32,
    /// Bits of the stencil buffer read for compare
    pub read_mask: u32,
    /// Bits of the stencil buffer written
    pub write_mask: u32,
    /// Action on stencil test fail
    pub fail: StencilOp,
    /// Action on stencil pass + depth fail
    pub depth_fail: StencilOp,
    /// Action on stencil pass + depth pass
    pub pass: StencilOp,
}

impl Default for StencilFaceState {
    fn default() -> Self {
        Self {
            func: CompareFunc::Always,
            reference: 0,
            read_mask: 0xFF,
            write_mask: 0xFF,
            fail: StencilOp::Keep,
            depth_fail: StencilOp::Keep,
            pass: StencilOp::Keep,
        }
    }
}

/// Stencil testing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StencilState {
    pub enabled: bool,
    pub front: StencilFaceState,
    pub back: StencilFaceState,
}

// ===== COLOR BLEND STATE =====

/// Color write mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorWriteMask {
    pub r: bool,
    pub g: bool,
    pub b: bool,
    pub a: bool,
}

impl ColorWriteMask {
    /// All channels enabled
    pub const ALL: Self = Self { r: true, g: true, b: true, a: true };
    /// No channels enabled
    pub const NONE: Self = Self { r: false, g: false, b: false, a: false };
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Blend equations and factors of one color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendAttachmentState {
    pub color_equation: BlendEquation,
    pub alpha_equation: BlendEquation,
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

impl Default for BlendAttachmentState {
    fn default() -> Self {
        Self {
            color_equation: BlendEquation::Add,
            alpha_equation: BlendEquation::Add,
            src_color: BlendFactor::One,
            dst_color: BlendFactor::Zero,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
        }
    }
}

/// Color blending state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendState {
    pub enabled: bool,
    pub attachments: [BlendAttachmentState; MAX_COLOR_ATTACHMENTS],
    /// Constant color and alpha used by the Constant* factors
    pub constant: [f32; 4],
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            attachments: [BlendAttachmentState::default(); MAX_COLOR_ATTACHMENTS],
            constant: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

// ===== PIPELINE STATE =====

/// Complete fixed-function state applied before a pass draws into a framebuffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineState {
    pub culling: FaceCulling,
    pub color_masks: [ColorWriteMask; MAX_COLOR_ATTACHMENTS],
    pub depth: DepthState,
    pub stencil: StencilState,
    pub blend: BlendState,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            culling: FaceCulling::default(),
            color_masks: [ColorWriteMask::ALL; MAX_COLOR_ATTACHMENTS],
            depth: DepthState::default(),
            stencil: StencilState::default(),
            blend: BlendState::default(),
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
