/// Pixel formats and component scalar types

// ===== COMPONENT TYPE =====

/// Scalar type of one component of a vertex attribute or pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentType {
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    HalfFloat,
    Float,
    Double,
}

impl ComponentType {
    pub const COUNT: usize = 9;

    pub const ALL: [ComponentType; Self::COUNT] = [
        ComponentType::Byte,
        ComponentType::UByte,
        ComponentType::Short,
        ComponentType::UShort,
        ComponentType::Int,
        ComponentType::UInt,
        ComponentType::HalfFloat,
        ComponentType::Float,
        ComponentType::Double,
    ];

    /// Index into conversion tables
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Size of one component in bytes
    pub fn size_bytes(self) -> u32 {
        match self {
            ComponentType::Byte | ComponentType::UByte => 1,
            ComponentType::Short | ComponentType::UShort | ComponentType::HalfFloat => 2,
            ComponentType::Int | ComponentType::UInt | ComponentType::Float => 4,
            ComponentType::Double => 8,
        }
    }

    /// True for the integer types (signed and unsigned)
    pub fn is_integer(self) -> bool {
        !self.is_float()
    }

    /// True for HalfFloat, Float and Double
    pub fn is_float(self) -> bool {
        matches!(self, ComponentType::HalfFloat | ComponentType::Float | ComponentType::Double)
    }
}

// ===== PIXEL FORMAT =====

/// Internal storage format of textures and render buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    // Normalized color
    R8,
    RG8,
    RGB8,
    RGBA8,
    SRGB8,
    SRGB8Alpha8,
    R16,
    RGBA16,

    // Floating point color
    R16F,
    RG16F,
    RGB16F,
    RGBA16F,
    R32F,
    RG32F,
    RGB32F,
    RGBA32F,
    R11FG11FB10F,

    // Integer color
    R8I,
    R8UI,
    R16I,
    R16UI,
    R32I,
    R32UI,
    RG32I,
    RG32UI,
    RGBA8I,
    RGBA8UI,
    RGBA32I,
    RGBA32UI,

    // Depth / stencil
    Depth16,
    Depth24,
    Depth32F,
    Depth24Stencil8,
    Depth32FStencil8,
    Stencil8,
}

impl PixelFormat {
    pub const COUNT: usize = 35;

    pub const ALL: [PixelFormat; Self::COUNT] = [
        PixelFormat::R8,
        PixelFormat::RG8,
        PixelFormat::RGB8,
        PixelFormat::RGBA8,
        PixelFormat::SRGB8,
        PixelFormat::SRGB8Alpha8,
        PixelFormat::R16,
        PixelFormat::RGBA16,
        PixelFormat::R16F,
        PixelFormat::RG16F,
        PixelFormat::RGB16F,
        PixelFormat::RGBA16F,
        PixelFormat::R32F,
        PixelFormat::RG32F,
        PixelFormat::RGB32F,
        PixelFormat::RGBA32F,
        PixelFormat::R11FG11FB10F,
        PixelFormat::R8I,
        PixelFormat::R8UI,
        PixelFormat::R16I,
        PixelFormat::R16UI,
        PixelFormat::R32I,
        PixelFormat::R32UI,
        PixelFormat::RG32I,
        PixelFormat::RG32UI,
        PixelFormat::RGBA8I,
        PixelFormat::RGBA8UI,
        PixelFormat::RGBA32I,
        PixelFormat::RGBA32UI,
        PixelFormat::Depth16,
        PixelFormat::Depth24,
        PixelFormat::Depth32F,
        PixelFormat::Depth24Stencil8,
        PixelFormat::Depth32FStencil8,
        PixelFormat::Stencil8,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Number of channels stored per pixel
    pub fn components(self) -> u8 {
        use PixelFormat::*;
        match self {
            R8 | R16 | R16F | R32F | R8I | R8UI | R16I | R16UI | R32I | R32UI => 1,
            RG8 | RG16F | RG32F | RG32I | RG32UI => 2,
            RGB8 | SRGB8 | RGB16F | RGB32F | R11FG11FB10F => 3,
            RGBA8 | SRGB8Alpha8 | RGBA16 | RGBA16F | RGBA32F | RGBA8I | RGBA8UI | RGBA32I | RGBA32UI => 4,
            Depth16 | Depth24 | Depth32F | Stencil8 => 1,
            Depth24Stencil8 | Depth32FStencil8 => 2,
        }
    }

    /// Size of one pixel in bytes, as stored
    pub fn bytes_per_pixel(self) -> u32 {
        use PixelFormat::*;
        match self {
            R8 | R8I | R8UI | Stencil8 => 1,
            RG8 | R16 | R16F | R16I | R16UI | Depth16 => 2,
            RGB8 | SRGB8 => 3,
            RGBA8 | SRGB8Alpha8 | R32F | R32I | R32UI | RG16F | R11FG11FB10F
            | RGBA8I | RGBA8UI | Depth24 | Depth32F | Depth24Stencil8 => 4,
            RGB16F => 6,
            RGBA16 | RGBA16F | RG32F | RG32I | RG32UI | Depth32FStencil8 => 8,
            RGB32F => 12,
            RGBA32F | RGBA32I | RGBA32UI => 16,
        }
    }

    /// Integer formats can only be sampled with integer samplers and
    /// only receive integer pixel data
    pub fn is_integer(self) -> bool {
        use PixelFormat::*;
        matches!(
            self,
            R8I | R8UI | R16I | R16UI | R32I | R32UI | RG32I | RG32UI | RGBA8I | RGBA8UI | RGBA32I | RGBA32UI
        )
    }

    /// True if the format has a depth channel
    pub fn has_depth(self) -> bool {
        use PixelFormat::*;
        matches!(self, Depth16 | Depth24 | Depth32F | Depth24Stencil8 | Depth32FStencil8)
    }

    /// True if the format has a stencil channel
    pub fn has_stencil(self) -> bool {
        use PixelFormat::*;
        matches!(self, Depth24Stencil8 | Depth32FStencil8 | Stencil8)
    }

    /// True for every format usable as a color attachment
    pub fn is_color(self) -> bool {
        !self.has_depth() && !self.has_stencil()
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
