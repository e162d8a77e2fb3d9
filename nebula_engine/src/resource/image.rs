/// CPU-side image data consumed by texture uploads

use crate::error::{Error, Result};
use crate::renderer::{ComponentType, PixelTransfer};

/// Pixels of an image (or one face/layer) in client memory
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    /// Channels per pixel (1..=4)
    pub components: u8,
    pub component_type: ComponentType,
    /// Integer pixels destined for integer formats (no normalization)
    pub integer: bool,
    pub data: Vec<u8>,
}

impl ImageData {
    /// Wrap raw bytes, checking that their length matches the dimensions
    pub fn new(
        width: u32,
        height: u32,
        depth: u32,
        components: u8,
        component_type: ComponentType,
        data: Vec<u8>,
    ) -> Result<ImageData> {
        if !(1..=4).contains(&components) {
            return Err(Error::UnsupportedFormat(format!("{} components per pixel", components)));
        }
        if width == 0 || height == 0 || depth == 0 {
            return Err(Error::InvalidArgument(format!("image dimensions {}x{}x{}", width, height, depth)));
        }
        let image = ImageData {
            width,
            height,
            depth,
            components,
            component_type,
            integer: false,
            data,
        };
        let expected = image.texel_count() * image.transfer().bytes_per_pixel() as u64;
        if image.data.len() as u64 != expected {
            return Err(Error::InvalidArgument(format!(
                "image of {}x{}x{} needs {} bytes, got {}",
                width, height, depth, expected, image.data.len()
            )));
        }
        Ok(image)
    }

    /// 8-bit RGBA image
    pub fn rgba8(width: u32, height: u32, data: Vec<u8>) -> Result<ImageData> {
        Self::new(width, height, 1, 4, ComponentType::UByte, data)
    }

    /// Floating point image with `components` channels
    pub fn from_f32(width: u32, height: u32, components: u8, pixels: &[f32]) -> Result<ImageData> {
        Self::new(width, height, 1, components, ComponentType::Float, bytemuck::cast_slice(pixels).to_vec())
    }

    /// Mark the pixels as unnormalized integers
    pub fn into_integer(mut self) -> Result<ImageData> {
        if !self.component_type.is_integer() {
            return Err(Error::UnsupportedFormat(format!(
                "{:?} components cannot be integer pixels", self.component_type
            )));
        }
        self.integer = true;
        Ok(self)
    }

    pub fn texel_count(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.depth as u64
    }

    /// Transfer layout handed to the backend
    pub fn transfer(&self) -> PixelTransfer {
        PixelTransfer {
            components: self.components,
            component_type: self.component_type,
            integer: self.integer,
        }
    }
}
