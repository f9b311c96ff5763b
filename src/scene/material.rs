//! Materials and textures attached to mesh nodes

use crate::color::Color;
use std::sync::Arc;

/// Lighting model of a material
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// Classic Blinn-Phong shading
    Phong,
    /// Physically based metallic-roughness shading
    Standard {
        /// Metalness in `0.0..=1.0`
        metalness: f32,
        /// Roughness in `0.0..=1.0`
        roughness: f32,
    },
}

/// Surface appearance of a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Material name
    pub name: Option<String>,
    /// Linear base color
    pub color: Color,
    /// Opacity in `0.0..=1.0`
    pub opacity: f32,
    /// Whether opacity below one needs blending
    pub transparent: bool,
    /// Use face normals instead of interpolated vertex normals
    pub flat_shading: bool,
    /// Multiply the base color with per-vertex colors
    pub vertex_colors: bool,
    /// Color texture
    pub map: Option<Arc<Texture>>,
    /// Lighting model
    pub shading: Shading,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            color: Color::new(1.0, 1.0, 1.0),
            opacity: 1.0,
            transparent: false,
            flat_shading: false,
            vertex_colors: false,
            map: None,
            shading: Shading::Phong,
        }
    }
}

impl Material {
    /// Set opacity, marking the material transparent when below one
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.transparent = opacity < 1.0;
        self
    }
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapping {
    /// Repeat
    Repeat,
    /// Repeat with mirroring
    MirroredRepeat,
    /// Clamp to the edge texel
    ClampToEdge,
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    /// Nearest texel
    Nearest,
    /// Linear interpolation
    Linear,
    /// Linear interpolation across mipmap levels
    LinearMipmapLinear,
}

/// Decoded pixel data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// RGBA8 pixels, row by row
    pub rgba: Vec<u8>,
}

/// Texture sampled by a material
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    /// Archive path of the image part
    pub path: String,
    /// MIME type of the image part
    pub content_type: String,
    /// Encoded image bytes; `None` when the part could not be found
    pub data: Option<Arc<[u8]>>,
    /// Decoded pixels, when an image loader is configured
    pub image: Option<Arc<TextureImage>>,
    /// Horizontal wrapping
    pub wrap_s: Wrapping,
    /// Vertical wrapping
    pub wrap_t: Wrapping,
    /// Magnification filter
    pub mag_filter: TextureFilter,
    /// Minification filter
    pub min_filter: TextureFilter,
}
