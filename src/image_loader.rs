//! Image decoding hook for texture parts
//!
//! The loader itself never decodes pixels. Textures carry the encoded bytes
//! of their image part; a configured [`ImageLoader`] additionally turns those
//! bytes into RGBA pixels.

use crate::error::Result;
use crate::scene::TextureImage;

/// Trait for decoding texture image parts
///
/// # Example
///
/// ```
/// use lib3mf_scene::{ImageLoader, Result, TextureImage};
///
/// /// Treats every part as a single opaque white pixel
/// struct Placeholder;
///
/// impl ImageLoader for Placeholder {
///     fn load(&self, _path: &str, _content_type: &str, _data: &[u8]) -> Result<TextureImage> {
///         Ok(TextureImage {
///             width: 1,
///             height: 1,
///             rgba: vec![255; 4],
///         })
///     }
/// }
/// ```
pub trait ImageLoader: Send + Sync {
    /// Decode an image part
    ///
    /// # Arguments
    ///
    /// * `path` - Archive path of the image part, as referenced by the texture
    /// * `content_type` - MIME type declared by the texture (`image/png`, `image/jpeg`)
    /// * `data` - Encoded image bytes
    ///
    /// A failure is logged and the texture keeps only its encoded bytes.
    fn load(&self, path: &str, content_type: &str, data: &[u8]) -> Result<TextureImage>;
}
