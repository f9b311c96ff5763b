//! Material and texture construction from 3MF resources

use std::sync::Arc;

use tracing::warn;

use crate::color::Color;
use crate::error::{Error, Result};
use crate::image_loader::ImageLoader;
use crate::model::{BaseMaterialGroup, FilterMode, Resources, Texture2D, TileStyle};
use crate::scene::{Material, Shading, Texture, TextureFilter, Wrapping};

/// Material for one entry of a base material set
///
/// Entries bound to metallic display properties produce a physically based
/// material; everything else is flat Phong. The entry's own
/// `displaypropertiesid` takes precedence over the one on the set, and the
/// metallic record is picked by the entry's index.
pub(crate) fn base_material(
    group: &BaseMaterialGroup,
    index: usize,
    resources: &Resources,
) -> Result<Material> {
    let base = group.materials.get(index).ok_or_else(|| {
        Error::unsupported_resource(
            &group.id,
            format!(
                "base material index {} out of range ({} materials)",
                index,
                group.materials.len()
            ),
        )
    })?;

    let shading = match base
        .displaypropertiesid
        .as_ref()
        .or(group.displaypropertiesid.as_ref())
        .and_then(|id| resources.pbmetallicdisplayproperties.get(id))
    {
        Some(props) => match props.metallic.get(index) {
            Some(metallic) => Shading::Standard {
                metalness: metallic.metallicness,
                roughness: metallic.roughness,
            },
            None => {
                warn!(
                    group = %group.id,
                    properties = %props.id,
                    index,
                    "no metallic entry for base material, using Phong"
                );
                Shading::Phong
            }
        },
        None => Shading::Phong,
    };

    let (r, g, b, _) = base.displaycolor;
    Ok(Material {
        name: base.name.clone(),
        color: Color::from_srgb8(r, g, b),
        flat_shading: true,
        shading,
        ..Material::default()
    }
    .with_opacity(base.opacity()))
}

/// Flat material sampling a texture
pub(crate) fn textured_material(map: Option<Arc<Texture>>) -> Material {
    Material {
        flat_shading: true,
        map,
        ..Material::default()
    }
}

/// Flat material driven by per-vertex colors
pub(crate) fn vertex_color_material() -> Material {
    Material {
        flat_shading: true,
        vertex_colors: true,
        ..Material::default()
    }
}

/// Fallback material for triangles without any resource
pub(crate) fn default_material(color: u32) -> Material {
    Material {
        color: Color::from_hex(color),
        flat_shading: true,
        ..Material::default()
    }
}

fn wrapping(style: TileStyle) -> Wrapping {
    match style {
        TileStyle::Wrap => Wrapping::Repeat,
        TileStyle::Mirror => Wrapping::MirroredRepeat,
        TileStyle::Clamp | TileStyle::None => Wrapping::ClampToEdge,
    }
}

fn filters(filter: FilterMode) -> (TextureFilter, TextureFilter) {
    match filter {
        FilterMode::Auto => (TextureFilter::Linear, TextureFilter::LinearMipmapLinear),
        FilterMode::Linear => (TextureFilter::Linear, TextureFilter::Linear),
        FilterMode::Nearest => (TextureFilter::Nearest, TextureFilter::Nearest),
    }
}

/// Texture for a `texture2d` resource
///
/// `data` is the encoded image part, if it could be located. Decoding
/// failures are logged; the texture then carries the encoded bytes only.
pub(crate) fn texture(
    texture2d: &Texture2D,
    data: Option<Arc<[u8]>>,
    image_loader: Option<&dyn ImageLoader>,
) -> Texture {
    let image = match (image_loader, &data) {
        (Some(loader), Some(bytes)) => {
            match loader.load(&texture2d.path, &texture2d.contenttype, bytes) {
                Ok(image) => Some(Arc::new(image)),
                Err(e) => {
                    warn!(path = %texture2d.path, error = %e, "failed to decode texture image");
                    None
                }
            }
        }
        _ => None,
    };

    let (mag_filter, min_filter) = filters(texture2d.filter);
    Texture {
        path: texture2d.path.clone(),
        content_type: texture2d.contenttype.clone(),
        data,
        image,
        wrap_s: wrapping(texture2d.tilestyleu),
        wrap_t: wrapping(texture2d.tilestylev),
        mag_filter,
        min_filter,
    }
}
