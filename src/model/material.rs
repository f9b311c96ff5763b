//! Materials and Properties extension resources

use crate::color::Color;

use super::core::ResourceId;

/// Base material within a `<basematerials>` set
#[derive(Debug, Clone, PartialEq)]
pub struct BaseMaterial {
    /// Position within the owning set, referenced by property indices
    pub index: usize,
    /// Material name
    pub name: Option<String>,
    /// sRGB display color (R, G, B, A)
    pub displaycolor: (u8, u8, u8, u8),
    /// Metallic display properties bound to this entry
    pub displaypropertiesid: Option<ResourceId>,
}

impl BaseMaterial {
    /// Create an opaque white base material
    pub fn new(index: usize) -> Self {
        Self {
            index,
            name: None,
            displaycolor: (0xff, 0xff, 0xff, 0xff),
            displaypropertiesid: None,
        }
    }

    /// Opacity in `0.0..=1.0` derived from the alpha byte of the display color
    pub fn opacity(&self) -> f32 {
        self.displaycolor.3 as f32 / 255.0
    }
}

/// `<basematerials>` resource
#[derive(Debug, Clone, PartialEq)]
pub struct BaseMaterialGroup {
    /// Resource id
    pub id: ResourceId,
    /// Metallic display properties for entries that do not name their own
    pub displaypropertiesid: Option<ResourceId>,
    /// Materials in declaration order
    pub materials: Vec<BaseMaterial>,
}

impl BaseMaterialGroup {
    /// Create an empty set
    pub fn new(id: impl Into<ResourceId>) -> Self {
        Self {
            id: id.into(),
            displaypropertiesid: None,
            materials: Vec::new(),
        }
    }
}

/// Tiling applied outside the `[0, 1]` texture coordinate range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileStyle {
    /// Repeat the texture
    #[default]
    Wrap,
    /// Repeat with mirroring
    Mirror,
    /// Clamp to the edge texel
    Clamp,
    /// No tiling
    None,
}

impl TileStyle {
    /// Parse an attribute value; unknown values fall back to `Wrap`
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "mirror" => TileStyle::Mirror,
            "clamp" => TileStyle::Clamp,
            "none" => TileStyle::None,
            _ => TileStyle::Wrap,
        }
    }
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Let the renderer pick (linear with mipmaps)
    #[default]
    Auto,
    /// Linear interpolation
    Linear,
    /// Nearest texel
    Nearest,
}

impl FilterMode {
    /// Parse an attribute value; unknown values fall back to `Auto`
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "linear" => FilterMode::Linear,
            "nearest" => FilterMode::Nearest,
            _ => FilterMode::Auto,
        }
    }
}

/// `<texture2d>` resource
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2D {
    /// Resource id
    pub id: ResourceId,
    /// Archive path of the image part
    pub path: String,
    /// MIME type of the image part
    pub contenttype: String,
    /// Horizontal tiling
    pub tilestyleu: TileStyle,
    /// Vertical tiling
    pub tilestylev: TileStyle,
    /// Sampling filter
    pub filter: FilterMode,
}

impl Texture2D {
    /// Create a texture with default tiling and filtering
    pub fn new(
        id: impl Into<ResourceId>,
        path: impl Into<String>,
        contenttype: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            contenttype: contenttype.into(),
            tilestyleu: TileStyle::default(),
            tilestylev: TileStyle::default(),
            filter: FilterMode::default(),
        }
    }
}

/// `<texture2dgroup>` resource
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2DGroup {
    /// Resource id
    pub id: ResourceId,
    /// Texture this group samples
    pub texid: ResourceId,
    /// Display properties id
    pub displaypropertiesid: Option<ResourceId>,
    /// Flattened `u, v` pairs, one per `<tex2coord>`
    pub uvs: Vec<f32>,
}

impl Texture2DGroup {
    /// Create an empty group
    pub fn new(id: impl Into<ResourceId>, texid: impl Into<ResourceId>) -> Self {
        Self {
            id: id.into(),
            texid: texid.into(),
            displaypropertiesid: None,
            uvs: Vec::new(),
        }
    }

    /// Number of coordinates in the group
    pub fn len(&self) -> usize {
        self.uvs.len() / 2
    }

    /// Whether the group has no coordinates
    pub fn is_empty(&self) -> bool {
        self.uvs.is_empty()
    }

    /// Coordinate at a property index
    pub fn uv(&self, index: u32) -> Option<[f32; 2]> {
        let i = index as usize * 2;
        Some([*self.uvs.get(i)?, *self.uvs.get(i + 1)?])
    }
}

/// `<colorgroup>` resource; colors are stored linearized
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGroup {
    /// Resource id
    pub id: ResourceId,
    /// Display properties id
    pub displaypropertiesid: Option<ResourceId>,
    /// Linear colors in declaration order
    pub colors: Vec<Color>,
}

impl ColorGroup {
    /// Create an empty group
    pub fn new(id: impl Into<ResourceId>) -> Self {
        Self {
            id: id.into(),
            displaypropertiesid: None,
            colors: Vec::new(),
        }
    }
}

/// `<pbmetallic>` entry
#[derive(Debug, Clone, PartialEq)]
pub struct PbMetallic {
    /// Name
    pub name: Option<String>,
    /// Metallicness in `0.0..=1.0`
    pub metallicness: f32,
    /// Roughness in `0.0..=1.0`
    pub roughness: f32,
}

/// `<pbmetallicdisplayproperties>` resource
#[derive(Debug, Clone, PartialEq)]
pub struct PbMetallicDisplayProperties {
    /// Resource id
    pub id: ResourceId,
    /// Entries in declaration order
    pub metallic: Vec<PbMetallic>,
}

impl PbMetallicDisplayProperties {
    /// Create an empty set
    pub fn new(id: impl Into<ResourceId>) -> Self {
        Self {
            id: id.into(),
            metallic: Vec::new(),
        }
    }
}
