//! Scene construction from parsed model parts

mod assembler;
mod geometry;
mod material;
mod scene;

pub(crate) use assembler::ObjectAssembler;
pub(crate) use scene::place_build_items;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::extension::ExtensionRegistry;
use crate::image_loader::ImageLoader;
use crate::model::ModelDocument;
use crate::opc::Archive;

/// Counters describing how much work one load did
///
/// Every object, material and texture is built at most once per load, so
/// these stay equal to the number of distinct resources used no matter how
/// often they are placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Objects resolved into scene subtrees
    pub objects_built: usize,
    /// Mesh nodes created
    pub meshes_built: usize,
    /// Materials created
    pub materials_built: usize,
    /// Textures created
    pub textures_built: usize,
}

/// Read-only inputs shared by every build step of one load
#[derive(Clone, Copy)]
pub(crate) struct LoadContext<'a> {
    /// Parsed model parts keyed by archive path
    pub documents: &'a BTreeMap<String, ModelDocument>,
    /// Decompressed package
    pub archive: &'a Archive,
    /// Image bytes bound through model relationships, keyed by target
    pub texture_parts: &'a HashMap<String, Arc<[u8]>>,
    /// Registered extension handlers
    pub extensions: &'a ExtensionRegistry,
    /// Optional pixel decoder
    pub image_loader: Option<&'a dyn ImageLoader>,
    /// Color of the fallback material
    pub default_color: u32,
}

impl<'a> LoadContext<'a> {
    /// Encoded bytes of a texture image part
    ///
    /// Relationship bindings win; otherwise the path is looked up in the
    /// archive directly.
    pub fn texture_bytes(&self, path: &str) -> Option<Arc<[u8]>> {
        self.texture_parts
            .get(path)
            .or_else(|| self.archive.get(&crate::opc::resolve_part_name(path)))
            .cloned()
    }
}
