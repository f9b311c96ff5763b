//! Data structures representing parsed 3MF model parts

mod core;
mod material;

pub use core::{
    BuildItem, Component, DEFAULT_RESOURCE_ID, METADATA_NAMES, Mesh, ModelDocument, Object,
    ObjectBody, ObjectType, ResourceId, ResourceKind, Resources, Transform, TriangleProperty,
    transform_from_values,
};

pub use material::{
    BaseMaterial, BaseMaterialGroup, ColorGroup, FilterMode, PbMetallic,
    PbMetallicDisplayProperties, Texture2D, Texture2DGroup, TileStyle,
};
