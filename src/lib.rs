//! # lib3mf-scene
//!
//! A pure Rust loader that turns 3MF (3D Manufacturing Format) packages into a
//! renderable scene graph.
//!
//! A 3MF file is a ZIP container following the Open Packaging Conventions
//! (OPC). Its relationships point at one or more XML model parts describing
//! meshes, materials, textures and how objects are assembled and placed. This
//! crate decompresses the container, parses every model part, resolves
//! objects (including components referencing objects declared later or in
//! other parts) and produces a tree of [`SceneNode`]s ready for a renderer.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Base materials (flat or metallic-roughness), color groups and textures
//! - Shared geometry: an object placed many times is built once
//! - Progress reporting and pluggable extension handlers
//!
//! ## Example
//!
//! ```no_run
//! use lib3mf_scene::Loader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("model.3mf")?;
//! let scene = Loader::default().parse_with_progress(&data, |p| {
//!     println!("{:.0}%", p * 100.0);
//! })?;
//!
//! for (world, mesh) in scene.meshes() {
//!     println!(
//!         "{} triangles at {:?}",
//!         mesh.geometry.triangle_count(),
//!         world.column(3)
//!     );
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
pub mod color;
pub mod error;
pub mod extension;
mod image_loader;
mod loader;
pub mod model;
pub mod opc;
pub mod parser;
pub mod scene;

pub use builder::BuildStats;
pub use color::Color;
pub use error::{Error, Result};
pub use extension::{ExtensionContext, ExtensionHandler, ExtensionRegistry};
pub use image_loader::ImageLoader;
pub use loader::{DEFAULT_COLOR, LoadedScene, Loader, LoaderConfig};
pub use model::{ModelDocument, ResourceId};
pub use scene::{
    Geometry, Material, MeshNode, NodeKind, SceneNode, Shading, Texture, TextureFilter,
    TextureImage, Wrapping,
};

/// Load a 3MF package held in memory with the default configuration
///
/// # Example
///
/// ```no_run
/// let data = std::fs::read("model.3mf")?;
/// let scene = lib3mf_scene::parse(&data)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse(data: &[u8]) -> Result<SceneNode> {
    Loader::default().parse(data)
}
