//! Loader entry points and configuration

use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Seek};
use std::sync::Arc;

use tracing::{debug, error};

use crate::builder::{BuildStats, LoadContext, ObjectAssembler, place_build_items};
use crate::error::{Error, Result};
use crate::extension::{ExtensionHandler, ExtensionRegistry};
use crate::image_loader::ImageLoader;
use crate::opc::{Archive, Package};
use crate::parser::{count_objects, parse_model_xml_with_progress};
use crate::scene::SceneNode;

/// Color of the material used for triangles without any resource
pub const DEFAULT_COLOR: u32 = 0xaaaaff;

/// Configuration for a [`Loader`]
///
/// # Example
///
/// ```
/// use lib3mf_scene::{Loader, LoaderConfig};
///
/// let loader = Loader::new(LoaderConfig::new().with_default_color(0x808080));
/// assert_eq!(loader.config().default_color(), 0x808080);
/// ```
#[derive(Clone)]
pub struct LoaderConfig {
    extensions: ExtensionRegistry,
    image_loader: Option<Arc<dyn ImageLoader>>,
    default_color: u32,
}

impl std::fmt::Debug for LoaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderConfig")
            .field("extensions", &self.extensions)
            .field("image_loader", &self.image_loader.is_some())
            .field("default_color", &format_args!("{:#08x}", self.default_color))
            .finish()
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderConfig {
    /// Configuration without handlers or image decoding
    pub fn new() -> Self {
        Self {
            extensions: ExtensionRegistry::new(),
            image_loader: None,
            default_color: DEFAULT_COLOR,
        }
    }

    /// Register an extension handler
    pub fn with_extension_handler(mut self, handler: Arc<dyn ExtensionHandler>) -> Self {
        self.extensions.register(handler);
        self
    }

    /// Decode texture images with the given loader
    pub fn with_image_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.image_loader = Some(loader);
        self
    }

    /// Color (`0xRRGGBB`) of the fallback material
    pub fn with_default_color(mut self, color: u32) -> Self {
        self.default_color = color;
        self
    }

    /// Registered extension handlers
    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Color of the fallback material
    pub fn default_color(&self) -> u32 {
        self.default_color
    }
}

/// Result of a full load
#[derive(Debug, Clone)]
pub struct LoadedScene {
    /// Root of the scene graph, one child per build item
    pub root: SceneNode,
    /// Unit declared by the root model part
    pub unit: String,
    /// Allow-listed metadata of the root model part
    pub metadata: HashMap<String, String>,
    /// Work counters
    pub stats: BuildStats,
}

/// Clamps reported values to a non-decreasing sequence in `0.0..=1.0`
struct Progress<'f> {
    callback: &'f mut dyn FnMut(f32),
    last: f32,
}

impl<'f> Progress<'f> {
    fn new(callback: &'f mut dyn FnMut(f32)) -> Self {
        Self {
            callback,
            last: 0.0,
        }
    }

    fn report(&mut self, value: f32) {
        let value = value.clamp(self.last, 1.0);
        self.last = value;
        (self.callback)(value);
    }

    /// Report `start + span * done / total`
    fn report_fraction(&mut self, start: f32, span: f32, done: usize, total: usize) {
        if total > 0 {
            self.report(start + span * done as f32 / total as f32);
        }
    }
}

/// Turns 3MF packages into scene graphs
///
/// A loader holds only configuration and can be shared between threads; all
/// per-load state lives inside a single call.
///
/// # Example
///
/// ```no_run
/// use lib3mf_scene::Loader;
///
/// let data = std::fs::read("model.3mf")?;
/// let scene = Loader::default().parse(&data)?;
/// println!("{} meshes", scene.mesh_count());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    /// Create a loader with the given configuration
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// The loader configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Load a package held in memory
    pub fn parse(&self, data: &[u8]) -> Result<SceneNode> {
        self.parse_with_progress(data, |_| {})
    }

    /// Load a package held in memory, reporting progress in `0.0..=1.0`
    ///
    /// The callback sees a non-decreasing sequence ending with exactly `1.0`
    /// on success.
    pub fn parse_with_progress(
        &self,
        data: &[u8],
        on_progress: impl FnMut(f32),
    ) -> Result<SceneNode> {
        self.load(data, on_progress).map(|loaded| loaded.root)
    }

    /// Callback-style load
    ///
    /// Failures are logged, handed to `on_error` and reported as `None`.
    pub fn load_from_buffer(
        &self,
        data: &[u8],
        on_progress: impl FnMut(f32),
        on_error: impl FnOnce(&Error),
    ) -> Option<SceneNode> {
        match self.parse_with_progress(data, on_progress) {
            Ok(scene) => Some(scene),
            Err(e) => {
                error!(error = %e, "failed to load 3MF package");
                on_error(&e);
                None
            }
        }
    }

    /// Load a package from any seekable reader
    pub fn from_reader<R: Read + Seek>(&self, reader: R) -> Result<SceneNode> {
        let mut on_progress = |_: f32| {};
        let mut progress = Progress::new(&mut on_progress);
        let archive = Archive::from_reader(reader)?;
        self.load_archive(archive, &mut progress)
            .map(|loaded| loaded.root)
    }

    /// Load a package held in memory and return the scene with its metadata
    pub fn load(&self, data: &[u8], mut on_progress: impl FnMut(f32)) -> Result<LoadedScene> {
        let mut progress = Progress::new(&mut on_progress);
        let archive = Archive::from_bytes(data)?;
        self.load_archive(archive, &mut progress)
    }

    fn load_archive(&self, archive: Archive, progress: &mut Progress<'_>) -> Result<LoadedScene> {
        debug!(parts = archive.len(), "decompressed package");
        progress.report(0.1);

        let package = Package::from_archive(archive)?;
        let root_part = package.root_model_part()?;
        if !package.archive().contains(&root_part) {
            return Err(Error::MissingFile(root_part));
        }
        let texture_parts = package.texture_parts();
        debug!(root = %root_part, textures = texture_parts.len(), "resolved package relationships");

        let documents = parse_documents(&package, &root_part, progress)?;
        progress.report(0.5);

        let ctx = LoadContext {
            documents: &documents,
            archive: package.archive(),
            texture_parts: &texture_parts,
            extensions: &self.config.extensions,
            image_loader: self.config.image_loader.as_deref(),
            default_color: self.config.default_color,
        };
        let mut assembler = ObjectAssembler::new(ctx);

        let total: usize = documents
            .values()
            .map(|doc| doc.resources.objects().len())
            .sum();
        let mut built = 0;
        for (part, document) in &documents {
            for object in document.resources.objects() {
                assembler.resolve(part, &object.id)?;
                built += 1;
                progress.report_fraction(0.5, 0.3, built, total);
            }
        }
        progress.report(0.8);

        let root_document = documents
            .get(&root_part)
            .ok_or_else(|| Error::MissingFile(root_part.clone()))?;
        let items = &root_document.build_items;
        let root = place_build_items(&mut assembler, &root_part, items, &mut |placed: usize| {
            progress.report_fraction(0.8, 0.2, placed, items.len())
        })?;
        progress.report(1.0);

        let stats = assembler.stats();
        debug!(
            objects = stats.objects_built,
            meshes = stats.meshes_built,
            materials = stats.materials_built,
            textures = stats.textures_built,
            "loaded 3MF package"
        );

        Ok(LoadedScene {
            root,
            unit: root_document.unit.clone(),
            metadata: root_document.metadata.clone(),
            stats,
        })
    }
}

/// Parse every model part of the package
///
/// A part that fails to parse is logged and left out, unless it is the root
/// part, in which case the load fails.
fn parse_documents(
    package: &Package,
    root_part: &str,
    progress: &mut Progress<'_>,
) -> Result<BTreeMap<String, crate::model::ModelDocument>> {
    let mut sources = Vec::new();
    for name in package.model_part_names() {
        match package.read_text(&name) {
            Ok(xml) => sources.push((name, xml)),
            Err(e) if name == root_part => return Err(e),
            Err(e) => error!(part = %name, error = %e, "rejected model part"),
        }
    }

    let total: usize = sources.iter().map(|(_, xml)| count_objects(xml)).sum();
    let mut parsed_before = 0;
    let mut documents = BTreeMap::new();

    for (name, xml) in &sources {
        let result = parse_model_xml_with_progress(name, xml, &mut |parsed: usize| {
            progress.report_fraction(0.1, 0.4, parsed_before + parsed, total)
        });
        match result {
            Ok(document) => {
                parsed_before += document.resources.objects().len();
                documents.insert(name.clone(), document);
            }
            Err(e) if name == root_part => return Err(e),
            Err(e) => error!(part = %name, error = %e, "rejected model part"),
        }
    }

    Ok(documents)
}
