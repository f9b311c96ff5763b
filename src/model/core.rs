//! Core 3MF types: documents, objects, meshes, components and build items

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::Matrix4;

use super::material::{
    BaseMaterialGroup, ColorGroup, PbMetallicDisplayProperties, Texture2D, Texture2DGroup,
};

/// Document-scoped resource identifier
///
/// Identifiers are kept as the opaque strings found in the XML; the format
/// requires them to be unique per resource map and that is assumed here.
pub type ResourceId = String;

/// Affine placement matrix of a component or build item
pub type Transform = Matrix4<f32>;

/// Resource id assigned to triangles that resolve to no material at all
pub const DEFAULT_RESOURCE_ID: &str = "default";

/// Metadata names kept by the parser; anything else is dropped
pub const METADATA_NAMES: [&str; 8] = [
    "Title",
    "Designer",
    "Description",
    "Copyright",
    "LicenseTerms",
    "Rating",
    "CreationDate",
    "ModificationDate",
];

/// Build a 4x4 affine matrix from the 12 values of a 3MF `transform` attribute
///
/// The attribute lists the matrix column by column without the implicit last
/// row, so `m00 m01 m02 m10 m11 m12 m20 m21 m22 m30 m31 m32` becomes
///
/// ```text
/// | t0 t3 t6 t9  |
/// | t1 t4 t7 t10 |
/// | t2 t5 t8 t11 |
/// | 0  0  0  1   |
/// ```
pub fn transform_from_values(t: &[f32; 12]) -> Transform {
    Matrix4::new(
        t[0], t[3], t[6], t[9], //
        t[1], t[4], t[7], t[10], //
        t[2], t[5], t[8], t[11], //
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Object type as declared by the `type` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectType {
    /// A printable model (the default)
    #[default]
    Model,
    /// Support structure
    Support,
    /// Solid support structure
    SolidSupport,
    /// Surface object
    Surface,
    /// Any other object
    Other,
}

impl ObjectType {
    /// Parse the attribute value; unknown values are reported as `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "model" => Some(ObjectType::Model),
            "support" => Some(ObjectType::Support),
            "solidsupport" => Some(ObjectType::SolidSupport),
            "surface" => Some(ObjectType::Surface),
            "other" => Some(ObjectType::Other),
            _ => None,
        }
    }
}

/// Per-triangle vertex indices and optional property bindings
///
/// Property indices and the resource id stay `None` when the attribute is
/// absent, meaning "inherit from the owning object".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TriangleProperty {
    /// First vertex index
    pub v1: u32,
    /// Second vertex index
    pub v2: u32,
    /// Third vertex index
    pub v3: u32,
    /// Property index for the first vertex
    pub p1: Option<u32>,
    /// Property index for the second vertex
    pub p2: Option<u32>,
    /// Property index for the third vertex
    pub p3: Option<u32>,
    /// Resource id the triangle is bound to
    pub pid: Option<ResourceId>,
}

impl TriangleProperty {
    /// Create a triangle without property bindings
    pub fn new(v1: u32, v2: u32, v3: u32) -> Self {
        Self {
            v1,
            v2,
            v3,
            ..Default::default()
        }
    }

    /// Vertex indices in declaration order
    pub fn vertices(&self) -> [u32; 3] {
        [self.v1, self.v2, self.v3]
    }

    /// Resource id after applying the triangle → object → `default` fallback
    pub fn effective_pid<'a>(&'a self, object_pid: Option<&'a str>) -> &'a str {
        self.pid
            .as_deref()
            .or(object_pid)
            .unwrap_or(DEFAULT_RESOURCE_ID)
    }

    /// Property indices for the three corners
    ///
    /// `p1` falls back to the object's `pindex`; `p2` and `p3` fall back to
    /// the effective `p1`. Returns `None` when nothing provides an index.
    pub fn effective_indices(&self, object_pindex: Option<u32>) -> Option<[u32; 3]> {
        let p1 = self.p1.or(object_pindex)?;
        Some([p1, self.p2.unwrap_or(p1), self.p3.unwrap_or(p1)])
    }
}

/// Triangle mesh of a leaf object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions
    pub vertices: Vec<[f32; 3]>,
    /// Vertex index triples, one per triangle
    pub triangles: Vec<[u32; 3]>,
    /// Property bindings, parallel to `triangles`
    pub triangle_properties: Vec<TriangleProperty>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a triangle, keeping the index buffer and property list in sync
    pub fn push_triangle(&mut self, triangle: TriangleProperty) {
        self.triangles.push(triangle.vertices());
        self.triangle_properties.push(triangle);
    }
}

/// Reference from a composite object to another object
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Referenced object id
    pub object_id: ResourceId,
    /// Local placement
    pub transform: Option<Transform>,
    /// Model part holding the referenced object (production `path` attribute)
    pub path: Option<String>,
}

impl Component {
    /// Create a component without transform
    pub fn new(object_id: impl Into<ResourceId>) -> Self {
        Self {
            object_id: object_id.into(),
            transform: None,
            path: None,
        }
    }
}

/// Top-level placement of an object in the build
#[derive(Debug, Clone, PartialEq)]
pub struct BuildItem {
    /// Referenced object id
    pub object_id: ResourceId,
    /// Placement transform
    pub transform: Option<Transform>,
    /// Model part holding the referenced object (production `path` attribute)
    pub path: Option<String>,
}

impl BuildItem {
    /// Create a build item without transform
    pub fn new(object_id: impl Into<ResourceId>) -> Self {
        Self {
            object_id: object_id.into(),
            transform: None,
            path: None,
        }
    }
}

/// Geometry carried by an object
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectBody {
    /// Leaf object with its own triangles
    Mesh(Mesh),
    /// Assembly of other objects
    Composite(Vec<Component>),
    /// Neither `<mesh>` nor `<components>` was present
    Empty,
}

/// Object resource
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Object id
    pub id: ResourceId,
    /// Object type
    pub object_type: ObjectType,
    /// Default resource id for triangles without `pid`
    pub pid: Option<ResourceId>,
    /// Default property index for triangles without `p1`
    pub pindex: Option<u32>,
    /// Thumbnail part path
    pub thumbnail: Option<String>,
    /// Part number
    pub partnumber: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Mesh or components
    pub body: ObjectBody,
}

impl Object {
    /// Create an empty object with the given id
    pub fn new(id: impl Into<ResourceId>) -> Self {
        Self {
            id: id.into(),
            object_type: ObjectType::default(),
            pid: None,
            pindex: None,
            thumbnail: None,
            partnumber: None,
            name: None,
            body: ObjectBody::Empty,
        }
    }

    /// The mesh, if this is a leaf object
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.body {
            ObjectBody::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// The components, if this is a composite object
    pub fn components(&self) -> Option<&[Component]> {
        match &self.body {
            ObjectBody::Composite(components) => Some(components),
            _ => None,
        }
    }
}

/// How triangles bound to a resource id are turned into geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// `texture2dgroup`: UV-mapped mesh
    Texture,
    /// `basematerials`: one flat or PBR material per base index
    Material,
    /// `colorgroup`: per-vertex colors
    VertexColor,
    /// No resource at all; fallback material
    Default,
}

/// Resource registry of one model part
#[derive(Debug, Clone, Default)]
pub struct Resources {
    /// Base material sets
    pub basematerials: HashMap<ResourceId, BaseMaterialGroup>,
    /// 2D textures
    pub texture2d: HashMap<ResourceId, Texture2D>,
    /// Texture coordinate groups
    pub texture2dgroup: HashMap<ResourceId, Texture2DGroup>,
    /// Color groups
    pub colorgroup: HashMap<ResourceId, ColorGroup>,
    /// Metallic display property sets
    pub pbmetallicdisplayproperties: HashMap<ResourceId, PbMetallicDisplayProperties>,
    objects: Vec<Object>,
    object_index: HashMap<ResourceId, usize>,
}

impl Resources {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object; a later object with the same id shadows the earlier one
    pub fn add_object(&mut self, object: Object) {
        self.object_index
            .insert(object.id.clone(), self.objects.len());
        self.objects.push(object);
    }

    /// Look up an object by id
    pub fn object(&self, id: &str) -> Option<&Object> {
        self.object_index.get(id).map(|&i| &self.objects[i])
    }

    /// Objects in declaration order
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    /// Classify a resource id
    ///
    /// Texture groups win over base materials, which win over color groups;
    /// the literal `default` id is last. Anything else is not renderable.
    pub fn resource_kind(&self, id: &str) -> Option<ResourceKind> {
        if self.texture2dgroup.contains_key(id) {
            Some(ResourceKind::Texture)
        } else if self.basematerials.contains_key(id) {
            Some(ResourceKind::Material)
        } else if self.colorgroup.contains_key(id) {
            Some(ResourceKind::VertexColor)
        } else if id == DEFAULT_RESOURCE_ID {
            Some(ResourceKind::Default)
        } else {
            None
        }
    }
}

/// One parsed model part
#[derive(Debug, Clone)]
pub struct ModelDocument {
    /// Archive path of the part, without leading `/`
    pub part_name: String,
    /// Unit of measurement (`millimeter` when not declared)
    pub unit: String,
    /// Allow-listed metadata
    pub metadata: HashMap<String, String>,
    /// Resource registry
    pub resources: Resources,
    /// Build items in declaration order
    pub build_items: Vec<BuildItem>,
    /// Declared namespaces, URI → prefix
    pub extensions: HashMap<String, String>,
    /// Source XML of the part, handed to extension handlers
    pub xml: Arc<str>,
}

impl ModelDocument {
    /// Create an empty document for a part
    pub fn new(part_name: impl Into<String>, xml: Arc<str>) -> Self {
        Self {
            part_name: part_name.into(),
            unit: "millimeter".to_string(),
            metadata: HashMap::new(),
            resources: Resources::new(),
            build_items: Vec::new(),
            extensions: HashMap::new(),
            xml,
        }
    }

    /// Prefix bound to a namespace URI, if the document declares it
    pub fn extension_prefix(&self, namespace: &str) -> Option<&str> {
        self.extensions.get(namespace).map(String::as_str)
    }
}
