//! Renderable scene graph produced by the loader
//!
//! The graph is a tree of [`SceneNode`]s. Group nodes carry a local transform
//! and children; mesh nodes carry shared [`Geometry`] and [`Material`]
//! handles. Cloning a node clones the tree structure but keeps pointing at the
//! same geometry and material allocations, which is how one built object is
//! placed many times.

mod material;

pub use material::{Material, Shading, Texture, TextureFilter, TextureImage, Wrapping};

use nalgebra::Matrix4;
use std::sync::Arc;

/// Vertex data of one mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    /// Flattened `x, y, z` positions
    pub positions: Arc<[f32]>,
    /// Triangle indices into `positions`; `None` for non-indexed geometry
    pub indices: Option<Vec<u32>>,
    /// Flattened `u, v` coordinates, one pair per vertex
    pub uvs: Option<Vec<f32>>,
    /// Flattened linear `r, g, b` colors, one triple per vertex
    pub colors: Option<Vec<f32>>,
}

impl Geometry {
    /// Non-indexed geometry: every three vertices form a triangle
    pub fn non_indexed(positions: Vec<f32>) -> Self {
        Self {
            positions: Arc::from(positions),
            indices: None,
            uvs: None,
            colors: None,
        }
    }

    /// Indexed geometry over a shared position buffer
    pub fn indexed(positions: Arc<[f32]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices: Some(indices),
            uvs: None,
            colors: None,
        }
    }

    /// Number of vertices in the position buffer
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles drawn
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.vertex_count() / 3,
        }
    }
}

/// Leaf payload: geometry drawn with a material
#[derive(Debug, Clone)]
pub struct MeshNode {
    /// Shared vertex data
    pub geometry: Arc<Geometry>,
    /// Shared material
    pub material: Arc<Material>,
}

/// Node payload
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Container of child nodes
    Group(Vec<SceneNode>),
    /// Drawable mesh
    Mesh(MeshNode),
}

/// Node of the scene graph
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Object name, when the source declared one
    pub name: Option<String>,
    /// Transform relative to the parent
    pub transform: Matrix4<f32>,
    /// Children or mesh
    pub kind: NodeKind,
}

impl SceneNode {
    /// Create an empty group with identity transform
    pub fn group(name: Option<String>) -> Self {
        Self {
            name,
            transform: Matrix4::identity(),
            kind: NodeKind::Group(Vec::new()),
        }
    }

    /// Create a mesh node with identity transform
    pub fn mesh(geometry: Arc<Geometry>, material: Arc<Material>) -> Self {
        Self {
            name: None,
            transform: Matrix4::identity(),
            kind: NodeKind::Mesh(MeshNode { geometry, material }),
        }
    }

    /// Append a child; a mesh node is first turned into a group holding the mesh
    pub fn add(&mut self, child: SceneNode) {
        if let NodeKind::Mesh(_) = self.kind {
            let mesh = std::mem::replace(&mut self.kind, NodeKind::Group(Vec::new()));
            let inner = SceneNode {
                name: None,
                transform: Matrix4::identity(),
                kind: mesh,
            };
            if let NodeKind::Group(children) = &mut self.kind {
                children.push(inner);
            }
        }
        if let NodeKind::Group(children) = &mut self.kind {
            children.push(child);
        }
    }

    /// Child nodes; empty for mesh nodes
    pub fn children(&self) -> &[SceneNode] {
        match &self.kind {
            NodeKind::Group(children) => children,
            NodeKind::Mesh(_) => &[],
        }
    }

    /// The mesh payload, if this is a mesh node
    pub fn as_mesh(&self) -> Option<&MeshNode> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            NodeKind::Group(_) => None,
        }
    }

    /// Pre-multiply the local transform: the node ends up at `matrix * old`
    pub fn apply_matrix(&mut self, matrix: &Matrix4<f32>) {
        self.transform = matrix * self.transform;
    }

    /// Independent copy of this node placed by an optional transform
    ///
    /// The copy shares geometry and materials with the original.
    pub fn placed(&self, transform: Option<&Matrix4<f32>>) -> SceneNode {
        let mut node = self.clone();
        if let Some(matrix) = transform {
            node.apply_matrix(matrix);
        }
        node
    }

    /// Every mesh in the subtree with its accumulated world transform
    pub fn meshes(&self) -> Vec<(Matrix4<f32>, &MeshNode)> {
        let mut out = Vec::new();
        self.collect_meshes(&Matrix4::identity(), &mut out);
        out
    }

    fn collect_meshes<'a>(
        &'a self,
        parent: &Matrix4<f32>,
        out: &mut Vec<(Matrix4<f32>, &'a MeshNode)>,
    ) {
        let world = parent * self.transform;
        match &self.kind {
            NodeKind::Mesh(mesh) => out.push((world, mesh)),
            NodeKind::Group(children) => {
                for child in children {
                    child.collect_meshes(&world, out);
                }
            }
        }
    }

    /// Number of mesh nodes in the subtree
    pub fn mesh_count(&self) -> usize {
        match &self.kind {
            NodeKind::Mesh(_) => 1,
            NodeKind::Group(children) => children.iter().map(SceneNode::mesh_count).sum(),
        }
    }
}
