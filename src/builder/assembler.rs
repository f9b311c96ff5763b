//! Memoized object resolution
//!
//! Objects are resolved on demand and every built subtree is cached under
//! `(part, object id)`. Components may reference objects declared later in
//! the same part or in other parts; the cache makes each one build exactly
//! once however often it is referenced.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::geometry::{
    flatten_positions, group_by_material_index, group_by_resource, indexed_geometry,
    textured_geometry, vertex_color_geometry,
};
use super::{BuildStats, LoadContext, material};
use crate::error::{Error, Result};
use crate::model::{
    Component, Mesh, ModelDocument, Object, ObjectBody, ResourceKind, TriangleProperty,
};
use crate::opc::resolve_part_name;
use crate::scene::{Geometry, Material, SceneNode, Texture};

type ObjectKey = (String, String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MaterialKey {
    Base {
        part: String,
        group: String,
        index: u32,
    },
    Textured {
        part: String,
        group: String,
    },
    VertexColors,
    Default,
}

/// Geometry of one triangle group with the material it is drawn with
struct BuiltMesh {
    geometry: Geometry,
    material: Arc<Material>,
}

/// Resolves objects into scene subtrees, building each resource once
pub(crate) struct ObjectAssembler<'a> {
    ctx: LoadContext<'a>,
    objects: HashMap<ObjectKey, Arc<SceneNode>>,
    materials: HashMap<MaterialKey, Arc<Material>>,
    textures: HashMap<ObjectKey, Arc<Texture>>,
    in_progress: Vec<ObjectKey>,
    stats: BuildStats,
}

impl<'a> ObjectAssembler<'a> {
    pub fn new(ctx: LoadContext<'a>) -> Self {
        Self {
            ctx,
            objects: HashMap::new(),
            materials: HashMap::new(),
            textures: HashMap::new(),
            in_progress: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Resolve an object of a model part into its (cached) scene subtree
    pub fn resolve(&mut self, part: &str, object_id: &str) -> Result<Arc<SceneNode>> {
        let key = (part.to_string(), object_id.to_string());
        if let Some(node) = self.objects.get(&key) {
            return Ok(Arc::clone(node));
        }

        if let Some(start) = self.in_progress.iter().position(|k| *k == key) {
            let mut chain: Vec<String> = self.in_progress[start..]
                .iter()
                .map(|(_, id)| id.clone())
                .collect();
            chain.push(object_id.to_string());
            return Err(Error::CyclicReference { chain });
        }

        let documents = self.ctx.documents;
        let document = documents.get(part).ok_or_else(|| Error::MissingObject {
            part: part.to_string(),
            object_id: object_id.to_string(),
        })?;
        let object = document
            .resources
            .object(object_id)
            .ok_or_else(|| Error::MissingObject {
                part: part.to_string(),
                object_id: object_id.to_string(),
            })?;

        self.in_progress.push(key.clone());
        let built = match &object.body {
            ObjectBody::Mesh(mesh) => self.build_mesh_object(document, object, mesh),
            ObjectBody::Composite(components) => self.build_composite(part, object, components),
            ObjectBody::Empty => Ok(SceneNode::group(object.name.clone())),
        };
        self.in_progress.pop();

        let node = Arc::new(built?);
        self.objects.insert(key, Arc::clone(&node));
        self.stats.objects_built += 1;
        debug!(part = %part, object = %object_id, meshes = node.mesh_count(), "built object");
        Ok(node)
    }

    fn build_composite(
        &mut self,
        part: &str,
        object: &Object,
        components: &[Component],
    ) -> Result<SceneNode> {
        let mut node = SceneNode::group(object.name.clone());
        for component in components {
            let target_part = component
                .path
                .as_deref()
                .map(resolve_part_name)
                .unwrap_or_else(|| part.to_string());
            let child = self.resolve(&target_part, &component.object_id)?;
            node.add(child.placed(component.transform.as_ref()));
        }
        Ok(node)
    }

    fn build_mesh_object(
        &mut self,
        document: &'a ModelDocument,
        object: &'a Object,
        mesh: &'a Mesh,
    ) -> Result<SceneNode> {
        let extensions = self.ctx.extensions;
        let mesh = extensions.apply_all(document, &object.id, mesh)?;

        let mut node = SceneNode::group(object.name.clone());
        let mut positions: Option<Arc<[f32]>> = None;

        for (resource_id, triangles) in group_by_resource(object, &mesh) {
            let built = match document.resources.resource_kind(&resource_id) {
                Some(ResourceKind::Texture) => {
                    self.build_textured(document, object, &mesh, &resource_id, &triangles)
                }
                Some(ResourceKind::Material) => {
                    let positions = positions.get_or_insert_with(|| flatten_positions(&mesh));
                    self.build_base_materials(document, object, positions, &resource_id, &triangles)
                }
                Some(ResourceKind::VertexColor) => {
                    self.build_vertex_colored(document, object, &mesh, &resource_id, &triangles)
                }
                Some(ResourceKind::Default) => {
                    let positions = positions.get_or_insert_with(|| flatten_positions(&mesh));
                    let color = self.ctx.default_color;
                    indexed_geometry(&resource_id, positions, &triangles).and_then(|geometry| {
                        let material = self.material(MaterialKey::Default, || {
                            Ok(material::default_material(color))
                        })?;
                        Ok(vec![BuiltMesh { geometry, material }])
                    })
                }
                None => Err(Error::unsupported_resource(
                    &resource_id,
                    "not a texture group, base material set or color group",
                )),
            };

            match built {
                Ok(meshes) => {
                    for built in meshes {
                        node.add(SceneNode::mesh(Arc::new(built.geometry), built.material));
                        self.stats.meshes_built += 1;
                    }
                }
                Err(e) if e.is_recoverable() => {
                    warn!(
                        part = %document.part_name,
                        object = %object.id,
                        error = %e,
                        "skipping triangle group"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(node)
    }

    fn build_textured(
        &mut self,
        document: &'a ModelDocument,
        object: &Object,
        mesh: &Mesh,
        resource_id: &str,
        triangles: &[&TriangleProperty],
    ) -> Result<Vec<BuiltMesh>> {
        let Some(group) = document.resources.texture2dgroup.get(resource_id) else {
            return Ok(Vec::new());
        };
        let geometry = textured_geometry(mesh, triangles, group, object.pindex)?;

        let key = MaterialKey::Textured {
            part: document.part_name.clone(),
            group: group.id.clone(),
        };
        let material = match self.materials.get(&key) {
            Some(material) => Arc::clone(material),
            None => {
                let map = self.texture(document, &group.texid);
                self.material(key, || Ok(material::textured_material(map)))?
            }
        };
        Ok(vec![BuiltMesh { geometry, material }])
    }

    fn build_base_materials(
        &mut self,
        document: &'a ModelDocument,
        object: &Object,
        positions: &Arc<[f32]>,
        resource_id: &str,
        triangles: &[&TriangleProperty],
    ) -> Result<Vec<BuiltMesh>> {
        let Some(group) = document.resources.basematerials.get(resource_id) else {
            return Ok(Vec::new());
        };

        let mut meshes = Vec::new();
        for (index, triangles) in group_by_material_index(triangles, object.pindex) {
            let key = MaterialKey::Base {
                part: document.part_name.clone(),
                group: group.id.clone(),
                index,
            };
            let built = indexed_geometry(resource_id, positions, &triangles).and_then(|geometry| {
                let material = self.material(key, || {
                    material::base_material(group, index as usize, &document.resources)
                })?;
                Ok(BuiltMesh { geometry, material })
            });

            // a bad index only drops the triangles that use it
            match built {
                Ok(mesh) => meshes.push(mesh),
                Err(e) if e.is_recoverable() => {
                    warn!(
                        part = %document.part_name,
                        object = %object.id,
                        index,
                        error = %e,
                        "skipping base material index"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(meshes)
    }

    fn build_vertex_colored(
        &mut self,
        document: &'a ModelDocument,
        object: &Object,
        mesh: &Mesh,
        resource_id: &str,
        triangles: &[&TriangleProperty],
    ) -> Result<Vec<BuiltMesh>> {
        let Some(group) = document.resources.colorgroup.get(resource_id) else {
            return Ok(Vec::new());
        };
        let geometry = vertex_color_geometry(mesh, triangles, group, object.pindex)?;
        let material = self.material(MaterialKey::VertexColors, || {
            Ok(material::vertex_color_material())
        })?;
        Ok(vec![BuiltMesh { geometry, material }])
    }

    /// Cached material, created with `build` on first use
    fn material(
        &mut self,
        key: MaterialKey,
        build: impl FnOnce() -> Result<Material>,
    ) -> Result<Arc<Material>> {
        if let Some(material) = self.materials.get(&key) {
            return Ok(Arc::clone(material));
        }
        let material = Arc::new(build()?);
        self.materials.insert(key, Arc::clone(&material));
        self.stats.materials_built += 1;
        Ok(material)
    }

    /// Cached texture for a `texture2d` id; `None` when the id is unknown
    fn texture(&mut self, document: &ModelDocument, texid: &str) -> Option<Arc<Texture>> {
        let key = (document.part_name.clone(), texid.to_string());
        if let Some(texture) = self.textures.get(&key) {
            return Some(Arc::clone(texture));
        }

        let Some(texture2d) = document.resources.texture2d.get(texid) else {
            warn!(
                part = %document.part_name,
                texid = %texid,
                "texture group references unknown texture"
            );
            return None;
        };

        let data = self.ctx.texture_bytes(&texture2d.path);
        if data.is_none() {
            warn!(path = %texture2d.path, "texture image part not found");
        }
        let texture = Arc::new(material::texture(texture2d, data, self.ctx.image_loader));
        self.textures.insert(key, Arc::clone(&texture));
        self.stats.textures_built += 1;
        Some(texture)
    }
}
