//! Geometry construction from mesh objects
//!
//! Triangles are first grouped by the resource they resolve to. Base material
//! and default groups become indexed geometry over the object's shared
//! position buffer; texture and color groups are expanded to non-indexed
//! geometry because their attributes are per corner, not per vertex.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{ColorGroup, Mesh, Object, ResourceId, Texture2DGroup, TriangleProperty};
use crate::scene::Geometry;

/// Triangles bound to one resource id
pub(crate) type TriangleGroup<'m> = (ResourceId, Vec<&'m TriangleProperty>);

/// Group triangles by effective resource id, in order of first appearance
pub(crate) fn group_by_resource<'m>(object: &Object, mesh: &'m Mesh) -> Vec<TriangleGroup<'m>> {
    let mut groups: Vec<TriangleGroup<'m>> = Vec::new();

    for triangle in &mesh.triangle_properties {
        let pid = triangle.effective_pid(object.pid.as_deref());
        match groups.iter_mut().find(|(id, _)| id == pid) {
            Some((_, triangles)) => triangles.push(triangle),
            None => groups.push((pid.to_string(), vec![triangle])),
        }
    }

    groups
}

/// Split base-material triangles by material index
///
/// The index is the triangle's `p1`, else the object's `pindex`, else 0.
pub(crate) fn group_by_material_index<'m>(
    triangles: &[&'m TriangleProperty],
    object_pindex: Option<u32>,
) -> BTreeMap<u32, Vec<&'m TriangleProperty>> {
    let mut groups: BTreeMap<u32, Vec<&'m TriangleProperty>> = BTreeMap::new();
    for &triangle in triangles {
        let index = triangle.p1.or(object_pindex).unwrap_or(0);
        groups.entry(index).or_default().push(triangle);
    }
    groups
}

/// Flatten vertex positions into an `x, y, z` buffer
pub(crate) fn flatten_positions(mesh: &Mesh) -> Arc<[f32]> {
    mesh.vertices.iter().flatten().copied().collect()
}

fn check_vertices(
    resource_id: &str,
    triangle: &TriangleProperty,
    vertex_count: usize,
) -> Result<()> {
    if let Some(v) = triangle
        .vertices()
        .into_iter()
        .find(|&v| v as usize >= vertex_count)
    {
        return Err(Error::unsupported_resource(
            resource_id,
            format!("vertex index {} out of range ({} vertices)", v, vertex_count),
        ));
    }
    Ok(())
}

fn corner_indices(
    resource_id: &str,
    triangle: &TriangleProperty,
    object_pindex: Option<u32>,
) -> Result<[u32; 3]> {
    triangle.effective_indices(object_pindex).ok_or_else(|| {
        Error::unsupported_resource(resource_id, "triangle has no property index")
    })
}

/// Indexed geometry drawing `triangles` from a shared position buffer
pub(crate) fn indexed_geometry(
    resource_id: &str,
    positions: &Arc<[f32]>,
    triangles: &[&TriangleProperty],
) -> Result<Geometry> {
    let vertex_count = positions.len() / 3;
    let mut indices = Vec::with_capacity(triangles.len() * 3);
    for triangle in triangles {
        check_vertices(resource_id, triangle, vertex_count)?;
        indices.extend_from_slice(&triangle.vertices());
    }
    Ok(Geometry::indexed(Arc::clone(positions), indices))
}

/// Non-indexed geometry with UVs looked up in a texture coordinate group
pub(crate) fn textured_geometry(
    mesh: &Mesh,
    triangles: &[&TriangleProperty],
    group: &Texture2DGroup,
    object_pindex: Option<u32>,
) -> Result<Geometry> {
    let mut positions = Vec::with_capacity(triangles.len() * 9);
    let mut uvs = Vec::with_capacity(triangles.len() * 6);

    for triangle in triangles {
        check_vertices(&group.id, triangle, mesh.vertices.len())?;
        let corners = corner_indices(&group.id, triangle, object_pindex)?;

        for (v, p) in triangle.vertices().into_iter().zip(corners) {
            let uv = group.uv(p).ok_or_else(|| {
                Error::unsupported_resource(
                    &group.id,
                    format!("texture coordinate {} out of range ({} coordinates)", p, group.len()),
                )
            })?;
            positions.extend_from_slice(&mesh.vertices[v as usize]);
            uvs.extend_from_slice(&uv);
        }
    }

    let mut geometry = Geometry::non_indexed(positions);
    geometry.uvs = Some(uvs);
    Ok(geometry)
}

/// Non-indexed geometry with per-corner colors from a color group
pub(crate) fn vertex_color_geometry(
    mesh: &Mesh,
    triangles: &[&TriangleProperty],
    group: &ColorGroup,
    object_pindex: Option<u32>,
) -> Result<Geometry> {
    let mut positions = Vec::with_capacity(triangles.len() * 9);
    let mut colors = Vec::with_capacity(triangles.len() * 9);

    for triangle in triangles {
        check_vertices(&group.id, triangle, mesh.vertices.len())?;
        let corners = corner_indices(&group.id, triangle, object_pindex)?;

        for (v, p) in triangle.vertices().into_iter().zip(corners) {
            let color = group.colors.get(p as usize).ok_or_else(|| {
                Error::unsupported_resource(
                    &group.id,
                    format!("color index {} out of range ({} colors)", p, group.colors.len()),
                )
            })?;
            positions.extend_from_slice(&mesh.vertices[v as usize]);
            colors.extend_from_slice(&color.to_array());
        }
    }

    let mut geometry = Geometry::non_indexed(positions);
    geometry.colors = Some(colors);
    Ok(geometry)
}
