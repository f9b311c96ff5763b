//! Placement of build items under the scene root

use tracing::debug;

use super::ObjectAssembler;
use crate::error::Result;
use crate::model::BuildItem;
use crate::opc::resolve_part_name;
use crate::scene::SceneNode;

/// Resolve and place every build item of the root part
///
/// Each item gets its own copy of the object's subtree with the item transform
/// applied on top. `on_item` receives the number of items placed so far.
pub(crate) fn place_build_items(
    assembler: &mut ObjectAssembler<'_>,
    root_part: &str,
    items: &[BuildItem],
    on_item: &mut dyn FnMut(usize),
) -> Result<SceneNode> {
    let mut root = SceneNode::group(None);

    for (i, item) in items.iter().enumerate() {
        let part = item
            .path
            .as_deref()
            .map(resolve_part_name)
            .unwrap_or_else(|| root_part.to_string());
        let object = assembler.resolve(&part, &item.object_id)?;
        root.add(object.placed(item.transform.as_ref()));
        on_item(i + 1);
    }

    debug!(items = items.len(), meshes = root.mesh_count(), "placed build items");
    Ok(root)
}
