//! XML parsing for 3MF model parts
//!
//! Model parts are read with a single streaming pass. The parser collects
//! the document unit, allow-listed metadata, namespace declarations, every
//! resource the scene builder understands and the build items. Elements from
//! other extensions are skipped; their namespaces are still recorded so
//! registered extension handlers can find them.

mod core;
mod material;

use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use material::{
    parse_base_element, parse_basematerials_start, parse_color_element, parse_colorgroup_start,
    parse_pbmetallic, parse_pbmetallic_start, parse_tex2coord, parse_texture2d,
    parse_texture2dgroup_start,
};

pub use core::{parse_build_item, parse_component, parse_object, parse_triangle, parse_vertex};

/// Size of 3MF transformation matrix (4x3 affine transform)
const TRANSFORM_MATRIX_SIZE: usize = 12;

/// Default buffer capacity for XML parsing (4KB)
const XML_BUFFER_CAPACITY: usize = 4096;

/// Extract local name from a potentially namespaced XML element name
///
/// - `"m:colorgroup"` returns `"colorgroup"`
/// - `"object"` returns `"object"`
pub(crate) fn get_local_name(name_str: &str) -> &str {
    if let Some(pos) = name_str.rfind(':') {
        &name_str[pos + 1..]
    } else {
        name_str
    }
}

/// Get an attribute value by its local name, regardless of namespace prefix
///
/// `p:path` and `prod:path` both have the local name `"path"`.
pub(crate) fn get_attr_by_local_name(
    attrs: &HashMap<String, String>,
    local_name: &str,
) -> Option<String> {
    attrs.iter().find_map(|(key, value)| {
        if !key.starts_with("xmlns") && get_local_name(key) == local_name {
            Some(value.clone())
        } else {
            None
        }
    })
}

/// Collect the attributes of an element, unescaping entity references in values
pub(crate) fn parse_attributes(e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::with_capacity(8);

    for attr in e.attributes() {
        let attr = attr?;
        let key =
            std::str::from_utf8(attr.key.as_ref()).map_err(|e| Error::XmlAttr(e.to_string()))?;
        let value = attr.unescape_value()?;

        attrs.insert(key.to_string(), value.into_owned());
    }

    Ok(attrs)
}

/// Parse a `transform` attribute into a placement matrix
pub(crate) fn parse_transform(value: &str) -> Result<Transform> {
    let values = value
        .split_whitespace()
        .map(|s| {
            s.parse::<f32>().map_err(|_| {
                Error::parse_error_with_context("transform", s, "floating-point number")
            })
        })
        .collect::<Result<Vec<f32>>>()?;

    if values.len() != TRANSFORM_MATRIX_SIZE {
        return Err(Error::Parse(format!(
            "Transform matrix must have exactly {} values (got {})",
            TRANSFORM_MATRIX_SIZE,
            values.len()
        )));
    }

    let mut t = [0.0; TRANSFORM_MATRIX_SIZE];
    t.copy_from_slice(&values);
    Ok(transform_from_values(&t))
}

/// Count `<object>` elements in a model part
///
/// Used to scale progress reporting before the real parse. Malformed XML
/// stops the count early; the parse proper reports the error.
pub fn count_objects(xml: &str) -> usize {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);
    let mut count = 0;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if get_local_name(&String::from_utf8_lossy(e.name().as_ref())) == "object" {
                    count += 1;
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    count
}

/// Parse one model part
///
/// `part_name` is recorded on the document and used in error messages.
pub fn parse_model_xml(part_name: &str, xml: &str) -> Result<ModelDocument> {
    parse_model_xml_with_progress(part_name, xml, &mut |_: usize| {})
}

/// Parse one model part, reporting the number of objects parsed so far
///
/// The callback runs once after each completed `<object>` element.
pub fn parse_model_xml_with_progress(
    part_name: &str,
    xml: &str,
    on_object: &mut dyn FnMut(usize),
) -> Result<ModelDocument> {
    let mut reader = Reader::from_str(xml);

    let mut document = ModelDocument::new(part_name, Arc::from(xml));
    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);

    let mut seen_root = false;
    let mut in_resources = false;
    let mut in_build = false;
    let mut objects_parsed = 0;

    let mut current_object: Option<Object> = None;
    let mut current_mesh: Option<Mesh> = None;
    let mut current_components: Option<Vec<Component>> = None;
    let mut current_metadata: Option<(String, String)> = None;

    let mut current_basematerials: Option<BaseMaterialGroup> = None;
    let mut current_texture2dgroup: Option<Texture2DGroup> = None;
    let mut current_colorgroup: Option<ColorGroup> = None;
    let mut current_pbmetallic: Option<PbMetallicDisplayProperties> = None;

    loop {
        let event_result = reader.read_event_into(&mut buf);
        let is_empty_element = matches!(&event_result, Ok(Event::Empty(_)));

        match event_result {
            Ok(Event::DocType(_)) => {
                return Err(Error::document(
                    part_name,
                    "DTD declarations are not allowed",
                ));
            }
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::document(part_name, e.to_string()))?;
                let local_name = get_local_name(name_str);

                if !seen_root {
                    if !local_name.eq_ignore_ascii_case("model") {
                        return Err(Error::document(
                            part_name,
                            format!("root element is <{}>, expected <model>", name_str),
                        ));
                    }
                    seen_root = true;
                    parse_model_element(&mut document, e)?;
                } else {
                    match local_name {
                        "metadata" if !in_resources && !in_build => {
                            let attrs = parse_attributes(e)?;
                            if let Some(meta_name) = attrs.get("name") {
                                if is_empty_element {
                                    insert_metadata(&mut document, meta_name, String::new());
                                } else {
                                    current_metadata = Some((meta_name.clone(), String::new()));
                                }
                            }
                        }
                        "resources" => in_resources = !is_empty_element,
                        "build" => in_build = !is_empty_element,
                        "object" if in_resources => {
                            current_object = Some(parse_object(e)?);
                            if is_empty_element {
                                finish_object(
                                    &mut document,
                                    &mut current_object,
                                    &mut current_mesh,
                                    &mut current_components,
                                );
                                objects_parsed += 1;
                                on_object(objects_parsed);
                            }
                        }
                        "mesh" if current_object.is_some() => {
                            current_mesh = Some(Mesh::new());
                        }
                        "vertex" => {
                            if let Some(ref mut mesh) = current_mesh {
                                mesh.vertices.push(parse_vertex(e)?);
                            }
                        }
                        "triangle" => {
                            if let Some(ref mut mesh) = current_mesh {
                                mesh.push_triangle(parse_triangle(e)?);
                            }
                        }
                        "components" if current_object.is_some() => {
                            current_components.get_or_insert_with(Vec::new);
                        }
                        "component" => {
                            if let Some(ref mut components) = current_components {
                                components.push(parse_component(e)?);
                            }
                        }
                        "item" if in_build => {
                            document.build_items.push(parse_build_item(e)?);
                        }
                        "basematerials" if in_resources => {
                            let group = parse_basematerials_start(e)?;
                            if is_empty_element {
                                document.resources.basematerials.insert(group.id.clone(), group);
                            } else {
                                current_basematerials = Some(group);
                            }
                        }
                        "base" => {
                            if let Some(ref mut group) = current_basematerials {
                                let index = group.materials.len();
                                group.materials.push(parse_base_element(e, index)?);
                            }
                        }
                        "texture2d" if in_resources => {
                            let texture = parse_texture2d(e)?;
                            document.resources.texture2d.insert(texture.id.clone(), texture);
                        }
                        "texture2dgroup" if in_resources => {
                            let group = parse_texture2dgroup_start(e)?;
                            if is_empty_element {
                                document.resources.texture2dgroup.insert(group.id.clone(), group);
                            } else {
                                current_texture2dgroup = Some(group);
                            }
                        }
                        "tex2coord" => {
                            if let Some(ref mut group) = current_texture2dgroup {
                                let [u, v] = parse_tex2coord(e)?;
                                group.uvs.push(u);
                                group.uvs.push(v);
                            }
                        }
                        "colorgroup" if in_resources => {
                            let group = parse_colorgroup_start(e)?;
                            if is_empty_element {
                                document.resources.colorgroup.insert(group.id.clone(), group);
                            } else {
                                current_colorgroup = Some(group);
                            }
                        }
                        "color" => {
                            if let Some(ref mut group) = current_colorgroup {
                                group.colors.push(parse_color_element(e)?);
                            }
                        }
                        "pbmetallicdisplayproperties" if in_resources => {
                            let props = parse_pbmetallic_start(e)?;
                            if is_empty_element {
                                document
                                    .resources
                                    .pbmetallicdisplayproperties
                                    .insert(props.id.clone(), props);
                            } else {
                                current_pbmetallic = Some(props);
                            }
                        }
                        "pbmetallic" => {
                            if let Some(ref mut props) = current_pbmetallic {
                                props.metallic.push(parse_pbmetallic(e)?);
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(ref t)) => {
                if let Some((_, ref mut value)) = current_metadata {
                    let text = t
                        .decode()
                        .map_err(|e| Error::document(part_name, e.to_string()))?;
                    value.push_str(&text);
                }
            }
            Ok(Event::GeneralRef(ref r)) => {
                if let Some((_, ref mut value)) = current_metadata {
                    match r.resolve_char_ref()? {
                        Some(ch) => value.push(ch),
                        None => {
                            let entity = r
                                .decode()
                                .map_err(|e| Error::document(part_name, e.to_string()))?;
                            let resolved = resolve_predefined_entity(&entity).ok_or_else(|| {
                                Error::document(
                                    part_name,
                                    format!("unknown entity reference '&{};'", entity),
                                )
                            })?;
                            value.push_str(resolved);
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::document(part_name, e.to_string()))?;

                match get_local_name(name_str) {
                    "metadata" => {
                        if let Some((meta_name, value)) = current_metadata.take() {
                            insert_metadata(&mut document, &meta_name, value.trim().to_string());
                        }
                    }
                    "resources" => in_resources = false,
                    "build" => in_build = false,
                    "object" => {
                        if current_object.is_some() {
                            finish_object(
                                &mut document,
                                &mut current_object,
                                &mut current_mesh,
                                &mut current_components,
                            );
                            objects_parsed += 1;
                            on_object(objects_parsed);
                        }
                    }
                    "basematerials" => {
                        if let Some(group) = current_basematerials.take() {
                            document.resources.basematerials.insert(group.id.clone(), group);
                        }
                    }
                    "texture2dgroup" => {
                        if let Some(group) = current_texture2dgroup.take() {
                            document.resources.texture2dgroup.insert(group.id.clone(), group);
                        }
                    }
                    "colorgroup" => {
                        if let Some(group) = current_colorgroup.take() {
                            document.resources.colorgroup.insert(group.id.clone(), group);
                        }
                    }
                    "pbmetallicdisplayproperties" => {
                        if let Some(props) = current_pbmetallic.take() {
                            document
                                .resources
                                .pbmetallicdisplayproperties
                                .insert(props.id.clone(), props);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(Error::document(part_name, "document has no root element"));
    }

    debug!(
        part = %part_name,
        objects = document.resources.objects().len(),
        build_items = document.build_items.len(),
        extensions = document.extensions.len(),
        "parsed model part"
    );

    Ok(document)
}

/// Record unit and namespace declarations from the root element
fn parse_model_element(document: &mut ModelDocument, e: &BytesStart) -> Result<()> {
    let attrs = parse_attributes(e)?;

    if let Some(unit) = attrs.get("unit") {
        document.unit = unit.clone();
    }

    for (key, value) in &attrs {
        if let Some(prefix) = key.strip_prefix("xmlns:") {
            document.extensions.insert(value.clone(), prefix.to_string());
        }
    }

    Ok(())
}

fn insert_metadata(document: &mut ModelDocument, name: &str, value: String) {
    if METADATA_NAMES.contains(&name) {
        document.metadata.insert(name.to_string(), value);
    } else {
        debug!(name = %name, "ignoring metadata outside the allow-list");
    }
}

/// Attach the collected mesh or components and register the object
///
/// A mesh takes precedence when both are present.
fn finish_object(
    document: &mut ModelDocument,
    current_object: &mut Option<Object>,
    current_mesh: &mut Option<Mesh>,
    current_components: &mut Option<Vec<Component>>,
) {
    let Some(mut object) = current_object.take() else {
        return;
    };

    let mesh = current_mesh.take();
    let components = current_components.take();
    object.body = match (mesh, components) {
        (Some(mesh), _) => ObjectBody::Mesh(mesh),
        (None, Some(components)) => ObjectBody::Composite(components),
        (None, None) => ObjectBody::Empty,
    };

    document.resources.add_object(object);
}
