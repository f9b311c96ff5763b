//! Core 3MF element parsing
//!
//! Objects, vertices, triangles, components and build items.

use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::events::BytesStart;

use super::{get_attr_by_local_name, parse_attributes, parse_transform};

/// Parse object element attributes
///
/// The mesh or components are attached by the caller once the element closes.
pub fn parse_object(e: &BytesStart) -> Result<Object> {
    let attrs = parse_attributes(e)?;

    let id = attrs
        .get("id")
        .ok_or_else(|| Error::missing_attribute("object", "id"))?;

    let mut object = Object::new(id.as_str());
    object.name = attrs.get("name").cloned();
    object.pid = attrs.get("pid").cloned();
    object.partnumber = attrs.get("partnumber").cloned();
    object.thumbnail = attrs.get("thumbnail").cloned();

    if let Some(type_str) = attrs.get("type") {
        object.object_type = ObjectType::parse(type_str).ok_or_else(|| {
            Error::XmlAttr(format!(
                "Invalid object type '{}'. Must be one of: model, support, solidsupport, surface, other",
                type_str
            ))
        })?;
    }

    if let Some(pindex) = attrs.get("pindex") {
        object.pindex = Some(pindex.parse::<u32>().map_err(|_| {
            Error::parse_error_with_context("object pindex", pindex, "unsigned integer")
        })?);
    }

    Ok(object)
}

/// Parse vertex element attributes
pub fn parse_vertex(e: &BytesStart) -> Result<[f32; 3]> {
    let mut x_opt: Option<f32> = None;
    let mut y_opt: Option<f32> = None;
    let mut z_opt: Option<f32> = None;

    let parse_f32 = |field: &str, value: &[u8]| -> Result<f32> {
        let value_str = std::str::from_utf8(value).map_err(|e| Error::XmlAttr(e.to_string()))?;
        let value = value_str.trim().parse::<f32>().map_err(|_| {
            Error::parse_error_with_context(field, value_str, "floating-point number")
        })?;
        if !value.is_finite() {
            return Err(Error::Parse(format!("{} must be finite (got {})", field, value)));
        }
        Ok(value)
    };

    for attr_result in e.attributes() {
        let attr = attr_result?;
        match attr.key.as_ref() {
            b"x" => x_opt = Some(parse_f32("vertex x coordinate", &attr.value)?),
            b"y" => y_opt = Some(parse_f32("vertex y coordinate", &attr.value)?),
            b"z" => z_opt = Some(parse_f32("vertex z coordinate", &attr.value)?),
            _ => {}
        }
    }

    let x = x_opt.ok_or_else(|| Error::missing_attribute("vertex", "x"))?;
    let y = y_opt.ok_or_else(|| Error::missing_attribute("vertex", "y"))?;
    let z = z_opt.ok_or_else(|| Error::missing_attribute("vertex", "z"))?;

    Ok([x, y, z])
}

/// Parse triangle element attributes
pub fn parse_triangle(e: &BytesStart) -> Result<TriangleProperty> {
    let mut v1_opt: Option<u32> = None;
    let mut v2_opt: Option<u32> = None;
    let mut v3_opt: Option<u32> = None;
    let mut triangle = TriangleProperty::default();

    for attr_result in e.attributes() {
        let attr = attr_result?;
        let key = attr.key.as_ref();

        match key {
            b"v1" | b"v2" | b"v3" | b"p1" | b"p2" | b"p3" => {
                let value_str =
                    std::str::from_utf8(&attr.value).map_err(|e| Error::XmlAttr(e.to_string()))?;
                let value = value_str.trim().parse::<u32>().map_err(|_| {
                    Error::parse_error_with_context(
                        &format!("triangle {}", String::from_utf8_lossy(key)),
                        value_str,
                        "unsigned integer",
                    )
                })?;

                match key {
                    b"v1" => v1_opt = Some(value),
                    b"v2" => v2_opt = Some(value),
                    b"v3" => v3_opt = Some(value),
                    b"p1" => triangle.p1 = Some(value),
                    b"p2" => triangle.p2 = Some(value),
                    _ => triangle.p3 = Some(value),
                }
            }
            b"pid" => {
                triangle.pid = Some(attr.unescape_value()?.into_owned());
            }
            _ => {}
        }
    }

    triangle.v1 = v1_opt.ok_or_else(|| Error::missing_attribute("triangle", "v1"))?;
    triangle.v2 = v2_opt.ok_or_else(|| Error::missing_attribute("triangle", "v2"))?;
    triangle.v3 = v3_opt.ok_or_else(|| Error::missing_attribute("triangle", "v3"))?;

    Ok(triangle)
}

/// Parse build item element attributes
pub fn parse_build_item(e: &BytesStart) -> Result<BuildItem> {
    let attrs = parse_attributes(e)?;

    let object_id = attrs
        .get("objectid")
        .ok_or_else(|| Error::missing_attribute("item", "objectid"))?;

    let mut item = BuildItem::new(object_id.as_str());
    if let Some(transform_str) = attrs.get("transform") {
        item.transform = Some(parse_transform(transform_str)?);
    }
    item.path = get_attr_by_local_name(&attrs, "path");

    Ok(item)
}

/// Parse component element attributes
pub fn parse_component(e: &BytesStart) -> Result<Component> {
    let attrs = parse_attributes(e)?;

    let object_id = attrs
        .get("objectid")
        .ok_or_else(|| Error::missing_attribute("component", "objectid"))?;

    let mut component = Component::new(object_id.as_str());
    if let Some(transform_str) = attrs.get("transform") {
        component.transform = Some(parse_transform(transform_str)?);
    }
    component.path = get_attr_by_local_name(&attrs, "path");

    Ok(component)
}
