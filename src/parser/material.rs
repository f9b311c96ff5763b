//! Materials and Properties extension parsing
//!
//! Base materials, 2D textures and their coordinate groups, color groups and
//! metallic display properties.

use crate::color::{Color, parse_hex_color};
use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::events::BytesStart;
use tracing::warn;

use super::parse_attributes;

fn required_id(attrs: &std::collections::HashMap<String, String>, element: &str) -> Result<String> {
    attrs
        .get("id")
        .cloned()
        .ok_or_else(|| Error::missing_attribute(element, "id"))
}

fn parse_unit_f32(field: &str, value: &str) -> Result<f32> {
    value
        .trim()
        .parse::<f32>()
        .map_err(|_| Error::parse_error_with_context(field, value, "floating-point number"))
}

/// Parse basematerials element attributes
pub(super) fn parse_basematerials_start(e: &BytesStart) -> Result<BaseMaterialGroup> {
    let attrs = parse_attributes(e)?;
    let mut group = BaseMaterialGroup::new(required_id(&attrs, "basematerials")?);
    group.displaypropertiesid = attrs.get("displaypropertiesid").cloned();
    Ok(group)
}

/// Parse base element attributes
///
/// Base materials are addressed by their position within the set.
pub(super) fn parse_base_element(e: &BytesStart, index: usize) -> Result<BaseMaterial> {
    let attrs = parse_attributes(e)?;

    let mut material = BaseMaterial::new(index);
    material.name = attrs.get("name").cloned();
    material.displaypropertiesid = attrs.get("displaypropertiesid").cloned();

    let color_str = attrs
        .get("displaycolor")
        .ok_or_else(|| Error::missing_attribute("base", "displaycolor"))?;
    match parse_hex_color(color_str) {
        Some(color) => material.displaycolor = color,
        None => warn!(color = %color_str, index, "invalid base material color, using white"),
    }

    Ok(material)
}

/// Parse texture2d element
pub(super) fn parse_texture2d(e: &BytesStart) -> Result<Texture2D> {
    let attrs = parse_attributes(e)?;
    let id = required_id(&attrs, "texture2d")?;
    let path = attrs
        .get("path")
        .ok_or_else(|| Error::missing_attribute("texture2d", "path"))?;
    let contenttype = attrs
        .get("contenttype")
        .ok_or_else(|| Error::missing_attribute("texture2d", "contenttype"))?;

    let mut texture = Texture2D::new(id, path.as_str(), contenttype.as_str());
    if let Some(tileu_str) = attrs.get("tilestyleu") {
        texture.tilestyleu = TileStyle::parse(tileu_str);
    }
    if let Some(tilev_str) = attrs.get("tilestylev") {
        texture.tilestylev = TileStyle::parse(tilev_str);
    }
    if let Some(filter_str) = attrs.get("filter") {
        texture.filter = FilterMode::parse(filter_str);
    }

    Ok(texture)
}

/// Parse texture2dgroup element attributes
pub(super) fn parse_texture2dgroup_start(e: &BytesStart) -> Result<Texture2DGroup> {
    let attrs = parse_attributes(e)?;
    let id = required_id(&attrs, "texture2dgroup")?;
    let texid = attrs
        .get("texid")
        .ok_or_else(|| Error::missing_attribute("texture2dgroup", "texid"))?;

    let mut group = Texture2DGroup::new(id, texid.as_str());
    group.displaypropertiesid = attrs.get("displaypropertiesid").cloned();
    Ok(group)
}

/// Parse tex2coord element
pub(super) fn parse_tex2coord(e: &BytesStart) -> Result<[f32; 2]> {
    let attrs = parse_attributes(e)?;
    let u = attrs
        .get("u")
        .ok_or_else(|| Error::missing_attribute("tex2coord", "u"))?;
    let v = attrs
        .get("v")
        .ok_or_else(|| Error::missing_attribute("tex2coord", "v"))?;
    Ok([parse_unit_f32("tex2coord u", u)?, parse_unit_f32("tex2coord v", v)?])
}

/// Parse colorgroup element attributes
pub(super) fn parse_colorgroup_start(e: &BytesStart) -> Result<ColorGroup> {
    let attrs = parse_attributes(e)?;
    let mut group = ColorGroup::new(required_id(&attrs, "colorgroup")?);
    group.displaypropertiesid = attrs.get("displaypropertiesid").cloned();
    Ok(group)
}

/// Parse color element into a linear color
///
/// The alpha byte of an eight-digit color is ignored for vertex colors.
pub(super) fn parse_color_element(e: &BytesStart) -> Result<Color> {
    let attrs = parse_attributes(e)?;
    let color_str = attrs
        .get("color")
        .ok_or_else(|| Error::missing_attribute("color", "color"))?;
    let (r, g, b, _) = parse_hex_color(color_str).ok_or_else(|| {
        Error::parse_error_with_context("color", color_str, "#RRGGBB or #RRGGBBAA")
    })?;
    Ok(Color::from_srgb8(r, g, b))
}

/// Parse pbmetallicdisplayproperties element attributes
pub(super) fn parse_pbmetallic_start(e: &BytesStart) -> Result<PbMetallicDisplayProperties> {
    let attrs = parse_attributes(e)?;
    Ok(PbMetallicDisplayProperties::new(required_id(
        &attrs,
        "pbmetallicdisplayproperties",
    )?))
}

/// Parse pbmetallic element
pub(super) fn parse_pbmetallic(e: &BytesStart) -> Result<PbMetallic> {
    let attrs = parse_attributes(e)?;
    let metallicness = attrs
        .get("metallicness")
        .map(|v| parse_unit_f32("pbmetallic metallicness", v))
        .transpose()?
        .unwrap_or(0.0);
    let roughness = attrs
        .get("roughness")
        .map(|v| parse_unit_f32("pbmetallic roughness", v))
        .transpose()?
        .unwrap_or(1.0);

    Ok(PbMetallic {
        name: attrs.get("name").cloned(),
        metallicness,
        roughness,
    })
}
