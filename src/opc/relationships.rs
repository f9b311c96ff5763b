//! Relationship part parsing

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::borrow::Cow;
use urlencoding::decode;

/// One `<Relationship>` entry of a `.rels` part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship id
    pub id: Option<String>,
    /// Target part, as written in the XML
    pub target: String,
    /// Relationship type URI
    pub rel_type: Option<String>,
}

impl Relationship {
    /// Archive path of the target: leading `/` removed and percent-decoding applied
    pub fn part_name(&self) -> String {
        resolve_part_name(&self.target)
    }

    /// Whether the target names a `.model` part
    pub fn targets_model(&self) -> bool {
        self.target
            .rsplit('.')
            .next()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("model"))
    }
}

/// Turn a relationship target or `path` attribute into an archive entry name
///
/// Targets are resolved against the package root. Invalid percent escapes are
/// left as written.
pub fn resolve_part_name(target: &str) -> String {
    let trimmed = target.strip_prefix('/').unwrap_or(target);
    match decode(trimmed) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => trimmed.to_string(),
    }
}

/// Parse the `<Relationship>` entries of a `.rels` part
///
/// `part_name` is only used for error reporting. Malformed XML and a missing
/// root element are both reported as [`Error::Document`].
pub fn parse_relationships(part_name: &str, xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut relationships = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                seen_root = true;
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::document(part_name, e.to_string()))?;

                if name_str.ends_with("Relationship") {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;

                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| Error::document(part_name, e.to_string()))?;
                        let value = attr
                            .unescape_value()
                            .map_err(|e| Error::document(part_name, e.to_string()))?
                            .into_owned();

                        match attr.key.as_ref() {
                            b"Id" => id = Some(value),
                            b"Target" => target = Some(value),
                            b"Type" => rel_type = Some(value),
                            _ => {}
                        }
                    }

                    let target =
                        target.ok_or_else(|| Error::missing_attribute(name_str, "Target"))?;
                    relationships.push(Relationship {
                        id,
                        target,
                        rel_type,
                    });
                }
            }
            Ok(Event::DocType(_)) => {
                return Err(Error::document(
                    part_name,
                    "DTD declarations are not allowed",
                ));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::document(part_name, e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(Error::document(part_name, "document has no root element"));
    }

    Ok(relationships)
}

/// First relationship whose target has the `.model` extension
pub fn find_model_relationship(relationships: &[Relationship]) -> Option<&Relationship> {
    relationships.iter().find(|rel| rel.targets_model())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/Metadata/thumbnail.png" Id="rel0" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail"/>
  <Relationship Target="/3D/3dmodel.MODEL" Id="rel1" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
  <Relationship Target="/3D/second.model" Id="rel2" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#;

    #[test]
    fn test_parse_relationships() {
        let rels = parse_relationships("_rels/.rels", RELS).unwrap();
        assert_eq!(rels.len(), 3);
        assert_eq!(rels[0].id.as_deref(), Some("rel0"));
        assert_eq!(rels[1].target, "/3D/3dmodel.MODEL");
    }

    #[test]
    fn test_first_model_relationship_wins() {
        let rels = parse_relationships("_rels/.rels", RELS).unwrap();
        let model = find_model_relationship(&rels).unwrap();
        assert_eq!(model.part_name(), "3D/3dmodel.MODEL");
    }

    #[test]
    fn test_no_model_relationship() {
        let xml = r#"<Relationships><Relationship Target="/Metadata/a.png" Id="r"/></Relationships>"#;
        let rels = parse_relationships("_rels/.rels", xml).unwrap();
        assert!(find_model_relationship(&rels).is_none());
    }

    #[test]
    fn test_percent_encoded_target() {
        assert_eq!(resolve_part_name("/2D/test%C3%86file.model"), "2D/testÆfile.model");
        assert_eq!(resolve_part_name("3D/plain.model"), "3D/plain.model");
    }

    #[test]
    fn test_missing_target_is_an_error() {
        let xml = r#"<Relationships><Relationship Id="r"/></Relationships>"#;
        let err = parse_relationships("_rels/.rels", xml).unwrap_err();
        assert!(err.to_string().contains("Target"));
    }

    #[test]
    fn test_empty_part_is_rejected() {
        for xml in ["", "   ", r#"<?xml version="1.0" encoding="UTF-8"?>"#] {
            let err = parse_relationships("_rels/.rels", xml).unwrap_err();
            assert!(matches!(err, Error::Document { ref part, .. } if part == "_rels/.rels"));
        }
    }

    #[test]
    fn test_malformed_xml_is_a_document_error() {
        let xml = r#"<Relationships><Relationship Target="/3D/a.model"></Foo>"#;
        let err = parse_relationships("_rels/.rels", xml).unwrap_err();
        assert!(matches!(err, Error::Document { ref part, .. } if part == "_rels/.rels"));
    }

    #[test]
    fn test_escaped_target() {
        let xml = r#"<Relationships><Relationship Target="/3D/a&amp;b.model" Id="r"/></Relationships>"#;
        let rels = parse_relationships("_rels/.rels", xml).unwrap();
        assert_eq!(rels[0].target, "/3D/a&b.model");
    }

    #[test]
    fn test_doctype_rejected() {
        let xml = r#"<?xml version="1.0"?><!DOCTYPE foo [<!ENTITY x "y">]><Relationships/>"#;
        let err = parse_relationships("_rels/.rels", xml).unwrap_err();
        assert!(matches!(err, Error::Document { .. }));
    }
}
