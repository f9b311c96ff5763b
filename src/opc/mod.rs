//! OPC (Open Packaging Conventions) handling for 3MF files
//!
//! 3MF files are ZIP archives following the OPC standard. The package
//! relationships part (`_rels/.rels`) points at the root model part, and each
//! model part may carry its own relationships part listing the textures it
//! uses.

mod archive;
mod relationships;

pub use archive::Archive;
pub use relationships::{
    Relationship, find_model_relationship, parse_relationships, resolve_part_name,
};

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::sync::Arc;
use tracing::{debug, warn};

/// Package relationships path
pub const RELS_PATH: &str = "_rels/.rels";

/// Canonical root model part
pub const MODEL_PATH: &str = "3D/3dmodel.model";

/// A decompressed 3MF package with its relationships resolved
#[derive(Debug, Clone)]
pub struct Package {
    archive: Archive,
    relationships: Vec<Relationship>,
    model_relationships: Vec<(String, Vec<Relationship>)>,
}

impl Package {
    /// Open a package from an in-memory buffer
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_archive(Archive::from_bytes(data)?)
    }

    /// Open a package from any seekable reader
    pub fn open<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_archive(Archive::from_reader(reader)?)
    }

    /// Parse the relationship parts of an already decompressed archive
    pub fn from_archive(archive: Archive) -> Result<Self> {
        let rels_name = archive
            .root_rels_name()
            .ok_or_else(|| Error::MissingFile(RELS_PATH.to_string()))?
            .to_string();
        let relationships = parse_relationships(&rels_name, &read_text(&archive, &rels_name)?)?;
        debug!(count = relationships.len(), part = %rels_name, "parsed package relationships");

        let mut model_relationships = Vec::new();
        for name in archive.model_rels_names() {
            let rels = parse_relationships(name, &read_text(&archive, name)?)?;
            debug!(count = rels.len(), part = %name, "parsed model relationships");
            model_relationships.push((name.to_string(), rels));
        }

        Ok(Self {
            archive,
            relationships,
            model_relationships,
        })
    }

    /// The underlying archive
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Entries of the package relationships part
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Entries of every model relationships part, grouped by part name
    pub fn model_relationships(&self) -> &[(String, Vec<Relationship>)] {
        &self.model_relationships
    }

    /// Archive path of the root model part
    ///
    /// This is the target of the first package relationship ending in
    /// `.model`; its relationship type is not checked.
    pub fn root_model_part(&self) -> Result<String> {
        let rels_name = self.archive.root_rels_name().unwrap_or(RELS_PATH);
        find_model_relationship(&self.relationships)
            .map(Relationship::part_name)
            .ok_or_else(|| Error::MissingRelationship(rels_name.to_string()))
    }

    /// Every model part to parse: the `3D/*.model` entries plus the root part
    /// when it lives elsewhere
    pub fn model_part_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .archive
            .model_part_names()
            .map(str::to_string)
            .collect();
        if let Ok(root) = self.root_model_part()
            && self.archive.contains(&root)
            && !names.contains(&root)
        {
            names.push(root);
        }
        names
    }

    /// Image bytes referenced by model relationships, keyed by the target as written
    ///
    /// Targets whose part is absent are skipped with a warning.
    pub fn texture_parts(&self) -> HashMap<String, Arc<[u8]>> {
        let mut textures = HashMap::new();
        for (rels_name, rels) in &self.model_relationships {
            for rel in rels {
                let part = rel.part_name();
                if let Some(data) = self.archive.get(&part) {
                    textures.insert(rel.target.clone(), Arc::clone(data));
                } else {
                    warn!(
                        rel_target = %rel.target,
                        rels = %rels_name,
                        "relationship target not found in archive"
                    );
                }
            }
        }
        textures
    }

    /// Read a part as UTF-8 text
    pub fn read_text(&self, name: &str) -> Result<String> {
        read_text(&self.archive, name)
    }
}

fn read_text(archive: &Archive, name: &str) -> Result<String> {
    let data = archive
        .get(name)
        .ok_or_else(|| Error::MissingFile(name.to_string()))?;
    let data: &[u8] = data;
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    String::from_utf8(data.to_vec())
        .map_err(|e| Error::document(name, format!("part is not valid UTF-8: {}", e)))
}
