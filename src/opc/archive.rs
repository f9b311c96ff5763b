//! Decompressed view of a 3MF ZIP container

use crate::error::Result;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek};
use std::sync::Arc;
use tracing::debug;
use zip::ZipArchive;

/// Every file of a ZIP container, fully decompressed and keyed by entry name
///
/// Entry names are stored exactly as the container lists them; lookups accept
/// an optional leading `/` so relationship targets can be used directly.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    parts: BTreeMap<String, Arc<[u8]>>,
}

impl Archive {
    /// Decompress an in-memory container
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(data))
    }

    /// Decompress a container from any seekable reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut zip = ZipArchive::new(reader)?;
        let mut parts = BTreeMap::new();

        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            debug!(part = %name, bytes = content.len(), "decompressed part");
            parts.insert(name, Arc::from(content));
        }

        Ok(Self { parts })
    }

    /// Build an archive from already decompressed parts
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        Self {
            parts: parts
                .into_iter()
                .map(|(name, data)| (name.into(), Arc::from(data)))
                .collect(),
        }
    }

    /// Bytes of a part
    pub fn get(&self, name: &str) -> Option<&Arc<[u8]>> {
        let name = name.strip_prefix('/').unwrap_or(name);
        self.parts.get(name)
    }

    /// Whether a part exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the container holds no files
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// All part names in sorted order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Name of the package relationships part
    ///
    /// Prefers the canonical `_rels/.rels` and otherwise takes any entry
    /// ending in `_rels/.rels`.
    pub fn root_rels_name(&self) -> Option<&str> {
        if let Some((name, _)) = self.parts.get_key_value(super::RELS_PATH) {
            return Some(name);
        }
        self.part_names().find(|name| name.ends_with(super::RELS_PATH))
    }

    /// Relationship parts of model parts (`3D/_rels/*.model.rels`)
    pub fn model_rels_names(&self) -> impl Iterator<Item = &str> {
        self.part_names().filter(|name| is_model_rels(name))
    }

    /// Model parts (`3D/*.model`)
    pub fn model_part_names(&self) -> impl Iterator<Item = &str> {
        self.part_names().filter(|name| is_model_part(name))
    }

    /// Texture parts (`3D/Texture/*` or `3D/Textures/*`)
    pub fn texture_part_names(&self) -> impl Iterator<Item = &str> {
        self.part_names().filter(|name| is_texture_part(name))
    }
}

fn in_3d_folder(name: &str) -> Option<&str> {
    let (folder, rest) = name.split_once('/')?;
    folder.eq_ignore_ascii_case("3d").then_some(rest)
}

fn is_model_rels(name: &str) -> bool {
    in_3d_folder(name)
        .and_then(|rest| rest.strip_prefix("_rels/"))
        .is_some_and(|file| file.to_ascii_lowercase().ends_with(".model.rels"))
}

fn is_model_part(name: &str) -> bool {
    in_3d_folder(name).is_some() && name.to_ascii_lowercase().ends_with(".model")
}

fn is_texture_part(name: &str) -> bool {
    in_3d_folder(name)
        .and_then(|rest| rest.split_once('/'))
        .is_some_and(|(folder, file)| {
            let texture_folder =
                folder.eq_ignore_ascii_case("texture") || folder.eq_ignore_ascii_case("textures");
            texture_folder && !file.is_empty()
        })
}
