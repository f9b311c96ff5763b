//! Shared helpers for building 3MF packages in memory

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const CORE_NS: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";
pub const MATERIAL_NS: &str = "http://schemas.microsoft.com/3dmanufacturing/material/2015/02";
pub const PRODUCTION_NS: &str = "http://schemas.microsoft.com/3dmanufacturing/production/2015/06";

pub const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
    <Default Extension="png" ContentType="image/png"/>
</Types>"#;

pub const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rel0" Target="/3D/3dmodel.model" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#;

/// A unit triangle in the XY plane
pub const TRIANGLE_MESH: &str = r#"<mesh>
    <vertices>
        <vertex x="0" y="0" z="0"/>
        <vertex x="1" y="0" z="0"/>
        <vertex x="0" y="1" z="0"/>
    </vertices>
    <triangles>
        <triangle v1="0" v2="1" v3="2"/>
    </triangles>
</mesh>"#;

/// Collects parts and writes them into a zip archive
#[derive(Default)]
pub struct PackageBuilder {
    parts: Vec<(String, Vec<u8>)>,
}

impl PackageBuilder {
    /// Content types and package relationships pointing at `3D/3dmodel.model`
    pub fn new() -> Self {
        Self::default()
            .part("[Content_Types].xml", CONTENT_TYPES)
            .part("_rels/.rels", ROOT_RELS)
    }

    /// Package without any part
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn part(mut self, name: &str, data: impl AsRef<[u8]>) -> Self {
        self.parts.push((name.to_string(), data.as_ref().to_vec()));
        self
    }

    pub fn model(self, xml: impl AsRef<[u8]>) -> Self {
        self.part("3D/3dmodel.model", xml)
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}

/// A model part with the given resources and build section
pub fn model_xml(resources: &str, build: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xml:lang="en-US" xmlns="{CORE_NS}" xmlns:m="{MATERIAL_NS}" xmlns:p="{PRODUCTION_NS}">
    <resources>
{resources}
    </resources>
    <build>
{build}
    </build>
</model>"#
    )
}

/// Package with one model part
pub fn package(resources: &str, build: &str) -> Vec<u8> {
    PackageBuilder::new()
        .model(model_xml(resources, build))
        .build()
}
