//! Integration tests for turning packages into scene graphs

mod common;

use common::{PackageBuilder, TRIANGLE_MESH, model_xml, package};
use lib3mf_scene::color::srgb_to_linear;
use lib3mf_scene::{Color, Error, Loader, TextureFilter, Wrapping};
use std::io::Cursor;
use std::sync::Arc;

const QUAD_VERTICES: &str = r#"<vertices>
    <vertex x="0" y="0" z="0"/>
    <vertex x="1" y="0" z="0"/>
    <vertex x="0" y="1" z="0"/>
    <vertex x="1" y="1" z="0"/>
</vertices>"#;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

#[test]
fn test_single_object_gets_default_material() {
    let data = package(
        &format!(r#"<object id="1" name="Plate">{TRIANGLE_MESH}</object>"#),
        r#"<item objectid="1"/>"#,
    );

    let scene = lib3mf_scene::parse(&data).unwrap();
    assert_eq!(scene.children().len(), 1);

    let meshes = scene.meshes();
    assert_eq!(meshes.len(), 1);
    let mesh = meshes[0].1;
    assert_eq!(mesh.geometry.vertex_count(), 3);
    assert_eq!(mesh.geometry.triangle_count(), 1);
    assert_eq!(mesh.geometry.indices.as_deref(), Some(&[0, 1, 2][..]));
    assert_eq!(mesh.material.color, Color::from_hex(0xaaaaff));
    assert!(mesh.material.flat_shading);
    assert!(!mesh.material.transparent);
    assert_eq!(scene.children()[0].name.as_deref(), Some("Plate"));
}

#[test]
fn test_base_material_color_is_linearized() {
    let data = package(
        &format!(
            r##"<basematerials id="2">
                <base name="Teal" displaycolor="#336699"/>
            </basematerials>
            <object id="1" pid="2" pindex="0">{TRIANGLE_MESH}</object>"##
        ),
        r#"<item objectid="1"/>"#,
    );

    let scene = lib3mf_scene::parse(&data).unwrap();
    let meshes = scene.meshes();
    let material = &meshes[0].1.material;

    assert_eq!(material.name.as_deref(), Some("Teal"));
    assert!(approx(material.color.r, srgb_to_linear(0x33 as f32 / 255.0)));
    assert!(approx(material.color.g, srgb_to_linear(0x66 as f32 / 255.0)));
    assert!(approx(material.color.b, srgb_to_linear(0x99 as f32 / 255.0)));
    assert_ne!(material.color, Color::from_hex(0x336699));
    assert_eq!(material.opacity, 1.0);
}

#[test]
fn test_base_material_alpha_sets_opacity() {
    let data = package(
        &format!(
            r##"<basematerials id="2">
                <base name="Glass" displaycolor="#33669980"/>
            </basematerials>
            <object id="1" pid="2" pindex="0">{TRIANGLE_MESH}</object>"##
        ),
        r#"<item objectid="1"/>"#,
    );

    let scene = lib3mf_scene::parse(&data).unwrap();
    let material = &scene.meshes()[0].1.material;
    assert!(approx(material.opacity, 128.0 / 255.0));
    assert!(material.transparent);
}

#[test]
fn test_metallic_display_properties() {
    let data = package(
        &format!(
            r##"<m:pbmetallicdisplayproperties id="3">
                <m:pbmetallic name="Steel" metallicness="0.9" roughness="0.25"/>
            </m:pbmetallicdisplayproperties>
            <basematerials id="2" displaypropertiesid="3">
                <base name="Steel" displaycolor="#C0C0C0"/>
            </basematerials>
            <object id="1" pid="2">{TRIANGLE_MESH}</object>"##
        ),
        r#"<item objectid="1"/>"#,
    );

    let scene = lib3mf_scene::parse(&data).unwrap();
    let material = &scene.meshes()[0].1.material;
    assert_eq!(
        material.shading,
        lib3mf_scene::Shading::Standard {
            metalness: 0.9,
            roughness: 0.25
        }
    );
}

#[test]
fn test_metallic_display_properties_on_base_entry() {
    let data = package(
        &format!(
            r##"<m:pbmetallicdisplayproperties id="3">
                <m:pbmetallic name="Steel" metallicness="0.9" roughness="0.25"/>
            </m:pbmetallicdisplayproperties>
            <basematerials id="2">
                <base name="Steel" displaycolor="#C0C0C0" displaypropertiesid="3"/>
            </basematerials>
            <object id="1" pid="2">{TRIANGLE_MESH}</object>"##
        ),
        r#"<item objectid="1"/>"#,
    );

    let scene = lib3mf_scene::parse(&data).unwrap();
    let material = &scene.meshes()[0].1.material;
    assert_eq!(material.name.as_deref(), Some("Steel"));
    assert_eq!(
        material.shading,
        lib3mf_scene::Shading::Standard {
            metalness: 0.9,
            roughness: 0.25
        }
    );
}

#[test]
fn test_base_entries_bound_to_different_display_properties() {
    let data = package(
        &format!(
            r##"<m:pbmetallicdisplayproperties id="3">
                <m:pbmetallic name="Steel" metallicness="0.9" roughness="0.25"/>
                <m:pbmetallic name="unused" metallicness="0.5" roughness="0.5"/>
            </m:pbmetallicdisplayproperties>
            <m:pbmetallicdisplayproperties id="4">
                <m:pbmetallic name="unused" metallicness="0.5" roughness="0.5"/>
                <m:pbmetallic name="Rubber" metallicness="0" roughness="0.95"/>
            </m:pbmetallicdisplayproperties>
            <basematerials id="2">
                <base name="Steel" displaycolor="#C0C0C0" displaypropertiesid="3"/>
                <base name="Rubber" displaycolor="#202020" displaypropertiesid="4"/>
                <base name="Paint" displaycolor="#FF0000"/>
            </basematerials>
            <object id="1" pid="2" pindex="0">
                <mesh>
                    {QUAD_VERTICES}
                    <triangles>
                        <triangle v1="0" v2="1" v3="2"/>
                        <triangle v1="1" v2="3" v3="2" p1="1"/>
                        <triangle v1="0" v2="3" v3="1" p1="2"/>
                    </triangles>
                </mesh>
            </object>"##
        ),
        r#"<item objectid="1"/>"#,
    );

    let scene = lib3mf_scene::parse(&data).unwrap();
    let meshes = scene.meshes();
    assert_eq!(meshes.len(), 3);

    let shading = |name: &str| {
        meshes
            .iter()
            .find(|(_, mesh)| mesh.material.name.as_deref() == Some(name))
            .map(|(_, mesh)| mesh.material.shading)
            .unwrap()
    };
    assert_eq!(
        shading("Steel"),
        lib3mf_scene::Shading::Standard {
            metalness: 0.9,
            roughness: 0.25
        }
    );
    assert_eq!(
        shading("Rubber"),
        lib3mf_scene::Shading::Standard {
            metalness: 0.0,
            roughness: 0.95
        }
    );
    assert_eq!(shading("Paint"), lib3mf_scene::Shading::Phong);
}

#[test]
fn test_triangles_split_by_resource_in_order() {
    let data = package(
        &format!(
            r##"<basematerials id="2">
                <base name="Red" displaycolor="#FF0000"/>
            </basematerials>
            <object id="1">
                <mesh>
                    {QUAD_VERTICES}
                    <triangles>
                        <triangle v1="1" v2="3" v3="2" pid="2" p1="0"/>
                        <triangle v1="0" v2="1" v3="2"/>
                    </triangles>
                </mesh>
            </object>"##
        ),
        r#"<item objectid="1"/>"#,
    );

    let scene = lib3mf_scene::parse(&data).unwrap();
    let meshes = scene.meshes();
    assert_eq!(meshes.len(), 2);
    assert_eq!(meshes[0].1.material.name.as_deref(), Some("Red"));
    assert_eq!(meshes[0].1.geometry.indices.as_deref(), Some(&[1, 3, 2][..]));
    assert_eq!(meshes[1].1.material.color, Color::from_hex(0xaaaaff));
    assert_eq!(meshes[1].1.geometry.indices.as_deref(), Some(&[0, 1, 2][..]));
    assert!(Arc::ptr_eq(
        &meshes[0].1.geometry.positions,
        &meshes[1].1.geometry.positions
    ));
}

#[test]
fn test_vertex_colors_inherit_object_pindex() {
    let data = package(
        &format!(
            r##"<m:colorgroup id="20">
                <m:color color="#FF0000"/>
                <m:color color="#00FF00"/>
                <m:color color="#0000FF"/>
            </m:colorgroup>
            <object id="1" pid="20" pindex="1">
                <mesh>
                    {QUAD_VERTICES}
                    <triangles>
                        <triangle v1="0" v2="1" v3="2" p1="0" p2="1" p3="2"/>
                        <triangle v1="1" v2="3" v3="2"/>
                    </triangles>
                </mesh>
            </object>"##
        ),
        r#"<item objectid="1"/>"#,
    );

    let scene = lib3mf_scene::parse(&data).unwrap();
    let meshes = scene.meshes();
    assert_eq!(meshes.len(), 1);

    let mesh = meshes[0].1;
    assert!(mesh.material.vertex_colors);
    assert!(mesh.geometry.indices.is_none());
    assert_eq!(mesh.geometry.vertex_count(), 6);

    #[rustfmt::skip]
    let expected = [
        1.0, 0.0, 0.0,  0.0, 1.0, 0.0,  0.0, 0.0, 1.0,
        0.0, 1.0, 0.0,  0.0, 1.0, 0.0,  0.0, 1.0, 0.0,
    ];
    let colors = mesh.geometry.colors.as_deref().unwrap();
    assert_eq!(colors.len(), expected.len());
    for (actual, expected) in colors.iter().zip(expected) {
        assert!(approx(*actual, expected), "{} != {}", actual, expected);
    }
}

#[test]
fn test_textured_object() {
    let model = model_xml(
        &format!(
            r#"<m:texture2d id="10" path="/3D/Textures/wood.png" contenttype="image/png"
                tilestyleu="mirror" tilestylev="clamp" filter="nearest"/>
            <m:texture2dgroup id="11" texid="10">
                <m:tex2coord u="0" v="0"/>
                <m:tex2coord u="1" v="0"/>
                <m:tex2coord u="0" v="1"/>
            </m:texture2dgroup>
            <object id="1">
                <mesh>
                    {QUAD_VERTICES}
                    <triangles>
                        <triangle v1="0" v2="1" v3="2" pid="11" p1="0" p2="1" p3="2"/>
                    </triangles>
                </mesh>
            </object>"#
        ),
        r#"<item objectid="1"/>"#,
    );
    let model_rels = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="tex0" Target="/3D/Textures/wood.png" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dtexture"/>
</Relationships>"#;
    let data = PackageBuilder::new()
        .model(model)
        .part("3D/_rels/3dmodel.model.rels", model_rels)
        .part("3D/Textures/wood.png", b"not really a png")
        .build();

    let loaded = Loader::default().load(&data, |_| {}).unwrap();
    let meshes = loaded.root.meshes();
    assert_eq!(meshes.len(), 1);

    let mesh = meshes[0].1;
    assert_eq!(
        mesh.geometry.uvs.as_deref(),
        Some(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0][..])
    );
    assert_eq!(mesh.geometry.vertex_count(), 3);

    let texture = mesh.material.map.as_ref().unwrap();
    assert_eq!(texture.content_type, "image/png");
    assert_eq!(texture.data.as_deref(), Some(&b"not really a png"[..]));
    assert!(texture.image.is_none());
    assert_eq!(texture.wrap_s, Wrapping::MirroredRepeat);
    assert_eq!(texture.wrap_t, Wrapping::ClampToEdge);
    assert_eq!(texture.mag_filter, TextureFilter::Nearest);
    assert_eq!(texture.min_filter, TextureFilter::Nearest);
    assert_eq!(loaded.stats.textures_built, 1);
}

#[test]
fn test_missing_texture_part_keeps_material() {
    let data = package(
        &format!(
            r#"<m:texture2d id="10" path="/3D/Textures/gone.png" contenttype="image/png"/>
            <m:texture2dgroup id="11" texid="10">
                <m:tex2coord u="0" v="0"/>
            </m:texture2dgroup>
            <object id="1" pid="11" pindex="0">{TRIANGLE_MESH}</object>"#
        ),
        r#"<item objectid="1"/>"#,
    );

    let scene = lib3mf_scene::parse(&data).unwrap();
    let texture = scene.meshes()[0].1.material.map.clone().unwrap();
    assert!(texture.data.is_none());
    assert_eq!(texture.wrap_s, Wrapping::Repeat);
}

#[test]
fn test_repeated_items_share_resources() {
    let data = package(
        &format!(r#"<object id="1">{TRIANGLE_MESH}</object>"#),
        r#"<item objectid="1"/>
           <item objectid="1" transform="1 0 0 0 1 0 0 0 1 10 0 0"/>
           <item objectid="1" transform="1 0 0 0 1 0 0 0 1 20 0 0"/>"#,
    );

    let loaded = Loader::default().load(&data, |_| {}).unwrap();
    assert_eq!(loaded.root.children().len(), 3);
    assert_eq!(loaded.stats.objects_built, 1);
    assert_eq!(loaded.stats.meshes_built, 1);
    assert_eq!(loaded.stats.materials_built, 1);

    let meshes = loaded.root.meshes();
    assert_eq!(meshes.len(), 3);
    assert!(Arc::ptr_eq(&meshes[0].1.geometry, &meshes[2].1.geometry));
    assert!(Arc::ptr_eq(&meshes[0].1.material, &meshes[2].1.material));
    assert_eq!(meshes[0].0[(0, 3)], 0.0);
    assert_eq!(meshes[1].0[(0, 3)], 10.0);
    assert_eq!(meshes[2].0[(0, 3)], 20.0);
}

#[test]
fn test_components_compose_transforms() {
    let data = package(
        &format!(
            r#"<object id="2">
                <components>
                    <component objectid="1" transform="1 0 0 0 1 0 0 0 1 0 5 0"/>
                    <component objectid="1" transform="1 0 0 0 1 0 0 0 1 0 -5 0"/>
                </components>
            </object>
            <object id="1">{TRIANGLE_MESH}</object>"#
        ),
        r#"<item objectid="2" transform="2 0 0 0 2 0 0 0 2 1 0 0"/>"#,
    );

    let scene = lib3mf_scene::parse(&data).unwrap();
    let meshes = scene.meshes();
    assert_eq!(meshes.len(), 2);
    assert!(Arc::ptr_eq(&meshes[0].1.geometry, &meshes[1].1.geometry));

    // item scale applies after the component offset
    assert_eq!(meshes[0].0[(0, 0)], 2.0);
    assert_eq!(meshes[0].0[(0, 3)], 1.0);
    assert_eq!(meshes[0].0[(1, 3)], 10.0);
    assert_eq!(meshes[1].0[(1, 3)], -10.0);
}

#[test]
fn test_component_from_another_part() {
    let root = model_xml(
        r#"<object id="1">
            <components>
                <component objectid="7" p:path="/3D/parts.model"/>
            </components>
        </object>"#,
        r#"<item objectid="1"/>"#,
    );
    let parts = model_xml(&format!(r#"<object id="7">{TRIANGLE_MESH}</object>"#), "");
    let data = PackageBuilder::new()
        .model(root)
        .part("3D/parts.model", parts)
        .build();

    let scene = lib3mf_scene::parse(&data).unwrap();
    assert_eq!(scene.mesh_count(), 1);
}

#[test]
fn test_cyclic_components_fail() {
    let data = package(
        r#"<object id="1"><components><component objectid="2"/></components></object>
           <object id="2"><components><component objectid="1"/></components></object>"#,
        r#"<item objectid="1"/>"#,
    );

    let err = lib3mf_scene::parse(&data).unwrap_err();
    assert!(matches!(err, Error::CyclicReference { .. }));
    assert!(err.to_string().contains("[E3003]"));
}

#[test]
fn test_unknown_build_item_object_fails() {
    let data = package(
        &format!(r#"<object id="1">{TRIANGLE_MESH}</object>"#),
        r#"<item objectid="99"/>"#,
    );

    let err = lib3mf_scene::parse(&data).unwrap_err();
    assert!(matches!(err, Error::MissingObject { ref object_id, .. } if object_id == "99"));
}

#[test]
fn test_unknown_pid_skips_triangles() {
    let data = package(
        &format!(r#"<object id="1" pid="404">{TRIANGLE_MESH}</object>"#),
        r#"<item objectid="1"/>"#,
    );

    let scene = lib3mf_scene::parse(&data).unwrap();
    assert_eq!(scene.children().len(), 1);
    assert_eq!(scene.mesh_count(), 0);
}

#[test]
fn test_missing_model_relationship() {
    let rels = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="thumb" Target="/Metadata/thumbnail.png" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail"/>
</Relationships>"#;
    let data = PackageBuilder::empty()
        .part("_rels/.rels", rels)
        .model(model_xml("", ""))
        .build();

    let err = lib3mf_scene::parse(&data).unwrap_err();
    assert!(matches!(err, Error::MissingRelationship(_)));
}

#[test]
fn test_missing_package_relationships() {
    let data = PackageBuilder::empty().model(model_xml("", "")).build();
    let err = lib3mf_scene::parse(&data).unwrap_err();
    assert!(matches!(err, Error::MissingFile(ref name) if name == "_rels/.rels"));
}

#[test]
fn test_missing_root_part() {
    let data = PackageBuilder::new().build();
    let err = lib3mf_scene::parse(&data).unwrap_err();
    assert!(matches!(err, Error::MissingFile(ref name) if name == "3D/3dmodel.model"));
}

#[test]
fn test_broken_root_part_fails() {
    let data = PackageBuilder::new().model("<notamodel/>").build();
    assert!(lib3mf_scene::parse(&data).is_err());
}

#[test]
fn test_broken_secondary_part_is_skipped() {
    let data = PackageBuilder::new()
        .model(model_xml(
            &format!(r#"<object id="1">{TRIANGLE_MESH}</object>"#),
            r#"<item objectid="1"/>"#,
        ))
        .part("3D/broken.model", "<model><resources><object id=")
        .build();

    let scene = lib3mf_scene::parse(&data).unwrap();
    assert_eq!(scene.mesh_count(), 1);
}

#[test]
fn test_empty_build_gives_empty_root() {
    let data = package(&format!(r#"<object id="1">{TRIANGLE_MESH}</object>"#), "");
    let loaded = Loader::default().load(&data, |_| {}).unwrap();
    assert!(loaded.root.children().is_empty());
    assert_eq!(loaded.stats.objects_built, 1);
}

#[test]
fn test_unit_and_metadata() {
    let model = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="inch" xmlns="{}">
    <metadata name="Title">Bracket</metadata>
    <metadata name="Designer">R&amp;D</metadata>
    <metadata name="Internal">hidden</metadata>
    <resources>
        <object id="1">{TRIANGLE_MESH}</object>
    </resources>
    <build>
        <item objectid="1"/>
    </build>
</model>"#,
        common::CORE_NS
    );
    let data = PackageBuilder::new().model(model).build();

    let loaded = Loader::default().load(&data, |_| {}).unwrap();
    assert_eq!(loaded.unit, "inch");
    assert_eq!(loaded.metadata.get("Title").map(String::as_str), Some("Bracket"));
    assert_eq!(loaded.metadata.get("Designer").map(String::as_str), Some("R&D"));
    assert!(!loaded.metadata.contains_key("Internal"));
}

#[test]
fn test_load_from_reader() {
    let data = package(
        &format!(r#"<object id="1">{TRIANGLE_MESH}</object>"#),
        r#"<item objectid="1"/>"#,
    );

    let scene = Loader::default().from_reader(Cursor::new(data)).unwrap();
    assert_eq!(scene.mesh_count(), 1);
}

#[test]
fn test_callback_style_load() {
    let data = package(
        &format!(r#"<object id="1">{TRIANGLE_MESH}</object>"#),
        r#"<item objectid="1"/>"#,
    );

    let mut failed = false;
    let scene = Loader::default().load_from_buffer(&data, |_| {}, |_| failed = true);
    assert!(scene.is_some());
    assert!(!failed);
}

#[test]
fn test_nonstandard_root_part_location() {
    let rels = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rel0" Target="/Models/main.model" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#;
    let data = PackageBuilder::empty()
        .part("_rels/.rels", rels)
        .part(
            "Models/main.model",
            model_xml(
                &format!(r#"<object id="1">{TRIANGLE_MESH}</object>"#),
                r#"<item objectid="1"/>"#,
            ),
        )
        .build();

    let scene = lib3mf_scene::parse(&data).unwrap();
    assert_eq!(scene.mesh_count(), 1);
}
