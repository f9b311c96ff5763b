#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(xml) = std::str::from_utf8(data) {
        if let Ok(rels) = lib3mf_scene::opc::parse_relationships("_rels/.rels", xml) {
            for rel in &rels {
                let _ = rel.part_name();
            }
        }
    }
});
