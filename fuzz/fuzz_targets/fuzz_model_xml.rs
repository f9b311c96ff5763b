#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(xml) = std::str::from_utf8(data) {
        let _ = lib3mf_scene::parser::parse_model_xml("3D/3dmodel.model", xml);
    }
});
