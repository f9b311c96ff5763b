#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Full pipeline: ZIP extraction -> relationships -> model parts -> scene
    let mut last = 0.0f32;
    let _ = lib3mf_scene::Loader::default().parse_with_progress(data, |p| {
        assert!(p >= last && p <= 1.0);
        last = p;
    });
});
