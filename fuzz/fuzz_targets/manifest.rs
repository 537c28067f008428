#![no_main]

use classcloak::rewrite::Manifest;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(manifest) = Manifest::parse(text) {
            let _ = Manifest::parse(&manifest.render());
        }
    }
});
