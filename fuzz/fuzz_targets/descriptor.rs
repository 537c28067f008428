#![no_main]

use classcloak::descriptor::{parse_field_descriptor, parse_method_descriptor, remap_descriptor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_field_descriptor(text);
        if let Ok(method) = parse_method_descriptor(text) {
            let _ = method.java_parameters();
            let _ = method.java_return();
        }
        let _ = remap_descriptor(text, |class| Some(format!("x{}", class.len())));
    }
});
