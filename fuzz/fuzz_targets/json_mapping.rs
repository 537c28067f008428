#![no_main]

use classcloak::{
    export::{json, MappingExporter, MappingFormat},
    mapping::MappingStore,
};
use libfuzzer_sys::fuzz_target;
use strum::IntoEnumIterator;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(tables) = json::parse(text) {
        let store = MappingStore::from_tables(&tables);
        let exporter = MappingExporter::new();
        for format in MappingFormat::iter() {
            let _ = exporter.render(&store, format);
        }
    }
});
