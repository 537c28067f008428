//! Tiny v2 writer.
//!
//! The first namespace is `obfuscated`, the second `deobfuscated`, so every name
//! column and every descriptor is written obfuscated side first. Descriptors live in
//! the first namespace and have their class references remapped accordingly.

use std::io::Write;

use crate::{
    descriptor::remap_descriptor,
    export::{ExportView, UNKNOWN_TYPE},
    Result,
};

const HEADER: &str = "tiny\t2\t0\tobfuscated\tdeobfuscated";

pub(crate) fn write<W: Write>(view: &ExportView, out: &mut W) -> Result<()> {
    let obfuscate = |name: &str| view.tables.classes.get(name).cloned();

    writeln!(out, "{HEADER}")?;
    for class in &view.classes {
        writeln!(out, "c\t{}\t{}", view.class_name(class), class)?;

        for field in view.fields_of(class) {
            let descriptor = field
                .descriptor
                .as_deref()
                .map_or_else(|| UNKNOWN_TYPE.to_string(), |d| remap_descriptor(d, obfuscate));
            writeln!(out, "\tf\t{}\t{}\t{}", descriptor, field.obfuscated, field.name)?;
        }
        for method in view.methods_of(class) {
            writeln!(
                out,
                "\tm\t{}\t{}\t{}",
                remap_descriptor(&method.descriptor, obfuscate),
                method.obfuscated,
                method.name
            )?;
        }
    }
    Ok(())
}
