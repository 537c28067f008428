//! Searge (`.srg`) writer.
//!
//! Three blocks separated by blank lines: `CL:` class lines, `FD:` field lines and
//! `MD:` method lines. Member lines qualify names with their owner using `/`;
//! method descriptors are written unchanged on both sides.

use std::io::Write;

use crate::{export::ExportView, mapping::split_field_key, mapping::split_method_key, Result};

pub(crate) fn write<W: Write>(view: &ExportView, out: &mut W) -> Result<()> {
    for (original, obfuscated) in &view.tables.classes {
        writeln!(out, "CL: {original} {obfuscated}")?;
    }
    writeln!(out)?;

    for (key, obfuscated) in &view.tables.fields {
        if let Some((owner, name)) = split_field_key(key) {
            writeln!(
                out,
                "FD: {owner}/{name} {}/{obfuscated}",
                view.class_name(owner)
            )?;
        }
    }
    writeln!(out)?;

    for (key, obfuscated) in &view.tables.methods {
        if let Some((owner, name, descriptor)) = split_method_key(key) {
            writeln!(
                out,
                "MD: {owner}/{name} {descriptor} {}/{obfuscated} {descriptor}",
                view.class_name(owner)
            )?;
        }
    }

    Ok(())
}
