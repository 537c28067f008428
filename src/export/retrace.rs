//! Retrace-style writer.
//!
//! The ProGuard layout restricted to methods, each prefixed with a `1:1:` line
//! range. Source line numbers are not tracked, so the range is a placeholder that
//! keeps retrace tools parsing the file.

use std::io::Write;

use crate::{
    export::{proguard::method_signature, ExportView},
    model::dotted_name,
    Result,
};

const LINE_RANGE: &str = "1:1";

pub(crate) fn write<W: Write>(view: &ExportView, out: &mut W) -> Result<()> {
    for class in &view.classes {
        writeln!(
            out,
            "{} -> {}:",
            dotted_name(class),
            dotted_name(view.class_name(class))
        )?;
        for method in view.methods_of(class) {
            writeln!(
                out,
                "    {LINE_RANGE}:{} -> {}",
                method_signature(method),
                method.obfuscated
            )?;
        }
    }
    Ok(())
}
