//! CSV writer: `Type,Original,Obfuscated,Class,Member`.
//!
//! `Class` and `Member` are empty for class rows. Method members carry their
//! descriptor so overloads stay distinguishable.

use std::io::Write;

use crate::{
    export::ExportView,
    mapping::{split_field_key, split_method_key},
    Result,
};

const HEADER: &str = "Type,Original,Obfuscated,Class,Member";

pub(crate) fn write<W: Write>(view: &ExportView, out: &mut W) -> Result<()> {
    writeln!(out, "{HEADER}")?;

    for (original, obfuscated) in &view.tables.classes {
        write_row(out, &["CLASS", original, obfuscated, "", ""])?;
    }
    for (key, obfuscated) in &view.tables.fields {
        if let Some((owner, name)) = split_field_key(key) {
            write_row(out, &["FIELD", key, obfuscated, owner, name])?;
        }
    }
    for (key, obfuscated) in &view.tables.methods {
        if let Some((owner, name, descriptor)) = split_method_key(key) {
            let member = format!("{name}{descriptor}");
            write_row(out, &["METHOD", key, obfuscated, owner, &member])?;
        }
    }

    Ok(())
}

fn write_row<W: Write>(out: &mut W, cells: &[&str]) -> Result<()> {
    let row: Vec<String> = cells.iter().map(|cell| quote(cell)).collect();
    writeln!(out, "{}", row.join(","))?;
    Ok(())
}

fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
