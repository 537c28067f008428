//! Human-readable mapping report.

use std::io::Write;

use crate::{export::ExportView, export::json::Statistics, Result};

const WIDTH: usize = 80;

pub(crate) fn write<W: Write>(view: &ExportView, out: &mut W) -> Result<()> {
    let heavy = "=".repeat(WIDTH);
    let stats = Statistics::of(&view.tables);

    writeln!(out, "{heavy}")?;
    writeln!(out, "  OBFUSCATION MAPPING REPORT")?;
    writeln!(out, "{heavy}")?;
    writeln!(out, "  Generator: {}", view.generator)?;
    writeln!(out, "  Generated: {}", view.generated_at)?;
    writeln!(out)?;
    writeln!(out, "  Classes renamed: {:>8}", stats.classes)?;
    writeln!(out, "  Fields renamed:  {:>8}", stats.fields)?;
    writeln!(out, "  Methods renamed: {:>8}", stats.methods)?;
    writeln!(out, "  Total:           {:>8}", stats.total)?;

    section(out, "CLASSES", &view.tables.classes)?;
    section(out, "FIELDS", &view.tables.fields)?;
    section(out, "METHODS", &view.tables.methods)?;
    kept(out, view)?;
    groups(out, view)?;

    writeln!(out)?;
    writeln!(out, "{heavy}")?;
    Ok(())
}

fn heading<W: Write>(out: &mut W, title: &str, count: usize) -> Result<()> {
    let light = "-".repeat(WIDTH);
    writeln!(out)?;
    writeln!(out, "{light}")?;
    writeln!(out, "  {title} ({count})")?;
    writeln!(out, "{light}")?;
    if count == 0 {
        writeln!(out, "  (none)")?;
    }
    Ok(())
}

fn kept<W: Write>(out: &mut W, view: &ExportView) -> Result<()> {
    let rows: Vec<(&str, &String)> = [
        ("class", &view.kept_classes),
        ("field", &view.kept_fields),
        ("method", &view.kept_methods),
    ]
    .into_iter()
    .flat_map(|(kind, symbols)| symbols.iter().map(move |s| (kind, s)))
    .collect();

    heading(out, "KEPT", rows.len())?;
    for (kind, symbol) in rows {
        writeln!(out, "  {kind:<6}  {symbol}")?;
    }
    Ok(())
}

fn groups<W: Write>(out: &mut W, view: &ExportView) -> Result<()> {
    heading(out, "HIERARCHY GROUPS", view.groups.len())?;
    for (root, members) in &view.groups {
        let shared = members
            .iter()
            .find_map(|m| view.tables.methods.get(m))
            .map_or("?", String::as_str);
        writeln!(out, "  {root}  ->  {shared}  ({} members)", members.len())?;
        for member in members {
            writeln!(out, "      {member}")?;
        }
    }
    Ok(())
}

fn section<'a, W, I>(out: &mut W, title: &str, rows: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let rows: Vec<_> = rows.into_iter().collect();
    let width = rows.iter().map(|(original, _)| original.len()).max().unwrap_or(0);

    heading(out, title, rows.len())?;
    for (original, obfuscated) in rows {
        writeln!(out, "  {original:<width$}  ->  {obfuscated}")?;
    }
    Ok(())
}
