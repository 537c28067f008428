//! Post-remap repair of the first-pass archive.

use std::collections::{BTreeMap, HashSet};

use crate::{
    model::{dotted_name, internal_name},
    rewrite::{
        archive::{class_entry_name, Archive, ArchiveEntry, Manifest},
        remapper::RemapTable,
    },
    Error, Result,
};

/// Manifest attributes that name a class.
pub const ENTRY_POINT_ATTRIBUTES: &[&str] = &[
    "Main-Class",
    "Premain-Class",
    "Agent-Class",
    "Launcher-Agent-Class",
];

/// Removes entries still named after an original class that was renamed.
///
/// Returns the removed entry names.
///
/// # Errors
///
/// Returns [`Error::Archive`] if a renamed class has its original entry but no
/// entry under its new name: the remapper did not rename it, and dropping the
/// original would lose the class.
pub fn remove_stale_entries(archive: &mut Archive, table: &RemapTable) -> Result<Vec<String>> {
    let mut removed = Vec::new();

    for (original, obfuscated) in table.classes() {
        if original == obfuscated {
            continue;
        }
        let stale = class_entry_name(original);
        if !archive.contains(&stale) {
            continue;
        }
        if !archive.contains(&class_entry_name(obfuscated)) {
            return Err(Error::Archive(format!(
                "class {original} was not renamed to {obfuscated} by the remapper"
            )));
        }

        archive.remove(&stale);
        log::debug!("Removed stale entry {stale}");
        removed.push(stale);
    }

    Ok(removed)
}

/// Keeps only the first entry of every name. Returns the names that had
/// duplicates.
pub fn collapse_duplicates(archive: &mut Archive) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut collapsed = Vec::new();

    archive.entries.retain(|entry| {
        if seen.insert(entry.name.clone()) {
            true
        } else {
            if !collapsed.contains(&entry.name) {
                collapsed.push(entry.name.clone());
            }
            false
        }
    });

    for name in &collapsed {
        log::warn!("Dropped duplicate entry {name}");
    }
    collapsed
}

/// Applies manifest overrides, then maps every entry-point attribute through the
/// class table. Values are written in dotted form.
///
/// Returns the names of the attributes whose value changed.
pub fn update_manifest(
    manifest: &mut Manifest,
    table: &RemapTable,
    overrides: &BTreeMap<String, String>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (name, value) in overrides {
        if manifest.get(name) != Some(value.as_str()) {
            manifest.set(name, value);
            changed.push(name.clone());
        }
    }

    for attribute in ENTRY_POINT_ATTRIBUTES {
        let Some(value) = manifest.get(attribute) else {
            continue;
        };
        let class = internal_name(value.trim());
        let Some(mapped) = table.map_class(&class) else {
            continue;
        };
        let mapped = dotted_name(mapped);
        if mapped != value {
            log::debug!("Manifest {attribute}: {value} -> {mapped}");
            manifest.set(attribute, &mapped);
            if !changed.iter().any(|c| c.eq_ignore_ascii_case(attribute)) {
                changed.push((*attribute).to_string());
            }
        }
    }

    changed
}

/// Adds resources whose path is not taken yet.
///
/// Returns `(merged, skipped)` entry names. Collisions are never overwritten.
pub fn merge_resources(archive: &mut Archive, resources: &[ArchiveEntry]) -> (Vec<String>, Vec<String>) {
    let mut merged = Vec::new();
    let mut skipped = Vec::new();

    for resource in resources {
        if archive.contains(&resource.name) {
            log::warn!("Skipped resource {}: entry already exists", resource.name);
            skipped.push(resource.name.clone());
            continue;
        }
        archive.entries.push(resource.clone());
        merged.push(resource.name.clone());
    }

    (merged, skipped)
}
