use std::path::Path;

use anyhow::{bail, Context};
use classcloak::{export::json, mapping::MappingStore};
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::file_display_name,
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
pub struct LookupResult {
    pub name: String,
    pub originals: Vec<String>,
}

pub fn run(mapping: &Path, name: &str, opts: &GlobalOptions) -> anyhow::Result<()> {
    let tables = json::read(mapping)
        .with_context(|| format!("failed to read mapping: {}", mapping.display()))?;
    let store = MappingStore::from_tables(&tables);

    // a member name may be shared by unrelated members of the same class
    let originals = store.get_original_names(name);
    if originals.is_empty() {
        bail!("{name} does not appear in {}", file_display_name(mapping));
    }

    let result = LookupResult {
        name: name.to_string(),
        originals,
    };

    print_output(&result, opts, |r| {
        let mut tw = TabWriter::new(&[("Obfuscated", Align::Left), ("Original", Align::Left)]);
        for original in &r.originals {
            tw.row(vec![r.name.clone(), original.clone()]);
        }
        tw.print();
    })
}
