//! Integration tests for archive rewriting.
//!
//! The container format and the bulk remapper are external collaborators, so
//! these tests supply small stand-ins:
//!
//! - [`LineCodec`] stores one `name=hex(data)` line per entry, with the manifest
//!   written as a regular `META-INF/MANIFEST.MF` entry.
//! - [`TokenRemapper`] treats a class body as whitespace-separated type names and
//!   renames every token found in the class table. Like some real remapping
//!   engines it keeps the original entry next to the renamed one.

use std::{fs, path::PathBuf};

use classcloak::{
    config::ObfuscationConfig,
    engine::{ObfuscationEngine, RewriteJob},
    mapping::MappingStore,
    model::ClassInfo,
    rewrite::{
        class_entry_name, Archive, ArchiveCodec, ArchiveEntry, BulkRemapper, Manifest, RemapOutput,
        RemapTable, RewriteOptions, Rewriter, MANIFEST_PATH,
    },
    Error, Result,
};

struct LineCodec;

impl ArchiveCodec for LineCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Archive> {
        let text = std::str::from_utf8(bytes).map_err(|e| Error::Archive(e.to_string()))?;
        let mut archive = Archive::new();

        for line in text.lines().filter(|l| !l.is_empty()) {
            let (name, hex) = line
                .split_once('=')
                .ok_or_else(|| Error::Archive(format!("bad line {line}")))?;
            let data = decode_hex(hex)?;
            if name == MANIFEST_PATH {
                let manifest = String::from_utf8(data).map_err(|e| Error::Archive(e.to_string()))?;
                archive.manifest = Some(Manifest::parse(&manifest)?);
            } else {
                archive.entries.push(ArchiveEntry::new(name, data));
            }
        }
        Ok(archive)
    }

    fn encode(&self, archive: &Archive) -> Result<Vec<u8>> {
        let mut out = String::new();
        if let Some(manifest) = &archive.manifest {
            out.push_str(&format!("{MANIFEST_PATH}={}\n", encode_hex(manifest.render().as_bytes())));
        }
        for entry in &archive.entries {
            out.push_str(&format!("{}={}\n", entry.name, encode_hex(&entry.data)));
        }
        Ok(out.into_bytes())
    }
}

fn encode_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_hex(hex: &str) -> Result<Vec<u8>> {
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| Error::Archive(format!("bad hex at {i}")))
        })
        .collect()
}

struct TokenRemapper;

impl BulkRemapper for TokenRemapper {
    fn remap(&self, archive: &Archive, table: &RemapTable, _classpath: &[PathBuf]) -> Result<RemapOutput> {
        let known: Vec<&str> = archive.class_names();
        let mut output = RemapOutput {
            archive: Archive {
                entries: Vec::new(),
                manifest: archive.manifest.clone(),
            },
            unresolved: Vec::new(),
        };

        for entry in &archive.entries {
            let Some(class) = entry.class_name() else {
                output.archive.entries.push(entry.clone());
                continue;
            };

            let body = String::from_utf8_lossy(&entry.data);
            let mut tokens = Vec::new();
            for token in body.split_whitespace() {
                if let Some(mapped) = table.map_class(token) {
                    tokens.push(mapped.to_string());
                    continue;
                }
                if token.starts_with("ext/") {
                    if !output.unresolved.iter().any(|u| u == token) {
                        output.unresolved.push(token.to_string());
                    }
                } else if !known.contains(&token) && !token.starts_with("java/") {
                    return Err(Error::RemapFailed {
                        type_name: token.to_string(),
                        message: "not in the archive or on the classpath".to_string(),
                    });
                }
                tokens.push(token.to_string());
            }

            match table.map_class(class) {
                Some(renamed) => {
                    output.archive.entries.push(entry.clone());
                    output
                        .archive
                        .entries
                        .push(ArchiveEntry::new(&class_entry_name(renamed), tokens.join(" ")));
                }
                None => output
                    .archive
                    .entries
                    .push(ArchiveEntry::new(&entry.name, tokens.join(" "))),
            }
        }

        Ok(output)
    }
}

fn store() -> MappingStore {
    let store = MappingStore::new();
    store.map_class("p/Main", "a1");
    store.map_class("p/Util", "a2");
    store
}

fn input_archive() -> Archive {
    Archive::new()
        .with_manifest(Manifest::parse("Manifest-Version: 1.0\nMain-Class: p.Main\n").unwrap())
        .with_entry("p/Main.class", "p/Util java/lang/String")
        .with_entry("p/Util.class", "java/lang/Object ext/Base")
        .with_entry("lib/Kept.class", "p/Util")
        .with_entry("config.properties", "debug=false")
}

fn write_input(dir: &std::path::Path, archive: &Archive) -> PathBuf {
    let path = dir.join("input.jar");
    fs::write(&path, LineCodec.encode(archive).unwrap()).unwrap();
    path
}

fn read_output(path: &std::path::Path) -> Archive {
    LineCodec.decode(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn stale_entries_are_removed() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let input = write_input(dir.path(), &input_archive());
    let output = dir.path().join("output.jar");

    let rewriter = Rewriter::new(&LineCodec, &TokenRemapper);
    let report = rewriter.rewrite(&input, &output, &store(), &RewriteOptions::new())?;

    assert_eq!(report.removed_stale, vec!["p/Main.class", "p/Util.class"]);
    assert_eq!(report.unresolved_types, vec!["ext/Base"]);

    let archive = read_output(&output);
    let mut classes = archive.class_names();
    classes.sort_unstable();
    assert_eq!(classes, vec!["a1", "a2", "lib/Kept"]);
    for class in ["p/Main", "p/Util"] {
        assert!(!archive.contains(&class_entry_name(class)));
    }
    assert_eq!(archive.entry("a1.class").unwrap().data, b"a2 java/lang/String".to_vec());
    assert_eq!(archive.entry("lib/Kept.class").unwrap().data, b"a2".to_vec());
    assert_eq!(archive.entries.len(), report.entries);
    Ok(())
}

#[test]
fn manifest_entry_point_follows_the_rename() -> Result<()> {
    let rewriter = Rewriter::new(&LineCodec, &TokenRemapper);

    let (archive, report) = rewriter.rewrite_archive(&input_archive(), &store(), &RewriteOptions::new())?;
    assert_eq!(report.manifest_attributes, vec!["Main-Class"]);
    let manifest = archive.manifest.unwrap();
    assert_eq!(manifest.get("Main-Class"), Some("a1"));
    assert_eq!(manifest.get("Manifest-Version"), Some("1.0"));

    let options = RewriteOptions::new().with_manifest_attribute("Main-Class", "p.Util");
    let (archive, _) = rewriter.rewrite_archive(&input_archive(), &store(), &options)?;
    assert_eq!(archive.manifest.unwrap().get("Main-Class"), Some("a2"));

    let mut bare = input_archive();
    bare.manifest = None;
    let (archive, _) = rewriter.rewrite_archive(&bare, &store(), &options)?;
    assert_eq!(archive.manifest.unwrap().get("Main-Class"), Some("a2"));
    Ok(())
}

#[test]
fn resources_merge_without_overwriting() -> Result<()> {
    let rewriter = Rewriter::new(&LineCodec, &TokenRemapper);
    let options = RewriteOptions::new()
        .with_resource(ArchiveEntry::new("config.properties", "debug=true"))
        .with_resource(ArchiveEntry::new("assets/logo.txt", "logo"));

    let (archive, report) = rewriter.rewrite_archive(&input_archive(), &store(), &options)?;
    assert_eq!(report.merged_resources, vec!["assets/logo.txt"]);
    assert_eq!(report.skipped_resources, vec!["config.properties"]);
    assert_eq!(archive.entry("config.properties").unwrap().data, b"debug=false".to_vec());
    assert!(archive.contains("assets/logo.txt"));
    Ok(())
}

#[test]
fn duplicate_entries_collapse() -> Result<()> {
    let archive = input_archive()
        .with_entry("notes.txt", "first")
        .with_entry("notes.txt", "second");

    let rewriter = Rewriter::new(&LineCodec, &TokenRemapper);
    let (output, report) = rewriter.rewrite_archive(&archive, &store(), &RewriteOptions::new())?;
    assert_eq!(report.collapsed_duplicates, vec!["notes.txt"]);
    assert_eq!(output.count("notes.txt"), 1);
    assert_eq!(output.entry("notes.txt").unwrap().data, b"first".to_vec());
    Ok(())
}

#[test]
fn remap_failure_leaves_destination_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let archive = input_archive().with_entry("p/Broken.class", "missing/Type");
    let input = write_input(dir.path(), &archive);
    let output = dir.path().join("output.jar");
    fs::write(&output, "previous build").unwrap();

    let rewriter = Rewriter::new(&LineCodec, &TokenRemapper);
    let result = rewriter.rewrite(&input, &output, &store(), &RewriteOptions::new());

    assert!(matches!(result, Err(Error::RemapFailed { ref type_name, .. }) if type_name == "missing/Type"));
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous build");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn mapping_is_written_before_the_archive() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let classes = vec![
        ClassInfo::new("p/Main", Some("java/lang/Object")),
        ClassInfo::new("p/Util", Some("java/lang/Object")),
    ];
    let broken = input_archive().with_entry("p/Broken.class", "missing/Type");
    let input = write_input(dir.path(), &broken);
    let mapping = dir.path().join("mapping.txt");
    let output = dir.path().join("output.jar");
    let options = RewriteOptions::new();

    let engine = ObfuscationEngine::new(ObfuscationConfig::default().with_prefixes("a", "f", "m"))?;
    let result = engine.run(&classes)?;
    let job = RewriteJob {
        rewriter: Rewriter::new(&LineCodec, &TokenRemapper),
        input: &input,
        output: &output,
        options: &options,
    };

    assert!(matches!(
        engine.write(result, &mapping, None, Some(job)),
        Err(Error::RemapFailed { .. })
    ));
    assert!(fs::read_to_string(&mapping)?.starts_with("p.Main -> a1:\n"));
    assert!(!output.exists());
    Ok(())
}

#[test]
fn engine_writes_both_outputs() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let classes = vec![
        ClassInfo::new("p/Main", Some("java/lang/Object")),
        ClassInfo::new("p/Util", Some("java/lang/Object")),
    ];
    let input = write_input(dir.path(), &input_archive());
    let mapping = dir.path().join("mapping.json");
    let output = dir.path().join("output.jar");
    let options = RewriteOptions::new();

    let engine = ObfuscationEngine::new(ObfuscationConfig::default().with_prefixes("a", "f", "m"))?;
    let result = engine.run(&classes)?;
    let outcome = engine.write(
        result,
        &mapping,
        None,
        Some(RewriteJob {
            rewriter: Rewriter::new(&LineCodec, &TokenRemapper),
            input: &input,
            output: &output,
            options: &options,
        }),
    )?;

    assert_eq!(outcome.format, "json");
    let report = outcome.rewrite.unwrap();
    assert_eq!(report.removed_stale.len(), 2);
    assert_eq!(read_output(&output).manifest.unwrap().get("Main-Class"), Some("a1"));
    Ok(())
}
