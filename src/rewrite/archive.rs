//! In-memory view of a class archive.
//!
//! An [`Archive`] is an ordered list of named entries plus the parsed main
//! manifest. Reading and writing the container itself is the job of an
//! [`ArchiveCodec`]; the codec is expected to move `META-INF/MANIFEST.MF` into
//! [`Archive::manifest`] on decode and back into the container on encode.

use crate::Result;

/// Path of the manifest inside the container.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

/// Maximum length of a manifest line in bytes, excluding the line break.
const MANIFEST_LINE_LIMIT: usize = 72;

/// Entry name of a class given its internal name.
#[must_use]
pub fn class_entry_name(class: &str) -> String {
    format!("{class}.class")
}

/// A named blob inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path inside the container, `/` separated
    pub name: String,
    /// Raw content
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(name: &str, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.to_string(),
            data: data.into(),
        }
    }

    /// Returns true for `.class` entries.
    #[must_use]
    pub fn is_class(&self) -> bool {
        self.name.ends_with(".class")
    }

    /// Internal class name of a `.class` entry.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        self.name.strip_suffix(".class")
    }
}

/// The main section of a JAR manifest.
///
/// Attribute order is preserved. Individual (per-entry) sections are not
/// interpreted and are carried through verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    attributes: Vec<(String, String)>,
    sections: String,
}

impl Manifest {
    /// Creates an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses manifest text, joining continuation lines.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for a main-section line that is neither
    /// a `Name: value` pair nor a continuation.
    pub fn parse(text: &str) -> Result<Self> {
        let mut manifest = Manifest::new();
        let mut lines = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));

        for line in lines.by_ref() {
            if line.is_empty() {
                break;
            }
            if let Some(continued) = line.strip_prefix(' ') {
                match manifest.attributes.last_mut() {
                    Some((_, value)) => value.push_str(continued),
                    None => return Err(malformed_error!("Manifest starts with a continuation line")),
                }
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                return Err(malformed_error!("Invalid manifest line '{}'", line));
            };
            if name.is_empty() {
                return Err(malformed_error!("Empty manifest attribute name"));
            }
            manifest
                .attributes
                .push((name.to_string(), value.strip_prefix(' ').unwrap_or(value).to_string()));
        }

        let rest: Vec<&str> = lines.collect();
        let rest = rest.join("\r\n");
        if !rest.trim().is_empty() {
            manifest.sections = rest;
        }

        Ok(manifest)
    }

    /// Value of an attribute; names compare case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets an attribute, replacing an existing value in place.
    pub fn set(&mut self, name: &str, value: &str) {
        match self
            .attributes
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }

    /// Removes an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self
            .attributes
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.attributes.remove(index).1)
    }

    /// Main-section attributes in file order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Renders the manifest with CRLF line breaks, wrapping lines at 72 bytes.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.attributes {
            wrap_line(&format!("{name}: {value}"), &mut out);
        }
        out.push_str("\r\n");
        if !self.sections.is_empty() {
            out.push_str(&self.sections);
            if !self.sections.ends_with("\r\n") {
                out.push_str("\r\n");
            }
        }
        out
    }
}

fn wrap_line(line: &str, out: &mut String) {
    let mut rest = line;
    let mut limit = MANIFEST_LINE_LIMIT;
    let mut first = true;

    while !rest.is_empty() {
        let mut cut = rest.len().min(limit);
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if !first {
            out.push(' ');
        }
        out.push_str(&rest[..cut]);
        out.push_str("\r\n");
        rest = &rest[cut..];
        // continuation lines spend one byte on the leading space
        limit = MANIFEST_LINE_LIMIT - 1;
        first = false;
    }
}

/// A decoded archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    /// Entries in container order
    pub entries: Vec<ArchiveEntry>,
    /// The main manifest, if the archive has one
    pub manifest: Option<Manifest>,
}

impl Archive {
    /// Creates an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    #[must_use]
    pub fn with_entry(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.entries.push(ArchiveEntry::new(name, data));
        self
    }

    /// Sets the manifest.
    #[must_use]
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Returns true if an entry with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// First entry with this name.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of entries with this name.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.entries.iter().filter(|e| e.name == name).count()
    }

    /// Removes every entry with this name and returns how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        before - self.entries.len()
    }

    /// Internal names of all class entries, in container order.
    #[must_use]
    pub fn class_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(ArchiveEntry::class_name)
            .collect()
    }
}

/// Container I/O for a class archive format.
pub trait ArchiveCodec: Send + Sync {
    /// Decodes a container.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Archive`] if the bytes are not a valid container.
    fn decode(&self, bytes: &[u8]) -> Result<Archive>;

    /// Encodes an archive into container bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Archive`] if the archive cannot be encoded.
    fn encode(&self, archive: &Archive) -> Result<Vec<u8>>;
}
