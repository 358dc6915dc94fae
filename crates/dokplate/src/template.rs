//! Base template engine for DOCX packages
//!
//! `Template` owns the unpacked archive and the main document part as an
//! editable string. It handles plain `${name}` substitution and saving;
//! block, image and row operations are layered on top by
//! [`crate::TemplateProcessor`].
//!
//! # Example
//!
//! ```no_run
//! use dokplate::Template;
//!
//! let mut template = Template::load("letter.docx")?;
//! template.set_value("customer", "ACME Corp.");
//! template.save_as("out.docx")?;
//! # Ok::<(), dokplate::TemplateError>(())
//! ```

use std::io::Cursor;
use std::path::Path;

use tracing::debug;

use crate::archive::{PackageArchive, MAIN_PART_PATH};
use crate::error::{Result, TemplateError};
use crate::xml::{ensure_macro, PLACEHOLDER};

/// A DOCX template with an editable main document part
#[derive(Debug)]
pub struct Template {
    /// The underlying OOXML archive
    archive: PackageArchive,
    /// Working copy of `word/document.xml`
    main_part: String,
}

impl Template {
    /// Load a template from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_archive(PackageArchive::open(path)?)
    }

    /// Load a template from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_archive(PackageArchive::from_reader(Cursor::new(bytes))?)
    }

    /// Wrap an already unpacked archive
    pub fn from_archive(archive: PackageArchive) -> Result<Self> {
        let main_part = archive
            .get_string(MAIN_PART_PATH)
            .ok_or_else(|| TemplateError::MissingFile(MAIN_PART_PATH.to_string()))?;
        Ok(Self { archive, main_part })
    }

    /// The current main document part
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Replace the main document part wholesale
    pub fn set_main_part(&mut self, xml: impl Into<String>) {
        self.main_part = xml.into();
    }

    /// Read an archive entry as text
    pub fn entry_string(&self, path: &str) -> Option<String> {
        self.archive.get_string(path)
    }

    /// Get a reference to the underlying archive
    pub fn archive(&self) -> &PackageArchive {
        &self.archive
    }

    /// Replace every `${search}` with `replace`, returning the count
    ///
    /// The value is inserted verbatim, so it may carry markup.
    pub fn set_value(&mut self, search: &str, replace: &str) -> usize {
        self.set_value_limited(search, replace, usize::MAX)
    }

    /// Replace at most `limit` occurrences of `${search}`
    pub fn set_value_limited(&mut self, search: &str, replace: &str, limit: usize) -> usize {
        let search = ensure_macro(search);
        let count = self.main_part.matches(&search).count().min(limit);
        if count > 0 {
            self.main_part = self.main_part.replacen(&search, replace, count);
        }
        debug!(placeholder = %search, count, "substituted value");
        count
    }

    /// Distinct placeholder names in the main part, in document order
    pub fn variables(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&self.main_part) {
            let name = &caps[1];
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Embed a file from disk under `entry`
    pub fn add_file<P: AsRef<Path>>(&mut self, source: P, entry: impl Into<String>) -> Result<()> {
        let bytes = std::fs::read(source)?;
        self.add_bytes(entry, bytes);
        Ok(())
    }

    /// Embed raw bytes under `entry`
    pub fn add_bytes(&mut self, entry: impl Into<String>, bytes: Vec<u8>) {
        self.archive.set(entry, bytes);
    }

    /// Write a text entry
    pub fn add_from_string(&mut self, entry: impl Into<String>, contents: impl Into<String>) {
        self.archive.set_string(entry, contents);
    }

    /// Flush the main part and serialize the package
    pub fn save(&mut self) -> Result<Vec<u8>> {
        self.archive.set_string(MAIN_PART_PATH, self.main_part.clone());
        let mut buffer = Cursor::new(Vec::new());
        self.archive.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Flush the main part and write the package to `path`
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.archive.set_string(MAIN_PART_PATH, self.main_part.clone());
        self.archive.write_to_file(path)
    }
}
