//! Template processor
//!
//! `TemplateProcessor` extends [`Template`] with block cloning, image
//! injection and paragraph-row splicing. Besides the main part it keeps the
//! relationship and content-type manifests as text, so injected images stay
//! consistent across all three until [`TemplateProcessor::save`] writes
//! them back.
//!
//! Every operation computes its result before touching any buffer, so a
//! failed call leaves the processor as it was.
//!
//! # Example
//!
//! ```no_run
//! use dokplate::{ImageOptions, TemplateProcessor};
//!
//! let mut processor = TemplateProcessor::open("invoice.docx")?;
//! processor.clone_block("line", 3, true)?;
//! processor.set_value("line#1", "First");
//! processor.set_value_break_line("note", ["one", "two"])?;
//! processor.set_image("logo", "logo.png", ImageOptions::new().with_max_size(200, 100))?;
//! processor.save_as("invoice-out.docx")?;
//! # Ok::<(), dokplate::TemplateError>(())
//! ```

use std::path::Path;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, warn};

use crate::archive::{PackageArchive, CONTENT_TYPES_PATH, DOCUMENT_RELS_PATH};
use crate::block::{self, BlockParts};
use crate::config::ProcessorConfig;
use crate::content_types::{self, TYPES_CLOSE};
use crate::error::{Result, TemplateError};
use crate::ids::IdGenerator;
use crate::image::{self, ImageDescriptor, ImageKind, ImageOptions};
use crate::relationships::{self, Relationship, RELATIONSHIPS_CLOSE};
use crate::row::{self, CloneValues};
use crate::template::Template;
use crate::xml::insert_before_closing;

/// Wingdings symbols commonly substituted into forms
pub mod symbols {
    /// Empty check box
    pub const CHECKBOX: &str = r#"<w:sym w:font="Wingdings" w:char="F06F"/>"#;
    /// Crossed check box
    pub const CHECKBOX_CROSSED: &str = r#"<w:sym w:font="Wingdings 2" w:char="00D0"/>"#;
}

/// A DOCX template with block, image and row operations
#[derive(Debug)]
pub struct TemplateProcessor<R = StdRng> {
    template: Template,
    /// Working copy of `word/_rels/document.xml.rels`
    rels: String,
    /// Working copy of `[Content_Types].xml`
    content_types: String,
    config: ProcessorConfig,
    ids: IdGenerator<R>,
}

impl TemplateProcessor<StdRng> {
    /// Open a template from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(Template::load(path)?)
    }

    /// Open a template from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::new(Template::from_bytes(bytes)?)
    }

    /// Wrap a loaded template with the default configuration
    pub fn new(template: Template) -> Result<Self> {
        Self::with_config(template, ProcessorConfig::default())
    }

    /// Wrap a loaded template with explicit settings
    pub fn with_config(template: Template, config: ProcessorConfig) -> Result<Self> {
        let ids = IdGenerator::from_os_rng(config.max_id_attempts);
        Self::build(template, config, ids)
    }
}

impl<R: Rng> TemplateProcessor<R> {
    /// Wrap a loaded template, drawing identifiers from `rng`
    pub fn with_rng(template: Template, config: ProcessorConfig, rng: R) -> Result<Self> {
        let ids = IdGenerator::new(rng, config.max_id_attempts);
        Self::build(template, config, ids)
    }

    fn build(template: Template, config: ProcessorConfig, ids: IdGenerator<R>) -> Result<Self> {
        config.validate()?;
        let rels = template
            .entry_string(DOCUMENT_RELS_PATH)
            .ok_or_else(|| TemplateError::MissingFile(DOCUMENT_RELS_PATH.to_string()))?;
        let content_types = template
            .entry_string(CONTENT_TYPES_PATH)
            .ok_or_else(|| TemplateError::MissingFile(CONTENT_TYPES_PATH.to_string()))?;

        Ok(Self {
            template,
            rels,
            content_types,
            config,
            ids,
        })
    }

    /// The current main document part
    pub fn main_part(&self) -> &str {
        self.template.main_part()
    }

    /// The current relationship manifest
    pub fn relationships_xml(&self) -> &str {
        &self.rels
    }

    /// The current content-type manifest
    pub fn content_types_xml(&self) -> &str {
        &self.content_types
    }

    /// Parsed entries of the relationship manifest
    pub fn relationships(&self) -> Result<Vec<Relationship>> {
        relationships::parse(self.rels.as_bytes())
    }

    /// The active settings
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Get a reference to the underlying archive
    pub fn archive(&self) -> &PackageArchive {
        self.template.archive()
    }

    /// Replace every `${search}` with `replace`, returning the count
    pub fn set_value(&mut self, search: &str, replace: &str) -> usize {
        self.template.set_value(search, replace)
    }

    /// Replace at most `limit` occurrences of `${search}`
    pub fn set_value_limited(&mut self, search: &str, replace: &str, limit: usize) -> usize {
        self.template.set_value_limited(search, replace, limit)
    }

    /// Distinct placeholder names in the main part
    pub fn variables(&self) -> Vec<String> {
        self.template.variables()
    }

    /// Repeat the `${name}` … `${/name}` block `count` times
    ///
    /// Placeholders inside copy `i` become `${token#i}`. With `replace` the
    /// marker paragraphs and original body are swapped for the copies;
    /// without it nothing changes. Returns the original body, or `None`
    /// when the block is not found.
    pub fn clone_block(&mut self, name: &str, count: usize, replace: bool) -> Result<Option<String>> {
        let Some(cloned) = block::clone_block(self.template.main_part(), name, count)? else {
            return Ok(None);
        };
        if replace {
            self.template.set_main_part(cloned.document);
        }
        Ok(Some(cloned.body))
    }

    /// Split the block `name` into its marker paragraphs and body
    pub fn block(&self, name: &str) -> Option<BlockParts> {
        block::find_block(self.template.main_part(), name)
    }

    /// Repeat the paragraph holding `search` once per value
    pub fn set_value_break_line(&mut self, search: &str, values: impl Into<CloneValues>) -> Result<()> {
        let spliced = row::splice_rows(self.template.main_part(), search, &values.into())?;
        self.template.set_main_part(spliced);
        Ok(())
    }

    /// Generate a relationship id unused in the relationship manifest
    pub fn generate_relationship_id(&mut self) -> Result<String> {
        self.ids.generate(&self.config.relationship_id, &self.rels)
    }

    /// Generate a VML shape id unused in the main part
    pub fn generate_xml_id(&mut self) -> Result<String> {
        self.ids.generate(&self.config.xml_id, self.template.main_part())
    }

    /// Build the descriptor for `path` without changing the package
    pub fn image_properties<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: &ImageOptions,
    ) -> Result<(ImageDescriptor, Vec<u8>)> {
        let path = path.as_ref();
        let unsupported = |reason: String| TemplateError::UnsupportedImage {
            path: path.display().to_string(),
            reason,
        };

        let extension = match &options.extension {
            Some(ext) => ext.trim_start_matches('.').to_lowercase(),
            None => image::extension_of(path)
                .ok_or_else(|| unsupported("file name has no extension".to_string()))?,
        };
        let kind = ImageKind::from_extension(&extension)
            .ok_or_else(|| unsupported(format!("unsupported extension {:?}", extension)))?;

        let bytes = std::fs::read(path)?;
        let (native_width, native_height) = image::probe_dimensions(&bytes, kind, path)?;
        let (width, height) =
            image::scale_dimensions(native_width, native_height, options.max_width, options.max_height);

        let xml_id = self.generate_xml_id()?;
        let rels_id = self.generate_relationship_id()?;

        let descriptor = ImageDescriptor {
            xml_id,
            rels_id,
            name: options
                .name
                .clone()
                .unwrap_or_else(|| self.config.default_image_name.clone()),
            mime_type: options
                .mime_type
                .clone()
                .unwrap_or_else(|| kind.mime_type().to_string()),
            extension,
            width,
            height,
        };
        Ok((descriptor, bytes))
    }

    /// Put the image at `path` in place of `${block_name}`
    ///
    /// The image is copied to `word/media/image{rId}.{ext}`, linked from the
    /// relationship manifest and its extension declared in the content-type
    /// manifest unless already present.
    pub fn set_image<P: AsRef<Path>>(
        &mut self,
        block_name: &str,
        path: P,
        options: ImageOptions,
    ) -> Result<ImageDescriptor> {
        let (image, bytes) = self.image_properties(path, &options)?;

        let mut rels = self.rels.clone();
        insert_before_closing(&mut rels, RELATIONSHIPS_CLOSE, &image.relationship().to_xml())?;

        let mut content_types = self.content_types.clone();
        if !content_types::declares_extension(&content_types, &image.extension)? {
            insert_before_closing(&mut content_types, TYPES_CLOSE, &image.content_type().to_xml())?;
        }

        if self.template.set_value(block_name, &image.shape_xml()) == 0 {
            warn!(placeholder = block_name, "image placeholder not found in main part");
        }
        self.template.add_bytes(image.media_path(), bytes);
        self.rels = rels;
        self.content_types = content_types;

        debug!(
            placeholder = block_name,
            media = %image.media_path(),
            width = image.width,
            height = image.height,
            "embedded image"
        );
        Ok(image)
    }

    fn prepare_save(&mut self) {
        let main_part = self
            .template
            .main_part()
            .replace("<w:t><w:pict>", "<w:pict>")
            .replace("</w:pict></w:t>", "</w:pict>");
        self.template.set_main_part(main_part);

        self.template.add_from_string(DOCUMENT_RELS_PATH, self.rels.clone());
        self.template
            .add_from_string(CONTENT_TYPES_PATH, self.content_types.clone());
    }

    /// Write all buffers back and serialize the package
    pub fn save(&mut self) -> Result<Vec<u8>> {
        self.prepare_save();
        self.template.save()
    }

    /// Write all buffers back and save the package to `path`
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.prepare_save();
        self.template.save_as(path)
    }
}
