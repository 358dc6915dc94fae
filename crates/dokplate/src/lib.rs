//! # dokplate
//!
//! DOCX template operations beyond plain placeholder replacement.
//!
//! This crate provides functionality to:
//! - Clone a `${name}` … `${/name}` block of paragraphs N times
//! - Inject PNG, JPEG and GIF images into a placeholder, scaled to fit
//! - Repeat a single paragraph once per value
//!
//! ## Example
//!
//! ```no_run
//! use dokplate::TemplateProcessor;
//!
//! let mut processor = TemplateProcessor::open("template.docx")?;
//! if processor.clone_block("item", 2, true)?.is_some() {
//!     processor.set_value("item_name#1", "Apples");
//!     processor.set_value("item_name#2", "Pears");
//! }
//! std::fs::write("output.docx", processor.save()?)?;
//! # Ok::<(), dokplate::TemplateError>(())
//! ```

pub mod archive;
pub mod block;
pub mod config;
pub mod content_types;
pub mod error;
pub mod ids;
pub mod image;
pub mod processor;
pub mod relationships;
pub mod row;
pub mod template;
#[doc(hidden)]
pub mod test_utils;
mod xml;

pub use archive::PackageArchive;
pub use block::BlockParts;
pub use config::{IdRange, ProcessorConfig};
pub use error::{Result, TemplateError};
pub use image::{ImageDescriptor, ImageKind, ImageOptions};
pub use processor::{symbols, TemplateProcessor};
pub use row::CloneValues;
pub use template::Template;
pub use xml::ensure_macro;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
