//! Relationship manifest entries
//!
//! OOXML uses relationship files (`_rels/*.rels`) to map IDs to targets.
//! Injected images need a `<Relationship>` entry in
//! `word/_rels/document.xml.rels` whose ID matches the `r:id` used by the
//! image markup in the main part.
//!
//! # Example
//!
//! ```
//! use dokplate::relationships::Relationship;
//!
//! let rel = Relationship::image("rId77", "media/imagerId77.png");
//! assert!(rel.to_xml().contains(r#"Target="media/imagerId77.png""#));
//! ```

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Result, TemplateError};
use crate::xml::escape_xml;

/// OOXML namespace for relationships
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Closing tag of the relationship manifest
pub const RELATIONSHIPS_CLOSE: &str = "</Relationships>";

/// Image relationship type
pub const TYPE_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// A single `<Relationship>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g. "rId77")
    pub id: String,
    /// The relationship type URI
    pub rel_type: String,
    /// The target URL or path
    pub target: String,
    /// Target mode: "External" for URLs, None for internal paths
    pub target_mode: Option<String>,
}

impl Relationship {
    /// Create an internal image relationship
    pub fn image(id: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type: TYPE_IMAGE.to_string(),
            target: target.into(),
            target_mode: None,
        }
    }

    /// Check if this relationship points to an image
    pub fn is_image(&self) -> bool {
        self.rel_type.contains("image")
    }

    /// Serialize as a single `<Relationship/>` element
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<Relationship");
        xml.push_str(&format!(r#" Id="{}""#, escape_xml(&self.id)));
        xml.push_str(&format!(r#" Type="{}""#, escape_xml(&self.rel_type)));
        xml.push_str(&format!(r#" Target="{}""#, escape_xml(&self.target)));
        if let Some(mode) = &self.target_mode {
            xml.push_str(&format!(r#" TargetMode="{}""#, escape_xml(mode)));
        }
        xml.push_str("/>");
        xml
    }
}

/// Parse all relationships from a manifest, in document order
pub fn parse(xml: &[u8]) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut relationships = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;
                    let mut target_mode = None;

                    for attr in e.attributes().filter_map(|a| a.ok()) {
                        let value = attr.unescape_value().ok().map(|s| s.to_string());
                        match attr.key.as_ref() {
                            b"Id" => id = value,
                            b"Target" => target = value,
                            b"Type" => rel_type = value,
                            b"TargetMode" => target_mode = value,
                            _ => {}
                        }
                    }

                    if let (Some(id), Some(target)) = (id, target) {
                        relationships.push(Relationship {
                            id,
                            rel_type: rel_type.unwrap_or_default(),
                            target,
                            target_mode,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TemplateError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}
