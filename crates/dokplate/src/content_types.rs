//! `[Content_Types].xml` default entries
//!
//! Every file extension stored in the package needs a `<Default>` content
//! type declaration, declared once per extension.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Result, TemplateError};
use crate::xml::escape_xml;

/// Closing tag of the content-type manifest
pub const TYPES_CLOSE: &str = "</Types>";

/// A `<Default Extension=".." ContentType=".."/>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultContentType {
    pub extension: String,
    pub content_type: String,
}

impl DefaultContentType {
    pub fn new(extension: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            content_type: content_type.into(),
        }
    }

    pub fn to_xml(&self) -> String {
        format!(
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            escape_xml(&self.extension),
            escape_xml(&self.content_type)
        )
    }
}

/// Parse the `<Default>` entries of a content-type manifest
pub fn parse_defaults(xml: &[u8]) -> Result<Vec<DefaultContentType>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut defaults = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Default" {
                    let mut extension = None;
                    let mut content_type = None;
                    for attr in e.attributes().filter_map(|a| a.ok()) {
                        let value = attr.unescape_value().ok().map(|s| s.to_string());
                        match attr.key.as_ref() {
                            b"Extension" => extension = value,
                            b"ContentType" => content_type = value,
                            _ => {}
                        }
                    }
                    if let Some(extension) = extension {
                        defaults.push(DefaultContentType {
                            extension,
                            content_type: content_type.unwrap_or_default(),
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

    Ok(defaults)
}

/// Check whether the manifest already declares a default for `extension`
///
/// Extensions are compared case-insensitively, as package part names are.
pub fn declares_extension(xml: &str, extension: &str) -> Result<bool> {
    Ok(parse_defaults(xml.as_bytes())?
        .iter()
        .any(|d| d.extension.eq_ignore_ascii_case(extension)))
}
