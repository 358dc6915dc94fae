//! Shared test fixtures for dokplate
//!
//! Builders for minimal DOCX packages and small encoded images, used by the
//! unit tests and the integration tests under `tests/`.

use std::io::{Cursor, Write};

use image::codecs::gif::GifEncoder;
use image::{DynamicImage, Frame, ImageFormat, RgbImage, RgbaImage};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

use crate::error::Result;
use crate::image::ImageKind;

/// `[Content_Types].xml` of the fixture package
pub const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

/// `word/_rels/document.xml.rels` of the fixture package
pub const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

/// Wrap body markup into a complete main document part
pub fn document_xml(body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
            r#"xmlns:v="urn:schemas-microsoft-com:vml" xmlns:o="urn:schemas-microsoft-com:office:office">"#,
            "<w:body>{}</w:body></w:document>"
        ),
        body
    )
}

/// A single-run paragraph holding `text`
pub fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text)
}

/// Create a minimal valid DOCX package whose body is `body`
pub fn create_template(body: &str) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#,
    )?;

    zip.start_file("word/_rels/document.xml.rels", options)?;
    zip.write_all(DOCUMENT_RELS_XML.as_bytes())?;

    zip.start_file("word/document.xml", options)?;
    zip.write_all(document_xml(body).as_bytes())?;

    zip.finish()?;
    Ok(buffer.into_inner())
}

/// Encode a blank image of the given size
pub fn encode_image(width: u32, height: u32, kind: ImageKind) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let encoded = match kind {
        ImageKind::Png => {
            DynamicImage::ImageRgb8(RgbImage::new(width, height)).write_to(&mut buffer, ImageFormat::Png)
        }
        ImageKind::Jpeg => {
            DynamicImage::ImageRgb8(RgbImage::new(width, height)).write_to(&mut buffer, ImageFormat::Jpeg)
        }
        ImageKind::Gif => {
            let mut encoder = GifEncoder::new(&mut buffer);
            encoder.encode_frame(Frame::new(RgbaImage::new(width, height)))
        }
    };
    encoded.map_err(|e| crate::error::TemplateError::UnsupportedImage {
        path: format!("<{:?} fixture>", kind),
        reason: e.to_string(),
    })?;
    Ok(buffer.into_inner())
}
