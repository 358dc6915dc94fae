//! Image injection support
//!
//! Images are embedded with legacy VML markup, sized in points and linked to
//! the media file through a relationship id:
//!
//! ```xml
//! <w:pict>
//!   <v:shape id="_x0000_i1234" type="#_x0000_t75" style="width:300pt;height:200pt">
//!     <v:imagedata r:id="rId77" o:title="Image"/>
//!   </v:shape>
//! </w:pict>
//! ```
//!
//! Only the basic raster formats are accepted: PNG, JPEG and GIF.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, ImageReader};

use crate::archive::MEDIA_DIR;
use crate::content_types::DefaultContentType;
use crate::error::{Result, TemplateError};
use crate::relationships::Relationship;
use crate::xml::escape_xml;

/// Raster formats that can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Gif,
    Png,
}

impl ImageKind {
    /// Map a file extension (case-insensitive) to a supported format
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// MIME content type of the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Png => "image/png",
        }
    }

    fn format(&self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Gif => ImageFormat::Gif,
            Self::Png => ImageFormat::Png,
        }
    }
}

/// Get the MIME content type for a supported image extension
pub fn content_type_for_extension(ext: &str) -> Option<&'static str> {
    ImageKind::from_extension(ext).map(|kind| kind.mime_type())
}

/// Lowercased extension of a path, without the dot
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Caller-supplied options for [`crate::TemplateProcessor::set_image`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOptions {
    /// Title written to `o:title`; the configured default when unset
    pub name: Option<String>,
    /// Extension override; inferred from the file name when unset
    pub extension: Option<String>,
    /// MIME type override; derived from the extension when unset
    pub mime_type: Option<String>,
    /// Width bound in points
    pub max_width: Option<u32>,
    /// Height bound in points
    pub max_height: Option<u32>,
}

impl ImageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Bound the rendered size; scaling only applies when both bounds are set
    pub fn with_max_size(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = Some(max_width);
        self.max_height = Some(max_height);
        self
    }
}

/// Scale native dimensions down along the dominant, overflowing axis
///
/// Scaling happens only when both bounds are given. The ratio comes from
/// the larger dimension, and only if that dimension exceeds its bound; a
/// square image or an overflowing minor axis keeps its native size.
pub fn scale_dimensions(
    width: u32,
    height: u32,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> (f64, f64) {
    let (w, h) = (f64::from(width), f64::from(height));
    let (max_w, max_h) = match (max_width, max_height) {
        (Some(mw), Some(mh)) if mw > 0 && mh > 0 => (f64::from(mw), f64::from(mh)),
        _ => return (w, h),
    };

    let ratio = if w > max_w && w > h {
        w / max_w
    } else if h > max_h && h > w {
        h / max_h
    } else {
        1.0
    };

    (w / ratio, h / ratio)
}

/// Decode just enough of the image to learn its pixel size
pub fn probe_dimensions(bytes: &[u8], kind: ImageKind, path: &Path) -> Result<(u32, u32)> {
    ImageReader::with_format(Cursor::new(bytes), kind.format())
        .into_dimensions()
        .map_err(|e| TemplateError::UnsupportedImage {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

/// Everything needed to splice one image into the package
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDescriptor {
    /// VML shape id (`_x0000_i....`)
    pub xml_id: String,
    /// Relationship id (`rId...`)
    pub rels_id: String,
    /// Title written to `o:title`
    pub name: String,
    /// Lowercased extension without dot
    pub extension: String,
    /// MIME type declared for the extension
    pub mime_type: String,
    /// Rendered width in points
    pub width: f64,
    /// Rendered height in points
    pub height: f64,
}

impl ImageDescriptor {
    /// File name of the embedded copy, e.g. `imagerId77.png`
    pub fn media_name(&self) -> String {
        format!("image{}.{}", self.rels_id, self.extension)
    }

    /// Archive path of the embedded copy
    pub fn media_path(&self) -> String {
        format!("{}/{}", MEDIA_DIR, self.media_name())
    }

    /// VML markup substituted for the placeholder
    pub fn shape_xml(&self) -> String {
        format!(
            r##"<w:pict><v:shape id="{}" type="#_x0000_t75" style="width:{}pt;height:{}pt"><v:imagedata r:id="{}" o:title="{}"/></v:shape></w:pict>"##,
            self.xml_id,
            self.width,
            self.height,
            self.rels_id,
            escape_xml(&self.name)
        )
    }

    /// Relationship entry pointing at the media file
    pub fn relationship(&self) -> Relationship {
        Relationship::image(&self.rels_id, format!("media/{}", self.media_name()))
    }

    /// Content-type default for the extension
    pub fn content_type(&self) -> DefaultContentType {
        DefaultContentType::new(&self.extension, &self.mime_type)
    }
}
