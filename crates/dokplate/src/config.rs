//! Processor configuration
//!
//! Settings are plain serde structs, loadable from TOML:
//!
//! ```
//! use dokplate::ProcessorConfig;
//!
//! let config = ProcessorConfig::from_toml_str(r#"
//! default_image_name = "Photo"
//!
//! [relationship_id]
//! prefix = "rId"
//! min = 2000
//! max = 2999
//! "#).unwrap();
//!
//! assert_eq!(config.default_image_name, "Photo");
//! assert_eq!(config.relationship_id.min, 2000);
//! assert_eq!(config.xml_id.prefix, "_x0000_i");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, TemplateError};

/// Prefix and numeric range of a generated identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    /// Literal prefix, e.g. `rId`
    pub prefix: String,
    /// Smallest numeric suffix (inclusive)
    pub min: u32,
    /// Largest numeric suffix (inclusive)
    pub max: u32,
}

impl IdRange {
    pub fn new(prefix: impl Into<String>, min: u32, max: u32) -> Self {
        Self {
            prefix: prefix.into(),
            min,
            max,
        }
    }

    /// Legacy VML shape ids: `_x0000_i1000` ..= `_x0000_i9999`
    pub fn xml_id() -> Self {
        Self::new("_x0000_i", 1000, 9999)
    }

    /// Relationship ids: `rId50` ..= `rId1000`
    pub fn relationship_id() -> Self {
        Self::new("rId", 50, 1000)
    }
}

/// Top-level processor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Title written on injected images when none is given
    pub default_image_name: String,
    /// Upper bound on candidates tried per generated identifier
    pub max_id_attempts: u32,
    /// Range for VML shape ids
    #[serde(default = "IdRange::xml_id")]
    pub xml_id: IdRange,
    /// Range for relationship ids
    #[serde(default = "IdRange::relationship_id")]
    pub relationship_id: IdRange,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            default_image_name: "Image".to_string(),
            max_id_attempts: 100,
            xml_id: IdRange::xml_id(),
            relationship_id: IdRange::relationship_id(),
        }
    }
}

impl ProcessorConfig {
    /// Parse settings from a TOML string and validate them
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the id generator cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_id_attempts == 0 {
            return Err(TemplateError::InvalidConfig(
                "max_id_attempts must be at least 1".to_string(),
            ));
        }
        for (field, range) in [("xml_id", &self.xml_id), ("relationship_id", &self.relationship_id)] {
            if range.min > range.max {
                return Err(TemplateError::InvalidConfig(format!(
                    "{}: min {} is greater than max {}",
                    field, range.min, range.max
                )));
            }
            if range.prefix.is_empty() {
                return Err(TemplateError::InvalidConfig(format!(
                    "{}: prefix must not be empty",
                    field
                )));
            }
        }
        Ok(())
    }
}
