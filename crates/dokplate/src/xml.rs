//! String-level helpers shared by the template operations

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, TemplateError};

/// Matches any `${...}` placeholder, capturing the inner token
pub(crate) static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(.*?)\}").expect("placeholder pattern is valid"));

/// Wrap a variable name into its `${name}` macro form unless it already is one
pub fn ensure_macro(name: &str) -> String {
    if name.starts_with("${") && name.ends_with('}') {
        name.to_string()
    } else {
        format!("${{{}}}", name)
    }
}

/// Escape special XML characters in attribute values
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Escape bare ampersands only; other markup in the value is kept
pub fn escape_ampersands(text: &str) -> String {
    text.replace('&', "&amp;")
}

/// Insert `fragment` right before the last occurrence of `closing_tag`
pub fn insert_before_closing(buffer: &mut String, closing_tag: &str, fragment: &str) -> Result<()> {
    let pos = buffer.rfind(closing_tag).ok_or_else(|| {
        TemplateError::InvalidStructure(format!("closing tag {} not found", closing_tag))
    })?;
    buffer.insert_str(pos, fragment);
    Ok(())
}
