//! Paragraph-row splicing
//!
//! A "row" is the single `<w:p>` paragraph surrounding a placeholder. The
//! paragraph is repeated once per value, each copy with the placeholder
//! replaced by that value. Boundaries are found by literal search on the
//! serialized main part, not by parsing it.

use tracing::debug;

use crate::error::{Result, TemplateError};
use crate::xml::{ensure_macro, escape_ampersands};

const PARAGRAPH_OPEN_WITH_ATTRS: &str = "<w:p ";
const PARAGRAPH_OPEN: &str = "<w:p>";
const PARAGRAPH_CLOSE: &str = "</w:p>";

/// Values for [`crate::TemplateProcessor::set_value_break_line`]
///
/// A single value behaves like a one-element list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneValues(pub Vec<String>);

impl From<&str> for CloneValues {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for CloneValues {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl<S: Into<String>> From<Vec<S>> for CloneValues {
    fn from(values: Vec<S>) -> Self {
        Self(values.into_iter().map(Into::into).collect())
    }
}

impl<S: AsRef<str>> From<&[S]> for CloneValues {
    fn from(values: &[S]) -> Self {
        Self(values.iter().map(|v| v.as_ref().to_string()).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for CloneValues {
    fn from(values: [S; N]) -> Self {
        Self(values.into_iter().map(Into::into).collect())
    }
}

/// Start of the nearest paragraph opening at or before `offset`
pub(crate) fn paragraph_start(xml: &str, offset: usize) -> Option<usize> {
    let head = xml.get(..offset)?;
    match (head.rfind(PARAGRAPH_OPEN_WITH_ATTRS), head.rfind(PARAGRAPH_OPEN)) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// End (exclusive, past the closing tag) of the nearest paragraph closing
/// at or after `offset`
pub(crate) fn paragraph_end(xml: &str, offset: usize) -> Option<usize> {
    xml.get(offset..)?
        .find(PARAGRAPH_CLOSE)
        .map(|pos| offset + pos + PARAGRAPH_CLOSE.len())
}

/// Repeat the paragraph holding `search` once per value
///
/// Returns the new main part; `xml` itself is never modified.
pub fn splice_rows(xml: &str, search: &str, values: &CloneValues) -> Result<String> {
    let search = ensure_macro(search);

    let tag_pos = xml
        .find(&search)
        .ok_or_else(|| TemplateError::VariableNotFound(search.clone()))?;

    let row_start = paragraph_start(xml, tag_pos).ok_or_else(|| {
        TemplateError::InvalidStructure(format!(
            "cannot find the start of the paragraph holding {}",
            search
        ))
    })?;
    let row_end = paragraph_end(xml, tag_pos).ok_or_else(|| {
        TemplateError::InvalidStructure(format!(
            "cannot find the end of the paragraph holding {}",
            search
        ))
    })?;

    let row = &xml[row_start..row_end];
    debug!(placeholder = %search, rows = values.0.len(), "splicing paragraph rows");

    let mut result = String::with_capacity(xml.len() + row.len() * values.0.len());
    result.push_str(&xml[..row_start]);
    for value in &values.0 {
        result.push_str(&row.replace(&search, &escape_ampersands(value)));
    }
    result.push_str(&xml[row_end..]);

    Ok(result)
}
