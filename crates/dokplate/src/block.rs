//! Block cloning
//!
//! A block is the run of paragraphs between the paragraph holding `${name}`
//! and the paragraph holding `${/name}`. Cloning works in two phases:
//!
//! 1. **Locate**: the main part is streamed through quick-xml and written
//!    back out, collapsing `<x></x>` into `<x/>`. While writing, the nearest
//!    `<w:p>` ancestor of each marker is tracked so its serialized markup can
//!    be cut from the output.
//! 2. **Slice**: the markup between the two paragraphs is matched on the
//!    re-serialized text, so it agrees byte for byte with what was parsed.
//!
//! Node identity does not survive serialization, which is why the second
//! phase works on text.

use std::ops::Range;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use regex::{Captures, RegexBuilder};
use tracing::debug;

use crate::error::{Result, TemplateError};
use crate::row::{paragraph_end, paragraph_start};
use crate::xml::PLACEHOLDER;

/// Paragraph markups found around a block's markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedParagraphs {
    /// The whole main part in normalized form
    pub document: String,
    /// Serialized paragraph holding `${name}`
    pub start_paragraph: String,
    /// Serialized paragraph holding `${/name}`
    pub end_paragraph: String,
}

/// Result of cloning a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonedBlock {
    /// Markup between the two marker paragraphs, before suffixing
    pub body: String,
    /// Normalized main part with the block replaced by its clones
    pub document: String,
}

/// A block split into its marker paragraphs and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockParts {
    pub begin: String,
    pub body: String,
    pub end: String,
}

struct OpenElement {
    id: usize,
    is_paragraph: bool,
    start: usize,
}

struct Marker {
    paragraph_id: usize,
    span: Option<Range<usize>>,
}

impl Marker {
    fn find(stack: &[OpenElement], marker: &str) -> Result<Self> {
        let paragraph = stack.iter().rev().find(|el| el.is_paragraph).ok_or_else(|| {
            TemplateError::InvalidStructure(format!("{} is not inside a paragraph", marker))
        })?;
        Ok(Self {
            paragraph_id: paragraph.id,
            span: None,
        })
    }

    fn close(&mut self, element: &OpenElement, end: usize) {
        if self.paragraph_id == element.id {
            self.span = Some(element.start..end);
        }
    }
}

fn is_paragraph(start: &BytesStart<'_>) -> bool {
    start.local_name().as_ref() == b"p"
}

/// Phase one: normalize the main part and cut out the marker paragraphs
///
/// Returns `Ok(None)` when either marker is missing.
pub fn locate_paragraphs(xml: &str, name: &str) -> Result<Option<LocatedParagraphs>> {
    let start_marker = format!("${{{}}}", name);
    let end_marker = format!("${{/{}}}", name);

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut pending: Option<BytesStart<'_>> = None;
    let mut next_id = 0;
    let mut start: Option<Marker> = None;
    let mut end: Option<Marker> = None;

    loop {
        let event = reader.read_event()?;

        if let Some(open) = pending.take() {
            if matches!(event, Event::End(_)) {
                writer.write_event(Event::Empty(open))?;
                continue;
            }
            let offset = writer.get_ref().len();
            let is_paragraph = is_paragraph(&open);
            writer.write_event(Event::Start(open))?;
            stack.push(OpenElement {
                id: next_id,
                is_paragraph,
                start: offset,
            });
            next_id += 1;
        }

        match event {
            Event::Start(e) => pending = Some(e),
            Event::End(e) => {
                writer.write_event(Event::End(e))?;
                let closed_at = writer.get_ref().len();
                if let Some(element) = stack.pop() {
                    for marker in [start.as_mut(), end.as_mut()].into_iter().flatten() {
                        marker.close(&element, closed_at);
                    }
                }
            }
            Event::Text(ref t) => {
                let text = String::from_utf8_lossy(t);
                if start.is_none() {
                    if text.contains(&start_marker) {
                        start = Some(Marker::find(&stack, &start_marker)?);
                    }
                } else if end.is_none() && text.contains(&end_marker) {
                    end = Some(Marker::find(&stack, &end_marker)?);
                }
                writer.write_event(event)?;
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    let (Some(start), Some(end)) = (start, end) else {
        return Ok(None);
    };
    let (Some(start_span), Some(end_span)) = (start.span, end.span) else {
        return Err(TemplateError::InvalidStructure(format!(
            "paragraph around block {} is never closed",
            name
        )));
    };

    let document = String::from_utf8(writer.into_inner()).map_err(|e| {
        TemplateError::InvalidStructure(format!("serialized main part is not UTF-8: {}", e))
    })?;

    Ok(Some(LocatedParagraphs {
        start_paragraph: document[start_span].to_string(),
        end_paragraph: document[end_span].to_string(),
        document,
    }))
}

/// Phase two: the first `start ... end` span, case-insensitive, non-greedy
///
/// Returns the full span and the body between the two paragraphs.
pub fn slice_block(located: &LocatedParagraphs) -> Result<Option<(Range<usize>, String)>> {
    let pattern = format!(
        "{}(.*?){}",
        regex::escape(&located.start_paragraph),
        regex::escape(&located.end_paragraph)
    );
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .size_limit(64 * (1 << 20))
        .build()
        .map_err(|e| TemplateError::InvalidStructure(format!("block pattern: {}", e)))?;

    Ok(re.captures(&located.document).and_then(|caps| {
        let whole = caps.get(0)?;
        let body = caps.get(1)?;
        Some((whole.range(), body.as_str().to_string()))
    }))
}

/// Rewrite every `${token}` into `${token#index}`
pub fn suffix_placeholders(xml: &str, index: usize) -> String {
    PLACEHOLDER
        .replace_all(xml, |caps: &Captures<'_>| format!("${{{}#{}}}", &caps[1], index))
        .into_owned()
}

/// Clone the block `name` `count` times
///
/// The returned document has the marker paragraphs and original body
/// replaced by `count` suffixed copies of the body.
pub fn clone_block(xml: &str, name: &str, count: usize) -> Result<Option<ClonedBlock>> {
    let Some(located) = locate_paragraphs(xml, name)? else {
        debug!(block = name, "block markers not found");
        return Ok(None);
    };
    let Some((span, body)) = slice_block(&located)? else {
        debug!(block = name, "block paragraphs not found in serialized document");
        return Ok(None);
    };

    let clones: String = (1..=count).map(|i| suffix_placeholders(&body, i)).collect();

    let mut document = located.document;
    document.replace_range(span, &clones);
    debug!(block = name, count, "cloned block");

    Ok(Some(ClonedBlock { body, document }))
}

/// Split out the block `name` by literal paragraph search, without parsing
pub fn find_block(xml: &str, name: &str) -> Option<BlockParts> {
    let start_marker = format!("${{{}}}", name);
    let end_marker = format!("${{/{}}}", name);

    let start_pos = xml.find(&start_marker)?;
    let begin_start = paragraph_start(xml, start_pos)?;
    let begin_end = paragraph_end(xml, start_pos)?;

    let end_pos = begin_end + xml[begin_end..].find(&end_marker)?;
    let end_start = paragraph_start(xml, end_pos)?;
    let end_end = paragraph_end(xml, end_pos)?;

    if end_start < begin_end {
        return None;
    }

    Some(BlockParts {
        begin: xml[begin_start..begin_end].to_string(),
        body: xml[begin_end..end_start].to_string(),
        end: xml[end_start..end_end].to_string(),
    })
}
