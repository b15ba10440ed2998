//! Forward-only markup cursor.
//!
//! A thin layer over `quick_xml` pull events exposing the few moves the
//! summary and detail parsers make: step to the next child start element,
//! read an element's text, skip an element, look up an attribute. Only the
//! start tag under the cursor is held; no document tree is built.
//!
//! Self-closing elements (`<field name="x"/>`) behave exactly like an empty
//! start/end pair, so callers never need to tell the two apart.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Cursor over one markup document held in memory.
pub struct MarkupReader<'a> {
    reader: Reader<&'a [u8]>,
    /// Start tag the cursor sits on. `None` after an end tag.
    current: Option<BytesStart<'a>>,
    /// The current element was self-closing and its end is still owed.
    empty_pending: bool,
    /// Number of currently open elements.
    depth: usize,
}

impl<'a> MarkupReader<'a> {
    pub fn new(markup: &'a [u8]) -> Self {
        Self {
            reader: Reader::from_reader(markup),
            current: None,
            empty_pending: false,
            depth: 0,
        }
    }

    /// Advance to the next start element inside the innermost open element.
    ///
    /// Returns `true` positioned on that element, or `false` once the open
    /// element's end tag is reached. At the top level, a clean end of
    /// document also returns `false`. Text, comments and declarations
    /// between elements are skipped.
    pub fn next_start_element(&mut self) -> Result<bool, MarkupError> {
        if self.empty_pending {
            self.close_empty();
            return Ok(false);
        }

        loop {
            match self.reader.read_event()? {
                Event::Start(start) => {
                    self.depth += 1;
                    self.current = Some(start);
                    return Ok(true);
                }
                Event::Empty(start) => {
                    self.depth += 1;
                    self.empty_pending = true;
                    self.current = Some(start);
                    return Ok(true);
                }
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                    self.current = None;
                    return Ok(false);
                }
                Event::Eof => return self.end_of_document().map(|_| false),
                _ => {}
            }
        }
    }

    /// Name of the element under the cursor, or `""` after an end tag.
    pub fn name(&self) -> &str {
        self.current
            .as_ref()
            .and_then(|start| std::str::from_utf8(start.name().into_inner()).ok())
            .unwrap_or("")
    }

    /// Unescaped value of `key` on the element under the cursor.
    pub fn attribute(&self, key: &str) -> Result<Option<String>, MarkupError> {
        let start = self.current.as_ref().ok_or(MarkupError::NotOnElement)?;
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if attr.key.as_ref() == key.as_bytes() {
                let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    /// Read the text content of the element under the cursor and consume
    /// its end tag. A child element is an error.
    pub fn read_text(&mut self) -> Result<String, MarkupError> {
        if self.current.is_none() {
            return Err(MarkupError::NotOnElement);
        }
        if self.empty_pending {
            self.close_empty();
            return Ok(String::new());
        }

        let element = self.name().to_owned();
        let mut text = String::new();
        loop {
            match self.reader.read_event()? {
                Event::Text(chunk) => {
                    text.push_str(&chunk.unescape().map_err(quick_xml::Error::from)?);
                }
                Event::CData(chunk) => text.push_str(std::str::from_utf8(&chunk)?),
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                    self.current = None;
                    return Ok(text);
                }
                Event::Start(_) | Event::Empty(_) => {
                    return Err(MarkupError::UnexpectedElement(element));
                }
                Event::Eof => return Err(MarkupError::UnexpectedEof),
                _ => {}
            }
        }
    }

    /// Consume everything up to and including the end tag of the innermost
    /// open element. On a freshly entered element that is the element
    /// itself; after a child's end tag it is the rest of the parent.
    pub fn skip_current_element(&mut self) -> Result<(), MarkupError> {
        self.current = None;
        if self.empty_pending {
            self.close_empty();
            return Ok(());
        }
        if self.depth == 0 {
            return Ok(());
        }

        let target = self.depth - 1;
        loop {
            match self.reader.read_event()? {
                Event::Start(_) => self.depth += 1,
                Event::End(_) => {
                    self.depth -= 1;
                    if self.depth == target {
                        return Ok(());
                    }
                }
                Event::Eof => return Err(MarkupError::UnexpectedEof),
                _ => {}
            }
        }
    }

    fn close_empty(&mut self) {
        self.empty_pending = false;
        self.depth = self.depth.saturating_sub(1);
        self.current = None;
    }

    fn end_of_document(&mut self) -> Result<(), MarkupError> {
        self.current = None;
        if self.depth > 0 {
            return Err(MarkupError::UnexpectedEof);
        }
        Ok(())
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid utf-8 in markup: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("document ended inside an open element")]
    UnexpectedEof,

    #[error("<{0}> contains child elements where text was expected")]
    UnexpectedElement(String),

    #[error("reader is not positioned on a start element")]
    NotOnElement,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
