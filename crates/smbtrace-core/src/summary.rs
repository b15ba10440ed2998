//! Packet summary listing.
//!
//! The tool's summary markup looks like:
//!
//! ```text
//! <psml>
//!   <structure>
//!     <section>No.</section> ... <section>Info</section>
//!   </structure>
//!   <packet>
//!     <section>1</section> ... <section>Negotiate Protocol Request</section>
//!   </packet>
//!   ...
//! </psml>
//! ```
//!
//! The column layout is validated up front and every packet row must match
//! it exactly. Any deviation fails the whole load; nothing partial is
//! returned.

use serde::Serialize;

use crate::markup::{MarkupError, MarkupReader};
use crate::tool::ToolError;

/// Root element of the summary markup.
pub const SUMMARY_ROOT: &str = "psml";

/// Column headings, in the order the tool emits them.
pub const SUMMARY_COLUMNS: [&str; 7] = [
    "No.",
    "Time",
    "Source",
    "Destination",
    "Protocol",
    "Length",
    "Info",
];

/// One row of the packet listing.
///
/// The length column is read and dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Frame number assigned by the tool. Strictly increasing in file order.
    pub number: u32,
    /// Seconds, as printed in the tool's time column.
    pub timestamp: f64,
    pub source: String,
    pub destination: String,
    pub protocol: String,
    pub info: String,
}

/// Parse a complete summary markup document into rows, in document order.
pub fn parse_summary(markup: &[u8]) -> Result<Vec<Summary>, LoadError> {
    let mut xml = MarkupReader::new(markup);

    enter(&mut xml, SUMMARY_ROOT)?;
    enter(&mut xml, "structure")?;
    for (position, column) in SUMMARY_COLUMNS.iter().enumerate() {
        if !xml.next_start_element()? {
            return Err(LoadError::SchemaViolation(format!(
                "structure ends before column {column:?}"
            )));
        }
        if xml.name() != "section" {
            return Err(LoadError::SchemaViolation(format!(
                "expected <section> for column {column:?}, found <{}>",
                xml.name()
            )));
        }
        let heading = xml.read_text().map_err(|e| match e {
            MarkupError::UnexpectedElement(_) => LoadError::SchemaViolation(format!(
                "heading for column {column:?} contains markup"
            )),
            other => other.into(),
        })?;
        if heading.trim() != *column {
            return Err(LoadError::SchemaViolation(format!(
                "column {} is {heading:?}, expected {column:?}",
                position + 1
            )));
        }
    }
    if xml.next_start_element()? {
        return Err(LoadError::SchemaViolation(format!(
            "unexpected <{}> after the last column",
            xml.name()
        )));
    }

    let mut summaries: Vec<Summary> = Vec::new();
    while xml.next_start_element()? {
        if xml.name() != "packet" {
            return Err(LoadError::SchemaViolation(format!(
                "expected <packet>, found <{}>",
                xml.name()
            )));
        }
        let index = summaries.len();
        let summary = read_packet(&mut xml, index)?;
        if let Some(previous) = summaries.last() {
            if summary.number <= previous.number {
                return Err(LoadError::MalformedPacketRecord {
                    index,
                    reason: format!(
                        "packet number {} does not follow {}",
                        summary.number, previous.number
                    ),
                });
            }
        }
        summaries.push(summary);
    }

    Ok(summaries)
}

/// Step into the next start element and require it to be `name`.
fn enter(xml: &mut MarkupReader<'_>, name: &str) -> Result<(), LoadError> {
    if !xml.next_start_element()? {
        return Err(LoadError::SchemaViolation(format!("missing <{name}>")));
    }
    if xml.name() != name {
        return Err(LoadError::SchemaViolation(format!(
            "expected <{name}>, found <{}>",
            xml.name()
        )));
    }
    Ok(())
}

/// Read one `<packet>` row. The cursor is on the packet's start tag and is
/// left just past its end tag.
fn read_packet(xml: &mut MarkupReader<'_>, index: usize) -> Result<Summary, LoadError> {
    let mut values = Vec::with_capacity(SUMMARY_COLUMNS.len());
    while xml.next_start_element()? {
        if xml.name() != "section" {
            return Err(LoadError::SchemaViolation(format!(
                "expected <section> in packet #{index}, found <{}>",
                xml.name()
            )));
        }
        if values.len() == SUMMARY_COLUMNS.len() {
            return Err(malformed(index, "more than seven sections".into()));
        }
        let value = xml.read_text().map_err(|e| match e {
            MarkupError::UnexpectedElement(_) => {
                malformed(index, format!("section {} contains markup", values.len() + 1))
            }
            other => other.into(),
        })?;
        values.push(value);
    }

    let [number, time, source, destination, protocol, _length, info]: [String; 7] =
        values.try_into().map_err(|values: Vec<String>| {
            malformed(index, format!("{} sections, expected seven", values.len()))
        })?;

    let number = match number.trim().parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => {
            let reason = format!("packet number {number:?} is not a positive integer");
            return Err(malformed(index, reason));
        }
    };
    let timestamp = match time.trim().parse::<f64>() {
        Ok(t) if t.is_finite() => t,
        _ => return Err(malformed(index, format!("timestamp {time:?} is not a number"))),
    };

    Ok(Summary {
        number,
        timestamp,
        source,
        destination,
        protocol,
        info,
    })
}

fn malformed(index: usize, reason: String) -> LoadError {
    LoadError::MalformedPacketRecord { index, reason }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("capture tool failed: {0}")]
    ProcessFailed(#[from] ToolError),

    #[error("summary schema violation: {0}")]
    SchemaViolation(String),

    #[error("malformed packet record #{index}: {reason}")]
    MalformedPacketRecord { index: usize, reason: String },

    #[error("unreadable summary markup: {0}")]
    Markup(#[from] MarkupError),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
