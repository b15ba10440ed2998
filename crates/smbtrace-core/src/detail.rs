//! Per-packet protocol field tree.
//!
//! Built from the tool's detail markup for a single frame:
//!
//! ```text
//! <pdml>
//!   <packet>
//!     <proto name="frame" showname="Frame 12: 194 bytes on wire">
//!       <field name="frame.number" show="12" showname="Frame Number: 12"/>
//!     </proto>
//!     <proto name="smb2" showname="SMB2 (Server Message Block Protocol version 2)">
//!       ...
//!     </proto>
//!   </packet>
//! </pdml>
//! ```

use std::fmt;

use serde::Serialize;

use crate::markup::{MarkupError, MarkupReader};
use crate::tool::ToolError;

/// Root element of the detail markup.
pub const DETAIL_ROOT: &str = "pdml";

/// Label of the synthetic node standing in for the `<packet>` element.
pub const ROOT_LABEL: &str = "root";

/// One protocol or field element. Children are owned and kept in document
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DetailNode {
    /// The element's `name` attribute.
    pub label: String,
    /// `showname` if present, else `show`, else empty.
    pub display_value: String,
    pub children: Vec<DetailNode>,
}

impl DetailNode {
    pub fn new(label: impl Into<String>, display_value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            display_value: display_value.into(),
            children: Vec::new(),
        }
    }

    /// The synthetic root every parsed tree starts from.
    pub fn root() -> Self {
        Self::new(ROOT_LABEL, "")
    }

    /// Depth-first search for the first node labelled `label`, this node
    /// included.
    pub fn find(&self, label: &str) -> Option<&DetailNode> {
        if self.label == label {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(label))
    }

    /// Number of nodes in this subtree, this node included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(DetailNode::node_count).sum::<usize>()
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        writeln!(
            f,
            "{:indent$}name={} val={}",
            "",
            self.label,
            self.display_value,
            indent = level * 4
        )?;
        for child in &self.children {
            child.write_indented(f, level + 1)?;
        }
        Ok(())
    }
}

/// One line per node, four spaces of indent per level.
impl fmt::Display for DetailNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Parse the detail markup returned for frame `number`.
///
/// The document must hold exactly one `<packet>`. A root with no packet at
/// all means the frame filter matched nothing.
pub fn parse_detail(markup: &[u8], number: u32) -> Result<DetailNode, FetchError> {
    let mut xml = MarkupReader::new(markup);

    if !xml.next_start_element()? {
        return Err(FetchError::SchemaViolation(format!("missing <{DETAIL_ROOT}>")));
    }
    if xml.name() != DETAIL_ROOT {
        return Err(FetchError::SchemaViolation(format!(
            "expected <{DETAIL_ROOT}>, found <{}>",
            xml.name()
        )));
    }
    if !xml.next_start_element()? {
        return Err(FetchError::UnknownPacket(number));
    }
    if xml.name() != "packet" {
        return Err(FetchError::SchemaViolation(format!(
            "expected <packet>, found <{}>",
            xml.name()
        )));
    }

    let tree = read_children(&mut xml, DetailNode::root())?;

    if xml.next_start_element()? {
        return Err(FetchError::SchemaViolation(format!(
            "unexpected <{}> after the packet",
            xml.name()
        )));
    }
    Ok(tree)
}

/// Append every `<proto>`/`<field>` child of the current element to `node`,
/// recursing into each.
fn read_children(xml: &mut MarkupReader<'_>, mut node: DetailNode) -> Result<DetailNode, FetchError> {
    while xml.next_start_element()? {
        let name = xml.name();
        if name != "proto" && name != "field" {
            return Err(FetchError::SchemaViolation(format!(
                "unexpected <{name}> inside the packet tree"
            )));
        }

        let label = xml.attribute("name")?.unwrap_or_default();
        let display_value = match xml.attribute("showname")? {
            Some(showname) => showname,
            None => xml.attribute("show")?.unwrap_or_default(),
        };
        let child = read_children(xml, DetailNode::new(label, display_value))?;
        node.children.push(child);
    }
    Ok(node)
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("no capture is loaded")]
    NoCapture,

    #[error("capture tool failed: {0}")]
    ProcessFailed(#[from] ToolError),

    #[error("detail schema violation: {0}")]
    SchemaViolation(String),

    #[error("packet {0} is not in the capture")]
    UnknownPacket(u32),

    #[error("unreadable detail markup: {0}")]
    Markup(#[from] MarkupError),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
