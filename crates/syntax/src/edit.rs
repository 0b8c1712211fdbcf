use serde::{Deserialize, Serialize};

use crate::node::Node;

/// In-place rewriting capability for one visited call site.
///
/// The host's tree walker hands an editor bound to the node being visited;
/// the compiler never reaches into traversal state on its own.
pub trait NodeEditor {
    /// Replace the visited node with a single expression.
    fn replace(&mut self, replacement: Node);

    /// Replace the visited node with several sibling nodes (statement
    /// positions only).
    fn replace_many(&mut self, replacements: Vec<Node>);
}

/// Line/column of a call site inside its compilation unit (1-based).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Editor over one slot of a flat node list, e.g. the statements of a block.
///
/// `replace_many` splices the replacements in at the slot's position, so a
/// host iterating the list must re-read its length afterwards. The slot then
/// spans all replacement nodes; after an empty `replace_many` it is empty and
/// a later `replace` inserts at the same position.
#[derive(Debug)]
pub struct SlotEditor<'a> {
    nodes: &'a mut Vec<Node>,
    index: usize,
    width: usize,
}

impl<'a> SlotEditor<'a> {
    /// Returns `None` when `index` is out of bounds.
    pub fn new(nodes: &'a mut Vec<Node>, index: usize) -> Option<Self> {
        (index < nodes.len()).then_some(Self {
            nodes,
            index,
            width: 1,
        })
    }

    /// First node of the slot, `None` once the slot has been emptied.
    pub fn current(&self) -> Option<&Node> {
        if self.width == 0 {
            return None;
        }
        self.nodes.get(self.index)
    }
}

impl NodeEditor for SlotEditor<'_> {
    fn replace(&mut self, replacement: Node) {
        self.replace_many(vec![replacement]);
    }

    fn replace_many(&mut self, replacements: Vec<Node>) {
        let width = replacements.len();
        self.nodes.splice(self.index..self.index + self.width, replacements);
        self.width = width;
    }
}
