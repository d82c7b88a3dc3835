//! Token tree produced by a scan.
//!
//! The tree is an arena: the [`TokenTree`] owns every node in a `Vec`, children
//! are listed by [`NodeId`] and the parent link is a plain index. Nothing is
//! reference counted, so dropping the tree drops everything at once.
//!
//! ```text
//! nodes: [ root, selector, selector_element, path, path_literal, ... ]
//!            ^0     ^1 parent=0  ^2 parent=1   ^3 parent=2
//! ```
//!
//! Tokens hidden from the tree (`Suppress::FROM_TREE`) still live in the arena
//! with a parent link, but are absent from their parent's `children`.

use std::fmt;

use crate::engine::ContextId;

/// Index of a node inside its [`TokenTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Byte range of the text a token consumed. Empty for lookahead tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Start byte index (inclusive).
    pub start: usize,
    /// End byte index (exclusive).
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone)]
struct Node {
    rule_name: &'static str,
    /// Name of the context active when the node was created.
    context: &'static str,
    /// Context the node's children are scanned in. Set by `enter`; until then
    /// it is the context the node was created in.
    entry: ContextId,
    captured: String,
    accumulated: String,
    span: Span,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    depth: usize,
    visible: bool,
}

/// The scan result: a rooted tree of tokens.
#[derive(Debug, Clone)]
pub struct TokenTree {
    nodes: Vec<Node>,
}

impl TokenTree {
    /// A tree holding only the root, whose children are scanned with `entry`.
    pub(crate) fn with_root(context: &'static str, entry: ContextId) -> Self {
        let root = Node {
            rule_name: "root",
            context,
            entry,
            captured: String::new(),
            accumulated: String::new(),
            span: Span { start: 0, end: 0 },
            parent: None,
            children: Vec::new(),
            depth: 0,
            visible: true,
        };
        TokenTree { nodes: vec![root] }
    }

    /// Create a node under `parent` and propagate its captured text to every
    /// ancestor, parent first.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn push(
        &mut self,
        parent: NodeId,
        rule_name: &'static str,
        context: &'static str,
        created_in: ContextId,
        captured: &str,
        span: Span,
        visible: bool,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(Node {
            rule_name,
            context,
            entry: created_in,
            captured: captured.to_string(),
            accumulated: captured.to_string(),
            span,
            parent: Some(parent),
            children: Vec::new(),
            depth,
            visible,
        });

        if visible {
            self.nodes[parent.0].children.push(id);
        }

        if !captured.is_empty() {
            let mut cursor = Some(parent);
            while let Some(ancestor) = cursor {
                let node = &mut self.nodes[ancestor.0];
                node.accumulated.push_str(captured);
                cursor = node.parent;
            }
        }

        id
    }

    /// `id` opens a level whose children are scanned with `context`.
    pub(crate) fn enter(&mut self, id: NodeId, context: ContextId) {
        self.nodes[id.0].entry = context;
    }

    pub(crate) fn entry(&self, id: NodeId) -> ContextId {
        self.nodes[id.0].entry
    }

    pub(crate) fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub(crate) fn depth_of(&self, id: NodeId) -> usize {
        self.nodes[id.0].depth
    }

    pub fn root(&self) -> Token<'_> {
        Token { tree: self, id: NodeId::ROOT }
    }

    /// Look up any node, including those hidden from the tree.
    pub fn get(&self, id: NodeId) -> Option<Token<'_>> {
        (id.0 < self.nodes.len()).then_some(Token { tree: self, id })
    }

    /// Visible tokens in document order (pre-order), starting with the root.
    pub fn iter(&self) -> impl Iterator<Item = Token<'_>> + '_ {
        let mut stack = vec![NodeId::ROOT];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
            Some(Token { tree: self, id })
        })
    }

    /// Every node in scan order, hidden ones included.
    pub fn all(&self) -> impl Iterator<Item = Token<'_>> + '_ {
        (0..self.nodes.len()).map(move |index| Token { tree: self, id: NodeId(index) })
    }

    /// Number of scanned nodes, hidden ones and the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, id: NodeId, indent: usize) -> fmt::Result {
        let node = &self.nodes[id.0];
        writeln!(f, "{:indent$}({}) => '{}'", "", node.rule_name, node.accumulated, indent = indent)?;
        for &child in &node.children {
            self.render(f, child, indent + 4)?;
        }
        Ok(())
    }
}

impl fmt::Display for TokenTree {
    /// One line per visible token, `(rule) => 'accumulated text'`, indented by
    /// four spaces per level.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, NodeId::ROOT, 0)
    }
}

/// Borrowed view of one node of a [`TokenTree`].
#[derive(Debug, Clone, Copy)]
pub struct Token<'t> {
    tree: &'t TokenTree,
    id: NodeId,
}

impl<'t> Token<'t> {
    fn node(&self) -> &'t Node {
        &self.tree.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Name of the rule that produced the token, or `root`.
    pub fn rule_name(&self) -> &'static str {
        self.node().rule_name
    }

    /// Text this token consumed itself. Empty for lookahead tokens.
    pub fn captured_text(&self) -> &'t str {
        &self.node().captured
    }

    /// Own captured text followed by everything captured below it, hidden
    /// tokens included, in document order.
    pub fn accumulated_text(&self) -> &'t str {
        &self.node().accumulated
    }

    pub fn span(&self) -> Span {
        self.node().span
    }

    /// Context active when this token was created (the start context for the
    /// root).
    pub fn context(&self) -> &'static str {
        self.node().context
    }

    /// Distance from the root.
    pub fn depth(&self) -> usize {
        self.node().depth
    }

    pub fn is_root(&self) -> bool {
        self.id == NodeId::ROOT
    }

    pub fn is_visible(&self) -> bool {
        self.node().visible
    }

    pub fn parent(&self) -> Option<Token<'t>> {
        self.node().parent.map(|id| Token { tree: self.tree, id })
    }

    /// Visible children in document order.
    pub fn children(&self) -> impl Iterator<Item = Token<'t>> + 't {
        let tree = self.tree;
        self.node().children.iter().map(move |&id| Token { tree, id })
    }

    /// Child count, visible children only.
    pub fn child_count(&self) -> usize {
        self.node().children.len()
    }
}
