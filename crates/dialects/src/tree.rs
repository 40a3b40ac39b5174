//! Parse tree produced by a successful match.
//!
//! Parts live in an arena owned by [`ParseTree`] and refer to each other by
//! [`PartId`]. Ownership is strictly parent-to-children through the child id
//! lists; the parent link is a plain index and never keeps anything alive.
//!
//! Parts are appended speculatively while rules are attempted. When an attempt
//! fails the engine truncates the arena back to its snapshot, so only parts of
//! successful matches survive.

use facet::Facet;
use std::ops::Range;

/// Index of a [`Part`] inside a [`ParseTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(usize);

impl PartId {
    /// Position of the part in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node of the parse tree: one matched rule occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    name: String,
    start: usize,
    end: usize,
    ignore: bool,
    parent: Option<PartId>,
    value: Option<String>,
    children: Vec<PartId>,
}

impl Part {
    /// Name of the rule this part matched.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte range of the input consumed by this part.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether the rule is marked `ignore`.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    /// Terminal value; `None` for non-terminals.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Enclosing non-terminal, if any.
    #[must_use]
    pub fn parent(&self) -> Option<PartId> {
        self.parent
    }

    /// Visible children in match order; empty for terminals.
    #[must_use]
    pub fn children(&self) -> &[PartId] {
        &self.children
    }
}

/// Arena of parts with an optional root.
#[derive(Debug, Clone, Default)]
pub struct ParseTree {
    parts: Vec<Part>,
    root: Option<PartId>,
}

impl ParseTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.parts.len()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.parts.truncate(len);
    }

    /// Appends a non-terminal whose span end and children are filled in later.
    pub(crate) fn reserve(
        &mut self,
        name: &str,
        start: usize,
        ignore: bool,
        parent: Option<PartId>,
    ) -> PartId {
        self.push(Part {
            name: name.to_string(),
            start,
            end: start,
            ignore,
            parent,
            value: None,
            children: Vec::new(),
        })
    }

    pub(crate) fn push_terminal(
        &mut self,
        name: &str,
        span: Range<usize>,
        ignore: bool,
        parent: Option<PartId>,
        value: String,
    ) -> PartId {
        self.push(Part {
            name: name.to_string(),
            start: span.start,
            end: span.end,
            ignore,
            parent,
            value: Some(value),
            children: Vec::new(),
        })
    }

    pub(crate) fn complete(&mut self, id: PartId, end: usize, children: Vec<PartId>) {
        let part = &mut self.parts[id.0];
        part.end = end;
        part.children = children;
    }

    pub(crate) fn set_root(&mut self, id: PartId) {
        self.root = Some(id);
    }

    fn push(&mut self, part: Part) -> PartId {
        let id = PartId(self.parts.len());
        self.parts.push(part);
        id
    }

    /// Returns the part stored under `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    #[must_use]
    pub fn part(&self, id: PartId) -> &Part {
        &self.parts[id.0]
    }

    /// Borrowed view of the part stored under `id`.
    #[must_use]
    pub fn get(&self, id: PartId) -> PartRef<'_> {
        PartRef { tree: self, id }
    }

    /// The root part, present once the root rule has matched.
    #[must_use]
    pub fn root(&self) -> Option<PartRef<'_>> {
        self.root.map(|id| self.get(id))
    }

    /// Serializes the visible tree below the root as JSON.
    ///
    /// Ignored parts and speculative leftovers are not included. Returns
    /// `None` if the tree has no root.
    #[must_use]
    pub fn to_json(&self) -> Option<String> {
        self.root()
            .map(|root| facet_json::to_string(&PartNode::from(root)))
    }
}

/// A borrowed handle on one part together with its tree.
///
/// This is what semantic-action handlers receive.
#[derive(Debug, Clone, Copy)]
pub struct PartRef<'t> {
    tree: &'t ParseTree,
    id: PartId,
}

impl<'t> PartRef<'t> {
    /// Arena id of this part.
    #[must_use]
    pub fn id(self) -> PartId {
        self.id
    }

    fn part(self) -> &'t Part {
        self.tree.part(self.id)
    }

    /// Name of the rule this part matched.
    #[must_use]
    pub fn name(self) -> &'t str {
        &self.part().name
    }

    /// Byte range consumed from the input.
    #[must_use]
    pub fn span(self) -> Range<usize> {
        self.part().span()
    }

    /// Whether the rule is marked `ignore`.
    #[must_use]
    pub fn is_ignored(self) -> bool {
        self.part().ignore
    }

    /// Terminal value; `None` for non-terminals.
    #[must_use]
    pub fn value(self) -> Option<&'t str> {
        self.part().value()
    }

    /// Slice of `input` covered by this part.
    ///
    /// # Panics
    ///
    /// Panics if `input` is not the text this tree was parsed from and the
    /// span falls outside it or off a character boundary.
    #[must_use]
    pub fn text(self, input: &str) -> &str {
        &input[self.span()]
    }

    /// Enclosing non-terminal, if any.
    #[must_use]
    pub fn parent(self) -> Option<PartRef<'t>> {
        self.part().parent.map(|id| self.tree.get(id))
    }

    /// Visible children in match order.
    pub fn children(self) -> impl Iterator<Item = PartRef<'t>> {
        let tree = self.tree;
        self.part().children.iter().map(move |&id| tree.get(id))
    }

    /// First visible child matching rule `name`.
    #[must_use]
    pub fn child(self, name: &str) -> Option<PartRef<'t>> {
        self.children().find(|child| child.name() == name)
    }

    /// Values of all terminal parts below this one, in input order.
    #[must_use]
    pub fn values(self) -> Vec<&'t str> {
        let mut out = Vec::new();
        self.collect_values(&mut out);
        out
    }

    fn collect_values(self, out: &mut Vec<&'t str>) {
        match self.value() {
            Some(value) => out.push(value),
            None => self.children().for_each(|child| child.collect_values(out)),
        }
    }
}

/// Owned, serializable copy of a visible subtree.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct PartNode {
    /// Rule name.
    pub name: String,

    /// Start byte offset.
    pub start: usize,

    /// End byte offset, exclusive.
    pub end: usize,

    /// Terminal value.
    pub value: Option<String>,

    /// Visible children.
    pub children: Vec<PartNode>,
}

impl From<PartRef<'_>> for PartNode {
    fn from(part: PartRef<'_>) -> Self {
        let span = part.span();
        Self {
            name: part.name().to_string(),
            start: span.start,
            end: span.end,
            value: part.value().map(str::to_string),
            children: part.children().map(PartNode::from).collect(),
        }
    }
}
