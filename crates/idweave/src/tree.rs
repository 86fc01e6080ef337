//! Renderer-agnostic component trees.
//!
//! [`ComponentNode`] models just enough of a declarative UI tree to drive
//! the whole pipeline: each node is decorated at the context path built by
//! its ancestors, and a node's `scope` only applies to its descendants.
//! Siblings never see each other's segments because the path is threaded
//! explicitly through the walk.

use serde::{Deserialize, Serialize};

use crate::context::{self, ContextPath};
use crate::decorate::{
    ConformanceCollaborator, Decorated, DecorationOptions, DecorationState, Describable, Decorator,
};

/// One node of a component tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentNode {
    /// Element kind such as `Button` or `Stack`
    pub kind: String,
    /// Explicit name of this node
    pub name: Option<String>,
    /// Visible text
    pub text: Option<String>,
    /// Accessibility label override
    pub accessibility_label: Option<String>,
    /// Segment pushed for the children
    pub scope: Option<String>,
    /// Screen root for the children
    pub screen: Option<String>,
    /// Opt out of decoration
    pub skip: bool,
    /// Identifier assigned by hand
    pub manual_identifier: Option<String>,
    /// Child nodes, in order
    pub children: Vec<ComponentNode>,
}

impl ComponentNode {
    /// A node of kind `kind`
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Set the explicit name.
    ///
    /// The name identifies this node only. Use [`scope`](Self::scope) to add
    /// a path segment for the node's descendants.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the visible text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the accessibility label
    #[must_use]
    pub fn accessibility_label(mut self, label: impl Into<String>) -> Self {
        self.accessibility_label = Some(label.into());
        self
    }

    /// Push `segment` for every descendant.
    ///
    /// This is the tree form of [`push_named`](crate::context::push_named):
    /// the segment lives for the subtree under this node and is not part of
    /// the node's own identifier.
    #[must_use]
    pub fn scope(mut self, segment: impl Into<String>) -> Self {
        self.scope = Some(segment.into());
        self
    }

    /// Start a fresh path at `name` for every descendant
    #[must_use]
    pub fn screen(mut self, name: impl Into<String>) -> Self {
        self.screen = Some(name.into());
        self
    }

    /// Opt out of decoration
    #[must_use]
    pub const fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Assign the identifier by hand
    #[must_use]
    pub fn manual_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.manual_identifier = Some(identifier.into());
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// Path seen by this node's children
    #[must_use]
    pub fn child_path(&self, path: &ContextPath) -> ContextPath {
        let base = self
            .screen
            .as_deref()
            .map_or_else(|| path.clone(), ContextPath::screen);
        self.scope
            .as_deref()
            .map_or_else(|| base.clone(), |segment| base.child(segment))
    }

    fn shallow(&self) -> Self {
        Self {
            children: Vec::new(),
            ..self.clone()
        }
    }
}

impl Describable for ComponentNode {
    fn explicit_name(&self) -> Option<String> {
        self.name.clone()
    }

    fn element_type(&self) -> Option<String> {
        Some(self.kind.clone()).filter(|kind| !kind.trim().is_empty())
    }

    fn text_content(&self) -> Option<String> {
        self.text.clone()
    }

    fn accessibility_label(&self) -> Option<String> {
        self.accessibility_label.clone()
    }

    fn skips_decoration(&self) -> bool {
        self.skip
    }

    fn manual_identifier(&self) -> Option<String> {
        self.manual_identifier.clone()
    }
}

/// Decoration result for one node and its subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedNode {
    /// Element kind of the source node
    pub kind: String,
    /// Attached identifier
    pub identifier: Option<String>,
    /// Attached accessibility label
    pub label: Option<String>,
    /// State reached for this node
    pub state: DecorationState,
    /// Structural adjustments from conformance
    pub adjustments: Vec<String>,
    /// Decorated children, in order
    pub children: Vec<DecoratedNode>,
}

impl DecoratedNode {
    fn from_decorated(decorated: &Decorated<ComponentNode>, children: Vec<Self>) -> Self {
        Self {
            kind: decorated.inner().kind.clone(),
            identifier: decorated.identifier().map(str::to_string),
            label: decorated.label().map(str::to_string),
            state: decorated.state(),
            adjustments: decorated.adjustments().to_vec(),
            children,
        }
    }

    /// Depth-first search for a node carrying `identifier`
    #[must_use]
    pub fn find_by_identifier(&self, identifier: &str) -> Option<&Self> {
        if self.identifier.as_deref() == Some(identifier) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_by_identifier(identifier))
    }

    /// Every attached identifier, in depth-first order
    #[must_use]
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(identifier) = &self.identifier {
            out.push(identifier);
        }
        for child in &self.children {
            child.collect_identifiers(out);
        }
    }

    /// Number of nodes in this subtree
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Self::len).sum::<usize>()
    }

    /// Always false; a decorated tree has at least its root
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl Decorator {
    /// Basic-decorate every node of `root`, starting at the ambient path
    #[must_use]
    pub fn decorate_tree(&self, root: &ComponentNode) -> DecoratedNode {
        self.walk(root, &context::current_path(), &|node: ComponentNode, path: &ContextPath| {
            self.basic_at(node, &DecorationOptions::new(), path)
        })
    }

    /// Full-decorate every node of `root`, starting at the ambient path
    #[must_use]
    pub fn decorate_tree_full<K>(&self, root: &ComponentNode, conformance: &K) -> DecoratedNode
    where
        K: ConformanceCollaborator<ComponentNode> + ?Sized,
    {
        self.walk(root, &context::current_path(), &|node: ComponentNode, path: &ContextPath| {
            self.full_at(node, &DecorationOptions::new(), conformance, path)
        })
    }

    fn walk(
        &self,
        node: &ComponentNode,
        path: &ContextPath,
        decorate: &dyn Fn(ComponentNode, &ContextPath) -> Decorated<ComponentNode>,
    ) -> DecoratedNode {
        let decorated = decorate(node.shallow(), path);
        let child_path = node.child_path(path);
        let children = node
            .children
            .iter()
            .map(|child| self.walk(child, &child_path, decorate))
            .collect();
        DecoratedNode::from_decorated(&decorated, children)
    }
}
