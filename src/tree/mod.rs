//! Arena-backed XML document model.
//!
//! A [`Document`] owns every node in a flat arena and links them by
//! [`NodeId`] indices (parent and ordered children), so subtrees can be
//! cloned, detached and re-inserted without shared ownership. Each node
//! carries an explicit [`NodeKind`] assigned from its position and shape
//! at parse time and maintained by the mutation primitives.
//!
//! Parsing lives in [`parse`], pretty serialization in [`write`].

pub mod parse;
pub mod write;

pub use parse::ParseError;

/// Handle to a node inside one [`Document`].
///
/// Handles stay valid for the lifetime of the document that issued them;
/// a detached node keeps its handle but is no longer reachable from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Structural role of a node in a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The document element (`configuration`).
    Root,
    /// A named group directly under the root.
    Section,
    /// A leaf holding a text value.
    ScalarKey,
    /// A container of repeated rows or nested keys.
    Table,
    /// A repeated table element: a flat attribute map without element children.
    Row,
    /// Ignored by every traversal that enumerates keys or elements.
    Comment,
}

#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    kind: NodeKind,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn element(name: &str, attributes: Vec<(String, String)>, text: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            kind: NodeKind::ScalarKey,
            attributes,
            text,
            parent: None,
            children: Vec::new(),
        }
    }

    fn comment(text: &str) -> Self {
        Self {
            name: String::new(),
            kind: NodeKind::Comment,
            attributes: Vec::new(),
            text: Some(text.to_string()),
            parent: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.kind == NodeKind::Comment
    }

    /// Attributes in document order.
    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Owned element subtree, detached from any document.
///
/// Used to hand elements across documents (e.g. into [`Document::insert_fragment`])
/// and to compare trees structurally. Comments are not part of a fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    encoding: Option<String>,
}

impl Document {
    /// Nodes held by the arena, detached ones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Create a document holding a single root element.
    pub fn new(root_name: &str) -> Self {
        let mut root = Node::element(root_name, Vec::new(), None);
        root.kind = NodeKind::Root;
        Self {
            nodes: vec![root],
            root: NodeId(0),
            encoding: None,
        }
    }

    /// Parse a document from XML text.
    pub fn parse(xml: &str) -> Result<Self, ParseError> {
        parse::parse_document(xml)
    }

    /// Serialize with two-space indentation and an XML declaration.
    pub fn to_xml_string(&self) -> std::io::Result<String> {
        write::to_xml_string(self)
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Encoding declared in the XML declaration, if any.
    #[must_use]
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    pub(crate) fn set_encoding(&mut self, encoding: Option<String>) {
        self.encoding = encoding;
    }

    /// # Panics
    ///
    /// Panics if `id` was issued by another document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).attribute(name)
    }

    /// All children, comments included.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Element children only.
    #[must_use]
    pub fn elements(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(|c| !self.node(*c).is_comment())
            .collect()
    }

    /// `id` and every descendant element, in document order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.node(current).is_comment() {
                continue;
            }
            out.push(current);
            stack.extend(self.node(current).children.iter().rev().copied());
        }
        out
    }

    /// Whether `id` is still reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.node(current).parent {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    /// Number of ancestors between `id` and the root (root is 0).
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.node(id).parent;
        while let Some(p) = current {
            depth += 1;
            current = self.node(p).parent;
        }
        depth
    }

    pub(crate) fn set_text(&mut self, id: NodeId, text: &str) {
        self.node_mut(id).text = Some(text.to_string());
    }

    /// Overwrite or append an attribute.
    pub(crate) fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let node = self.node_mut(id);
        if let Some(slot) = node.attributes.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_string();
        } else {
            node.attributes.push((name.to_string(), value.to_string()));
        }
    }

    /// Allocate a detached element node.
    pub(crate) fn new_element(
        &mut self,
        name: &str,
        attributes: Vec<(String, String)>,
        text: Option<String>,
    ) -> NodeId {
        self.nodes.push(Node::element(name, attributes, text));
        NodeId(self.nodes.len() - 1)
    }

    pub(crate) fn new_comment(&mut self, text: &str) -> NodeId {
        self.nodes.push(Node::comment(text));
        NodeId(self.nodes.len() - 1)
    }

    /// Deep-copy a subtree into a new detached subtree of the same arena.
    pub(crate) fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let source = self.node(id).clone();
        let children = source.children.clone();
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            ..source
        });
        let copy = NodeId(self.nodes.len() - 1);
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.node_mut(child_copy).parent = Some(copy);
            self.node_mut(copy).children.push(child_copy);
        }
        copy
    }

    /// Insert a detached node among `parent`'s children at `position`
    /// (clamped to the child count). A leaf receiving an element becomes a table.
    pub(crate) fn insert_child(&mut self, parent: NodeId, position: usize, child: NodeId) {
        let position = position.min(self.node(parent).children.len());
        self.node_mut(parent).children.insert(position, child);
        self.node_mut(child).parent = Some(parent);
        if !self.node(child).is_comment()
            && matches!(self.node(parent).kind, NodeKind::ScalarKey | NodeKind::Row)
        {
            self.node_mut(parent).kind = NodeKind::Table;
        }
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let end = self.node(parent).children.len();
        self.insert_child(parent, end, child);
    }

    /// Insert a detached node right after `sibling`.
    pub(crate) fn insert_after(&mut self, sibling: NodeId, node: NodeId) {
        if let Some(parent) = self.node(sibling).parent {
            let position = self
                .node(parent)
                .children
                .iter()
                .position(|c| *c == sibling)
                .map_or(usize::MAX, |p| p + 1);
            self.insert_child(parent, position, node);
        }
    }

    /// Unlink a node from its parent. The node and its subtree stay in the
    /// arena until the document is parsed again, so repeated add/remove
    /// cycles grow [`node_count`](Self::node_count) until the next reload.
    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|c| *c != id);
        }
    }

    /// Copy a subtree out of the document.
    #[must_use]
    pub fn to_fragment(&self, id: NodeId) -> XmlElement {
        let node = self.node(id);
        XmlElement {
            name: node.name.clone(),
            attributes: node.attributes.clone(),
            text: node.text.clone(),
            children: self
                .elements(id)
                .into_iter()
                .map(|c| self.to_fragment(c))
                .collect(),
        }
    }

    /// Materialise a fragment under `parent` at `position` and classify it.
    pub(crate) fn insert_fragment(
        &mut self,
        parent: NodeId,
        position: usize,
        fragment: &XmlElement,
    ) -> NodeId {
        let id = self.build_fragment(fragment);
        self.insert_child(parent, position, id);
        self.classify(id);
        id
    }

    fn build_fragment(&mut self, fragment: &XmlElement) -> NodeId {
        let id = self.new_element(
            &fragment.name,
            fragment.attributes.clone(),
            fragment.text.clone(),
        );
        for child in &fragment.children {
            let child_id = self.build_fragment(child);
            self.node_mut(child_id).parent = Some(id);
            self.node_mut(id).children.push(child_id);
        }
        id
    }

    /// Assign node kinds to `id` and its subtree from structure and depth.
    pub(crate) fn classify(&mut self, id: NodeId) {
        for child in self.node(id).children.clone() {
            self.classify(child);
        }
        if self.node(id).is_comment() {
            return;
        }
        let kind = if id == self.root {
            NodeKind::Root
        } else if self.depth(id) == 1 {
            NodeKind::Section
        } else if self
            .node(id)
            .children
            .iter()
            .any(|c| !self.node(*c).is_comment())
        {
            NodeKind::Table
        } else if !self.node(id).attributes.is_empty()
            && self.node(id).text.as_deref().map_or(true, str::is_empty)
        {
            NodeKind::Row
        } else {
            NodeKind::ScalarKey
        };
        self.node_mut(id).kind = kind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<configuration component="sat">
  <!-- global settings -->
  <global>
    <delay>250</delay>
    <carriers>
      <!-- first carrier -->
      <carrier id="0" type="ctrl"/>
      <carrier id="1" type="data"/>
    </carriers>
  </global>
  <forward_band>
    <spot id="1" gw="0">
      <bandwidth>50</bandwidth>
    </spot>
  </forward_band>
</configuration>
"#;

    fn find(doc: &Document, name: &str) -> NodeId {
        doc.descendants(doc.root())
            .into_iter()
            .find(|id| doc.name(*id) == name)
            .unwrap()
    }

    #[test]
    fn kinds_are_assigned_from_structure() {
        let doc = Document::parse(SAMPLE).unwrap();
        assert_eq!(doc.kind(doc.root()), NodeKind::Root);
        assert_eq!(doc.kind(find(&doc, "global")), NodeKind::Section);
        assert_eq!(doc.kind(find(&doc, "delay")), NodeKind::ScalarKey);
        assert_eq!(doc.kind(find(&doc, "carriers")), NodeKind::Table);
        assert_eq!(doc.kind(find(&doc, "carrier")), NodeKind::Row);
        assert_eq!(doc.kind(find(&doc, "spot")), NodeKind::Table);
    }

    #[test]
    fn elements_skip_comments() {
        let doc = Document::parse(SAMPLE).unwrap();
        let carriers = find(&doc, "carriers");
        assert_eq!(doc.children(carriers).len(), 3);
        assert_eq!(doc.elements(carriers).len(), 2);
        assert_eq!(doc.elements(doc.root()).len(), 2);
    }

    #[test]
    fn clone_subtree_is_deep_and_detached() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        let spot = find(&doc, "spot");
        let copy = doc.clone_subtree(spot);
        assert!(!doc.is_attached(copy));
        assert_eq!(doc.to_fragment(copy), doc.to_fragment(spot));

        doc.set_attribute(copy, "id", "2");
        assert_eq!(doc.attribute(spot, "id"), Some("1"));

        doc.insert_after(spot, copy);
        let band = find(&doc, "forward_band");
        assert_eq!(doc.elements(band), vec![spot, copy]);
    }

    #[test]
    fn inserting_under_a_scalar_promotes_it_to_table() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        let delay = find(&doc, "delay");
        let child = doc.new_element("extra", Vec::new(), Some("1".into()));
        doc.append_child(delay, child);
        assert_eq!(doc.kind(delay), NodeKind::Table);
    }

    #[test]
    fn detach_unlinks_from_parent() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        let carriers = find(&doc, "carriers");
        let first = doc.elements(carriers)[0];
        doc.detach(first);
        assert_eq!(doc.elements(carriers).len(), 1);
        assert!(!doc.is_attached(first));
        assert_eq!(doc.kind(carriers), NodeKind::Table);
    }

    #[test]
    fn inserted_fragment_is_classified() {
        let mut doc = Document::parse(SAMPLE).unwrap();
        let global = find(&doc, "global");
        let fragment = XmlElement::new("ports")
            .with_child(XmlElement::new("port").with_attribute("value", "5000"));
        let id = doc.insert_fragment(global, 0, &fragment);
        assert_eq!(doc.kind(id), NodeKind::Table);
        assert_eq!(doc.kind(doc.elements(id)[0]), NodeKind::Row);
        assert_eq!(doc.elements(global)[0], id);
    }
}
