//! DOM Tree structure

use rustc_hash::FxHashMap;
use std::fmt;

use crate::error::{TreeError, TreeResult};
use crate::node::{is_valid_attribute_name, ElementData, Node, NodeId, NodeType};

/// Elements whose content is never rendered as text
const NON_RENDERED: &[&str] = &["script", "style", "template", "head"];

/// DOM tree that owns all nodes
pub struct DomTree {
    /// All live nodes, attached or not
    nodes: FxHashMap<NodeId, Node>,
    /// Next available node ID
    next_id: u32,
    /// Root document node
    document_id: NodeId,
}

impl DomTree {
    /// Create a new empty DOM tree
    pub fn new() -> Self {
        let document_id = NodeId::new(0);
        let document = Node::new(document_id, NodeType::Document);

        let mut nodes = FxHashMap::default();
        nodes.insert(document_id, document);

        Self {
            nodes,
            next_id: 1,
            document_id,
        }
    }

    /// Get the document (root) node ID
    pub fn document_id(&self) -> NodeId {
        self.document_id
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Get a node by ID, failing for released nodes
    pub fn node(&self, id: NodeId) -> TreeResult<&Node> {
        self.get(id).ok_or(TreeError::NodeNotFound(id.0))
    }

    fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut Node> {
        self.get_mut(id).ok_or(TreeError::NodeNotFound(id.0))
    }

    /// Check whether a node is still held by the tree
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn insert(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(id, node_type));
        id
    }

    /// Create a new element node
    pub fn create_element(&mut self, tag_name: impl Into<String>) -> NodeId {
        self.insert(NodeType::Element(ElementData::new(tag_name)))
    }

    /// Create a new text node
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.insert(NodeType::Text(content.into()))
    }

    /// Create a new comment node
    pub fn create_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.insert(NodeType::Comment(content.into()))
    }

    /// Create a DOCTYPE node
    pub fn create_doctype(&mut self, name: impl Into<String>) -> NodeId {
        self.insert(NodeType::Doctype { name: name.into() })
    }

    /// Check whether `ancestor` is `id` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.get(node_id).and_then(|n| n.parent);
        }
        false
    }

    /// Append a child node to a parent, moving it out of its previous parent
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> TreeResult<()> {
        self.node(parent_id)?;
        let old_parent = self.node(child_id)?.parent;

        if self.is_inclusive_ancestor(child_id, parent_id) {
            return Err(TreeError::HierarchyRequest {
                parent: parent_id.0,
                child: child_id.0,
            });
        }

        if let Some(old_parent) = old_parent {
            self.remove_child(old_parent, child_id)?;
        }

        self.node_mut(child_id)?.parent = Some(parent_id);
        self.node_mut(parent_id)?.children.push(child_id);

        log::trace!("appended {} to {}", child_id, parent_id);
        Ok(())
    }

    /// Remove a node from its parent
    pub fn remove_child(&mut self, parent_id: NodeId, child_id: NodeId) -> TreeResult<()> {
        self.node_mut(parent_id)?.children.retain(|id| *id != child_id);
        self.node_mut(child_id)?.parent = None;
        Ok(())
    }

    /// Detach a node from its parent, if it has one
    pub fn detach(&mut self, id: NodeId) -> TreeResult<()> {
        match self.node(id)?.parent {
            Some(parent) => self.remove_child(parent, id),
            None => Ok(()),
        }
    }

    /// Replace all children of `parent_id` with `new_children`.
    ///
    /// The previous children are released together with their subtrees;
    /// returns the ids of every released node.
    pub fn replace_children(&mut self, parent_id: NodeId, new_children: &[NodeId]) -> TreeResult<Vec<NodeId>> {
        let mut released = Vec::new();
        for child in self.children(parent_id) {
            released.extend(self.remove_subtree(child)?);
        }
        for &child in new_children {
            self.append_child(parent_id, child)?;
        }
        Ok(released)
    }

    /// Detach a node and release it and all of its descendants.
    ///
    /// Returns the ids of the released nodes.
    pub fn remove_subtree(&mut self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        if id == self.document_id {
            return Err(TreeError::HierarchyRequest { parent: id.0, child: id.0 });
        }
        self.detach(id)?;

        let mut released = self.descendants(id);
        released.push(id);
        for node_id in &released {
            self.nodes.remove(node_id);
        }

        log::trace!("released {} node(s) rooted at {}", released.len(), id);
        Ok(released)
    }

    /// Get all children of a node
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id)
            .map(|n| n.children.to_vec())
            .unwrap_or_default()
    }

    /// Get the element children of a node, in document order
    pub fn element_children(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        Ok(self
            .node(id)?
            .children
            .iter()
            .copied()
            .filter(|&child| self.get(child).map(Node::is_element).unwrap_or(false))
            .collect())
    }

    /// All descendants of a node in document order.
    ///
    /// Walks with an explicit stack; nesting depth is not bounded by
    /// `append_child`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).into_iter().rev().collect();
        while let Some(node_id) = stack.pop() {
            result.push(node_id);
            if let Some(node) = self.get(node_id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        result
    }

    /// Get an attribute of an element, `None` when it is absent
    pub fn get_attribute(&self, id: NodeId, name: &str) -> TreeResult<Option<String>> {
        let elem = self.node(id)?.as_element().ok_or(TreeError::InvalidNodeType(id.0))?;
        Ok(elem.get_attribute(name).map(str::to_string))
    }

    /// Set an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> TreeResult<()> {
        if !is_valid_attribute_name(name) {
            return Err(TreeError::InvalidCharacter(name.to_string()));
        }
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(TreeError::InvalidNodeType(id.0))?;
        elem.set_attribute(name, value);
        Ok(())
    }

    /// Get the text content of a node and all its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result, false);
        result
    }

    /// Get the rendered text of a node.
    ///
    /// Like [`DomTree::text_content`], but `<br>` becomes a line break and the
    /// content of non-rendered elements is skipped.
    pub fn inner_text(&self, id: NodeId) -> TreeResult<String> {
        self.node(id)?;
        let mut result = String::new();
        self.collect_text(id, &mut result, true);
        Ok(result)
    }

    fn collect_text(&self, id: NodeId, result: &mut String, rendered: bool) {
        let mut stack = vec![id];
        while let Some(node_id) = stack.pop() {
            let Some(node) = self.get(node_id) else {
                continue;
            };
            match &node.node_type {
                NodeType::Text(text) => result.push_str(text),
                NodeType::Comment(_) | NodeType::Doctype { .. } => {}
                NodeType::Element(elem) if rendered && elem.tag_name == "br" => result.push('\n'),
                NodeType::Element(elem)
                    if rendered && NON_RENDERED.contains(&elem.tag_name.as_str()) => {}
                _ => stack.extend(node.children.iter().rev().copied()),
            }
        }
    }

    /// Replace the children of a node with a single text node.
    ///
    /// Empty text leaves the node without children. Returns the ids of the
    /// released nodes.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> TreeResult<Vec<NodeId>> {
        self.node(id)?;
        let new_children = if text.is_empty() {
            Vec::new()
        } else {
            vec![self.create_text(text)]
        };
        self.replace_children(id, &new_children)
    }

    /// Get the number of nodes held by the tree, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (only has document node)
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Pretty print the tree for debugging
    pub fn pretty_print(&self) -> String {
        let mut output = String::new();
        let mut stack = vec![(self.document_id, 0)];

        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            let indent = "  ".repeat(depth);

            match &node.node_type {
                NodeType::Document => {
                    output.push_str("#document\n");
                }
                NodeType::Doctype { name } => {
                    output.push_str(&format!("{}<!DOCTYPE {}>\n", indent, name));
                }
                NodeType::Element(elem) => {
                    let attrs: String = elem
                        .attributes
                        .iter()
                        .map(|(k, v)| format!(" {}=\"{}\"", k, v))
                        .collect();
                    output.push_str(&format!("{}<{}{}>\n", indent, elem.tag_name, attrs));
                }
                NodeType::Text(text) => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        output.push_str(&format!("{}#text: {:?}\n", indent, trimmed));
                    }
                }
                NodeType::Comment(text) => {
                    output.push_str(&format!("{}<!-- {} -->\n", indent, text));
                }
            }

            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }

        output
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DomTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pretty_print())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_with_items(tree: &mut DomTree, count: usize) -> (NodeId, Vec<NodeId>) {
        let ul = tree.create_element("ul");
        tree.append_child(tree.document_id(), ul).unwrap();
        let items = (0..count)
            .map(|_| {
                let li = tree.create_element("li");
                tree.append_child(ul, li).unwrap();
                li
            })
            .collect();
        (ul, items)
    }

    #[test]
    fn test_create_elements() {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let body = tree.create_element("body");
        let text = tree.create_text("Hello, World!");

        tree.append_child(tree.document_id(), html).unwrap();
        tree.append_child(html, body).unwrap();
        tree.append_child(body, text).unwrap();

        assert_eq!(tree.len(), 4); // document + html + body + text
        assert_eq!(tree.text_content(body), "Hello, World!");
    }

    #[test]
    fn test_append_moves_child() {
        let mut tree = DomTree::new();
        let (first, items) = list_with_items(&mut tree, 2);
        let (second, _) = list_with_items(&mut tree, 0);

        tree.append_child(second, items[0]).unwrap();

        assert_eq!(tree.children(first), vec![items[1]]);
        assert_eq!(tree.children(second), vec![items[0]]);
        assert_eq!(tree.get(items[0]).unwrap().parent, Some(second));
    }

    #[test]
    fn test_append_ancestor_is_rejected() {
        let mut tree = DomTree::new();
        let (ul, items) = list_with_items(&mut tree, 1);

        let err = tree.append_child(items[0], ul).unwrap_err();
        assert_eq!(err, TreeError::HierarchyRequest { parent: items[0].0, child: ul.0 });

        let err = tree.append_child(ul, ul).unwrap_err();
        assert!(matches!(err, TreeError::HierarchyRequest { .. }));
    }

    #[test]
    fn test_remove_subtree_releases_nodes() {
        let mut tree = DomTree::new();
        let (ul, items) = list_with_items(&mut tree, 3);

        let released = tree.remove_subtree(ul).unwrap();

        assert_eq!(released.len(), 4);
        assert!(released.contains(&ul));
        assert!(!tree.contains_node(ul));
        assert!(items.iter().all(|id| !tree.contains_node(*id)));
        assert!(tree.children(tree.document_id()).is_empty());
        assert_eq!(tree.inner_text(ul), Err(TreeError::NodeNotFound(ul.0)));
        assert!(tree.remove_subtree(tree.document_id()).is_err());
    }

    #[test]
    fn test_element_children_skip_text() {
        let mut tree = DomTree::new();
        let (ul, items) = list_with_items(&mut tree, 2);
        let text = tree.create_text("\n");
        tree.append_child(ul, text).unwrap();

        assert_eq!(tree.element_children(ul).unwrap(), items);
        assert_eq!(tree.children(ul).len(), 3);
    }

    #[test]
    fn test_inner_text_renders_breaks() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        let a = tree.create_text("one");
        let br = tree.create_element("br");
        let b = tree.create_text("two");
        let script = tree.create_element("script");
        let code = tree.create_text("var x;");
        for child in [a, br, b, script] {
            tree.append_child(p, child).unwrap();
        }
        tree.append_child(script, code).unwrap();

        assert_eq!(tree.inner_text(p).unwrap(), "one\ntwo");
        assert_eq!(tree.text_content(p), "onetwovar x;");
    }

    #[test]
    fn test_set_text_content_replaces_children() {
        let mut tree = DomTree::new();
        let (ul, items) = list_with_items(&mut tree, 2);

        let released = tree.set_text_content(ul, "plain").unwrap();
        assert_eq!(released, items);
        assert_eq!(tree.text_content(ul), "plain");
        assert!(!tree.contains_node(items[0]));
        assert_eq!(tree.children(ul).len(), 1);

        tree.set_text_content(ul, "").unwrap();
        assert!(tree.children(ul).is_empty());
    }

    #[test]
    fn test_set_attribute_validates_name() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let text = tree.create_text("x");

        tree.set_attribute(div, "data-id", "42").unwrap();
        assert_eq!(tree.get_attribute(div, "data-id").unwrap().as_deref(), Some("42"));
        assert_eq!(tree.get_attribute(div, "missing").unwrap(), None);
        assert_eq!(
            tree.set_attribute(div, "bad name", "x"),
            Err(TreeError::InvalidCharacter("bad name".to_string()))
        );
        assert_eq!(tree.set_attribute(text, "id", "x"), Err(TreeError::InvalidNodeType(text.0)));
    }

    #[test]
    fn test_pretty_print_order() {
        let mut tree = DomTree::new();
        let (ul, items) = list_with_items(&mut tree, 2);
        tree.set_attribute(ul, "id", "menu").unwrap();
        let text = tree.create_text(" first ");
        tree.append_child(items[0], text).unwrap();

        assert_eq!(
            tree.pretty_print(),
            "#document\n  <ul id=\"menu\">\n    <li>\n      #text: \"first\"\n    <li>\n"
        );
    }

    #[test]
    fn test_deep_nesting_walks() {
        const DEPTH: usize = 200_000;
        let mut tree = DomTree::new();

        // Built from the leaf up so each append checks a detached parent
        let mut top = tree.create_text("deep");
        for _ in 0..DEPTH {
            let span = tree.create_element("span");
            tree.append_child(span, top).unwrap();
            top = span;
        }
        let div = tree.create_element("div");
        tree.append_child(tree.document_id(), div).unwrap();
        tree.append_child(div, top).unwrap();

        assert_eq!(tree.inner_text(div).unwrap(), "deep");
        assert_eq!(tree.text_content(div), "deep");
        assert_eq!(tree.descendants(div).len(), DEPTH + 1);

        let released = tree.set_text_content(div, "").unwrap();
        assert_eq!(released.len(), DEPTH + 1);
        assert_eq!(tree.len(), 2);
    }
}
