//! Tree builder
//!
//! Constructs DOM nodes from markup tokens.

use elemental_dom::{DomTree, NodeId, NodeType};

use crate::error::{HtmlError, HtmlResult};
use crate::tokenizer::{Token, Tokenizer};

/// Default limit on element nesting
const DEFAULT_MAX_DEPTH: usize = 512;

/// Markup parser that builds nodes into a [`DomTree`]
#[derive(Debug, Clone)]
pub struct HtmlParser {
    max_depth: usize,
}

impl HtmlParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit how deeply elements may nest
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse a whole document into a fresh tree
    pub fn parse_document(&self, html: &str) -> HtmlResult<DomTree> {
        let mut tree = DomTree::new();
        let document = tree.document_id();
        for root in self.parse_fragment(&mut tree, html)? {
            tree.append_child(document, root)
                .map_err(|e| HtmlError::ParseError(e.to_string()))?;
        }
        Ok(tree)
    }

    /// Parse a fragment into `tree`, returning the detached top-level nodes.
    ///
    /// Nothing is left behind in the tree when parsing fails.
    pub fn parse_fragment(&self, tree: &mut DomTree, html: &str) -> HtmlResult<Vec<NodeId>> {
        let mut builder = TreeBuilder {
            tree,
            open_elements: Vec::new(),
            roots: Vec::new(),
            max_depth: self.max_depth,
        };

        match builder.run(html) {
            Ok(()) => Ok(builder.roots),
            Err(err) => {
                for root in builder.roots {
                    builder.tree.remove_subtree(root).ok();
                }
                log::debug!("discarded partially parsed fragment: {}", err);
                Err(err)
            }
        }
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

struct TreeBuilder<'t> {
    tree: &'t mut DomTree,
    /// Stack of open elements
    open_elements: Vec<NodeId>,
    /// Top-level nodes of the fragment
    roots: Vec<NodeId>,
    max_depth: usize,
}

impl TreeBuilder<'_> {
    fn run(&mut self, html: &str) -> HtmlResult<()> {
        let mut tokenizer = Tokenizer::new(html);
        loop {
            match tokenizer.next_token()? {
                Token::Eof => return Ok(()),
                token => self.process_token(token)?,
            }
        }
    }

    /// Process a single token
    fn process_token(&mut self, token: Token) -> HtmlResult<()> {
        match token {
            Token::Doctype { name } => {
                let doctype = self.tree.create_doctype(name);
                self.insert(doctype)?;
            }

            Token::StartTag { name, attributes, self_closing } => {
                let element_id = self.tree.create_element(&name);
                if let Some(elem) = self.tree.get_mut(element_id).and_then(|n| n.as_element_mut()) {
                    elem.attributes = attributes;
                }
                self.insert(element_id)?;

                if !self_closing && !is_void_element(&name) {
                    if self.open_elements.len() >= self.max_depth {
                        return Err(HtmlError::ParseError(format!(
                            "elements nested deeper than {} levels",
                            self.max_depth
                        )));
                    }
                    self.open_elements.push(element_id);
                }
            }

            Token::EndTag { name } => self.handle_end_tag(&name),

            Token::Text(text) => self.handle_text(text)?,

            Token::Comment(text) => {
                let comment = self.tree.create_comment(text);
                self.insert(comment)?;
            }

            Token::Eof => {}
        }
        Ok(())
    }

    /// Attach a node to the current open element, or make it a root
    fn insert(&mut self, id: NodeId) -> HtmlResult<()> {
        match self.open_elements.last() {
            Some(&parent) => self
                .tree
                .append_child(parent, id)
                .map_err(|e| HtmlError::ParseError(e.to_string())),
            None => {
                self.roots.push(id);
                Ok(())
            }
        }
    }

    /// Close the innermost open element with this name; stray end tags are ignored
    fn handle_end_tag(&mut self, name: &str) {
        let position = self.open_elements.iter().rposition(|&id| {
            self.tree.get(id).and_then(|n| n.tag_name()) == Some(name)
        });
        if let Some(i) = position {
            self.open_elements.truncate(i);
        }
    }

    /// Append text, merging with a preceding text node
    fn handle_text(&mut self, text: String) -> HtmlResult<()> {
        let last_sibling = match self.open_elements.last() {
            Some(&parent) => self.tree.get(parent).and_then(|n| n.children.last().copied()),
            None => self.roots.last().copied(),
        };

        if let Some(node) = last_sibling.and_then(|id| self.tree.get_mut(id)) {
            if let NodeType::Text(ref mut existing) = node.node_type {
                existing.push_str(&text);
                return Ok(());
            }
        }

        let text_id = self.tree.create_text(text);
        self.insert(text_id)
    }
}

/// Check if an element is a void element (never has children)
pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input"
        | "link" | "meta" | "param" | "source" | "track" | "wbr"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use elemental_dom::Queryable;

    // Helper to parse HTML and return the tree
    fn parse(html: &str) -> DomTree {
        HtmlParser::new().parse_document(html).unwrap()
    }

    #[test]
    fn test_parse_document() {
        let tree = parse(
            r#"<!DOCTYPE html>
<html>
<head><title>Test</title></head>
<body><p>Hello</p></body>
</html>"#,
        );

        assert_eq!(tree.get_elements_by_tag_name("html").len(), 1);
        assert_eq!(tree.get_elements_by_tag_name("p").len(), 1);
    }

    #[test]
    fn test_parse_with_attributes() {
        let tree = parse(r#"<div id="main" class="container">Content</div>"#);

        let main = tree.get_element_by_id("main").unwrap();
        assert_eq!(tree.text_content(main), "Content");
        assert_eq!(tree.get_elements_by_class_name("container"), vec![main]);
    }

    #[test]
    fn test_fragment_roots_are_detached() {
        let mut tree = DomTree::new();
        let roots = HtmlParser::new()
            .parse_fragment(&mut tree, "<b>bold</b> and <i>italic</i>")
            .unwrap();

        assert_eq!(roots.len(), 3);
        assert!(roots.iter().all(|&id| tree.get(id).unwrap().parent.is_none()));
        assert!(tree.children(tree.document_id()).is_empty());
    }

    #[test]
    fn test_void_elements_no_close() {
        let tree = parse("<div><br><hr><img><input></div>");

        let div = tree.get_elements_by_tag_name("div")[0];
        assert_eq!(tree.children(div).len(), 4);
        let br = tree.get_elements_by_tag_name("br")[0];
        assert!(tree.children(br).is_empty());
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        let tree = parse("<ul><li>one</span><li>two</ul><p>after");

        let ul = tree.get_elements_by_tag_name("ul")[0];
        assert_eq!(tree.text_content(ul), "onetwo");
        let p = tree.get_elements_by_tag_name("p")[0];
        assert_eq!(tree.get(p).unwrap().parent, Some(tree.document_id()));
    }

    #[test]
    fn test_failed_fragment_leaves_nothing() {
        let mut tree = DomTree::new();
        let before = tree.len();

        let err = HtmlParser::new()
            .parse_fragment(&mut tree, "<p>ok</p><div title=\"open")
            .unwrap_err();

        assert_eq!(err, HtmlError::UnexpectedEof("attribute value"));
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn test_max_depth() {
        let result = HtmlParser::new()
            .with_max_depth(2)
            .parse_document("<div><div><div></div></div></div>");

        assert!(matches!(result, Err(HtmlError::ParseError(_))));
    }
}
