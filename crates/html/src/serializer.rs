//! Markup serialization (the `innerHTML` getter)

use elemental_dom::{DomTree, NodeId, NodeType};

use crate::tree_builder::is_void_element;

/// Pending work for the serializer walk
enum Step<'a> {
    /// Write a node; the flag marks raw text content of script/style
    Node(NodeId, bool),
    /// Write the end tag of an element whose children are done
    EndTag(&'a str),
}

/// Serialize the children of a node.
///
/// Released nodes serialize to nothing. The walk keeps its own stack, so
/// arbitrarily deep trees serialize without recursion.
pub fn serialize_children(tree: &DomTree, id: NodeId) -> String {
    let mut output = String::new();
    let raw = tree
        .get(id)
        .and_then(|n| n.tag_name())
        .is_some_and(is_raw_text_element);

    let mut stack: Vec<Step<'_>> = tree
        .children(id)
        .into_iter()
        .rev()
        .map(|child| Step::Node(child, raw))
        .collect();

    while let Some(step) = stack.pop() {
        let (id, raw_parent) = match step {
            Step::EndTag(tag_name) => {
                output.push_str("</");
                output.push_str(tag_name);
                output.push('>');
                continue;
            }
            Step::Node(id, raw_parent) => (id, raw_parent),
        };
        let Some(node) = tree.get(id) else {
            continue;
        };

        match &node.node_type {
            NodeType::Document => {
                stack.extend(node.children.iter().rev().map(|&child| Step::Node(child, false)));
            }
            NodeType::Doctype { name } => {
                output.push_str("<!DOCTYPE ");
                output.push_str(name);
                output.push('>');
            }
            NodeType::Element(elem) => {
                output.push('<');
                output.push_str(&elem.tag_name);
                for (name, value) in &elem.attributes {
                    output.push(' ');
                    output.push_str(name);
                    output.push_str("=\"");
                    output.push_str(&escape_attribute(value));
                    output.push('"');
                }
                output.push('>');

                if is_void_element(&elem.tag_name) {
                    continue;
                }

                let raw = is_raw_text_element(&elem.tag_name);
                stack.push(Step::EndTag(&elem.tag_name));
                stack.extend(node.children.iter().rev().map(|&child| Step::Node(child, raw)));
            }
            NodeType::Text(text) if raw_parent => output.push_str(text),
            NodeType::Text(text) => output.push_str(&escape_text(text)),
            NodeType::Comment(text) => {
                output.push_str("<!--");
                output.push_str(text);
                output.push_str("-->");
            }
        }
    }

    output
}

fn is_raw_text_element(tag_name: &str) -> bool {
    matches!(tag_name, "script" | "style")
}

/// Escape text content for markup
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\u{00A0}' => escaped.push_str("&nbsp;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escape a double-quoted attribute value
pub fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\u{00A0}' => escaped.push_str("&nbsp;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HtmlParser;
    use elemental_dom::Queryable;

    fn inner_html_of(html: &str, selector: &str) -> String {
        let tree = HtmlParser::new().parse_document(html).unwrap();
        let id = tree.query_selector(selector).unwrap();
        serialize_children(&tree, id)
    }

    #[test]
    fn test_serialize_preserves_structure() {
        let markup = r#"<p class="intro" data-id="7">Hi <b>there</b><br><!--c--></p>"#;
        assert_eq!(
            inner_html_of(&format!("<div id=\"root\">{}</div>", markup), "#root"),
            markup
        );
    }

    #[test]
    fn test_serialize_escapes() {
        let html = "<div id=\"root\"><a title='say \"hi\" &amp; go'>1 &lt; 2</a></div>";
        assert_eq!(
            inner_html_of(html, "#root"),
            "<a title=\"say &quot;hi&quot; &amp; go\">1 &lt; 2</a>"
        );
    }

    #[test]
    fn test_raw_text_is_not_escaped() {
        let html = "<script id=\"s\">if (a < b) {}</script>";
        assert_eq!(inner_html_of(html, "#s"), "if (a < b) {}");
    }

    #[test]
    fn test_released_node_serializes_empty() {
        let mut tree = HtmlParser::new().parse_document("<p id=\"x\">text</p>").unwrap();
        let p = tree.query_selector("#x").unwrap();
        tree.remove_subtree(p).unwrap();
        assert_eq!(serialize_children(&tree, p), "");
    }

    #[test]
    fn test_deep_tree_serializes() {
        const DEPTH: usize = 100_000;
        let mut tree = elemental_dom::DomTree::new();
        let mut top = tree.create_text("x");
        for _ in 0..DEPTH {
            let b = tree.create_element("b");
            tree.append_child(b, top).unwrap();
            top = b;
        }
        let root = tree.create_element("div");
        tree.append_child(root, top).unwrap();

        let html = serialize_children(&tree, root);
        assert_eq!(html.len(), DEPTH * "<b></b>".len() + 1);
        assert!(html.starts_with("<b><b>"));
        assert!(html.ends_with("x</b></b>"));
    }
}
