//! DOM query functionality (getElementById, querySelector, etc.)

use crate::node::NodeId;
use crate::tree::DomTree;

/// Trait for querying the DOM
pub trait Queryable {
    /// Find an element by its ID attribute
    fn get_element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Find elements by tag name
    fn get_elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeId>;

    /// Find elements by class name
    fn get_elements_by_class_name(&self, class_name: &str) -> Vec<NodeId>;

    /// Find the first element matching a simple selector (`#id`, `.class` or `tag`)
    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let selector = selector.trim();
        if let Some(id) = selector.strip_prefix('#') {
            self.get_element_by_id(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            self.get_elements_by_class_name(class).into_iter().next()
        } else {
            self.get_elements_by_tag_name(selector).into_iter().next()
        }
    }
}

impl DomTree {
    fn find_elements<F>(&self, mut predicate: F) -> impl Iterator<Item = NodeId> + '_
    where
        F: FnMut(&crate::node::ElementData) -> bool + 'static,
    {
        self.descendants(self.document_id())
            .into_iter()
            .filter(move |&node_id| {
                self.get(node_id)
                    .and_then(|n| n.as_element())
                    .map(&mut predicate)
                    .unwrap_or(false)
            })
    }
}

impl Queryable for DomTree {
    fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let id = id.to_string();
        self.find_elements(move |e| e.id() == Some(id.as_str())).next()
    }

    fn get_elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeId> {
        let tag_lower = tag_name.to_ascii_lowercase();
        self.find_elements(move |e| e.tag_name == tag_lower).collect()
    }

    fn get_elements_by_class_name(&self, class_name: &str) -> Vec<NodeId> {
        let class_name = class_name.to_string();
        self.find_elements(move |e| e.has_class(&class_name)).collect()
    }
}
