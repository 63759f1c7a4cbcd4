//! Document
//!
//! The tree plus its `html`/`head`/`body` skeleton.

use crate::{DomTree, Node, NodeId};

/// Skeleton element ids
#[derive(Debug, Clone, Copy)]
struct Skeleton {
    html: NodeId,
    head: NodeId,
    body: NodeId,
}

#[derive(Debug)]
pub struct Document {
    pub tree: DomTree,
    url: String,
    skeleton: Option<Skeleton>,
}

impl Document {
    /// Document with an html/head/body skeleton and an empty journal
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();
        let [html, head, body] = ["html", "head", "body"].map(|tag| tree.create_element(tag));
        for (parent, child) in [(tree.root(), html), (html, head), (html, body)] {
            // fresh elements under the document node cannot violate hierarchy rules
            let _ = tree.append_child(parent, child);
        }
        tree.take_records();

        Self {
            tree,
            url: url.to_string(),
            skeleton: Some(Skeleton { html, head, body }),
        }
    }

    /// Document holding nothing but the document node
    pub fn blank(url: &str) -> Self {
        Self { tree: DomTree::new(), url: url.to_string(), skeleton: None }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Document node
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.skeleton.map(|s| s.html)
    }

    pub fn head(&self) -> Option<NodeId> {
        self.skeleton.map(|s| s.head)
    }

    pub fn body(&self) -> Option<NodeId> {
        self.skeleton.map(|s| s.body)
    }

    /// Text of the first `<title>` in `<head>`
    pub fn title(&self) -> String {
        let Some(head) = self.head() else {
            return String::new();
        };
        self.tree.children(head)
            .find(|(_, node)| node.local_name() == Some("title"))
            .map(|(id, _)| self.tree.text_content(id))
            .unwrap_or_default()
    }

    /// First element in document order whose id is `id`
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.descendants(self.root()).into_iter().find(|&node| {
            self.tree.get(node)
                .and_then(Node::as_element)
                .is_some_and(|e| e.id.as_deref() == Some(id))
        })
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
