//! DOM Node - arena entry
//!
//! Links use NodeId (4 bytes) instead of pointers; `NodeId::NONE` marks
//! an absent link so the struct stays flat.

use crate::NodeId;

/// Properties every node exposes natively. Behavior templates applied by
/// copying may not overwrite these.
pub const NATIVE_PROPERTIES: &[&str] = &[
    "attributes", "childNodes", "children", "className", "classList",
    "firstChild", "id", "innerHTML", "lastChild", "localName",
    "nextSibling", "nodeName", "nodeType", "outerHTML", "ownerDocument",
    "parentNode", "previousSibling", "tagName", "textContent",
];

/// One arena slot: tree links plus payload
#[derive(Debug, Clone)]
pub struct Node {
    pub parent: NodeId,
    pub first_child: NodeId,
    /// Kept so appends never walk the sibling chain
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
    pub data: NodeData,
}

impl Node {
    pub(crate) fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Detached element; the name is lowercased
    pub fn element(name: &str) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(name)))
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::with_data(NodeData::Text(TextData { content: content.into() }))
    }

    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    #[inline]
    pub fn is_document(&self) -> bool {
        matches!(self.data, NodeData::Document)
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(&t.content),
            _ => None,
        }
    }

    /// Local name for elements
    #[inline]
    pub fn local_name(&self) -> Option<&str> {
        self.as_element().map(|e| e.name.as_str())
    }

    /// Whether `name` is one of the node's native properties
    pub fn is_native_property(name: &str) -> bool {
        NATIVE_PROPERTIES.contains(&name)
    }
}

/// Payload by node kind
#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(TextData),
}

/// Element payload
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Local name, always lowercase
    pub name: String,
    /// Attributes in insertion order
    pub attrs: Vec<Attribute>,
    /// Mirrors the `id` attribute
    pub id: Option<String>,
    /// Mirrors the `class` attribute, split on whitespace
    pub classes: Vec<String>,
}

impl ElementData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
            id: None,
            classes: Vec::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Check attribute presence
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Set an attribute, returning the previous value
    pub fn set_attr(&mut self, name: &str, value: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        let old = match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => Some(std::mem::replace(&mut attr.value, value.to_string())),
            None => {
                self.attrs.push(Attribute { name: name.clone(), value: value.to_string() });
                None
            }
        };
        self.refresh_cache(&name);
        old
    }

    /// Remove an attribute, returning its value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        let pos = self.attrs.iter().position(|a| a.name == name)?;
        let removed = self.attrs.remove(pos);
        self.refresh_cache(&name);
        Some(removed.value)
    }

    /// Check class membership
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn refresh_cache(&mut self, name: &str) {
        match name {
            "id" => self.id = self.get_attr("id").map(str::to_string),
            "class" => {
                self.classes = self.get_attr("class")
                    .map(|v| v.split_ascii_whitespace().map(str::to_string).collect())
                    .unwrap_or_default();
            }
            _ => {}
        }
    }
}

/// Text node data
#[derive(Debug, Clone)]
pub struct TextData {
    pub content: String,
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}
