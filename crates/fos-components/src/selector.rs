//! Insertion point selectors
//!
//! The small selector language accepted by a `content` point's `select`
//! attribute, compiled once per distribution.

use fos_dom::{DomTree, NodeId};

/// Read access needed to evaluate a selector
pub trait MatchContext {
    fn tree(&self) -> &DomTree;

    /// Whether `node` currently owns a light tree (is a shadow host)
    fn owns_light_tree(&self, node: NodeId) -> bool;
}

/// One comma-separated item of a tag list: `tag` or `tag[attr=value]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch {
    pub tag: String,
    pub attr: Option<(String, String)>,
}

impl TagMatch {
    fn parse(item: &str) -> Self {
        let item = item.trim();
        if let Some((tag, rest)) = item.split_once('[') {
            if let Some((name, value)) = rest.strip_suffix(']').and_then(|inner| inner.split_once('=')) {
                let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                return Self {
                    tag: tag.trim().to_ascii_lowercase(),
                    attr: Some((name.trim().to_ascii_lowercase(), value.to_string())),
                };
            }
        }
        Self { tag: item.to_ascii_lowercase(), attr: None }
    }
}

/// Compiled selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// No selector: claims everything left in the pool
    All,
    /// `~`: nodes that own a light tree
    LightHost,
    /// `#id`
    Id(String),
    /// `*`: every non-text node
    NonText,
    /// `.class`
    Class(String),
    /// `[attr]`
    Attribute(String),
    /// `a, b[is=x], c`
    Tags(Vec<TagMatch>),
}

impl Selector {
    /// Compile the value of a `select` attribute; absent or blank is `All`
    pub fn compile(source: Option<&str>) -> Self {
        let Some(source) = source.map(str::trim).filter(|s| !s.is_empty()) else {
            return Selector::All;
        };
        match source.as_bytes()[0] {
            b'~' => Selector::LightHost,
            b'#' => Selector::Id(source[1..].to_string()),
            b'*' => Selector::NonText,
            b'.' => Selector::Class(source[1..].to_string()),
            b'[' => {
                let inner = source[1..].strip_suffix(']').unwrap_or(&source[1..]);
                Selector::Attribute(inner.trim().to_ascii_lowercase())
            }
            _ => Selector::Tags(
                source.split(',')
                    .filter(|item| !item.trim().is_empty())
                    .map(TagMatch::parse)
                    .collect(),
            ),
        }
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self, Selector::All)
    }

    /// Test a single node. Text nodes only match `All`.
    pub fn matches(&self, cx: &impl MatchContext, node: NodeId) -> bool {
        let Some(data) = cx.tree().get(node) else {
            return false;
        };
        if let Selector::All = self {
            return true;
        }
        if let Selector::NonText = self {
            return !data.is_text();
        }
        let Some(element) = data.as_element() else {
            return false;
        };
        match self {
            Selector::LightHost => cx.owns_light_tree(node),
            Selector::Id(id) => element.id.as_deref() == Some(id.as_str()),
            Selector::Class(class) => element.has_class(class),
            Selector::Attribute(name) => element.has_attr(name),
            Selector::Tags(items) => items.iter().any(|item| {
                item.tag == element.name
                    && item.attr.as_ref().is_none_or(|(name, value)| {
                        element.get_attr(name).is_some_and(|v| v.eq_ignore_ascii_case(value))
                    })
            }),
            Selector::All | Selector::NonText => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain<'a>(&'a DomTree, Option<NodeId>);

    impl MatchContext for Plain<'_> {
        fn tree(&self) -> &DomTree {
            self.0
        }

        fn owns_light_tree(&self, node: NodeId) -> bool {
            self.1 == Some(node)
        }
    }

    #[test]
    fn test_compile_forms() {
        assert_eq!(Selector::compile(None), Selector::All);
        assert_eq!(Selector::compile(Some("  ")), Selector::All);
        assert_eq!(Selector::compile(Some("~")), Selector::LightHost);
        assert_eq!(Selector::compile(Some("#main")), Selector::Id("main".into()));
        assert_eq!(Selector::compile(Some("*")), Selector::NonText);
        assert_eq!(Selector::compile(Some(".a")), Selector::Class("a".into()));
        assert_eq!(Selector::compile(Some("[title]")), Selector::Attribute("title".into()));
        assert_eq!(
            Selector::compile(Some("H1, button[is=x-bar]")),
            Selector::Tags(vec![
                TagMatch { tag: "h1".into(), attr: None },
                TagMatch { tag: "button".into(), attr: Some(("is".into(), "x-bar".into())) },
            ])
        );
    }

    #[test]
    fn test_matching() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.set_attribute(div, "class", "a b").unwrap();
        tree.set_attribute(div, "id", "main").unwrap();
        let button = tree.create_element("button");
        tree.set_attribute(button, "is", "x-bar").unwrap();
        let text = tree.create_text("hi");
        let cx = Plain(&tree, Some(button));

        assert!(Selector::compile(Some(".b")).matches(&cx, div));
        assert!(Selector::compile(Some("#main")).matches(&cx, div));
        assert!(Selector::compile(Some("[id]")).matches(&cx, div));
        assert!(!Selector::compile(Some("[id]")).matches(&cx, button));
        assert!(Selector::compile(Some("~")).matches(&cx, button));
        assert!(!Selector::compile(Some("~")).matches(&cx, div));
        assert!(Selector::compile(Some("span, button[is=x-bar]")).matches(&cx, button));
        assert!(!Selector::compile(Some("button[is=x-baz]")).matches(&cx, button));

        assert!(Selector::compile(Some("*")).matches(&cx, div));
        assert!(!Selector::compile(Some("*")).matches(&cx, text));
        assert!(!Selector::compile(Some(".a")).matches(&cx, text));
        assert!(Selector::All.matches(&cx, text));
    }
}
