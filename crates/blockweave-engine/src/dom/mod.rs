//! # Detached DOM
//!
//! An owned element tree standing in for browser DOM nodes. Renders produce
//! `Element`s off-tree; the serializer splices them together and writes the
//! result out as an HTML string.
//!
//! A [`RenderSpec`] pairs a rendered root with the path to its *content hole*,
//! the element that receives the node's children. Paths are child indices
//! from the root, so holes survive moving the root around by value.

mod parse;

pub use parse::parse_fragment;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A node of the detached DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Element(Element),
    Text(String),
}

impl DomNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            DomNode::Element(el) => Some(el),
            DomNode::Text(_) => None,
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            DomNode::Element(el) => el.text_content(),
            DomNode::Text(text) => text.clone(),
        }
    }

    pub fn write_html(&self, out: &mut String) {
        match self {
            DomNode::Element(el) => el.write_html(out),
            DomNode::Text(text) => out.push_str(&html_escape::encode_text(text)),
        }
    }
}

impl From<Element> for DomNode {
    fn from(el: Element) -> Self {
        DomNode::Element(el)
    }
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    attrs: Vec<(String, String)>,
    pub children: Vec<DomNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: impl Into<DomNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(DomNode::Text(text.into()));
        self
    }

    /// Sets an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(idx).1)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, class: &str) {
        let merged = merge_css_classes(&[self.attr("class").unwrap_or(""), class]);
        self.set_attr("class", merged);
    }

    pub fn append(&mut self, child: impl Into<DomNode>) {
        self.children.push(child.into());
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(DomNode::as_element)
    }

    /// Path (child indices) to the first element in document order, the root
    /// included, that satisfies `pred`.
    pub fn find_path(&self, pred: &impl Fn(&Element) -> bool) -> Option<Vec<usize>> {
        if pred(self) {
            return Some(Vec::new());
        }
        for (idx, child) in self.children.iter().enumerate() {
            if let DomNode::Element(el) = child
                && let Some(mut path) = el.find_path(pred)
            {
                path.insert(0, idx);
                return Some(path);
            }
        }
        None
    }

    /// First element in document order, the root included, satisfying `pred`.
    pub fn find(&self, pred: &impl Fn(&Element) -> bool) -> Option<&Element> {
        let path = self.find_path(pred)?;
        self.at_path(&path)
    }

    pub fn at_path(&self, path: &[usize]) -> Option<&Element> {
        let mut current = self;
        for &idx in path {
            current = current.children.get(idx)?.as_element()?;
        }
        Some(current)
    }

    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = self;
        for &idx in path {
            current = match current.children.get_mut(idx)? {
                DomNode::Element(el) => el,
                DomNode::Text(_) => return None,
            };
        }
        Some(current)
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(DomNode::text_content).collect()
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    pub fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }
        out.push('>');
        if self.is_void() {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

/// Writes a sequence of nodes as HTML.
pub fn nodes_to_html(nodes: &[DomNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_html(&mut out);
    }
    out
}

/// Joins class lists, dropping empty entries.
pub fn merge_css_classes(classes: &[&str]) -> String {
    classes
        .iter()
        .flat_map(|c| c.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A rendered root plus the location of its content hole, if it has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSpec {
    pub dom: Element,
    pub content_hole: Option<Vec<usize>>,
}

impl RenderSpec {
    /// A render with no place for children.
    pub fn leaf(dom: Element) -> Self {
        Self {
            dom,
            content_hole: None,
        }
    }

    /// A render whose root itself receives the children.
    pub fn wrapper(dom: Element) -> Self {
        Self {
            dom,
            content_hole: Some(Vec::new()),
        }
    }

    pub fn with_hole(dom: Element, hole: Vec<usize>) -> Self {
        Self {
            dom,
            content_hole: Some(hole),
        }
    }

    pub fn has_hole(&self) -> bool {
        self.content_hole.is_some()
    }

    pub fn hole_mut(&mut self) -> Option<&mut Element> {
        let path = self.content_hole.as_ref()?;
        self.dom.at_path_mut(path)
    }

    pub fn hole(&self) -> Option<&Element> {
        let path = self.content_hole.as_ref()?;
        self.dom.at_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_attributes_and_text_are_escaped() {
        let el = Element::new("a")
            .with_attr("href", "/search?q=\"x\"&y")
            .with_text("1 < 2 & 3");
        assert_eq!(
            el.to_html(),
            r#"<a href="/search?q=&quot;x&quot;&amp;y">1 &lt; 2 &amp; 3</a>"#
        );
    }

    #[test]
    fn test_void_elements_have_no_closing_tag() {
        let el = Element::new("p")
            .with_text("a")
            .with_child(Element::new("br"))
            .with_text("b");
        assert_eq!(el.to_html(), "<p>a<br>b</p>");
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut el = Element::new("div").with_attr("a", "1").with_attr("b", "2");
        el.set_attr("a", "3");
        assert_eq!(el.to_html(), r#"<div a="3" b="2"></div>"#);
    }

    #[test]
    fn test_find_path_and_hole() {
        let dom = Element::new("div").with_child(
            Element::new("figure")
                .with_child(Element::new("img"))
                .with_child(Element::new("figcaption").with_attr("class", "caption")),
        );
        let path = dom.find_path(&|el| el.has_class("caption")).unwrap();
        assert_eq!(path, vec![0, 1]);

        let mut spec = RenderSpec::with_hole(dom, path);
        spec.hole_mut().unwrap().append(DomNode::Text("hi".into()));
        assert_eq!(
            spec.dom.to_html(),
            r#"<div><figure><img><figcaption class="caption">hi</figcaption></figure></div>"#
        );
    }

    #[test]
    fn test_merge_css_classes_skips_empty() {
        assert_eq!(merge_css_classes(&["bn-block-content", "", " custom  x "]), "bn-block-content custom x");
    }
}
