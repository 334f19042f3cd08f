//! A small, tolerant HTML reader.
//!
//! Handles what the serializer writes plus ordinary pasted markup: nested
//! tags, quoted/unquoted/bare attributes, void elements, comments and
//! entities. Unbalanced close tags are ignored; unclosed tags are closed at
//! the end of input.

use super::{DomNode, Element};

pub fn parse_fragment(html: &str) -> Vec<DomNode> {
    let mut reader = Reader { src: html, pos: 0 };
    let mut stack: Vec<Element> = vec![Element::new("#fragment")];

    while !reader.at_end() {
        if reader.starts_with("<!--") {
            reader.skip_past("-->");
        } else if reader.starts_with("<!") || reader.starts_with("<?") {
            reader.skip_past(">");
        } else if reader.starts_with("</") {
            let name = reader.read_close_tag();
            close_element(&mut stack, &name);
        } else if reader.starts_tag() {
            let (element, self_closing) = reader.read_open_tag();
            if self_closing || element.is_void() {
                push_child(&mut stack, DomNode::Element(element));
            } else {
                stack.push(element);
            }
        } else {
            let text = reader.read_text();
            if !text.is_empty() {
                let decoded = html_escape::decode_html_entities(&text).into_owned();
                push_child(&mut stack, DomNode::Text(decoded));
            }
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().map(|root| root.children).unwrap_or_default()
}

fn push_child(stack: &mut [Element], node: DomNode) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

fn close_top(stack: &mut Vec<Element>) {
    if let Some(done) = stack.pop() {
        push_child(stack, DomNode::Element(done));
    }
}

fn close_element(stack: &mut Vec<Element>, name: &str) {
    // Index 0 is the fragment root and never matches.
    let Some(idx) = stack.iter().rposition(|el| el.tag == name) else {
        return;
    };
    if idx == 0 {
        return;
    }
    while stack.len() > idx {
        close_top(stack);
    }
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn starts_tag(&self) -> bool {
        let mut chars = self.rest().chars();
        chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_past(&mut self, needle: &str) {
        match self.rest().find(needle) {
            Some(idx) => self.pos += idx + needle.len(),
            None => self.pos = self.src.len(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    fn read_text(&mut self) -> String {
        // A lone '<' that does not start markup is literal text.
        let start = self.pos;
        if self.peek() == Some('<') {
            self.bump();
        }
        match self.rest().find('<') {
            Some(idx) => self.pos += idx,
            None => self.pos = self.src.len(),
        }
        self.src[start..self.pos].to_string()
    }

    fn read_tag_name(&mut self) -> String {
        self.read_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == ':')
            .to_ascii_lowercase()
    }

    fn read_close_tag(&mut self) -> String {
        self.pos += 2;
        let name = self.read_tag_name();
        self.skip_past(">");
        name
    }

    fn read_open_tag(&mut self) -> (Element, bool) {
        self.bump();
        let mut element = Element::new(self.read_tag_name());

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return (element, false),
                Some('>') => {
                    self.bump();
                    return (element, false);
                }
                Some('/') => {
                    self.bump();
                    if self.peek() == Some('>') {
                        self.bump();
                        return (element, true);
                    }
                }
                Some(_) => {
                    let name = self
                        .read_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/'))
                        .to_ascii_lowercase();
                    if name.is_empty() {
                        self.bump();
                        continue;
                    }
                    self.skip_whitespace();
                    let value = if self.peek() == Some('=') {
                        self.bump();
                        self.skip_whitespace();
                        self.read_attr_value()
                    } else {
                        String::new()
                    };
                    element.set_attr(name, value);
                }
            }
        }
    }

    fn read_attr_value(&mut self) -> String {
        let raw = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let value = self.read_while(|c| c != quote);
                self.bump();
                value
            }
            _ => self.read_while(|c| !c.is_whitespace() && c != '>'),
        };
        html_escape::decode_html_entities(raw).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::nodes_to_html;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reads_nested_elements_and_attributes() {
        let nodes = parse_fragment(
            r#"<div class="bn-block-content" data-content-type='heading' data-level=2><h2 class="bn-inline-content">Title</h2></div>"#,
        );
        assert_eq!(nodes.len(), 1);
        let div = nodes[0].as_element().unwrap();
        assert_eq!(div.attr("data-content-type"), Some("heading"));
        assert_eq!(div.attr("data-level"), Some("2"));
        assert_eq!(div.text_content(), "Title");
    }

    #[test]
    fn test_serializer_output_round_trips() {
        let html = r#"<p>a &amp; b<br><strong>c</strong></p><hr><span data-x="&quot;q&quot;">d</span>"#;
        assert_eq!(nodes_to_html(&parse_fragment(html)), html);
    }

    #[test]
    fn test_tolerates_broken_markup() {
        let nodes = parse_fragment("<!-- note --><p>one<b>two</p></i>three < four");
        assert_eq!(
            nodes_to_html(&nodes),
            "<p>one<b>two</b></p>three &lt; four"
        );
    }

    #[test]
    fn test_self_closing_and_bare_attributes() {
        let nodes = parse_fragment(r#"<input disabled /><img src=a.png>"#);
        let input = nodes[0].as_element().unwrap();
        assert_eq!(input.attr("disabled"), Some(""));
        assert_eq!(nodes[1].as_element().unwrap().attr("src"), Some("a.png"));
    }
}
