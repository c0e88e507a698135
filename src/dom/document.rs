//! Page document on top of `scraper`'s HTML tree.

use scraper::node::Text;
use scraper::{ElementRef, Html, Node, Selector};

/// Parse a selector written in the source.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector parses")
}

/// Quote a value for a double-quoted attribute in markup handed to the parser. The parser
/// decodes it back to `raw` exactly.
pub fn quote_attribute(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('"', "&quot;")
}

fn text_node(text: &str) -> Node {
    Node::Text(Text { text: text.into() })
}

/// Markup built from trusted structure. Server-supplied strings only enter through
/// [`Fragment::fill_text`], so they stay text.
#[derive(Debug, Clone)]
pub struct Fragment {
    html: Html,
}

impl Fragment {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_fragment(markup),
        }
    }

    /// Append `text` as a text node to the first element matching `target`.
    pub fn fill_text(&mut self, target: &Selector, text: &str) -> bool {
        let Some(id) = self.html.select(target).next().map(|el| el.id()) else {
            return false;
        };
        match self.html.tree.get_mut(id) {
            Some(mut node) => {
                if !text.is_empty() {
                    node.append(text_node(text));
                }
                true
            }
            None => false,
        }
    }

    /// First top-level element of the fragment.
    fn first_element(&self) -> Option<ElementRef<'_>> {
        self.html.root_element().children().find_map(ElementRef::wrap)
    }
}

/// The page the client keeps in sync.
///
/// Equality compares the serialized page, so two documents showing the same thing are equal
/// however they got there.
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.to_html() == other.to_html()
    }
}

impl Document {
    /// Empty page: `<html><head></head><body></body></html>`.
    pub fn new() -> Self {
        Self {
            html: Html::parse_document(""),
        }
    }

    /// First element matching `selector` in document order, like `querySelector`.
    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// Append the fragment's top-level nodes as the last children of the first element
    /// matching `parent`. Returns `false` when nothing matches.
    pub fn append_fragment(&mut self, parent: &Selector, fragment: &Fragment) -> bool {
        let Some(parent_id) = self.html.select(parent).next().map(|el| el.id()) else {
            return false;
        };
        let mut pending = vec![(fragment.html.root_element().id(), parent_id)];
        while let Some((from, to)) = pending.pop() {
            let Some(source) = fragment.html.tree.get(from) else {
                continue;
            };
            for child in source.children() {
                let Some(mut target) = self.html.tree.get_mut(to) else {
                    break;
                };
                let copied = target.append(child.value().clone()).id();
                pending.push((child.id(), copied));
            }
        }
        true
    }

    /// Swap the first element matching `target` for the fragment's first element, in place.
    /// The replacement's text becomes the element's only child. A lone text child is
    /// overwritten rather than replaced, so repeating the same swap leaves no garbage.
    pub fn replace_first(&mut self, target: &Selector, fragment: &Fragment) -> bool {
        let Some(target_id) = self.html.select(target).next().map(|el| el.id()) else {
            return false;
        };
        let Some(source) = fragment.first_element() else {
            return false;
        };
        let element = source.value().clone();
        let text: String = source.text().collect();

        let existing: Vec<_> = match self.html.tree.get(target_id) {
            Some(node) => node
                .children()
                .map(|c| (c.id(), matches!(c.value(), Node::Text(_))))
                .collect(),
            None => return false,
        };
        match self.html.tree.get_mut(target_id) {
            Some(mut node) => *node.value() = Node::Element(element),
            None => return false,
        }

        if let [(only, true)] = existing.as_slice() {
            if let Some(mut child) = self.html.tree.get_mut(*only) {
                *child.value() = text_node(&text);
            }
            return true;
        }
        for (child, _) in &existing {
            if let Some(mut child) = self.html.tree.get_mut(*child) {
                child.detach();
            }
        }
        if !text.is_empty() {
            if let Some(mut node) = self.html.tree.get_mut(target_id) {
                node.append(text_node(&text));
            }
        }
        true
    }

    /// Serialize the whole page. Text and attribute values come out escaped.
    pub fn to_html(&self) -> String {
        self.html.html()
    }

    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        self.html.tree.nodes().count()
    }
}
