use std::fmt::Write;
use std::sync::OnceLock;

use html_escape::{decode_html_entities, encode_double_quoted_attribute};
use regex::Regex;

/// Destination carried by every rewritten anchor; default navigation never happens.
pub const PLACEHOLDER_HREF: &str = "#";
/// Class given to anchors that open outside the wiki.
pub const EXTERNAL_CLASS: &str = "external";
/// Attribute holding the index of a [`LinkBinding::Navigate`] binding.
pub const INTERNAL_ATTR: &str = "data-internal";
/// Attribute holding the index of a [`LinkBinding::OpenExternal`] binding.
pub const EXTERNAL_ATTR: &str = "data-external";

/// Click behaviour attached to an anchor. Only the table index is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkBinding {
    /// Navigate to `internal_targets[i]` of the render that produced the anchor.
    Navigate(usize),
    /// Open `external_targets[j]` in the external browser.
    OpenExternal(usize),
}

impl LinkBinding {
    fn attribute(self) -> (&'static str, usize) {
        match self {
            LinkBinding::Navigate(i) => (INTERNAL_ATTR, i),
            LinkBinding::OpenExternal(j) => (EXTERNAL_ATTR, j),
        }
    }
}

/// Opening tag of a hyperlink element.
///
/// The closing `</a>` and the label stay in the surrounding [`Node::Markup`] runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
    /// Decoded destination, `None` for anchors without an `href`.
    pub href: Option<String>,
    pub class: Option<String>,
    /// Remaining attributes in source order, values decoded.
    pub attrs: Vec<(String, String)>,
    pub binding: Option<LinkBinding>,
}

impl Anchor {
    /// Placeholder anchor for the `index`-th internal link of a render.
    pub fn internal(index: usize) -> Self {
        Self {
            href: Some(PLACEHOLDER_HREF.to_string()),
            binding: Some(LinkBinding::Navigate(index)),
            ..Self::default()
        }
    }

    /// True when the destination is exactly the placeholder marker.
    pub fn is_placeholder(&self) -> bool {
        self.href.as_deref() == Some(PLACEHOLDER_HREF)
    }

    /// Looks up one of the remaining attributes by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn from_tag(attributes: &str) -> Self {
        let mut anchor = Self::default();

        for caps in attribute_regex().captures_iter(attributes) {
            let name = caps[1].to_ascii_lowercase();
            let raw = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            let value = decode_html_entities(raw).into_owned();

            match name.as_str() {
                "href" => anchor.href = Some(value),
                "class" => anchor.class = Some(value),
                // Bindings are only ever attached by the renderer itself
                INTERNAL_ATTR | EXTERNAL_ATTR => {}
                _ => anchor.attrs.push((name, value)),
            }
        }

        anchor
    }

    fn write_html(&self, out: &mut String) {
        out.push_str("<a");
        if let Some(href) = &self.href {
            push_attr(out, "href", href);
        }
        if let Some(class) = &self.class {
            push_attr(out, "class", class);
        }
        if let Some(binding) = self.binding {
            let (name, index) = binding.attribute();
            let _ = write!(out, " {name}=\"{index}\"");
        }
        for (name, value) in &self.attrs {
            push_attr(out, name, value);
        }
        out.push('>');
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    let _ = write!(
        out,
        " {name}=\"{}\"",
        encode_double_quoted_attribute(value)
    );
}

/// A piece of a rendered fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Trusted HTML passed through verbatim.
    Markup(String),
    /// An `<a ...>` opening tag.
    Anchor(Anchor),
}

/// Rendered HTML split into markup runs and hyperlink opening tags.
///
/// This is the structure the link passes walk instead of a live document:
/// every hyperlink element is reachable as a [`Node::Anchor`], and
/// serializing with [`Fragment::to_html`] writes bindings as data attributes
/// rather than script text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    /// Splits renderer output into markup and anchors.
    ///
    /// The input must come from the Markdown renderer: raw HTML in page
    /// markup has already been escaped or sanitized, so every `<a` tag found
    /// here is a real hyperlink element.
    pub fn parse(html: &str) -> Self {
        let mut nodes = Vec::new();
        let mut last = 0;

        for caps in anchor_regex().captures_iter(html) {
            let Some(tag) = caps.get(0) else {
                continue;
            };
            if tag.start() > last {
                nodes.push(Node::Markup(html[last..tag.start()].to_string()));
            }
            let attributes = caps.get(1).map_or("", |m| m.as_str());
            nodes.push(Node::Anchor(Anchor::from_tag(attributes)));
            last = tag.end();
        }

        if last < html.len() {
            nodes.push(Node::Markup(html[last..].to_string()));
        }

        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All hyperlink elements in document order.
    pub fn anchors(&self) -> impl Iterator<Item = &Anchor> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Anchor(anchor) => Some(anchor),
            Node::Markup(_) => None,
        })
    }

    pub fn anchors_mut(&mut self) -> impl Iterator<Item = &mut Anchor> {
        self.nodes.iter_mut().filter_map(|node| match node {
            Node::Anchor(anchor) => Some(anchor),
            Node::Markup(_) => None,
        })
    }

    /// Bindings of all bound anchors in document order.
    pub fn bindings(&self) -> impl Iterator<Item = LinkBinding> + '_ {
        self.anchors().filter_map(|anchor| anchor.binding)
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Markup(markup) => out.push_str(markup),
                Node::Anchor(anchor) => anchor.write_html(&mut out),
            }
        }
        out
    }
}

fn anchor_regex() -> &'static Regex {
    static ANCHOR_REGEX: OnceLock<Regex> = OnceLock::new();
    ANCHOR_REGEX.get_or_init(|| {
        Regex::new(r#"(?i)<a(\s(?:[^>"']|"[^"]*"|'[^']*')*)?>"#).expect("Invalid anchor regex")
    })
}

fn attribute_regex() -> &'static Regex {
    static ATTRIBUTE_REGEX: OnceLock<Regex> = OnceLock::new();
    ATTRIBUTE_REGEX.get_or_init(|| {
        Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("Invalid attribute regex")
    })
}
