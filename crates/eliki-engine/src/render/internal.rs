use std::sync::OnceLock;

use html_escape::{encode_quoted_attribute, encode_text};
use regex::{Captures, Regex};

use super::fragment::{Anchor, Fragment, Node};

/// Delimiters of an internal link token.
pub const OPEN: &str = "[[";
pub const CLOSE: &str = "]]";

/// Private-use characters framing the index of a lifted token. Markdown
/// passes them through text untouched.
const SENTINEL_OPEN: char = '\u{E000}';
const SENTINEL_CLOSE: char = '\u{E001}';

fn link_token_regex() -> &'static Regex {
    static LINK_TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();
    // Lazy so adjacent tokens are never merged; `.` stops at line ends.
    LINK_TOKEN_REGEX.get_or_init(|| Regex::new(r"\[\[.*?\]\]").expect("Invalid link token regex"))
}

fn sentinel_regex() -> &'static Regex {
    static SENTINEL_REGEX: OnceLock<Regex> = OnceLock::new();
    SENTINEL_REGEX
        .get_or_init(|| Regex::new(r"\x{E000}([0-9]+)\x{E001}").expect("Invalid sentinel regex"))
}

fn restore_regex() -> &'static Regex {
    static RESTORE_REGEX: OnceLock<Regex> = OnceLock::new();
    // Closing anchors first, then any other tag, then a bare sentinel in text.
    RESTORE_REGEX.get_or_init(|| {
        Regex::new(
            r#"(?i)(</a\s*>)|(<(?:[^>"']|"[^"]*"|'[^']*')*>)|\x{E000}([0-9]+)\x{E001}"#,
        )
        .expect("Invalid restore regex")
    })
}

fn sentinel(index: usize) -> String {
    format!("{SENTINEL_OPEN}{index}{SENTINEL_CLOSE}")
}

/// Target named by the index captured in `group`, if it exists.
fn indexed_target<'a>(
    caps: &Captures<'_>,
    group: usize,
    targets: &'a [String],
) -> Option<(usize, &'a str)> {
    let index = caps.get(group)?.as_str().parse::<usize>().ok()?;
    targets.get(index).map(|target| (index, target.as_str()))
}

/// Lifts every `[[Target]]` token out of raw page markup.
///
/// Tokens are matched leftmost-first in a single pass over the markup before
/// any Markdown processing, so the literal inner text is appended to
/// `targets`. Each token is replaced by an opaque sentinel carrying its
/// index; [`restore_internal_links`] turns the sentinels into anchors once
/// the markup has been rendered. Unterminated `[[` is left as text.
pub fn lift_internal_links(markup: &str, targets: &mut Vec<String>) -> String {
    link_token_regex()
        .replace_all(markup, |caps: &Captures<'_>| {
            let token = &caps[0];
            targets.push(token[OPEN.len()..token.len() - CLOSE.len()].to_string());
            sentinel(targets.len() - 1)
        })
        .into_owned()
}

/// Replaces the sentinels left by [`lift_internal_links`] with placeholder
/// anchors bound to [`LinkBinding::Navigate`](super::LinkBinding).
///
/// Anchor labels are the HTML-escaped targets. A sentinel that ended up
/// inside a tag (an image `alt`, say) or inside another hyperlink becomes
/// plain label text, so the output stays well formed.
pub fn restore_internal_links(fragment: &mut Fragment, targets: &[String]) {
    let mut restore = Restore {
        targets,
        placed: vec![false; targets.len()],
        in_anchor: false,
        nodes: Vec::new(),
        pending: String::new(),
    };

    for node in std::mem::take(&mut fragment.nodes) {
        match node {
            Node::Markup(markup) => restore.markup(&markup),
            Node::Anchor(anchor) => restore.anchor(anchor),
        }
    }

    fragment.nodes = restore.finish();
}

struct Restore<'a> {
    targets: &'a [String],
    placed: Vec<bool>,
    in_anchor: bool,
    nodes: Vec<Node>,
    pending: String,
}

impl Restore<'_> {
    fn markup(&mut self, markup: &str) {
        let mut last = 0;

        for caps in restore_regex().captures_iter(markup) {
            let Some(found) = caps.get(0) else {
                continue;
            };
            self.pending.push_str(&markup[last..found.start()]);
            last = found.end();

            if caps.get(1).is_some() {
                self.in_anchor = false;
                self.pending.push_str(found.as_str());
            } else if caps.get(2).is_some() {
                let tag = self.labels_in_tag(found.as_str());
                self.pending.push_str(&tag);
            } else {
                self.text_sentinel(&caps, found.as_str());
            }
        }

        self.pending.push_str(&markup[last..]);
    }

    fn anchor(&mut self, mut anchor: Anchor) {
        // Attribute values are re-encoded on output, so the literal target goes in
        for (_, value) in &mut anchor.attrs {
            *value = self.literal_labels(value);
        }
        self.flush();
        self.nodes.push(Node::Anchor(anchor));
        self.in_anchor = true;
    }

    fn text_sentinel(&mut self, caps: &Captures<'_>, raw: &str) {
        let Some((index, target)) = indexed_target(caps, 3, self.targets) else {
            self.pending.push_str(raw);
            return;
        };

        let label = encode_text(target);
        if self.in_anchor || self.placed[index] {
            self.pending.push_str(&label);
            return;
        }

        self.placed[index] = true;
        self.flush();
        self.nodes.push(Node::Anchor(Anchor::internal(index)));
        self.pending.push_str(&label);
        self.pending.push_str("</a>");
    }

    fn labels_in_tag(&self, tag: &str) -> String {
        sentinel_regex()
            .replace_all(tag, |caps: &Captures<'_>| match indexed_target(caps, 1, self.targets) {
                Some((_, target)) => encode_quoted_attribute(target).into_owned(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    fn literal_labels(&self, value: &str) -> String {
        sentinel_regex()
            .replace_all(value, |caps: &Captures<'_>| match indexed_target(caps, 1, self.targets) {
                Some((_, target)) => target.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.nodes.push(Node::Markup(std::mem::take(&mut self.pending)));
        }
    }

    fn finish(mut self) -> Vec<Node> {
        self.flush();
        self.nodes
    }
}
