//! # Link-aware rendering
//!
//! Turns page markup into HTML in which every hyperlink is reached through a
//! numeric index instead of a string embedded in the markup.
//!
//! ## Pipeline
//!
//! 1. **Internal links**: `[[Target]]` tokens are lifted out of the raw
//!    markup. Literal targets go to `internal_targets` and each token is
//!    replaced by a sentinel Markdown leaves alone.
//! 2. **Markdown**: the injected [`MarkdownRenderer`] produces HTML with raw
//!    HTML from the page neutralised.
//! 3. **Fragment**: the HTML is split into markup runs and `<a>` opening tags
//!    ([`Fragment`]), and sentinels become placeholder anchors bound to
//!    `Navigate(i)`.
//! 4. **External links**: every anchor not pointing at `#` is bound to
//!    `OpenExternal(j)` and its encoded destination goes to
//!    `external_targets`.
//!
//! Tokens never reach the Markdown renderer, so emphasis, code spans or
//! reference definitions cannot change a target, and the inserted anchors
//! never pass through the sanitizer.
//!
//! ## Modules
//!
//! - **`markdown`**: `MarkdownRenderer` trait, `CommonMarkRenderer`, `HtmlPolicy`
//! - **`fragment`**: `Fragment`, `Node`, `Anchor`, `LinkBinding`
//! - **`internal`**: `[[Target]]` lifting and restoring
//! - **`external`**: hyperlink capture and `encode_uri`

pub mod external;
pub mod fragment;
pub mod internal;
pub mod markdown;

pub use external::{capture_external_links, encode_uri};
pub use fragment::{Anchor, Fragment, LinkBinding, Node, PLACEHOLDER_HREF};
pub use internal::{lift_internal_links, restore_internal_links};
pub use markdown::{CommonMarkRenderer, HtmlPolicy, MarkdownRenderer};

/// Output of one render pass. Indices are only meaningful for this render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderResult {
    /// Serialized [`fragment`](Self::fragment), safe to insert into the view.
    pub html: String,
    pub fragment: Fragment,
    /// Literal `[[...]]` targets in discovery order, duplicates included.
    pub internal_targets: Vec<String>,
    /// Encoded destinations of the remaining hyperlinks in document order.
    pub external_targets: Vec<String>,
}

impl RenderResult {
    pub fn internal_target(&self, index: usize) -> Option<&str> {
        self.internal_targets.get(index).map(String::as_str)
    }

    pub fn external_target(&self, index: usize) -> Option<&str> {
        self.external_targets.get(index).map(String::as_str)
    }
}

/// Renders page markup into a [`RenderResult`].
#[derive(Debug, Clone, Default)]
pub struct LinkAwareRenderer<M = CommonMarkRenderer> {
    markdown: M,
}

impl LinkAwareRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: HtmlPolicy) -> Self {
        Self::with_markdown(CommonMarkRenderer::with_policy(policy))
    }
}

impl<M: MarkdownRenderer> LinkAwareRenderer<M> {
    pub fn with_markdown(markdown: M) -> Self {
        Self { markdown }
    }

    pub fn render(&self, markup: &str) -> RenderResult {
        let mut internal_targets = Vec::new();
        let lifted = lift_internal_links(markup, &mut internal_targets);

        let html = self.markdown.render(&lifted);
        let mut fragment = Fragment::parse(&html);
        restore_internal_links(&mut fragment, &internal_targets);

        let mut external_targets = Vec::new();
        capture_external_links(&mut fragment, &mut external_targets);

        log::debug!(
            "rendered {} bytes of markup: {} internal, {} external links",
            markup.len(),
            internal_targets.len(),
            external_targets.len()
        );

        RenderResult {
            html: fragment.to_html(),
            fragment,
            internal_targets,
            external_targets,
        }
    }
}
