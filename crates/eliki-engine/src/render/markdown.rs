use pulldown_cmark::{Event, Options, Parser, html};

/// Converts page markup to an HTML fragment.
///
/// Implementations must neutralise raw HTML in their input: the link passes
/// treat every `<a` tag in the output as a genuine hyperlink element.
pub trait MarkdownRenderer {
    fn render(&self, markup: &str) -> String;
}

impl<F> MarkdownRenderer for F
where
    F: Fn(&str) -> String,
{
    fn render(&self, markup: &str) -> String {
        self(markup)
    }
}

/// What happens to raw HTML written inside page markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HtmlPolicy {
    /// Raw HTML is shown as literal, escaped text.
    #[default]
    Escape,
    /// Raw HTML is kept and cleaned with ammonia.
    Sanitize,
}

/// CommonMark renderer backed by pulldown-cmark.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMarkRenderer {
    policy: HtmlPolicy,
}

impl CommonMarkRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: HtmlPolicy) -> Self {
        Self { policy }
    }

    fn options() -> Options {
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
    }
}

impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, markup: &str) -> String {
        let parser = Parser::new_ext(markup, Self::options());
        let mut html_output = String::new();

        match self.policy {
            HtmlPolicy::Escape => {
                let events = parser.map(|event| match event {
                    Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
                    other => other,
                });
                html::push_html(&mut html_output, events);
                html_output
            }
            HtmlPolicy::Sanitize => {
                html::push_html(&mut html_output, parser);
                ammonia::clean(&html_output)
            }
        }
    }
}
