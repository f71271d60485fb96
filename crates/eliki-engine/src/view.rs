//! HTML chrome around rendered pages.
//!
//! Buttons and the edit link are bound through `data-action` attributes, the
//! same way rendered links use `data-internal` / `data-external`.

use html_escape::encode_text;

use crate::session::{EditorView, ViewState};

pub const ACTION_ATTR: &str = "data-action";

const STYLE: &str = "\
body { font-family: sans-serif; max-width: 50em; margin: 1em auto; padding: 0 1em; }
h1 { border-bottom: 1px solid #ccc; }
a { color: #0645ad; text-decoration: none; }
a.external { color: #36b; }
a.external::after { content: \" \\2197\"; font-size: 0.8em; }
.notice { background: #fec; border: 1px solid #ca6; padding: 0.5em; }
#editor { width: 100%; height: 30em; font-family: monospace; tab-size: 4; }
";

/// Heading plus rendered body of the current page.
pub fn page_html(state: &ViewState) -> String {
    let title = encode_text(&state.title);
    let mut html = String::new();

    if let Some(notice) = &state.notice {
        html.push_str(&format!("<p class=\"notice\">{}</p>\n", encode_text(notice)));
    }

    if state.editable {
        html.push_str(&format!(
            "<h1><span id=\"title\">{title}</span> &nbsp; [<a href=\"#\" {ACTION_ATTR}=\"edit\">edit</a>]</h1>\n"
        ));
    } else {
        html.push_str(&format!(
            "<h1>Special: <span id=\"title\">{title}</span></h1>\n"
        ));
    }

    html.push_str(&state.render.html);
    html
}

pub fn editor_html(editor: &EditorView) -> String {
    format!(
        "<h1>Editing <span id=\"title\">{title}</span></h1>\n\
         <div><button {ACTION_ATTR}=\"save\">Save</button> &nbsp; <button {ACTION_ATTR}=\"cancel\">Cancel</button><br><br></div>\n\
         <div id=\"editordiv\"><textarea id=\"editor\">{markup}</textarea></div>\n",
        title = encode_text(&editor.title),
        markup = encode_text(&editor.markup),
    )
}

/// Wraps a view body in a standalone HTML document.
pub fn document_html(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title} - eliki</title>\n<style>\n{STYLE}</style>\n</head>\n<body>\n<div id=\"everything\">\n{body}</div>\n</body>\n</html>\n",
        title = encode_text(title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Page, PageName};
    use crate::render::LinkAwareRenderer;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn state(title: &str, markup: &str, editable: bool) -> ViewState {
        ViewState {
            page: Some(Page::Named(PageName::new(title))),
            title: title.to_string(),
            key: None,
            markup: markup.to_string(),
            render: LinkAwareRenderer::new().render(markup),
            editable,
            notice: None,
        }
    }

    #[test]
    fn editable_page_has_edit_link() {
        assert_snapshot!(page_html(&state("Index", "Hi [[There]]", true)).trim_end(), @r##"
        <h1><span id="title">Index</span> &nbsp; [<a href="#" data-action="edit">edit</a>]</h1>
        <p>Hi <a href="#" data-internal="0">There</a></p>
        "##);
    }

    #[test]
    fn special_page_has_no_edit_link() {
        let html = page_html(&state("List All Pages", "", false));
        assert_eq!(html, "<h1>Special: <span id=\"title\">List All Pages</span></h1>\n");
    }

    #[test]
    fn title_is_escaped() {
        let html = page_html(&state("<script>x</script>", "", true));
        assert!(html.contains("<span id=\"title\">&lt;script&gt;x&lt;/script&gt;</span>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn notice_is_shown_above_the_heading() {
        let mut state = state("Index", "", true);
        state.notice = Some("Tried to go to <empty string>".to_string());

        let html = page_html(&state);
        assert!(html.starts_with(
            "<p class=\"notice\">Tried to go to &lt;empty string&gt;</p>\n<h1>"
        ));
    }

    #[test]
    fn editor_escapes_markup() {
        let editor = EditorView {
            title: "Notes".to_string(),
            markup: "</textarea><b>& more".to_string(),
        };
        assert_snapshot!(editor_html(&editor).trim_end(), @r#"
        <h1>Editing <span id="title">Notes</span></h1>
        <div><button data-action="save">Save</button> &nbsp; <button data-action="cancel">Cancel</button><br><br></div>
        <div id="editordiv"><textarea id="editor">&lt;/textarea&gt;&lt;b&gt;&amp; more</textarea></div>
        "#);
    }

    #[test]
    fn document_styles_external_links() {
        let doc = document_html("A & B", "<p>body</p>\n");
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>A &amp; B - eliki</title>"));
        assert!(doc.contains("a.external"));
        assert!(doc.contains("<div id=\"everything\">\n<p>body</p>\n</div>"));
    }
}
