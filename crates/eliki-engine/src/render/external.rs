use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use super::fragment::{EXTERNAL_CLASS, Fragment, LinkBinding, PLACEHOLDER_HREF};

/// Characters left alone when encoding a full URI, as `encodeURI` does.
///
/// `%` is kept as well so destinations the Markdown renderer already
/// percent-encoded are not encoded twice.
const URI_RESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#')
    .remove(b'%');

/// Percent-encodes a URI while keeping its structure characters.
pub fn encode_uri(uri: &str) -> String {
    utf8_percent_encode(uri, URI_RESERVED).to_string()
}

/// Rewrites every hyperlink whose destination is not the placeholder into an
/// indexed external link.
///
/// The encoded destination is appended to `targets`; the anchor gets an
/// [`LinkBinding::OpenExternal`] binding, the `external` class and `href="#"`.
/// Anchors without an `href` are not hyperlinks and are skipped. A second run
/// over the same fragment finds only placeholders and appends nothing.
pub fn capture_external_links(fragment: &mut Fragment, targets: &mut Vec<String>) {
    for anchor in fragment.anchors_mut() {
        let Some(href) = anchor.href.as_deref() else {
            continue;
        };
        if href == PLACEHOLDER_HREF {
            continue;
        }

        targets.push(encode_uri(href));
        anchor.binding = Some(LinkBinding::OpenExternal(targets.len() - 1));
        anchor.class = Some(EXTERNAL_CLASS.to_string());
        anchor.href = Some(PLACEHOLDER_HREF.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("http://example.com", "http://example.com")]
    #[case("http://example.com/a b", "http://example.com/a%20b")]
    #[case("https://x.org/?q=1&r=[2]", "https://x.org/?q=1&r=%5B2%5D")]
    #[case("http://example.com/caf%C3%A9", "http://example.com/caf%C3%A9")]
    #[case("http://example.com/café", "http://example.com/caf%C3%A9")]
    #[case("mailto:me@example.com", "mailto:me@example.com")]
    #[case("http://a.com/#frag", "http://a.com/#frag")]
    fn encodes_like_encode_uri(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(encode_uri(input), expected);
    }

    #[test]
    fn rewrites_external_anchor() {
        let mut fragment =
            Fragment::parse(r#"<p><a href="http://example.com" title="Ex">x</a></p>"#);
        let mut targets = Vec::new();

        capture_external_links(&mut fragment, &mut targets);

        assert_eq!(targets, vec!["http://example.com"]);
        assert_snapshot!(
            fragment.to_html(),
            @r##"<p><a href="#" class="external" data-external="0" title="Ex">x</a></p>"##
        );
    }

    #[test]
    fn placeholder_anchors_are_left_alone() {
        let mut fragment = Fragment::parse(r##"<a href="#">edit</a>"##);
        let mut targets = Vec::new();

        capture_external_links(&mut fragment, &mut targets);

        assert!(targets.is_empty());
        assert_eq!(fragment.to_html(), r##"<a href="#">edit</a>"##);
    }

    #[test]
    fn anchors_without_href_are_skipped() {
        let mut fragment = Fragment::parse("<a>bare</a>");
        let mut targets = Vec::new();

        capture_external_links(&mut fragment, &mut targets);

        assert!(targets.is_empty());
        assert_eq!(fragment.anchors().next().unwrap().binding, None);
    }

    #[test]
    fn indices_follow_document_order() {
        let mut fragment = Fragment::parse(
            r#"<a href="http://one.com">1</a><a href="http://two.com">2</a>"#,
        );
        let mut targets = Vec::new();

        capture_external_links(&mut fragment, &mut targets);

        assert_eq!(targets, vec!["http://one.com", "http://two.com"]);
        assert_eq!(
            fragment.bindings().collect::<Vec<_>>(),
            vec![LinkBinding::OpenExternal(0), LinkBinding::OpenExternal(1)]
        );
    }

    #[test]
    fn second_pass_changes_nothing() {
        let mut fragment = Fragment::parse(r#"<a href="http://example.com">x</a>"#);
        let mut targets = Vec::new();

        capture_external_links(&mut fragment, &mut targets);
        let rewritten = fragment.clone();
        capture_external_links(&mut fragment, &mut targets);

        assert_eq!(targets, vec!["http://example.com"]);
        assert_eq!(fragment, rewritten);
    }

    #[test]
    fn reparsed_output_is_also_stable() {
        let mut fragment = Fragment::parse(r#"<a href="http://example.com">x</a>"#);
        let mut targets = Vec::new();
        capture_external_links(&mut fragment, &mut targets);

        let mut reparsed = Fragment::parse(&fragment.to_html());
        let mut again = Vec::new();
        capture_external_links(&mut reparsed, &mut again);

        assert!(again.is_empty());
    }
}
