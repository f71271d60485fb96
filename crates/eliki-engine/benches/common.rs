// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_page_markup(paragraphs: usize) -> String {
    let base = "## Section\n\nSee [[Home]], [[Shopping List]] and [the docs](https://example.org/docs).\n\n- [[Tom & Jerry]]\n- <https://example.com/a%20b>\n\n";
    base.repeat(paragraphs)
}

#[allow(dead_code)]
pub fn generate_page_list(pages: usize) -> String {
    (0..pages).map(|n| format!("* [[page {n}]]\n")).collect()
}
