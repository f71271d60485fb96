pub mod io;
pub mod page;
pub mod render;
pub mod session;
pub mod view;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use io::{FsPageStore, IoError, MemoryPageStore, PageStore};
pub use page::*;
pub use render::{
    CommonMarkRenderer, HtmlPolicy, LinkAwareRenderer, LinkBinding, MarkdownRenderer,
    RenderResult,
};
pub use session::*;
pub use view::{document_html, editor_html, page_html};
