//! Single-threaded wiki controller.
//!
//! [`Wiki`] owns the page store, the renderer, the external opener and the
//! [`ViewState`] of whatever is on screen. Every navigation replaces the
//! state wholesale, so link indices always refer to the page being shown.

use crate::io::{IoError, PageStore};
use crate::page::{DEFAULT_PAGE, NavigationTarget, Page, PageKey, PageName};
use crate::render::{
    CommonMarkRenderer, LinkAwareRenderer, LinkBinding, MarkdownRenderer, RenderResult,
};

/// Notice shown when navigation had nowhere valid to go.
pub const INVALID_TARGET_NOTICE: &str = "Tried to go to <empty string>";

#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    #[error("Cannot edit this page: {0}")]
    NotEditable(String),
    #[error("Page store error: {0}")]
    Io(#[from] IoError),
}

/// Hands an external link destination to the host (usually a browser).
pub trait ExternalOpener {
    fn open(&self, target: &str) -> std::io::Result<()>;
}

impl<F> ExternalOpener for F
where
    F: Fn(&str) -> std::io::Result<()>,
{
    fn open(&self, target: &str) -> std::io::Result<()> {
        self(target)
    }
}

/// Requests arriving from the host window or shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Show(NavigationTarget),
    ListAllPages,
}

/// Everything needed to draw the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// `None` until the first navigation.
    pub page: Option<Page>,
    pub title: String,
    /// Storage key of a named page; `None` for special pages.
    pub key: Option<PageKey>,
    pub markup: String,
    pub render: RenderResult,
    pub editable: bool,
    pub notice: Option<String>,
}

impl ViewState {
    fn named(name: PageName, key: PageKey, markup: String, render: RenderResult) -> Self {
        Self {
            title: name.as_str().to_string(),
            page: Some(Page::Named(name)),
            key: Some(key),
            markup,
            render,
            editable: true,
            notice: None,
        }
    }

    fn all_pages(markup: String, render: RenderResult) -> Self {
        Self {
            title: Page::AllPages.title().to_string(),
            page: Some(Page::AllPages),
            key: None,
            markup,
            render,
            editable: false,
            notice: None,
        }
    }
}

/// Raw markup of the current page, handed to the host for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorView {
    pub title: String,
    pub markup: String,
}

pub struct Wiki<S, O, M = CommonMarkRenderer> {
    store: S,
    opener: O,
    renderer: LinkAwareRenderer<M>,
    home: PageName,
    state: ViewState,
}

impl<S: PageStore, O: ExternalOpener> Wiki<S, O> {
    pub fn new(store: S, opener: O) -> Self {
        Self::with_renderer(store, opener, LinkAwareRenderer::new())
    }
}

impl<S: PageStore, O: ExternalOpener, M: MarkdownRenderer> Wiki<S, O, M> {
    pub fn with_renderer(store: S, opener: O, renderer: LinkAwareRenderer<M>) -> Self {
        Self {
            store,
            opener,
            renderer,
            home: PageName::new(DEFAULT_PAGE),
            state: ViewState::default(),
        }
    }

    /// Use another page as home. Names without a storage key are ignored.
    pub fn with_home_page(mut self, name: impl Into<PageName>) -> Self {
        let name = name.into();
        if name.key().is_some() {
            self.home = name;
        } else {
            log::warn!("Ignoring home page {:?}: no usable page key", name.as_str());
        }
        self
    }

    pub fn home_page(&self) -> &PageName {
        &self.home
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Show a page by name or by index into the current internal link table.
    ///
    /// A target that does not resolve to a page key never reaches the store:
    /// the home page is shown instead, carrying a notice.
    pub fn go(&mut self, target: impl Into<NavigationTarget>) -> Result<&ViewState, WikiError> {
        let target = target.into();
        let name = match &target {
            NavigationTarget::ByName(name) => Some(PageName::new(name.as_str())),
            NavigationTarget::ByIndex(index) => {
                self.state.render.internal_target(*index).map(PageName::new)
            }
        };

        match name.and_then(|name| name.key().map(|key| (name, key))) {
            Some((name, key)) => self.show_named(name, key),
            None => {
                log::warn!("Navigation target {target:?} has no page key, going home");
                self.go_home_with_notice()
            }
        }
    }

    /// Show the current page again, re-reading it from the store.
    pub fn reload(&mut self) -> Result<&ViewState, WikiError> {
        match self.state.page.clone() {
            Some(Page::Named(name)) => {
                self.go(NavigationTarget::ByName(name.as_str().to_string()))
            }
            Some(Page::AllPages) => self.list_all_pages(),
            None => self.go(NavigationTarget::ByName(self.home.as_str().to_string())),
        }
    }

    pub fn edit(&self) -> Result<EditorView, WikiError> {
        if !self.state.editable {
            return Err(WikiError::NotEditable(self.state.title.clone()));
        }
        Ok(EditorView {
            title: self.state.title.clone(),
            markup: self.state.markup.clone(),
        })
    }

    /// Store new markup for the current page and show it again.
    ///
    /// Whitespace-only markup deletes the page.
    pub fn save(&mut self, markup: &str) -> Result<&ViewState, WikiError> {
        let key = match (&self.state.key, self.state.editable) {
            (Some(key), true) => key.clone(),
            _ => return Err(WikiError::NotEditable(self.state.title.clone())),
        };

        if markup.trim().is_empty() {
            let removed = self.store.remove(&key)?;
            log::info!("Deleted page {key} (existed: {removed})");
        } else {
            self.store.save(&key, markup)?;
            log::info!("Saved page {key} ({} bytes)", markup.len());
        }

        self.reload()
    }

    /// Leave the editor without saving.
    pub fn cancel(&mut self) -> Result<&ViewState, WikiError> {
        self.reload()
    }

    /// Open external link `index` of the current page. Failures are logged.
    pub fn open_external(&self, index: usize) {
        let Some(target) = self.state.render.external_target(index) else {
            log::warn!("No external link {index} on {:?}", self.state.title);
            return;
        };

        log::debug!("Opening external link {target}");
        if let Err(e) = self.opener.open(target) {
            log::warn!("Failed to open {target}: {e}");
        }
    }

    /// Act on a click on a bound anchor.
    pub fn click(&mut self, binding: LinkBinding) -> Result<&ViewState, WikiError> {
        match binding {
            LinkBinding::Navigate(index) => self.go(NavigationTarget::ByIndex(index)),
            LinkBinding::OpenExternal(index) => {
                self.open_external(index);
                Ok(&self.state)
            }
        }
    }

    /// Show the generated, read-only list of every stored page.
    pub fn list_all_pages(&mut self) -> Result<&ViewState, WikiError> {
        let markup: String = self
            .store
            .keys()?
            .iter()
            .map(|key| format!("* [[{key}]]\n"))
            .collect();

        let render = self.renderer.render(&markup);
        self.state = ViewState::all_pages(markup, render);
        log::debug!("Listing {} pages", self.state.render.internal_targets.len());
        Ok(&self.state)
    }

    pub fn dispatch(&mut self, command: HostCommand) -> Result<&ViewState, WikiError> {
        match command {
            HostCommand::Show(target) => self.go(target),
            HostCommand::ListAllPages => self.list_all_pages(),
        }
    }

    fn show_named(&mut self, name: PageName, key: PageKey) -> Result<&ViewState, WikiError> {
        log::debug!("Going to {:?} (key {key})", name.as_str());
        let markup = self.store.load(&key)?.unwrap_or_default();
        let render = self.renderer.render(&markup);
        self.state = ViewState::named(name, key, markup, render);
        Ok(&self.state)
    }

    fn go_home_with_notice(&mut self) -> Result<&ViewState, WikiError> {
        // with_home_page only accepts names with a key
        let key = self.home.key().unwrap_or_else(PageKey::default_page);
        self.show_named(self.home.clone(), key)?;
        self.state.notice = Some(INVALID_TARGET_NOTICE.to_string());
        Ok(&self.state)
    }
}
