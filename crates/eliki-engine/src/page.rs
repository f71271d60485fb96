use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Page shown at startup and whenever navigation has nowhere valid to go.
pub const DEFAULT_PAGE: &str = "Index";
/// Title of the generated page listing every stored page.
pub const ALL_PAGES_TITLE: &str = "List All Pages";
/// Longest key, in bytes, a page is stored under.
pub const MAX_KEY_LEN: usize = 255;

/// A user-supplied page name, as written inside `[[...]]` or given by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageName(String);

impl PageName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage key of this page, `None` when nothing filesystem-safe remains.
    pub fn key(&self) -> Option<PageKey> {
        PageKey::from_name(&self.0)
    }
}

impl fmt::Display for PageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PageName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Filesystem-safe, non-empty identifier a page is stored under.
///
/// Derived as `sanitize_filename(lowercase(name))`, so names differing only in
/// case (or in stripped characters) share one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey(String);

impl PageKey {
    pub fn from_name(name: &str) -> Option<Self> {
        let key = sanitize_filename(&name.to_lowercase());
        if key.is_empty() { None } else { Some(Self(key)) }
    }

    /// Key of [`DEFAULT_PAGE`].
    pub fn default_page() -> Self {
        Self(DEFAULT_PAGE.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a navigation request points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// A literal page name.
    ByName(String),
    /// Position in the internal link table of the page currently shown.
    ByIndex(usize),
}

impl From<&str> for NavigationTarget {
    fn from(name: &str) -> Self {
        NavigationTarget::ByName(name.to_string())
    }
}

impl From<String> for NavigationTarget {
    fn from(name: String) -> Self {
        NavigationTarget::ByName(name)
    }
}

impl From<usize> for NavigationTarget {
    fn from(index: usize) -> Self {
        NavigationTarget::ByIndex(index)
    }
}

/// What the view is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    /// A stored (or not yet created) page.
    Named(PageName),
    /// The generated list of every stored page.
    AllPages,
}

impl Page {
    pub fn title(&self) -> &str {
        match self {
            Page::Named(name) => name.as_str(),
            Page::AllPages => ALL_PAGES_TITLE,
        }
    }
}

struct FilenameRules {
    illegal: Regex,
    control: Regex,
    reserved: Regex,
    windows_reserved: Regex,
    windows_trailing: Regex,
}

fn filename_rules() -> &'static FilenameRules {
    static RULES: OnceLock<FilenameRules> = OnceLock::new();
    RULES.get_or_init(|| FilenameRules {
        illegal: Regex::new(r#"[/?<>\\:*|"]"#).expect("Invalid illegal-character regex"),
        control: Regex::new(r"[\x00-\x1f\x80-\x9f]").expect("Invalid control-character regex"),
        reserved: Regex::new(r"^\.+$").expect("Invalid reserved-name regex"),
        windows_reserved: Regex::new(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$")
            .expect("Invalid windows reserved-name regex"),
        windows_trailing: Regex::new(r"[. ]+$").expect("Invalid trailing regex"),
    })
}

/// Reduces arbitrary text to a name that is safe as a single file name on
/// common filesystems. May return an empty string.
pub fn sanitize_filename(input: &str) -> String {
    let rules = filename_rules();

    let sanitized = rules.illegal.replace_all(input, "");
    let sanitized = rules.control.replace_all(&sanitized, "");
    let sanitized = rules.reserved.replace(&sanitized, "");
    let sanitized = rules.windows_reserved.replace(&sanitized, "");
    let sanitized = rules.windows_trailing.replace(&sanitized, "");

    truncate_utf8(&sanitized, MAX_KEY_LEN).to_string()
}

fn truncate_utf8(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
