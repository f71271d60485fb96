use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eliki_config::{Config, RawHtml};
use eliki_engine::{
    ExternalOpener, FsPageStore, HostCommand, HtmlPolicy, LinkAwareRenderer, NavigationTarget,
    PageStore, ViewState, Wiki, document_html, editor_html, page_html,
};
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "eliki", version, about = "A small personal wiki with [[wiki links]]")]
struct Cli {
    /// Pages directory, overriding the config file
    #[arg(long, global = true)]
    pages: Option<PathBuf>,

    /// Config file to read instead of ~/.config/eliki/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Render a page as a full HTML document
    Show {
        /// Page name (home page when omitted)
        page: Option<String>,

        /// Print the internal and external link tables instead
        #[arg(long)]
        links: bool,
    },
    /// Render a page, then follow one of its internal links
    Follow { page: String, index: usize },
    /// Render the list of every stored page
    List,
    /// Print the editor view of a page
    Edit { page: String },
    /// Save page markup read from a file or stdin
    Save {
        page: String,

        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Open one of a page's external links in the system browser
    Open { page: String, index: usize },
}

fn html_policy(raw_html: RawHtml) -> HtmlPolicy {
    match raw_html {
        RawHtml::Escape => HtmlPolicy::Escape,
        RawHtml::Sanitize => HtmlPolicy::Sanitize,
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?
            .with_context(|| format!("Config file not found: {}", path.display()))?,
        None => Config::load_or_default()?,
    };

    if let Some(pages) = &cli.pages {
        config.pages_path = pages.clone();
    }

    Ok(config)
}

/// URL schemes handed to the system browser.
const OPENABLE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

fn is_openable(target: &str) -> bool {
    target.split_once(':').is_some_and(|(scheme, _)| {
        OPENABLE_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str())
    })
}

fn open_in_browser(target: &str) -> io::Result<()> {
    if !is_openable(target) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Not opening {target}: only http, https and mailto links are opened"),
        ));
    }
    open::that(target)
}

fn read_markup(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut markup = String::new();
            io::stdin()
                .read_to_string(&mut markup)
                .context("Failed to read markup from stdin")?;
            Ok(markup)
        }
    }
}

fn write_document(out: &mut impl Write, state: &ViewState) -> Result<()> {
    if let Some(notice) = &state.notice {
        log::warn!("{notice}");
    }
    out.write_all(document_html(&state.title, &page_html(state)).as_bytes())?;
    Ok(())
}

fn write_links(out: &mut impl Write, state: &ViewState) -> Result<()> {
    writeln!(out, "internal:")?;
    for (i, target) in state.render.internal_targets.iter().enumerate() {
        writeln!(out, "  {i}\t{target}")?;
    }
    writeln!(out, "external:")?;
    for (j, target) in state.render.external_targets.iter().enumerate() {
        writeln!(out, "  {j}\t{target}")?;
    }
    Ok(())
}

/// Run one host command against the wiki, writing the resulting view to `out`.
fn run<S, O>(wiki: &mut Wiki<S, O>, command: Commands, out: &mut impl Write) -> Result<()>
where
    S: PageStore,
    O: ExternalOpener,
{
    match command {
        Commands::Show { page, links } => {
            let target = page.unwrap_or_else(|| wiki.home_page().to_string());
            let state = wiki.dispatch(HostCommand::Show(NavigationTarget::ByName(target)))?;
            if links {
                write_links(out, state)?;
            } else {
                write_document(out, state)?;
            }
        }
        Commands::Follow { page, index } => {
            wiki.go(page)?;
            let state = wiki.go(NavigationTarget::ByIndex(index))?;
            write_document(out, state)?;
        }
        Commands::List => {
            let state = wiki.dispatch(HostCommand::ListAllPages)?;
            write_document(out, state)?;
        }
        Commands::Edit { page } => {
            wiki.go(page)?;
            let editor = wiki.edit()?;
            let title = format!("Editing {}", editor.title);
            out.write_all(document_html(&title, &editor_html(&editor)).as_bytes())?;
        }
        Commands::Save { page, file } => {
            let markup = read_markup(file.as_ref())?;
            wiki.go(page)?;
            let state = wiki.save(&markup)?;
            write_document(out, state)?;
        }
        Commands::Open { page, index } => {
            wiki.go(page)?;
            wiki.open_external(index);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    log::debug!("Using pages directory {}", config.pages_path.display());

    let store = FsPageStore::open(&config.pages_path).with_context(|| {
        format!(
            "Failed to open pages directory {}",
            config.pages_path.display()
        )
    })?;
    let renderer = LinkAwareRenderer::with_policy(html_policy(config.raw_html));
    let mut wiki =
        Wiki::with_renderer(store, open_in_browser, renderer).with_home_page(config.home_page);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&mut wiki, cli.command, &mut out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use eliki_engine::MemoryPageStore;
    use pretty_assertions::assert_eq;

    fn no_open(_: &str) -> io::Result<()> {
        Ok(())
    }

    type TestWiki = Wiki<MemoryPageStore, fn(&str) -> io::Result<()>>;

    fn wiki(pages: &[(&str, &str)]) -> TestWiki {
        Wiki::new(
            MemoryPageStore::with_pages(pages.iter().copied()),
            no_open as fn(&str) -> io::Result<()>,
        )
    }

    fn output(wiki: &mut TestWiki, args: &[&str]) -> String {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        run(wiki, cli.command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["eliki", "show", "Home", "--pages", "/tmp/pages"]).unwrap();
        assert_eq!(cli.pages, Some(PathBuf::from("/tmp/pages")));
        assert_eq!(
            cli.command,
            Commands::Show {
                page: Some("Home".to_string()),
                links: false
            }
        );
    }

    #[test]
    fn parses_follow_index() {
        let cli = Cli::try_parse_from(["eliki", "follow", "Index", "2"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Follow {
                page: "Index".to_string(),
                index: 2
            }
        );
        assert!(Cli::try_parse_from(["eliki", "follow", "Index", "two"]).is_err());
    }

    #[test]
    fn only_web_and_mail_links_are_opened() {
        assert!(is_openable("http://example.com"));
        assert!(is_openable("HTTPS://example.com/a%20b"));
        assert!(is_openable("mailto:me@example.com"));

        assert!(!is_openable("file:///etc/passwd"));
        assert!(!is_openable("javascript:alert(1)"));
        assert!(!is_openable("/usr/bin/env"));
        assert!(!is_openable("relative/page.html"));
    }

    #[test]
    fn local_destinations_are_refused_before_opening() {
        let err = open_in_browser("file:///etc/passwd").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let err = open_in_browser("C:\\Windows\\notepad.exe").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn show_defaults_to_home_page() {
        let mut wiki = wiki(&[("Index", "Welcome")]);
        let html = output(&mut wiki, &["eliki", "show"]);
        assert!(html.contains("<span id=\"title\">Index</span>"));
        assert!(html.contains("<p>Welcome</p>"));
    }

    #[test]
    fn show_links_prints_both_tables() {
        let mut wiki = wiki(&[("Index", "[[A]] [[B]] <http://example.com>")]);
        let text = output(&mut wiki, &["eliki", "show", "Index", "--links"]);
        assert_eq!(
            text,
            "internal:\n  0\tA\n  1\tB\nexternal:\n  0\thttp://example.com\n"
        );
    }

    #[test]
    fn follow_goes_through_the_link_table() {
        let mut wiki = wiki(&[("Index", "[[Other]]"), ("Other", "over here")]);
        let html = output(&mut wiki, &["eliki", "follow", "Index", "0"]);
        assert!(html.contains("<p>over here</p>"));
    }

    #[test]
    fn list_is_special() {
        let mut wiki = wiki(&[("b", "2"), ("a", "1")]);
        let html = output(&mut wiki, &["eliki", "list"]);
        assert!(html.contains("<h1>Special: <span id=\"title\">List All Pages</span></h1>"));
    }

    #[test]
    fn edit_prints_escaped_markup() {
        let mut wiki = wiki(&[("Index", "a <b> c")]);
        let html = output(&mut wiki, &["eliki", "edit", "Index"]);
        assert!(html.contains("<textarea id=\"editor\">a &lt;b&gt; c</textarea>"));
    }

    #[test]
    fn save_reads_markup_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("page.md");
        std::fs::write(&file, "fresh [[Link]]").unwrap();

        let mut wiki = wiki(&[]);
        let file_arg = file.to_string_lossy().to_string();
        let html = output(&mut wiki, &["eliki", "save", "Notes", "--file", &file_arg]);

        assert!(html.contains("data-internal=\"0\""));
        assert_eq!(wiki.state().markup, "fresh [[Link]]");
    }

    #[test]
    fn config_file_and_pages_override() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "pages_path = \"/from/config\"\nhome_page = \"Start\"\nraw_html = \"sanitize\"\n",
        )
        .unwrap();
        let config_arg = config_file.to_string_lossy().to_string();

        let cli = Cli::try_parse_from(["eliki", "--config", &config_arg, "list"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.pages_path, PathBuf::from("/from/config"));
        assert_eq!(config.home_page, "Start");
        assert_eq!(html_policy(config.raw_html), HtmlPolicy::Sanitize);

        let cli =
            Cli::try_parse_from(["eliki", "--config", &config_arg, "--pages", "/cli", "list"])
                .unwrap();
        assert_eq!(load_config(&cli).unwrap().pages_path, PathBuf::from("/cli"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let cli =
            Cli::try_parse_from(["eliki", "--config", "/no/such/config.toml", "list"]).unwrap();
        assert!(load_config(&cli).is_err());
    }
}
