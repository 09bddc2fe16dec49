use std::env;
use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use log::LevelFilter;

use vellum::app::App;
use vellum::config::Config;
use vellum::dialogs::DialogService;
use vellum::editor::HeadlessEditor;

/// Headless pipeline runner: open a document into the in-memory editor,
/// then save it back, externalizing any embedded images as sibling files.
/// With an output path the document is re-based and written there instead.
#[tokio::main]
async fn main() -> Result<()> {
    let mut logger = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(LevelFilter::Info);
        logger.filter_module("vellum", LevelFilter::Debug);
    }
    logger.init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: vellum <document.html> [output.html]");
        std::process::exit(2);
    }
    let input = PathBuf::from(&args[1]);
    let output = args.get(2).map(PathBuf::from);
    let save_in_place = output.is_none();

    let config = Config::load().await?;
    let dialogs = BatchDialogs {
        open_path: Some(input),
        save_path: output,
    };
    let mut app = App::new(config, Box::new(HeadlessEditor::new()), Box::new(dialogs));

    let opened = app.open_document().await?;
    log::info!("{}", opened);

    let saved = if save_in_place {
        app.save_document().await?
    } else {
        app.save_document_as().await?
    };
    println!("{}", saved);

    Ok(())
}

/// Scripted dialog service for the headless runner: paths come from the
/// command line and confirmations auto-approve.
struct BatchDialogs {
    open_path: Option<PathBuf>,
    save_path: Option<PathBuf>,
}

#[async_trait]
impl DialogService for BatchDialogs {
    async fn pick_open_path(&mut self) -> Option<PathBuf> {
        self.open_path.take()
    }

    async fn pick_save_path(&mut self) -> Option<PathBuf> {
        self.save_path.take()
    }

    async fn pick_image_path(&mut self) -> Option<PathBuf> {
        None
    }

    async fn confirm_discard(&mut self, _document_name: &str) -> bool {
        true
    }
}
