use std::{fs::File, io::stdout, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, LevelFilter, WriteLogger};

use chapterbook::book::Book;
use chapterbook::clipboard::SystemClipboard;
use chapterbook::event_source::KeyboardEventSource;
use chapterbook::panic_handler;
use chapterbook::settings;
use chapterbook::storage::StateStore;
use chapterbook::theme::ThemeMode;
use chapterbook::{App, run_app_with_event_source};

#[derive(Parser, Debug)]
#[command(name = "chapterbook", version, about = "Read interactive guidebooks in the terminal")]
struct Args {
    /// Book file (.json, .yaml or .yml). The built-in sample is used when omitted.
    book: Option<PathBuf>,

    /// Where checklist progress and the theme are saved
    #[arg(long, value_name = "PATH", conflicts_with = "ephemeral")]
    state_file: Option<PathBuf>,

    /// Keep all state in memory for this session only
    #[arg(long)]
    ephemeral: bool,

    #[arg(long, value_name = "PATH", default_value = "chapterbook.log")]
    log_file: PathBuf,

    /// Force a theme for this session
    #[arg(long, value_parser = parse_theme)]
    theme: Option<ThemeMode>,
}

fn parse_theme(value: &str) -> Result<ThemeMode, String> {
    ThemeMode::parse(value).ok_or_else(|| format!("unknown theme '{value}', use dark or light"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    WriteLogger::init(
        LevelFilter::Debug,
        Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("cannot create log file {}", args.log_file.display()))?,
    )?;

    info!("Starting chapterbook");
    settings::load_settings();

    let book = match &args.book {
        Some(path) => Book::load_from_file(path)?,
        None => Book::sample()?,
    };

    let storage = if args.ephemeral {
        StateStore::ephemeral()
    } else {
        let path = args.state_file.clone().or_else(settings::default_state_path);
        if path.is_none() {
            error!("Could not determine data directory, progress will not be saved");
        }
        StateStore::load_or_ephemeral(path.as_deref())
    };

    panic_handler::initialize_panic_handler();

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let current = settings::current();
    let mut app = App::with_settings(
        book,
        storage,
        Box::new(SystemClipboard),
        &current,
        args.theme,
    );
    let mut event_source = KeyboardEventSource;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut event_source);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down chapterbook");
    Ok(())
}
