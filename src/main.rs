use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use std::io;
use tracing::{error, info};

mod config;
mod logging;
mod service;
mod storage;
mod tui;

use config::Config;
use service::ChannelStore;
use storage::gateway::PersistenceGateway;
use storage::kv::FileStore;
use tui::app::App;

fn main() -> Result<()> {
    let config = Config::from_env();
    logging::init(&config)?;

    let file_store = FileStore::new(&config.data_dir);
    file_store.initialize()?;
    info!(data_dir = %file_store.dir().display(), "starting chantags");
    let store = ChannelStore::open(PersistenceGateway::new(file_store))?;

    // Setup terminal
    enable_raw_mode().map_err(|e| anyhow::anyhow!("Failed to enable raw mode: {}. Make sure you're running in a terminal.", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(|e| anyhow::anyhow!("Failed to enter alternate screen: {}. Make sure you're running in a terminal.", e))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| anyhow::anyhow!("Failed to create terminal: {}. Make sure you're running in a terminal.", e))?;

    let mut app = App::new(store);
    let result = run(&mut terminal, &mut app, event::read);

    // Restore terminal even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    match &result {
        Ok(()) => info!("chantags exited"),
        Err(e) => error!("chantags stopped: {e:#}"),
    }
    result
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut next_event: impl FnMut() -> io::Result<Event>,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|f| app.render(f))?;

        if let Event::Key(key) = next_event()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key.code, key.modifiers);
            }
        }
    }
    Ok(())
}
