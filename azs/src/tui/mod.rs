//! Terminal user interface
//!
//! Two-pane resource browser: tree on the left, context-dependent content
//! on the right, powerline status bar on top, popups composited over the
//! panes. Single-threaded reducer; all waiting happens in commands.

pub mod app;
pub mod events;
pub mod msg;
pub mod popups;
pub mod progress;
pub mod properties;
pub mod runner;
pub mod state;
pub mod tree;
pub mod views;

pub use app::App;
pub use events::{Event, EventHandler};
pub use msg::Message;
pub use runner::TuiRunner;
pub use state::{AppState, Focus, InterfaceMode, SearchMode, View};

use std::io::{self, Stdout};
use std::sync::Arc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use eyre::Result;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::cloud::{AzCli, CloudCli, DemoCli, Dispatcher};
use crate::config::Config;

/// Terminal type alias
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode
pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Run the application with the given configuration
pub async fn run(config: &Config) -> Result<()> {
    let cli: Arc<dyn CloudCli> = if config.demo {
        Arc::new(DemoCli::new())
    } else {
        Arc::new(AzCli::new(config))
    };
    let dispatcher = Dispatcher::new(cli);
    let app = App::new(dispatcher, config);

    let terminal = init()?;
    let mut runner = TuiRunner::new(terminal, app);
    let result = runner.run().await;
    restore()?;
    result
}
