//! The single message stream feeding the reducer
//!
//! Everything that can change state arrives here: input events, terminal
//! resizes, timer ticks, and the terminal messages of dispatched commands.

use crossterm::event::KeyEvent;

use crate::cloud::CloudMsg;

/// Sum type consumed by [`crate::tui::App::update`]
#[derive(Debug)]
pub enum Message {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Fixed-cadence timer tick; drives spinners and progress estimates
    Tick,
    /// Terminal message of a dispatched command
    Cloud(CloudMsg),
}
