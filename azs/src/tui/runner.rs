//! TUI runner - owns the terminal and the main loop
//!
//! One reducer invocation at a time: the loop draws, waits for either a
//! terminal event or a command's terminal message, feeds it to the
//! reducer, and spawns whatever follow-up commands come back. Commands
//! run as detached tokio tasks; each ends by pushing exactly one message
//! onto the channel, consumed here in FIFO order.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use eyre::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::app::App;
use super::events::{Event, EventHandler};
use super::msg::Message;
use super::views;
use super::Tui;
use crate::cloud::{CloudMsg, Command};

/// Tick cadence; also drives progress simulation
const TICK_RATE: Duration = Duration::from_millis(250);

/// How long quit waits for outstanding commands before dropping them
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub struct TuiRunner {
    app: App,
    terminal: Tui,
    event_handler: EventHandler,
    msg_tx: mpsc::UnboundedSender<CloudMsg>,
    msg_rx: mpsc::UnboundedReceiver<CloudMsg>,
    /// Commands spawned but not yet terminal
    outstanding: Arc<AtomicUsize>,
}

impl TuiRunner {
    pub fn new(terminal: Tui, app: App) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        Self {
            app,
            terminal,
            event_handler: EventHandler::new(TICK_RATE),
            msg_tx,
            msg_rx,
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Spawn commands off the main scheduler. Each delivers exactly one
    /// message back; send failure just means we are shutting down.
    fn spawn_commands(&self, commands: Vec<Command>) {
        for command in commands {
            let tx = self.msg_tx.clone();
            let outstanding = self.outstanding.clone();
            outstanding.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let msg = command.await;
                outstanding.fetch_sub(1, Ordering::SeqCst);
                let _ = tx.send(msg);
            });
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let size = self.terminal.size()?;
        self.app.state_mut().width = size.width;
        self.app.state_mut().height = size.height;

        let init = self.app.init_commands();
        self.spawn_commands(init);

        info!("entering main loop");
        loop {
            self.terminal.draw(|frame| views::render(self.app.state(), frame))?;

            tokio::select! {
                event = self.event_handler.next() => {
                    let msg = match event? {
                        Event::Key(key) => Message::Key(key),
                        Event::Resize(w, h) => Message::Resize(w, h),
                        Event::Tick => Message::Tick,
                    };
                    let commands = self.app.update(msg);
                    self.spawn_commands(commands);
                }
                Some(cloud) = self.msg_rx.recv() => {
                    let commands = self.app.update(Message::Cloud(cloud));
                    self.spawn_commands(commands);
                }
            }

            if self.app.state().should_quit {
                break;
            }
        }

        self.shutdown().await;
        info!("main loop exited");
        Ok(())
    }

    /// Best-effort shutdown: stop taking input, give outstanding commands
    /// a short grace window. Unfinished children are reaped by
    /// kill-on-drop when their tasks are dropped with the runtime.
    async fn shutdown(&mut self) {
        let deadline = Instant::now() + SHUTDOWN_GRACE;
        while self.outstanding.load(Ordering::SeqCst) > 0 && Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(100), self.msg_rx.recv()).await {
                Ok(Some(msg)) => {
                    debug!("draining terminal message during shutdown");
                    // Follow-up commands are intentionally dropped
                    let _ = self.app.update(Message::Cloud(msg));
                }
                Ok(None) => break,
                Err(_) => {}
            }
        }
        let left = self.outstanding.load(Ordering::SeqCst);
        if left > 0 {
            debug!(left, "shutdown grace expired with commands outstanding");
        }
    }
}
