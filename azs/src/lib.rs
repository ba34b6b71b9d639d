//! azscope - interactive terminal browser for Azure resources
//!
//! The interesting machinery is the interactive core: a single-threaded
//! message loop coordinating a focus-aware two-pane view machine with
//! back-navigation and popup overlays, a search engine (the `resq`
//! crate) with filters, wildcards, scoring and suggestions, and an async
//! command dispatcher that fans bounded-deadline `az` invocations out to
//! tokio tasks and streams their single terminal message back into the
//! reducer.
//!
//! # Modules
//!
//! - [`cloud`] - process runner, `az` wrapper, demo dataset, dispatcher
//! - [`adapters`] - per-resource-family keymaps and renderers
//! - [`ai`] - opaque text-in/text-out analysis provider
//! - [`tui`] - state, reducer, tree, popups, renderer, main loop
//! - [`config`] - environment-driven settings

pub mod adapters;
pub mod ai;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod tui;

pub use cloud::{AzCli, CloudCli, CloudError, CloudMsg, Command, DemoCli, Dispatcher, Resource, Subscription};
pub use config::Config;
pub use tui::{App, AppState, Focus, Message, SearchMode, TuiRunner, View};
