//! Cloud access layer
//!
//! Everything that talks to the outside world lives here: the bounded
//! process runner, the `az` CLI wrapper behind the [`CloudCli`] trait,
//! the demo dataset, and the command dispatcher that turns logical
//! operations into single-terminal-message units of work.

pub mod cli;
pub mod commands;
pub mod demo;
pub mod error;
pub mod process;
pub mod types;

pub use cli::{AzCli, CloudCli};
pub use commands::{CloudMsg, Command, Dispatcher};
pub use demo::DemoCli;
pub use error::CloudError;
pub use types::{
    Blob, Container, Health, Organization, Pipeline, Pod, Project, Resource, ResourceGroup, SecretItem, Subscription,
    ToolOp,
};
