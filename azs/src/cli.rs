//! Command-line interface

use clap::Parser;

use crate::config::Config;

/// Interactive terminal browser for Azure resources
#[derive(Debug, Parser)]
#[command(name = "azs", version, about, long_about = None)]
pub struct Cli {
    /// Subscription id or name to start in
    #[arg(long)]
    pub subscription: Option<String>,

    /// Tenant id override
    #[arg(long)]
    pub tenant: Option<String>,

    /// Browse the built-in demo dataset instead of calling the cloud CLI
    #[arg(long)]
    pub demo: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Overlay CLI flags on top of the environment-derived config
    pub fn apply(&self, config: &mut Config) {
        if self.subscription.is_some() {
            config.subscription = self.subscription.clone();
        }
        if self.tenant.is_some() {
            config.tenant = self.tenant.clone();
        }
        if self.demo {
            config.demo = true;
        }
        if self.log_level.is_some() {
            config.log_level = self.log_level.clone();
        }
    }
}
