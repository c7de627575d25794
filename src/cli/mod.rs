pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "tagscroll")]
#[command(about = "Search a booru-style post API by tags and auto-scroll the results", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/tagscroll/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Write logs to this file (the TUI owns the terminal)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Direct API endpoint, overriding the config file
    #[arg(long, env = "TAGSCROLL_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Relay prefix to try after the direct endpoint (repeatable, replaces configured relays)
    #[arg(long = "relay", global = true)]
    pub relays: Vec<String>,

    /// Only use the direct endpoint
    #[arg(long, global = true, conflicts_with = "relays")]
    pub no_relays: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search posts and print them
    Search {
        /// Tags to search for
        #[arg(required = true)]
        tags: Vec<String>,

        /// Print normalized posts as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the candidate URLs a search would try, in order
    Endpoints {
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Launch the TUI, optionally searching right away
    Tui { tags: Vec<String> },
    /// Run the local relay server
    Proxy {
        /// Address to bind
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Load the config file this invocation points at.
    pub fn load_config(&self) -> crate::app::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if self.no_relays {
            config.api = config.api.direct_only();
        } else if !self.relays.is_empty() {
            config.api.relays = self.relays.clone();
        }
        if let Commands::Proxy { bind, port } = &self.command {
            if let Some(bind) = bind {
                config.proxy.bind = bind.clone();
            }
            if let Some(port) = port {
                config.proxy.port = *port;
            }
        }
    }
}
