use std::path::PathBuf;

use arlo_core::AuditFlow;
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};

#[derive(Debug, Clone, Parser)]
#[command(name = "arlo", author, version, about = "Terminal client for Arlo risk-limiting audits")]
pub struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Server origin, overriding the config file.
    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub election: Option<String>,

    #[arg(long, value_enum)]
    pub flow: Option<FlowArg>,

    /// Client route to open, e.g. `/election/e1/setup`.
    #[arg(long)]
    pub route: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlowArg {
    Single,
    Multi,
}

impl From<FlowArg> for AuditFlow {
    fn from(flow: FlowArg) -> Self {
        match flow {
            FlowArg::Single => AuditFlow::Single,
            FlowArg::Multi => AuditFlow::Multi,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Load the audit once and print the current screen.
    Status,
    /// Refresh repeatedly, printing the screen after each refresh.
    Watch {
        #[arg(long, default_value_t = 5)]
        every: u64,
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    /// Reset the audit.
    Reset,
    /// Choose the sample size and wait until the server has drawn it.
    SampleSize {
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Write a printable sheet layout as JSON.
    Sheets {
        #[arg(value_enum)]
        kind: SheetKind,
        #[arg(long)]
        jurisdiction: String,
        #[arg(long)]
        round: String,
        /// 1-based round number for titles; defaults to the round's position.
        #[arg(long)]
        round_num: Option<u32>,
        /// Origin used in audit-board links; defaults to the server base URL.
        #[arg(long)]
        origin: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SheetKind {
    Labels,
    Placeholders,
    Credentials,
}

impl Cli {
    /// Applies command-line overrides on top of file settings.
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(election) = &self.election {
            config.election_id = Some(election.clone());
        }
        if let Some(flow) = self.flow {
            config.flow = flow.into();
        }
        config
    }
}
