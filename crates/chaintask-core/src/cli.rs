use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

/// `TITLE:BODY` pair given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPair {
    pub title: String,
    pub body: String,
}

impl std::str::FromStr for TaskPair {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (title, body) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("expected TITLE:BODY, got: {s}"))?;
        Ok(Self {
            title: title.to_string(),
            body: body.to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "chaintask",
    version,
    about = "chaintask: task list client for the on-chain task ledger",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// TOML config file.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Config override, e.g. `--set session.restore=false`.
    #[arg(
        long = "set",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub overrides: Vec<KeyVal>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a session against an in-process ledger and print the resulting task list.
    Simulate(SimulateArgs),
    /// Print the effective configuration.
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Wallet account used for the session.
    #[arg(long, default_value = "0xa11ce00000000000000000000000000000000001")]
    pub account: String,

    /// Task already on the ledger before the session starts.
    #[arg(
        long = "seed",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<TaskPair>()),
        action = ArgAction::Append
    )]
    pub seed: Vec<TaskPair>,

    /// Task to submit through the draft form.
    #[arg(
        long = "add",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<TaskPair>()),
        action = ArgAction::Append
    )]
    pub add: Vec<TaskPair>,

    /// Task id to delete.
    #[arg(long = "delete", action = ArgAction::Append)]
    pub delete: Vec<u64>,

    /// Treat the account as already authorized, so start-up restores the session
    /// without a prompt.
    #[arg(long)]
    pub authorized: bool,

    /// Decline the account prompt.
    #[arg(long)]
    pub decline_connect: bool,

    /// Decline every signature request.
    #[arg(long)]
    pub reject_signatures: bool,

    /// Make every confirmation revert.
    #[arg(long)]
    pub revert: bool,

    /// Fail every `getMyTask` read.
    #[arg(long)]
    pub fail_reads: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}
