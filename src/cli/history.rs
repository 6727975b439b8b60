// src/cli/history.rs
//! History command arguments

use clap::Args;

#[derive(Args)]
pub struct HistoryArgs {
    /// Subcommand (list, init, rollback, undo, redo) and optional range A or A-B
    #[arg(value_name = "COMMAND [RANGE]")]
    pub positional: Vec<String>,

    /// First transaction id
    #[arg(long)]
    pub from: Option<i64>,

    /// Last transaction id
    #[arg(long)]
    pub to: Option<i64>,

    /// Show the packages of each transaction
    #[arg(long)]
    pub info: bool,

    /// Oldest transaction first
    #[arg(long)]
    pub reverse: bool,
}
