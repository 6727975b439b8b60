// src/commands/history.rs
//! History command

use super::{load_config, GlobalOptions};
use crate::cli::HistoryArgs;
use anyhow::{Context, Result};
use pkgmgr::args::{HistoryCommand, HistoryRequest, HistoryRequestBuilder};
use pkgmgr::history::{HistoryDb, HistoryPlan, HistoryTransaction};
use pkgmgr::pool::read_records;
use pkgmgr::Error;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

pub fn build_request(args: &HistoryArgs) -> pkgmgr::Result<HistoryRequest> {
    let mut b = HistoryRequestBuilder::new();
    for token in &args.positional {
        b.positional(token)?;
    }
    if let Some(from) = args.from {
        b.from(from)?;
    }
    if let Some(to) = args.to {
        b.to(to)?;
    }
    b.info(args.info).reverse(args.reverse);
    b.build()
}

/// NEVRAs in the installed-package database
fn installed_set(path: &Path) -> Result<BTreeSet<String>> {
    let records = match read_records(path) {
        Ok(records) => records,
        Err(Error::FileNotFound(_)) => Vec::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };
    Ok(records
        .iter()
        .map(|r| format!("{}-{}.{}", r.name, r.evr(), r.arch))
        .collect())
}

pub fn cmd_history(opts: &GlobalOptions, args: &HistoryArgs) -> Result<()> {
    let req = build_request(args)?;
    let config = load_config(opts)?;
    let mut db = HistoryDb::open(&config.history_db)
        .with_context(|| format!("Failed to open {}", config.history_db.display()))?;
    let current = installed_set(&config.installed_db)?;

    match req.command {
        HistoryCommand::List => {
            let transactions = db.list(req.from, req.to, req.reverse)?;
            if opts.json {
                print_json(&transactions)?;
            } else {
                print_transactions(&transactions, req.info);
            }
        }
        HistoryCommand::Init => {
            let installed: Vec<String> = current.into_iter().collect();
            match db.init(&installed)? {
                Some(id) => println!(
                    "History initialized as transaction {} ({} packages)",
                    id,
                    installed.len()
                ),
                None => println!("History is already initialized"),
            }
        }
        HistoryCommand::Rollback => {
            info!("Computing rollback to transaction {}", req.to);
            print_plan(&db.rollback_plan(req.to, &current)?, opts.json)?;
        }
        HistoryCommand::Undo => {
            print_plan(&db.undo_plan(req.from, req.to, &current)?, opts.json)?;
        }
        HistoryCommand::Redo => {
            print_plan(&db.redo_plan(req.from, req.to, &current)?, opts.json)?;
        }
    }
    Ok(())
}

fn print_transactions(transactions: &[HistoryTransaction], info: bool) {
    if transactions.is_empty() {
        println!("No transactions recorded");
        return;
    }
    println!("{:>5}  {:<40} {:<16} {:>9}", "ID", "Command line", "Date", "Altered");
    for t in transactions {
        println!(
            "{:>5}  {:<40} {:<16} {:>9}",
            t.id,
            truncate(&t.cmdline, 40),
            t.local_time(),
            format!("+{}/-{}", t.added(), t.removed())
        );
        if info {
            for item in &t.items {
                println!("         {:<8} {}", item.action.as_str(), item.nevra);
            }
        }
    }
}

fn print_json(transactions: &[HistoryTransaction]) -> Result<()> {
    let list: Vec<_> = transactions
        .iter()
        .map(|t| {
            serde_json::json!({
                "id": t.id,
                "cmdline": t.cmdline,
                "timestamp": t.timestamp,
                "added": t.added(),
                "removed": t.removed(),
                "items": t.items.iter().map(|i| serde_json::json!({
                    "nevra": i.nevra,
                    "action": i.action.as_str(),
                })).collect::<Vec<_>>(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&list)?);
    Ok(())
}

fn print_plan(plan: &HistoryPlan, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({ "install": plan.install, "erase": plan.erase });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    if plan.is_empty() {
        println!("Nothing to do");
        return Ok(());
    }
    for nevra in &plan.install {
        println!("install {}", nevra);
    }
    for nevra in &plan.erase {
        println!("erase   {}", nevra);
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse(argv: &[&str]) -> pkgmgr::Result<HistoryRequest> {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Some(Commands::History(args)) => build_request(&args),
            _ => panic!("not a history command"),
        }
    }

    #[test]
    fn test_positional_range() {
        let req = parse(&["pkgmgr", "history", "list", "5-10"]).unwrap();
        assert_eq!((req.from, req.to), (5, 10));

        let req = parse(&["pkgmgr", "history", "undo", "7"]).unwrap();
        assert_eq!((req.from, req.to), (7, 7));
    }

    #[test]
    fn test_named_override() {
        let req = parse(&["pkgmgr", "history", "list", "5-10", "--from", "6", "--info"]).unwrap();
        assert_eq!((req.from, req.to), (6, 10));
        assert!(req.info);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("install a very long list", 10), "install...");
    }
}
