// src/history/mod.rs

//! Transaction history
//!
//! Every recorded transaction is a list of NEVRAs installed or erased. The
//! installed set at any transaction id is the replay of all transactions up to
//! it, which is what rollback, undo and redo plans are computed from. Plans are
//! only computed here; executing them belongs to the installer.

mod schema;

pub use schema::{get_schema_version, migrate, SCHEMA_VERSION};

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Command line recorded for the baseline transaction
pub const INIT_CMDLINE: &str = "history init";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Install,
    Erase,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Install => "install",
            HistoryAction::Erase => "erase",
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "install" => Ok(HistoryAction::Install),
            "erase" => Ok(HistoryAction::Erase),
            _ => Err(Error::ParseError(format!("invalid history action: {}", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub nevra: String,
    pub action: HistoryAction,
}

impl HistoryItem {
    pub fn install(nevra: impl Into<String>) -> Self {
        Self {
            nevra: nevra.into(),
            action: HistoryAction::Install,
        }
    }

    pub fn erase(nevra: impl Into<String>) -> Self {
        Self {
            nevra: nevra.into(),
            action: HistoryAction::Erase,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTransaction {
    pub id: i64,
    pub cmdline: String,
    /// Unix seconds
    pub timestamp: i64,
    pub items: Vec<HistoryItem>,
}

impl HistoryTransaction {
    pub fn added(&self) -> usize {
        self.count(HistoryAction::Install)
    }

    pub fn removed(&self) -> usize {
        self.count(HistoryAction::Erase)
    }

    fn count(&self, action: HistoryAction) -> usize {
        self.items.iter().filter(|i| i.action == action).count()
    }

    /// Local time of the transaction, `YYYY-MM-DD HH:MM`
    pub fn local_time(&self) -> String {
        match DateTime::from_timestamp(self.timestamp, 0) {
            Some(utc) => utc
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            None => self.timestamp.to_string(),
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            cmdline: row.get(1)?,
            timestamp: row.get(2)?,
            items: Vec::new(),
        })
    }
}

/// Packages to install and erase to reach a target state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPlan {
    pub install: Vec<String>,
    pub erase: Vec<String>,
}

impl HistoryPlan {
    pub fn is_empty(&self) -> bool {
        self.install.is_empty() && self.erase.is_empty()
    }
}

/// SQLite-backed history store
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open (creating if needed) the database at `path` and migrate it
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| Error::system(format!("Failed to create {}", parent.display()), e))?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Record the currently installed set as a baseline when history is empty
    ///
    /// Returns the new transaction id, or `None` if history already exists.
    pub fn init(&mut self, installed: &[String]) -> Result<Option<i64>> {
        if self.last_id()?.is_some() {
            debug!("History already initialized");
            return Ok(None);
        }
        let items: Vec<_> = installed.iter().map(HistoryItem::install).collect();
        let id = self.record(INIT_CMDLINE, &items)?;
        info!("History initialized with {} packages", items.len());
        Ok(Some(id))
    }

    /// Append a transaction
    pub fn record(&mut self, cmdline: &str, items: &[HistoryItem]) -> Result<i64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO transactions (cmdline, timestamp) VALUES (?1, ?2)",
            params![cmdline, chrono::Utc::now().timestamp()],
        )?;
        let id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO transaction_items (trans_id, nevra, action) VALUES (?1, ?2, ?3)",
            )?;
            for item in items {
                stmt.execute(params![id, &item.nevra, item.action.as_str()])?;
            }
        }
        tx.commit()?;
        debug!("Recorded transaction {} ({} items)", id, items.len());
        Ok(id)
    }

    pub fn last_id(&self) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row("SELECT MAX(id) FROM transactions", [], |row| {
                row.get::<_, Option<i64>>(0)
            })?;
        Ok(id)
    }

    fn ensure_exists(&self, id: i64) -> Result<()> {
        let found = self
            .conn
            .query_row("SELECT id FROM transactions WHERE id = ?1", [id], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        match found {
            Some(_) => Ok(()),
            None => Err(Error::NoMatch(format!("transaction {}", id))),
        }
    }

    fn check_range(&self, from: i64, to: i64) -> Result<()> {
        if from > to {
            return Err(Error::InvalidParameter(format!(
                "transaction range {}-{} is reversed",
                from, to
            )));
        }
        self.ensure_exists(from)?;
        self.ensure_exists(to)
    }

    fn items(&self, id: i64) -> Result<Vec<HistoryItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT nevra, action FROM transaction_items WHERE trans_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map([id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(nevra, action)| {
                Ok(HistoryItem {
                    nevra,
                    action: action.parse()?,
                })
            })
            .collect()
    }

    /// Transactions in `[from, to]`, newest first unless `reverse`
    ///
    /// `from == 0` lists everything; `to == 0` means just `from`.
    pub fn list(&self, from: i64, to: i64, reverse: bool) -> Result<Vec<HistoryTransaction>> {
        let (lo, hi) = if from == 0 {
            (1, i64::MAX)
        } else {
            let to = if to == 0 { from } else { to };
            self.check_range(from, to)?;
            (from, to)
        };
        let order = if reverse { "ASC" } else { "DESC" };

        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, cmdline, timestamp FROM transactions
             WHERE id BETWEEN ?1 AND ?2 ORDER BY id {}",
            order
        ))?;
        let mut transactions = stmt
            .query_map(params![lo, hi], HistoryTransaction::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for trans in &mut transactions {
            trans.items = self.items(trans.id)?;
        }
        Ok(transactions)
    }

    /// Installed set right after transaction `id`; 0 is the empty state
    pub fn state_at(&self, id: i64) -> Result<BTreeSet<String>> {
        if id != 0 {
            self.ensure_exists(id)?;
        }
        let mut stmt = self.conn.prepare(
            "SELECT nevra, action FROM transaction_items
             WHERE trans_id <= ?1 ORDER BY trans_id, rowid",
        )?;
        let rows = stmt
            .query_map([id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut state = BTreeSet::new();
        for (nevra, action) in rows {
            match action.parse::<HistoryAction>()? {
                HistoryAction::Install => {
                    state.insert(nevra);
                }
                HistoryAction::Erase => {
                    state.remove(&nevra);
                }
            }
        }
        Ok(state)
    }

    /// Return to the state right after transaction `to`
    pub fn rollback_plan(&self, to: i64, current: &BTreeSet<String>) -> Result<HistoryPlan> {
        let target = self.state_at(to)?;
        Ok(HistoryPlan {
            install: target.difference(current).cloned().collect(),
            erase: current.difference(&target).cloned().collect(),
        })
    }

    /// Reverse the net effect of transactions `from..=to`
    pub fn undo_plan(&self, from: i64, to: i64, current: &BTreeSet<String>) -> Result<HistoryPlan> {
        let (added, removed) = self.net_change(from, to)?;
        Ok(HistoryPlan {
            install: removed.difference(current).cloned().collect(),
            erase: added.intersection(current).cloned().collect(),
        })
    }

    /// Re-apply the net effect of transactions `from..=to`
    pub fn redo_plan(&self, from: i64, to: i64, current: &BTreeSet<String>) -> Result<HistoryPlan> {
        let (added, removed) = self.net_change(from, to)?;
        Ok(HistoryPlan {
            install: added.difference(current).cloned().collect(),
            erase: removed.intersection(current).cloned().collect(),
        })
    }

    fn net_change(&self, from: i64, to: i64) -> Result<(BTreeSet<String>, BTreeSet<String>)> {
        self.check_range(from, to)?;
        let before = self.state_at(self.previous_id(from)?)?;
        let after = self.state_at(to)?;
        let added = after.difference(&before).cloned().collect();
        let removed = before.difference(&after).cloned().collect();
        Ok((added, removed))
    }

    /// Id of the transaction preceding `id`, 0 if none
    fn previous_id(&self, id: i64) -> Result<i64> {
        let prev = self.conn.query_row(
            "SELECT MAX(id) FROM transactions WHERE id < ?1",
            [id],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(prev.unwrap_or(0))
    }
}
