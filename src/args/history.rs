// src/args/history.rs

//! `history` request

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// History subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryCommand {
    #[default]
    List,
    Init,
    Rollback,
    Undo,
    Redo,
}

impl HistoryCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryCommand::List => "list",
            HistoryCommand::Init => "init",
            HistoryCommand::Rollback => "rollback",
            HistoryCommand::Undo => "undo",
            HistoryCommand::Redo => "redo",
        }
    }
}

impl fmt::Display for HistoryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "list" => Ok(HistoryCommand::List),
            "init" => Ok(HistoryCommand::Init),
            "rollback" => Ok(HistoryCommand::Rollback),
            "undo" => Ok(HistoryCommand::Undo),
            "redo" => Ok(HistoryCommand::Redo),
            _ => Err(Error::InvalidParameter(format!(
                "unknown history command '{}'",
                s
            ))),
        }
    }
}

/// A validated history request; `from`/`to` of 0 mean "not given"
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryRequest {
    pub command: HistoryCommand,
    pub from: i64,
    pub to: i64,
    pub info: bool,
    pub reverse: bool,
}

/// Builder for [`HistoryRequest`]
///
/// Positionals: the command, then an optional `A` or `A-B` range. Named
/// `from`/`to` override the positional range.
#[derive(Debug, Default)]
pub struct HistoryRequestBuilder {
    command: Option<HistoryCommand>,
    range: Option<(i64, i64)>,
    from: Option<i64>,
    to: Option<i64>,
    info: bool,
    reverse: bool,
}

impl HistoryRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(&mut self, token: &str) -> Result<&mut Self> {
        if self.command.is_none() {
            self.command = Some(token.parse()?);
        } else if self.range.is_none() {
            self.range = Some(parse_range(token)?);
        } else {
            return Err(Error::InvalidParameter(format!(
                "unexpected argument '{}'",
                token
            )));
        }
        Ok(self)
    }

    pub fn from(&mut self, id: i64) -> Result<&mut Self> {
        self.from = Some(check_id(id)?);
        Ok(self)
    }

    pub fn to(&mut self, id: i64) -> Result<&mut Self> {
        self.to = Some(check_id(id)?);
        Ok(self)
    }

    pub fn info(&mut self, info: bool) -> &mut Self {
        self.info = info;
        self
    }

    pub fn reverse(&mut self, reverse: bool) -> &mut Self {
        self.reverse = reverse;
        self
    }

    pub fn build(&self) -> Result<HistoryRequest> {
        let command = self.command.unwrap_or_default();
        let (range_from, range_to) = self.range.unwrap_or((0, 0));
        let from = self.from.unwrap_or(range_from);
        let mut to = self.to.unwrap_or(range_to);
        if to == 0 {
            to = from;
        }

        match command {
            HistoryCommand::Rollback if to == 0 => {
                return Err(Error::InvalidParameter(
                    "rollback needs a transaction id".to_string(),
                ));
            }
            HistoryCommand::Undo | HistoryCommand::Redo if from == 0 => {
                return Err(Error::InvalidParameter(format!(
                    "{} needs a transaction id or range",
                    command
                )));
            }
            _ => {}
        }
        if from != 0 && from > to {
            return Err(Error::InvalidParameter(format!(
                "transaction range {}-{} is reversed",
                from, to
            )));
        }

        Ok(HistoryRequest {
            command,
            from,
            to,
            info: self.info,
            reverse: self.reverse,
        })
    }
}

fn check_id(id: i64) -> Result<i64> {
    if id <= 0 {
        return Err(Error::InvalidParameter(format!(
            "transaction id must be positive, got {}",
            id
        )));
    }
    Ok(id)
}

/// Parse `A` or `A-B`
fn parse_range(token: &str) -> Result<(i64, i64)> {
    let parse_id = |s: &str| -> Result<i64> {
        let id: i64 = s
            .trim()
            .parse()
            .map_err(|_| Error::ParseError(format!("invalid transaction range '{}'", token)))?;
        if id <= 0 {
            return Err(Error::ParseError(format!(
                "invalid transaction range '{}'",
                token
            )));
        }
        Ok(id)
    };

    match token.split_once('-') {
        Some((a, b)) => Ok((parse_id(a)?, parse_id(b)?)),
        None => {
            let id = parse_id(token)?;
            Ok((id, id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(positionals: &[&str]) -> Result<HistoryRequest> {
        let mut builder = HistoryRequestBuilder::new();
        for p in positionals {
            builder.positional(p)?;
        }
        builder.build()
    }

    #[test]
    fn test_default_is_list() {
        let req = build(&[]).unwrap();
        assert_eq!(req.command, HistoryCommand::List);
        assert_eq!((req.from, req.to), (0, 0));
    }

    #[test]
    fn test_positional_range() {
        let req = build(&["list", "5-10"]).unwrap();
        assert_eq!((req.from, req.to), (5, 10));

        let req = build(&["undo", "7"]).unwrap();
        assert_eq!(req.command, HistoryCommand::Undo);
        assert_eq!((req.from, req.to), (7, 7));
    }

    #[test]
    fn test_named_options_override_positional() {
        let mut builder = HistoryRequestBuilder::new();
        builder.positional("list").unwrap();
        builder.positional("5-10").unwrap();
        builder.from(6).unwrap().to(8).unwrap();
        builder.info(true).reverse(true);
        let req = builder.build().unwrap();
        assert_eq!((req.from, req.to), (6, 8));
        assert!(req.info && req.reverse);
    }

    #[test]
    fn test_to_defaults_to_from() {
        let mut builder = HistoryRequestBuilder::new();
        builder.positional("redo").unwrap();
        builder.from(3).unwrap();
        let req = builder.build().unwrap();
        assert_eq!((req.from, req.to), (3, 3));
    }

    #[test]
    fn test_rollback_with_to_only() {
        let mut builder = HistoryRequestBuilder::new();
        builder.positional("rollback").unwrap();
        builder.to(4).unwrap();
        let req = builder.build().unwrap();
        assert_eq!((req.from, req.to), (0, 4));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(build(&["frobnicate"]), Err(Error::InvalidParameter(_))));
        assert!(matches!(build(&["list", "a-b"]), Err(Error::ParseError(_))));
        assert!(matches!(build(&["list", "0"]), Err(Error::ParseError(_))));
        assert!(matches!(build(&["list", "10-5"]), Err(Error::InvalidParameter(_))));
        assert!(matches!(build(&["undo"]), Err(Error::InvalidParameter(_))));
        assert!(matches!(build(&["rollback"]), Err(Error::InvalidParameter(_))));
        assert!(matches!(
            build(&["list", "1", "2"]),
            Err(Error::InvalidParameter(_))
        ));
        assert!(HistoryRequestBuilder::new().from(-1).is_err());
    }
}
