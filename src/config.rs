// src/config.rs

//! Configuration loading
//!
//! The main file (`/etc/pkgmgr/pkgmgr.toml` by default) carries a `[main]`
//! table; repositories live in `*.toml` files under `reposdir`, one table per
//! repo:
//!
//! ```toml
//! [photon]
//! name = "Photon OS base"
//! baseurl = "file:///srv/mirror/photon"
//! priority = 10
//! metadata_expire = "2d"
//! skip_if_unavailable = true
//! ```
//!
//! Repo order is file-name order, then table order within a file. That order
//! breaks ties between repos of equal priority.

use crate::error::{Error, Result};
use crate::repository::{RepoDescriptor, CMDLINE_REPO, DEFAULT_PRIORITY, SYSTEM_REPO};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/pkgmgr/pkgmgr.toml";
pub const DEFAULT_CACHEDIR: &str = "/var/cache/pkgmgr";
pub const DEFAULT_REPOSDIR: &str = "/etc/pkgmgr/repos.d";
pub const DEFAULT_INSTALLED_DB: &str = "/var/lib/pkgmgr/installed.json";
pub const DEFAULT_HISTORY_DB: &str = "/var/lib/pkgmgr/history.db";

/// 48 hours
pub const DEFAULT_METADATA_EXPIRE: i64 = 172_800;

/// Process-wide configuration, built once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub cachedir: PathBuf,
    pub reposdir: PathBuf,
    pub metadata_expire: i64,
    pub cache_only: bool,
    pub installed_db: PathBuf,
    pub history_db: PathBuf,
    /// Repos in declaration order
    pub repos: Vec<RepoDescriptor>,
    setopts: Vec<(String, String)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cachedir: PathBuf::from(DEFAULT_CACHEDIR),
            reposdir: PathBuf::from(DEFAULT_REPOSDIR),
            metadata_expire: DEFAULT_METADATA_EXPIRE,
            cache_only: false,
            installed_db: PathBuf::from(DEFAULT_INSTALLED_DB),
            history_db: PathBuf::from(DEFAULT_HISTORY_DB),
            repos: Vec::new(),
            setopts: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    main: MainSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MainSection {
    cachedir: Option<PathBuf>,
    reposdir: Option<PathBuf>,
    metadata_expire: Option<ExpireValue>,
    cacheonly: Option<bool>,
    installed_db: Option<PathBuf>,
    history_db: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpireValue {
    Seconds(i64),
    Text(String),
}

impl ExpireValue {
    fn seconds(&self) -> Result<i64> {
        match self {
            ExpireValue::Seconds(s) => Ok(*s),
            ExpireValue::Text(t) => parse_metadata_expire(t),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RepoSection {
    name: Option<String>,
    baseurl: Option<String>,
    enabled: Option<bool>,
    priority: Option<i32>,
    metadata_expire: Option<ExpireValue>,
    skip_if_unavailable: Option<bool>,
    snapshot: Option<PathBuf>,
}

impl Config {
    /// Load the main file, apply `--setopt` overrides, then read repo files
    ///
    /// Without an explicit `path` a missing default file just means defaults.
    pub fn load(path: Option<&Path>, setopts: &[String]) -> Result<Self> {
        let setopts = setopts
            .iter()
            .map(|s| parse_setopt(s))
            .collect::<Result<Vec<_>>>()?;

        let file_path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let file = match fs::read_to_string(file_path) {
            Ok(content) => toml::from_str::<ConfigFile>(&content).map_err(|e| {
                Error::Config(format!("{}: {}", file_path.display(), e))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound && path.is_none() => {
                debug!("No config at {}, using defaults", file_path.display());
                ConfigFile::default()
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::FileNotFound(file_path.to_path_buf()));
            }
            Err(e) => {
                return Err(Error::system(
                    format!("Failed to read {}", file_path.display()),
                    e,
                ));
            }
        };

        let mut config = Config::default();
        let main = file.main;
        if let Some(v) = main.cachedir {
            config.cachedir = v;
        }
        if let Some(v) = main.reposdir {
            config.reposdir = v;
        }
        if let Some(v) = main.metadata_expire {
            config.metadata_expire = v.seconds()?;
        }
        if let Some(v) = main.cacheonly {
            config.cache_only = v;
        }
        if let Some(v) = main.installed_db {
            config.installed_db = v;
        }
        if let Some(v) = main.history_db {
            config.history_db = v;
        }

        config.setopts = setopts;
        config.apply_main_setopts()?;
        config.repos = load_repos(&config.reposdir, &config.cachedir, config.metadata_expire)?;
        Ok(config)
    }

    fn apply_main_setopts(&mut self) -> Result<()> {
        for (key, value) in &self.setopts {
            match key.as_str() {
                "cachedir" => self.cachedir = PathBuf::from(value),
                "reposdir" => self.reposdir = PathBuf::from(value),
                "metadata_expire" => self.metadata_expire = parse_metadata_expire(value)?,
                "cacheonly" => self.cache_only = parse_bool(key, value)?,
                "installed_db" => self.installed_db = PathBuf::from(value),
                "history_db" => self.history_db = PathBuf::from(value),
                _ => {}
            }
        }
        Ok(())
    }

    /// Last value given for a `--setopt` key
    pub fn setopt(&self, key: &str) -> Option<&str> {
        self.setopts
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Record a `--setopt`-style override after loading
    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.setopts.push((key.into(), value.into()));
    }

    /// Apply `--disablerepo` then `--enablerepo` glob patterns
    pub fn toggle_repos(&mut self, enable: &[String], disable: &[String]) -> Result<()> {
        for (patterns, state) in [(disable, false), (enable, true)] {
            for pattern in patterns {
                let glob = glob::Pattern::new(pattern).map_err(|e| {
                    Error::ParseError(format!("bad repo pattern '{}': {}", pattern, e))
                })?;
                let mut matched = false;
                for repo in self.repos.iter_mut().filter(|r| glob.matches(&r.name)) {
                    repo.enabled = state;
                    matched = true;
                }
                if !matched {
                    return Err(Error::NoMatch(format!("repo '{}'", pattern)));
                }
            }
        }
        Ok(())
    }

    pub fn enabled_repos(&self) -> impl Iterator<Item = &RepoDescriptor> {
        self.repos.iter().filter(|r| r.enabled && !r.is_cmdline())
    }
}

/// Read every `*.toml` file in `reposdir`, in file-name order
fn load_repos(reposdir: &Path, cachedir: &Path, default_expire: i64) -> Result<Vec<RepoDescriptor>> {
    let entries = match fs::read_dir(reposdir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No repo directory at {}", reposdir.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(Error::system(
                format!("Failed to read {}", reposdir.display()),
                e,
            ));
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| Error::system(format!("Failed to read {}", reposdir.display()), e))?
            .path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            files.push(path);
        }
    }
    files.sort();

    let mut repos: Vec<RepoDescriptor> = Vec::new();
    for file in files {
        let content = fs::read_to_string(&file)
            .map_err(|e| Error::system(format!("Failed to read {}", file.display()), e))?;
        for repo in parse_repo_file(&content, cachedir, default_expire)
            .map_err(|e| Error::Config(format!("{}: {}", file.display(), e)))?
        {
            if repos.iter().any(|r| r.name == repo.name) {
                return Err(Error::Config(format!(
                    "{}: repo '{}' is defined twice",
                    file.display(),
                    repo.name
                )));
            }
            repos.push(repo);
        }
    }
    Ok(repos)
}

/// Parse one repo file; tables keep their order of appearance
pub fn parse_repo_file(
    content: &str,
    cachedir: &Path,
    default_expire: i64,
) -> Result<Vec<RepoDescriptor>> {
    let table: toml::Table =
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;

    let mut repos = Vec::new();
    for (id, value) in table {
        if id == CMDLINE_REPO || id == SYSTEM_REPO {
            return Err(Error::Config(format!("repo id '{}' is reserved", id)));
        }
        let section: RepoSection = value
            .try_into()
            .map_err(|e: toml::de::Error| Error::Config(format!("repo '{}': {}", id, e)))?;

        let mut repo = RepoDescriptor::new(id.as_str(), cachedir);
        repo.description = section.name.unwrap_or_else(|| id.clone());
        repo.baseurl = section.baseurl;
        repo.enabled = section.enabled.unwrap_or(true);
        repo.priority = section.priority.unwrap_or(DEFAULT_PRIORITY);
        repo.metadata_expire = match section.metadata_expire {
            Some(v) => v.seconds()?,
            None => default_expire,
        };
        repo.skip_if_unavailable = section.skip_if_unavailable.unwrap_or(false);
        repo.snapshot = section.snapshot;
        repos.push(repo);
    }
    Ok(repos)
}

/// Parse `metadata_expire`: seconds, `-1`/`never`, or a number with `s`/`m`/`h`/`d`
pub fn parse_metadata_expire(value: &str) -> Result<i64> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("never") || value == "-1" {
        return Ok(-1);
    }

    let (digits, multiplier) = match value.char_indices().last() {
        Some((i, 's')) => (&value[..i], 1),
        Some((i, 'm')) => (&value[..i], 60),
        Some((i, 'h')) => (&value[..i], 3600),
        Some((i, 'd')) => (&value[..i], 86_400),
        _ => (value, 1),
    };
    let amount: i64 = digits
        .parse()
        .map_err(|_| Error::ParseError(format!("invalid metadata_expire '{}'", value)))?;
    if amount < 0 {
        return Err(Error::ParseError(format!(
            "invalid metadata_expire '{}'",
            value
        )));
    }
    amount
        .checked_mul(multiplier)
        .ok_or_else(|| Error::ParseError(format!("metadata_expire '{}' is too large", value)))
}

/// Split `KEY=VALUE`
pub fn parse_setopt(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| Error::ParseError(format!("setopt '{}' is not KEY=VALUE", s)))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::ParseError(format!("setopt '{}' has an empty key", s)));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidParameter(format!(
            "{} expects a boolean, got '{}'",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_metadata_expire() {
        assert_eq!(parse_metadata_expire("3600").unwrap(), 3600);
        assert_eq!(parse_metadata_expire("90m").unwrap(), 5400);
        assert_eq!(parse_metadata_expire("2d").unwrap(), 172_800);
        assert_eq!(parse_metadata_expire("never").unwrap(), -1);
        assert_eq!(parse_metadata_expire("-1").unwrap(), -1);
        assert!(parse_metadata_expire("soon").is_err());
        assert!(parse_metadata_expire("-5").is_err());
    }

    #[test]
    fn test_parse_setopt() {
        assert_eq!(
            parse_setopt("buffer-percent=5").unwrap(),
            ("buffer-percent".to_string(), "5".to_string())
        );
        assert!(matches!(parse_setopt("novalue"), Err(Error::ParseError(_))));
        assert!(matches!(parse_setopt("=5"), Err(Error::ParseError(_))));
    }

    #[test]
    fn test_parse_repo_file_keeps_order() {
        let content = r#"
[updates]
baseurl = "file:///srv/updates"
priority = 10

[base]
name = "Base"
baseurl = "/srv/base"
metadata_expire = "never"
skip_if_unavailable = true
snapshot = "/etc/pkgmgr/base.snapshot"
"#;
        let repos = parse_repo_file(content, Path::new("/cache"), 600).unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "updates");
        assert_eq!(repos[0].priority, 10);
        assert_eq!(repos[0].metadata_expire, 600);
        assert_eq!(repos[1].name, "base");
        assert_eq!(repos[1].description, "Base");
        assert_eq!(repos[1].priority, DEFAULT_PRIORITY);
        assert_eq!(repos[1].metadata_expire, -1);
        assert!(repos[1].skip_if_unavailable);
        assert_eq!(repos[1].cache_dir, PathBuf::from("/cache/base"));
    }

    #[test]
    fn test_reserved_repo_ids() {
        let content = "[\"@System\"]\nbaseurl = \"/srv\"\n";
        assert!(matches!(
            parse_repo_file(content, Path::new("/cache"), 600),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_with_setopts() {
        let dir = TempDir::new().unwrap();
        let reposdir = dir.path().join("repos.d");
        fs::create_dir_all(&reposdir).unwrap();
        fs::write(reposdir.join("b.toml"), "[second]\nbaseurl = \"/srv/b\"\n").unwrap();
        fs::write(reposdir.join("a.toml"), "[first]\nbaseurl = \"/srv/a\"\n").unwrap();
        fs::write(reposdir.join("ignored.repo"), "junk").unwrap();

        let conf = dir.path().join("pkgmgr.toml");
        fs::write(
            &conf,
            format!(
                "[main]\nreposdir = \"{}\"\nmetadata_expire = 60\n",
                reposdir.display()
            ),
        )
        .unwrap();

        let config = Config::load(
            Some(&conf),
            &[
                "cachedir=/tmp/cache".to_string(),
                "comp-ratio=0.5".to_string(),
                "comp-ratio=0.6".to_string(),
            ],
        )
        .unwrap();

        assert_eq!(config.cachedir, PathBuf::from("/tmp/cache"));
        assert_eq!(config.metadata_expire, 60);
        let names: Vec<_> = config.repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(config.repos[0].cache_dir, PathBuf::from("/tmp/cache/first"));
        assert_eq!(config.setopt("comp-ratio"), Some("0.6"));
        assert_eq!(config.setopt("buffer-percent"), None);
    }

    #[test]
    fn test_explicit_missing_config() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("missing.toml")), &[]).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_toggle_repos() {
        let mut config = Config::default();
        config.repos = vec![
            RepoDescriptor::new("photon", "/cache"),
            RepoDescriptor::new("photon-updates", "/cache"),
            RepoDescriptor::new("extras", "/cache"),
        ];
        config
            .toggle_repos(&["photon-updates".to_string()], &["photon*".to_string()])
            .unwrap();
        let enabled: Vec<_> = config.enabled_repos().map(|r| r.name.as_str()).collect();
        assert_eq!(enabled, vec!["photon-updates", "extras"]);

        assert!(matches!(
            config.toggle_repos(&[], &["nope".to_string()]),
            Err(Error::NoMatch(_))
        ));
    }
}
