// src/query/mod.rs

//! Solvable queries
//!
//! Lookups resolve identity strings to solvables. They return every match,
//! including the same NEVRA from several repos; picking one is up to the
//! caller.

mod format;
mod repoquery;

pub use format::{location_url, QueryFormat};
pub use repoquery::run_repoquery;

use crate::error::{Error, Result};
use crate::nevra::{evr_cmp, split_name_equals_evr, split_nevra};
use crate::pool::{DepId, DepKind, Pool, RepoId, SolvableId};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Which side of the system-repo boundary a query may see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    None,
    Installed,
    Available,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::None => "none",
            Scope::Installed => "installed",
            Scope::Available => "available",
        }
    }

    fn admits(self, pool: &Pool, id: SolvableId) -> bool {
        match self {
            Scope::None => true,
            Scope::Installed => pool.is_installed(id),
            Scope::Available => !pool.is_installed(id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" | "all" => Ok(Scope::None),
            "installed" => Ok(Scope::Installed),
            "available" => Ok(Scope::Available),
            _ => Err(Error::InvalidParameter(format!("unknown scope '{}'", s))),
        }
    }
}

/// One package spec given to [`Query::filter_spec`]
#[derive(Debug, Clone)]
enum PackageSpec {
    /// Glob over the name and the full NEVRA
    Glob(glob::Pattern),
    /// A literal `name-evr.arch`; a package literally named like that still matches
    Nevra {
        literal: String,
        name: String,
        evr: String,
        arch: String,
    },
    /// `name=evr`, any arch
    NameEvr { name: String, evr: String },
}

impl PackageSpec {
    fn parse(spec: &str) -> Result<Self> {
        if spec.contains('=') {
            let (name, evr) = split_name_equals_evr(spec)?;
            if name.is_empty() || evr.is_empty() {
                return Err(Error::ParseError(format!("bad package spec '{}'", spec)));
            }
            return Ok(PackageSpec::NameEvr { name, evr });
        }
        if !spec.contains(['*', '?', '[']) {
            if let Ok((name, evr, arch)) = split_nevra(spec) {
                return Ok(PackageSpec::Nevra {
                    literal: spec.to_string(),
                    name,
                    evr,
                    arch,
                });
            }
        }
        let pattern = glob::Pattern::new(spec)
            .map_err(|e| Error::ParseError(format!("bad package spec '{}': {}", spec, e)))?;
        Ok(PackageSpec::Glob(pattern))
    }
}

/// A filter over the pool
///
/// Specs are glob patterns matched against both the package name and the full
/// NEVRA, so `bash`, `bash*` and `bash-5.1-2.ph5.x86_64` all work. A literal
/// NEVRA is looked up exactly, and `name=evr` selects that version on any arch.
pub struct Query<'p> {
    pool: &'p Pool,
    scope: Scope,
    repo: Option<RepoId>,
    arches: Vec<String>,
    specs: Vec<PackageSpec>,
}

impl<'p> Query<'p> {
    pub fn new(pool: &'p Pool) -> Self {
        Self {
            pool,
            scope: Scope::None,
            repo: None,
            arches: Vec::new(),
            specs: Vec::new(),
        }
    }

    /// Restrict to installed or available packages; `Scope::None` lifts the restriction
    pub fn apply_scope(&mut self, scope: Scope) -> &mut Self {
        self.scope = scope;
        self
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn in_repo(&mut self, repo: RepoId) -> &mut Self {
        self.repo = Some(repo);
        self
    }

    pub fn filter_arches(&mut self, arches: &[String]) -> &mut Self {
        self.arches.extend(arches.iter().cloned());
        self
    }

    /// Add a name, NEVRA or `name=evr` spec; specs are OR-ed together
    pub fn filter_spec(&mut self, spec: &str) -> Result<&mut Self> {
        self.specs.push(PackageSpec::parse(spec)?);
        Ok(self)
    }

    /// Solvables named exactly by a NEVRA or `name=evr` spec
    fn resolve_exact(&self) -> HashSet<SolvableId> {
        let pool = self.pool;
        let mut ids = HashSet::new();
        for spec in &self.specs {
            match spec {
                PackageSpec::Glob(_) => {}
                PackageSpec::Nevra {
                    name, evr, arch, ..
                } => {
                    let sides: &[bool] = match self.scope {
                        Scope::Installed => &[true],
                        Scope::Available => &[false],
                        Scope::None => &[true, false],
                    };
                    for &installed_only in sides {
                        ids.extend(find_by_nevra(pool, name, evr, arch, installed_only));
                    }
                }
                PackageSpec::NameEvr { name, evr } => {
                    for (repo, _) in pool.repos() {
                        ids.extend(find_by_nevr_in_repo(pool, repo, name, evr));
                    }
                }
            }
        }
        ids
    }

    fn matches(&self, id: SolvableId, exact: &HashSet<SolvableId>) -> bool {
        let pool = self.pool;
        if !pool.is_considered(id) || !self.scope.admits(pool, id) {
            return false;
        }
        if let Some(repo) = self.repo {
            if pool.solvable(id).repo != repo {
                return false;
            }
        }
        if !self.arches.is_empty() && !self.arches.iter().any(|a| a == pool.arch(id)) {
            return false;
        }
        if !self.specs.is_empty() && !exact.contains(&id) {
            let name = pool.name(id);
            let nevra = pool.nevra(id);
            let by_name = self.specs.iter().any(|spec| match spec {
                PackageSpec::Glob(p) => p.matches(name) || p.matches(&nevra),
                PackageSpec::Nevra { literal, .. } => literal == name,
                PackageSpec::NameEvr { .. } => false,
            });
            if !by_name {
                return false;
            }
        }
        true
    }

    /// Matching solvables in pool order
    pub fn run(&self) -> Vec<SolvableId> {
        let exact = self.resolve_exact();
        match self.repo {
            Some(repo) => self
                .pool
                .repo_solvables(repo)
                .filter(|&id| self.matches(id, &exact))
                .collect(),
            None => self
                .pool
                .solvable_ids()
                .filter(|&id| self.matches(id, &exact))
                .collect(),
        }
    }
}

/// All solvables with exactly this name, evr and arch
///
/// With `installed_only` only the system repo is searched, otherwise only
/// the non-system repos. Matches from several repos are all returned.
pub fn find_by_nevra(
    pool: &Pool,
    name: &str,
    evr: &str,
    arch: &str,
    installed_only: bool,
) -> Vec<SolvableId> {
    let (Some(name), Some(evr), Some(arch)) =
        (pool.lookup(name), pool.lookup(evr), pool.lookup(arch))
    else {
        return Vec::new();
    };

    pool.solvable_ids()
        .filter(|&id| {
            let s = pool.solvable(id);
            pool.is_considered(id)
                && s.name == name
                && s.evr == evr
                && s.arch == arch
                && pool.is_installed(id) == installed_only
        })
        .collect()
}

/// Solvables of one repo with this name and evr, any arch
pub fn find_by_nevr_in_repo(pool: &Pool, repo: RepoId, name: &str, evr: &str) -> Vec<SolvableId> {
    let (Some(name), Some(evr)) = (pool.lookup(name), pool.lookup(evr)) else {
        return Vec::new();
    };

    pool.repo_solvables(repo)
        .filter(|&id| {
            let s = pool.solvable(id);
            pool.is_considered(id) && s.name == name && s.evr == evr
        })
        .collect()
}

/// Union of the requires of every given solvable
pub fn collect_requires(pool: &Pool, ids: &[SolvableId]) -> BTreeSet<DepId> {
    collect_deps(pool, ids, &[DepKind::Requires])
}

/// Union of the given dependency arrays of every given solvable
pub fn collect_deps(pool: &Pool, ids: &[SolvableId], kinds: &[DepKind]) -> BTreeSet<DepId> {
    let mut deps = BTreeSet::new();
    for &id in ids {
        for &kind in kinds {
            deps.extend(pool.deps(id, kind).iter().copied());
        }
    }
    deps
}

/// Keep the newest solvable per (name, arch)
///
/// Equal versions go to the repo with the lower priority value, then to the
/// earlier solvable.
pub fn newest_per_name_arch(pool: &Pool, ids: &[SolvableId]) -> Vec<SolvableId> {
    let mut best: HashMap<(&str, &str), SolvableId> = HashMap::new();
    for &id in ids {
        let key = (pool.name(id), pool.arch(id));
        match best.get(&key) {
            Some(&current) => {
                let better = match evr_cmp(pool.evr(id), pool.evr(current)) {
                    Ordering::Greater => true,
                    Ordering::Less => false,
                    Ordering::Equal => {
                        pool.repo(pool.solvable(id).repo).priority
                            < pool.repo(pool.solvable(current).repo).priority
                    }
                };
                if better {
                    best.insert(key, id);
                }
            }
            None => {
                best.insert(key, id);
            }
        }
    }
    let mut ids: Vec<_> = best.into_values().collect();
    ids.sort();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PackageRecord;

    fn pool() -> Pool {
        let mut pool = Pool::new();
        let mut bash = PackageRecord::new("bash", "5.1", "2.ph5", "x86_64");
        bash.requires = vec!["glibc".to_string(), "ncurses-libs".to_string()];
        let mut coreutils = PackageRecord::new("coreutils", "9.1", "1.ph5", "x86_64");
        coreutils.requires = vec!["glibc".to_string(), "libacl".to_string()];

        pool.add_repo("base", 50, None, vec![bash.clone(), coreutils]);
        pool.add_repo(
            "updates",
            10,
            None,
            vec![
                bash.clone(),
                PackageRecord::new("bash", "5.2", "1.ph5", "x86_64"),
                PackageRecord::new("bash", "5.2", "1.ph5", "aarch64"),
            ],
        );
        let system = pool.add_repo("@System", 0, None, vec![bash]);
        pool.set_installed(system);
        pool
    }

    #[test]
    fn test_scope_from_str() {
        assert_eq!("installed".parse::<Scope>().unwrap(), Scope::Installed);
        assert_eq!("available".parse::<Scope>().unwrap(), Scope::Available);
        assert_eq!("none".parse::<Scope>().unwrap(), Scope::None);
        assert!(matches!(
            "sideways".parse::<Scope>(),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_find_by_nevra_returns_duplicates_across_repos() {
        let pool = pool();
        let found = find_by_nevra(&pool, "bash", "5.1-2.ph5", "x86_64", false);
        assert_eq!(found, vec![SolvableId(0), SolvableId(2)]);

        let installed = find_by_nevra(&pool, "bash", "5.1-2.ph5", "x86_64", true);
        assert_eq!(installed, vec![SolvableId(5)]);

        assert!(find_by_nevra(&pool, "zsh", "5.9-1", "x86_64", false).is_empty());
    }

    #[test]
    fn test_find_by_nevr_in_repo_ignores_arch() {
        let pool = pool();
        let updates = pool.repo_by_name("updates").unwrap();
        let found = find_by_nevr_in_repo(&pool, updates, "bash", "5.2-1.ph5");
        assert_eq!(found, vec![SolvableId(3), SolvableId(4)]);

        let base = pool.repo_by_name("base").unwrap();
        assert!(find_by_nevr_in_repo(&pool, base, "bash", "5.2-1.ph5").is_empty());
    }

    #[test]
    fn test_collect_requires_deduplicates() {
        let pool = pool();
        let deps = collect_requires(&pool, &[SolvableId(0), SolvableId(1)]);
        let mut names: Vec<_> = deps.iter().map(|&d| pool.str(d)).collect();
        names.sort();
        assert_eq!(names, vec!["glibc", "libacl", "ncurses-libs"]);
    }

    #[test]
    fn test_query_scopes() {
        let pool = pool();
        let mut q = Query::new(&pool);
        q.filter_spec("bash").unwrap();
        assert_eq!(q.run().len(), 5);

        q.apply_scope(Scope::Installed);
        assert_eq!(q.run(), vec![SolvableId(5)]);

        q.apply_scope(Scope::Available);
        assert_eq!(q.run().len(), 4);

        q.apply_scope(Scope::None);
        assert_eq!(q.run().len(), 5);
    }

    #[test]
    fn test_query_arch_and_nevra_spec() {
        let pool = pool();
        let mut q = Query::new(&pool);
        q.filter_arches(&["aarch64".to_string()]);
        assert_eq!(q.run(), vec![SolvableId(4)]);

        let mut q = Query::new(&pool);
        q.filter_spec("coreutils-9.1-1.ph5.x86_64").unwrap();
        assert_eq!(q.run(), vec![SolvableId(1)]);
    }

    #[test]
    fn test_exact_nevra_spec_honours_scope() {
        let pool = pool();
        let mut q = Query::new(&pool);
        q.filter_spec("bash-5.1-2.ph5.x86_64").unwrap();
        assert_eq!(q.run(), vec![SolvableId(0), SolvableId(2), SolvableId(5)]);

        q.apply_scope(Scope::Installed);
        assert_eq!(q.run(), vec![SolvableId(5)]);

        q.apply_scope(Scope::Available);
        assert_eq!(q.run(), vec![SolvableId(0), SolvableId(2)]);
    }

    #[test]
    fn test_name_evr_spec_spans_arches() {
        let pool = pool();
        let mut q = Query::new(&pool);
        q.filter_spec("bash=5.2-1.ph5").unwrap();
        assert_eq!(q.run(), vec![SolvableId(3), SolvableId(4)]);

        let mut q = Query::new(&pool);
        q.apply_scope(Scope::Installed).filter_spec("bash=5.2-1.ph5").unwrap();
        assert!(q.run().is_empty());

        assert!(matches!(
            Query::new(&pool).filter_spec("=5.2"),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn test_newest_per_name_arch() {
        let pool = pool();
        let mut q = Query::new(&pool);
        q.apply_scope(Scope::Available).filter_spec("bash").unwrap();
        let newest = newest_per_name_arch(&pool, &q.run());
        assert_eq!(newest, vec![SolvableId(3), SolvableId(4)]);

        // Same evr in two repos: the lower priority value wins
        let newest = newest_per_name_arch(&pool, &[SolvableId(0), SolvableId(2)]);
        assert_eq!(newest, vec![SolvableId(2)]);
    }
}
