// src/pool/mod.rs

//! In-memory solvable pool
//!
//! The pool is the universe of known packages that queries run against. It
//! interns strings, keeps every repo's solvables in one contiguous id range and
//! stores per-solvable dependency arrays. Dependency solving itself happens
//! elsewhere; nothing here computes transactions.

mod record;

pub use record::{read_records, write_records, PackageRecord, RepoMetadata};

use std::collections::HashMap;
use std::ops::Range;

/// Interned string id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrId(u32);

/// Dependency strings (`name [op evr]`) are interned like any other string
pub type DepId = StrId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SolvableId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoId(pub usize);

/// Dependency arrays kept per solvable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DepKind {
    Provides,
    Obsoletes,
    Conflicts,
    /// Includes the pre-requires
    Requires,
    RequiresPre,
    Recommends,
    Suggests,
    Supplements,
    Enhances,
}

const DEP_KINDS: usize = 9;

impl DepKind {
    pub const ALL: [DepKind; DEP_KINDS] = [
        DepKind::Provides,
        DepKind::Obsoletes,
        DepKind::Conflicts,
        DepKind::Requires,
        DepKind::RequiresPre,
        DepKind::Recommends,
        DepKind::Suggests,
        DepKind::Supplements,
        DepKind::Enhances,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// A repo's slice of the pool
#[derive(Debug, Clone)]
pub struct Repo {
    pub name: String,
    pub priority: i32,
    pub baseurl: Option<String>,
    range: Range<usize>,
}

impl Repo {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// One concrete package version + architecture
#[derive(Debug, Clone)]
pub struct Solvable {
    pub name: StrId,
    pub evr: StrId,
    pub arch: StrId,
    pub repo: RepoId,
    pub summary: String,
    pub location: Option<String>,
    pub sourcerpm: Option<String>,
    pub install_size: u64,
    pub download_size: u64,
    pub files: Vec<String>,
    /// Hidden from every query (set by snapshots)
    pub excluded: bool,
    deps: [Vec<DepId>; DEP_KINDS],
}

/// The package universe
#[derive(Debug, Default)]
pub struct Pool {
    strings: Vec<String>,
    string_ids: HashMap<String, StrId>,
    repos: Vec<Repo>,
    solvables: Vec<Solvable>,
    installed: Option<RepoId>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its stable id
    pub fn intern(&mut self, s: &str) -> StrId {
        if let Some(&id) = self.string_ids.get(s) {
            return id;
        }
        let id = StrId(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.string_ids.insert(s.to_string(), id);
        id
    }

    /// Look a string up without interning it
    pub fn lookup(&self, s: &str) -> Option<StrId> {
        self.string_ids.get(s).copied()
    }

    pub fn str(&self, id: StrId) -> &str {
        &self.strings[id.0 as usize]
    }

    /// Capability name of a dependency, i.e. the part before any operator
    pub fn dep_name(&self, dep: DepId) -> &str {
        let s = self.str(dep);
        s.split_whitespace().next().unwrap_or(s)
    }

    /// Append a repo and all of its packages
    pub fn add_repo(
        &mut self,
        name: &str,
        priority: i32,
        baseurl: Option<String>,
        records: Vec<PackageRecord>,
    ) -> RepoId {
        let repo_id = RepoId(self.repos.len());
        let start = self.solvables.len();

        for rec in records {
            let solvable = self.make_solvable(repo_id, rec);
            self.solvables.push(solvable);
        }

        self.repos.push(Repo {
            name: name.to_string(),
            priority,
            baseurl,
            range: start..self.solvables.len(),
        });
        repo_id
    }

    fn make_solvable(&mut self, repo: RepoId, rec: PackageRecord) -> Solvable {
        let evr = rec.evr();
        let name = self.intern(&rec.name);
        let evr_id = self.intern(&evr);
        let arch = self.intern(&rec.arch);

        let mut deps: [Vec<DepId>; DEP_KINDS] = Default::default();
        let mut push = |pool: &mut Pool, kind: DepKind, list: &[String]| {
            for dep in list {
                let id = pool.intern(dep.trim());
                let slot = &mut deps[kind.index()];
                if !slot.contains(&id) {
                    slot.push(id);
                }
            }
        };

        push(self, DepKind::Provides, &[format!("{} = {}", rec.name, evr)]);
        push(self, DepKind::Provides, &rec.provides);
        push(self, DepKind::Obsoletes, &rec.obsoletes);
        push(self, DepKind::Conflicts, &rec.conflicts);
        push(self, DepKind::Requires, &rec.requires);
        push(self, DepKind::Requires, &rec.requires_pre);
        push(self, DepKind::RequiresPre, &rec.requires_pre);
        push(self, DepKind::Recommends, &rec.recommends);
        push(self, DepKind::Suggests, &rec.suggests);
        push(self, DepKind::Supplements, &rec.supplements);
        push(self, DepKind::Enhances, &rec.enhances);

        Solvable {
            name,
            evr: evr_id,
            arch,
            repo,
            summary: rec.summary,
            location: rec.location,
            sourcerpm: rec.sourcerpm,
            install_size: rec.install_size,
            download_size: rec.download_size,
            files: rec.files,
            excluded: false,
            deps,
        }
    }

    /// Mark a repo as the system (installed) repo
    pub fn set_installed(&mut self, repo: RepoId) {
        self.installed = Some(repo);
    }

    pub fn installed(&self) -> Option<RepoId> {
        self.installed
    }

    pub fn is_installed(&self, id: SolvableId) -> bool {
        self.installed == Some(self.solvable(id).repo)
    }

    pub fn repo(&self, id: RepoId) -> &Repo {
        &self.repos[id.0]
    }

    pub fn repos(&self) -> impl Iterator<Item = (RepoId, &Repo)> {
        self.repos.iter().enumerate().map(|(i, r)| (RepoId(i), r))
    }

    pub fn repo_by_name(&self, name: &str) -> Option<RepoId> {
        self.repos.iter().position(|r| r.name == name).map(RepoId)
    }

    pub fn solvable(&self, id: SolvableId) -> &Solvable {
        &self.solvables[id.0]
    }

    /// Every solvable in the pool, excluded ones included
    pub fn solvable_ids(&self) -> impl Iterator<Item = SolvableId> + '_ {
        (0..self.solvables.len()).map(SolvableId)
    }

    /// The solvables of one repo, in its contiguous id range
    pub fn repo_solvables(&self, repo: RepoId) -> impl Iterator<Item = SolvableId> + '_ {
        self.repos[repo.0].range.clone().map(SolvableId)
    }

    /// False for solvables hidden by a snapshot
    pub fn is_considered(&self, id: SolvableId) -> bool {
        !self.solvables[id.0].excluded
    }

    pub fn exclude(&mut self, id: SolvableId) {
        self.solvables[id.0].excluded = true;
    }

    pub fn deps(&self, id: SolvableId, kind: DepKind) -> &[DepId] {
        &self.solvables[id.0].deps[kind.index()]
    }

    pub fn name(&self, id: SolvableId) -> &str {
        self.str(self.solvable(id).name)
    }

    pub fn evr(&self, id: SolvableId) -> &str {
        self.str(self.solvable(id).evr)
    }

    pub fn arch(&self, id: SolvableId) -> &str {
        self.str(self.solvable(id).arch)
    }

    /// Canonical `name-evr.arch`
    pub fn nevra(&self, id: SolvableId) -> String {
        format!("{}-{}.{}", self.name(id), self.evr(id), self.arch(id))
    }

    pub fn len(&self) -> usize {
        self.solvables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solvables.is_empty()
    }
}
