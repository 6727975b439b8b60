// src/query/repoquery.rs

//! Repoquery execution against a loaded pool

use super::format::location_url;
use super::{collect_deps, collect_requires, Query};
use crate::args::{DepKey, RepoqueryRequest, WhatKey};
use crate::error::Result;
use crate::nevra::evr_cmp;
use crate::pool::{DepKind, Pool, SolvableId};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Run a repoquery and return the output lines, sorted and de-duplicated
pub fn run_repoquery(pool: &Pool, req: &RepoqueryRequest) -> Result<Vec<String>> {
    let mut query = Query::new(pool);
    query.apply_scope(req.scope()).filter_arches(&req.arches);
    if let Some(spec) = &req.spec {
        query.filter_spec(spec)?;
    }
    let mut ids = query.run();

    if req.extras {
        ids = extras(pool, &ids);
    }
    if req.duplicates {
        ids = duplicates(pool, &ids);
    }
    if req.upgrades {
        ids = relative_to_installed(pool, &ids, Ordering::Greater);
    }
    if req.downgrades {
        ids = relative_to_installed(pool, &ids, Ordering::Less);
    }
    if !req.files.is_empty() {
        ids.retain(|&id| {
            let files = &pool.solvable(id).files;
            req.files.iter().any(|f| files.contains(f))
        });
    }
    for (key, caps) in &req.what {
        ids.retain(|&id| matches_what(pool, id, *key, caps));
    }
    debug!("repoquery matched {} solvables", ids.len());

    let mut lines = BTreeSet::new();
    if let Some(key) = req.dep_key {
        debug!("printing {} of matched packages", key.as_str());
        let deps = match key {
            DepKey::Requires => collect_requires(pool, &ids),
            other => collect_deps(pool, &ids, other.kinds()),
        };
        lines.extend(deps.into_iter().map(|d| pool.str(d).to_string()));
    } else if let Some(format) = &req.query_format {
        for &id in &ids {
            lines.insert(format.render(pool, id, req.location));
        }
    } else if req.list {
        for &id in &ids {
            lines.extend(pool.solvable(id).files.iter().cloned());
        }
    } else if req.location {
        lines.extend(ids.iter().filter_map(|&id| location_url(pool, id)));
    } else if req.source {
        lines.extend(
            ids.iter()
                .filter_map(|&id| pool.solvable(id).sourcerpm.clone()),
        );
    } else {
        lines.extend(ids.iter().map(|&id| pool.nevra(id)));
    }

    Ok(lines.into_iter().collect())
}

/// Installed packages whose exact NEVRA is in no available repo
fn extras(pool: &Pool, ids: &[SolvableId]) -> Vec<SolvableId> {
    let available: HashSet<String> = pool
        .solvable_ids()
        .filter(|&id| pool.is_considered(id) && !pool.is_installed(id))
        .map(|id| pool.nevra(id))
        .collect();
    ids.iter()
        .copied()
        .filter(|&id| pool.is_installed(id) && !available.contains(&pool.nevra(id)))
        .collect()
}

/// Installed packages sharing a name and arch with another installed version
fn duplicates(pool: &Pool, ids: &[SolvableId]) -> Vec<SolvableId> {
    let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
    if let Some(system) = pool.installed() {
        for id in pool.repo_solvables(system) {
            *counts.entry((pool.name(id), pool.arch(id))).or_default() += 1;
        }
    }
    ids.iter()
        .copied()
        .filter(|&id| {
            pool.is_installed(id)
                && counts
                    .get(&(pool.name(id), pool.arch(id)))
                    .is_some_and(|&n| n > 1)
        })
        .collect()
}

/// Available packages that compare `wanted` against an installed same name+arch
fn relative_to_installed(pool: &Pool, ids: &[SolvableId], wanted: Ordering) -> Vec<SolvableId> {
    let mut installed: HashMap<(&str, &str), Vec<&str>> = HashMap::new();
    if let Some(system) = pool.installed() {
        for id in pool.repo_solvables(system) {
            installed
                .entry((pool.name(id), pool.arch(id)))
                .or_default()
                .push(pool.evr(id));
        }
    }
    ids.iter()
        .copied()
        .filter(|&id| {
            !pool.is_installed(id)
                && installed
                    .get(&(pool.name(id), pool.arch(id)))
                    .is_some_and(|evrs| {
                        evrs.iter()
                            .any(|installed| evr_cmp(pool.evr(id), installed) == wanted)
                    })
        })
        .collect()
}

fn matches_what(pool: &Pool, id: SolvableId, key: WhatKey, caps: &[String]) -> bool {
    let kinds = key.kinds();
    let by_dep = kinds.iter().any(|&kind| {
        pool.deps(id, kind)
            .iter()
            .any(|&dep| caps.iter().any(|c| c == pool.dep_name(dep)))
    });
    if by_dep {
        return true;
    }
    kinds.contains(&DepKind::Provides)
        && caps
            .iter()
            .any(|c| pool.solvable(id).files.iter().any(|f| f == c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::RepoqueryRequestBuilder;
    use crate::error::Error;
    use crate::pool::PackageRecord;

    fn pool() -> Pool {
        let mut pool = Pool::new();

        let mut bash = PackageRecord::new("bash", "5.1", "2.ph5", "x86_64");
        bash.requires = vec!["glibc >= 2.36".to_string(), "ncurses-libs".to_string()];
        bash.recommends = vec!["bash-completion".to_string()];
        bash.files = vec!["/usr/bin/bash".to_string(), "/bin/sh".to_string()];
        bash.location = Some("RPMS/x86_64/bash-5.1-2.ph5.x86_64.rpm".to_string());
        bash.sourcerpm = Some("bash-5.1-2.ph5.src.rpm".to_string());
        bash.install_size = 7_000_000;

        let mut bash_new = PackageRecord::new("bash", "5.2", "1.ph5", "x86_64");
        bash_new.requires = vec!["glibc >= 2.38".to_string()];
        bash_new.location = Some("RPMS/x86_64/bash-5.2-1.ph5.x86_64.rpm".to_string());

        let mut vim = PackageRecord::new("vim", "9.0", "1.ph5", "x86_64");
        vim.requires = vec!["ncurses-libs".to_string()];

        let mut ncurses = PackageRecord::new("ncurses-libs", "6.4", "1.ph5", "x86_64");
        ncurses.provides = vec!["libncursesw.so.6()(64bit)".to_string()];

        pool.add_repo(
            "base",
            50,
            Some("https://repo.example.org/base/".to_string()),
            vec![bash.clone(), vim, ncurses],
        );
        pool.add_repo("updates", 10, None, vec![bash_new]);

        let old_zlib = PackageRecord::new("zlib", "1.2", "1.ph5", "x86_64");
        let new_zlib = PackageRecord::new("zlib", "1.3", "1.ph5", "x86_64");
        let local = PackageRecord::new("mytool", "1.0", "1", "noarch");
        let system = pool.add_repo("@System", 0, None, vec![bash, old_zlib, new_zlib, local]);
        pool.set_installed(system);
        pool
    }

    fn run(configure: impl FnOnce(&mut RepoqueryRequestBuilder)) -> Vec<String> {
        let mut b = RepoqueryRequestBuilder::new();
        configure(&mut b);
        run_repoquery(&pool(), &b.build().unwrap()).unwrap()
    }

    #[test]
    fn test_default_lists_nevras() {
        let out = run(|b| {
            b.available(true);
            b.positional("bash").unwrap();
        });
        assert_eq!(out, vec!["bash-5.1-2.ph5.x86_64", "bash-5.2-1.ph5.x86_64"]);
    }

    #[test]
    fn test_requires_union() {
        let out = run(|b| {
            b.available(true).dep_key(DepKey::Requires).unwrap();
            b.positional("bash").unwrap();
        });
        assert_eq!(out, vec!["glibc >= 2.36", "glibc >= 2.38", "ncurses-libs"]);
    }

    #[test]
    fn test_depends_includes_weak_deps() {
        let out = run(|b| {
            b.available(true).dep_key(DepKey::Depends).unwrap();
            b.positional("bash-5.1*").unwrap();
        });
        assert_eq!(out, vec!["bash-completion", "glibc >= 2.36", "ncurses-libs"]);
    }

    #[test]
    fn test_whatrequires_matches_capability_name() {
        let out = run(|b| {
            b.available(true);
            b.what(WhatKey::Requires, "ncurses-libs").unwrap();
        });
        assert_eq!(out, vec!["bash-5.1-2.ph5.x86_64", "vim-9.0-1.ph5.x86_64"]);
    }

    #[test]
    fn test_whatprovides_matches_files() {
        let out = run(|b| {
            b.available(true);
            b.what(WhatKey::Provides, "/bin/sh").unwrap();
        });
        assert_eq!(out, vec!["bash-5.1-2.ph5.x86_64"]);
    }

    #[test]
    fn test_upgrades_and_extras() {
        let out = run(|b| {
            b.upgrades(true);
        });
        assert_eq!(out, vec!["bash-5.2-1.ph5.x86_64"]);

        let out = run(|b| {
            b.extras(true);
        });
        assert_eq!(
            out,
            vec![
                "mytool-1.0-1.noarch",
                "zlib-1.2-1.ph5.x86_64",
                "zlib-1.3-1.ph5.x86_64"
            ]
        );

        let out = run(|b| {
            b.duplicates(true);
        });
        assert_eq!(out, vec!["zlib-1.2-1.ph5.x86_64", "zlib-1.3-1.ph5.x86_64"]);
    }

    #[test]
    fn test_query_format_and_location() {
        let out = run(|b| {
            b.available(true);
            b.positional("bash-5.1-2.ph5.x86_64").unwrap();
            b.query_format("%{name}\\t%{epoch}:%{version}|%{repoid}|%{location}")
                .unwrap();
        });
        assert_eq!(
            out,
            vec![
                "bash\t0:5.1|base|https://repo.example.org/base/RPMS/x86_64/bash-5.1-2.ph5.x86_64.rpm"
            ]
        );

        let out = run(|b| {
            b.available(true).location(true);
        });
        assert_eq!(
            out,
            vec![
                "RPMS/x86_64/bash-5.2-1.ph5.x86_64.rpm",
                "https://repo.example.org/base/RPMS/x86_64/bash-5.1-2.ph5.x86_64.rpm"
            ]
        );
    }

    #[test]
    fn test_file_owner_and_source() {
        let out = run(|b| {
            b.installed(true).file("/usr/bin/bash").source(true);
        });
        assert_eq!(out, vec!["bash-5.1-2.ph5.src.rpm"]);
    }

    #[test]
    fn test_unknown_format_tag_rejected_when_building() {
        let mut b = RepoqueryRequestBuilder::new();
        assert!(matches!(
            b.query_format("%{colour}"),
            Err(Error::ParseError(_))
        ));
        assert!(matches!(
            b.query_format("%{name"),
            Err(Error::ParseError(_))
        ));
        // Nothing was stored, so the request still builds without a format
        assert_eq!(b.build().unwrap().query_format, None);
    }
}
