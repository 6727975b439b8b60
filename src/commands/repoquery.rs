// src/commands/repoquery.rs
//! Repoquery command

use super::{load_config, open_sack, GlobalOptions};
use crate::cli::RepoqueryArgs;
use anyhow::Result;
use pkgmgr::args::{DepKey, RepoqueryRequest, RepoqueryRequestBuilder, WhatKey};
use pkgmgr::query::run_repoquery;

/// Validate the options into a request; no configuration or repo access
pub fn build_request(args: &RepoqueryArgs) -> pkgmgr::Result<RepoqueryRequest> {
    let mut b = RepoqueryRequestBuilder::new();

    for arch in &args.arch {
        b.arch(arch)?;
    }

    let dep_keys = [
        (args.provides, DepKey::Provides),
        (args.obsoletes, DepKey::Obsoletes),
        (args.conflicts, DepKey::Conflicts),
        (args.requires, DepKey::Requires),
        (args.recommends, DepKey::Recommends),
        (args.suggests, DepKey::Suggests),
        (args.supplements, DepKey::Supplements),
        (args.enhances, DepKey::Enhances),
        (args.depends, DepKey::Depends),
        (args.requires_pre, DepKey::RequiresPre),
    ];
    for (set, key) in dep_keys {
        if set {
            b.dep_key(key)?;
        }
    }

    let what = [
        (&args.whatprovides, WhatKey::Provides),
        (&args.whatobsoletes, WhatKey::Obsoletes),
        (&args.whatconflicts, WhatKey::Conflicts),
        (&args.whatrequires, WhatKey::Requires),
        (&args.whatrecommends, WhatKey::Recommends),
        (&args.whatsuggests, WhatKey::Suggests),
        (&args.whatsupplements, WhatKey::Supplements),
        (&args.whatenhances, WhatKey::Enhances),
        (&args.whatdepends, WhatKey::Depends),
    ];
    for (values, key) in what {
        for value in values {
            b.what(key, value)?;
        }
    }

    if let Some(qf) = &args.query_format {
        b.query_format(qf)?;
    }
    for file in &args.file {
        b.file(file);
    }

    b.available(args.available)
        .installed(args.installed)
        .extras(args.extras)
        .duplicates(args.duplicates)
        .upgrades(args.upgrades)
        .downgrades(args.downgrades)
        .list(args.list)
        .location(args.location)
        .source(args.source);

    for spec in &args.spec {
        b.positional(spec)?;
    }
    b.build()
}

pub fn cmd_repoquery(opts: &GlobalOptions, args: &RepoqueryArgs) -> Result<()> {
    let req = build_request(args)?;
    let mut config = load_config(opts)?;
    let (sack, _) = open_sack(&mut config, opts)?;

    let lines = run_repoquery(sack.pool(), &req)?;
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        for line in lines {
            println!("{}", line);
        }
    }
    Ok(())
}
