// src/cli/repoquery.rs
//! Repoquery command arguments

use clap::Args;

#[derive(Args)]
pub struct RepoqueryArgs {
    /// Package name glob or NEVRA
    pub spec: Vec<String>,

    /// Limit to these architectures (comma-separated, repeatable)
    #[arg(long)]
    pub arch: Vec<String>,

    // Dependency keys: at most one

    /// Print provides of the matched packages
    #[arg(long)]
    pub provides: bool,

    #[arg(long)]
    pub obsoletes: bool,

    #[arg(long)]
    pub conflicts: bool,

    /// Print requires of the matched packages
    #[arg(long)]
    pub requires: bool,

    #[arg(long)]
    pub recommends: bool,

    #[arg(long)]
    pub suggests: bool,

    #[arg(long)]
    pub supplements: bool,

    #[arg(long)]
    pub enhances: bool,

    /// Requires plus all weak dependencies
    #[arg(long)]
    pub depends: bool,

    #[arg(long = "requires-pre")]
    pub requires_pre: bool,

    // Reverse dependencies: capability lists, comma-separated

    #[arg(long, value_name = "CAPS")]
    pub whatprovides: Vec<String>,

    #[arg(long, value_name = "CAPS")]
    pub whatobsoletes: Vec<String>,

    #[arg(long, value_name = "CAPS")]
    pub whatconflicts: Vec<String>,

    #[arg(long, value_name = "CAPS")]
    pub whatrequires: Vec<String>,

    #[arg(long, value_name = "CAPS")]
    pub whatrecommends: Vec<String>,

    #[arg(long, value_name = "CAPS")]
    pub whatsuggests: Vec<String>,

    #[arg(long, value_name = "CAPS")]
    pub whatsupplements: Vec<String>,

    #[arg(long, value_name = "CAPS")]
    pub whatenhances: Vec<String>,

    #[arg(long, value_name = "CAPS")]
    pub whatdepends: Vec<String>,

    /// Only packages from enabled repositories
    #[arg(long)]
    pub available: bool,

    /// Only installed packages
    #[arg(long)]
    pub installed: bool,

    /// Installed packages not available from any repository
    #[arg(long)]
    pub extras: bool,

    /// Installed packages with more than one version
    #[arg(long)]
    pub duplicates: bool,

    /// Available upgrades of installed packages
    #[arg(long)]
    pub upgrades: bool,

    /// Available downgrades of installed packages
    #[arg(long)]
    pub downgrades: bool,

    /// Packages owning this file (repeatable)
    #[arg(long)]
    pub file: Vec<String>,

    /// Print file lists
    #[arg(short, long)]
    pub list: bool,

    /// Print download URLs
    #[arg(long)]
    pub location: bool,

    /// Print source package names
    #[arg(long)]
    pub source: bool,

    /// Output format, e.g. "%{name} %{evr}"
    #[arg(long = "qf", alias = "queryformat", value_name = "FORMAT")]
    pub query_format: Option<String>,
}
