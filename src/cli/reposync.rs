// src/cli/reposync.rs
//! Reposync command arguments

use clap::Args;

#[derive(Args)]
pub struct ReposyncArgs {
    /// Limit to these architectures (comma-separated, repeatable)
    #[arg(long)]
    pub arch: Vec<String>,

    /// Remove local packages no longer present in the repository
    #[arg(long)]
    pub delete: bool,

    /// Also copy repository metadata
    #[arg(long)]
    pub download_metadata: bool,

    /// Verify package signatures
    #[arg(long)]
    pub gpgcheck: bool,

    /// Only the newest version of each package
    #[arg(long)]
    pub newest_only: bool,

    /// Do not add the repo id to the download path
    #[arg(long)]
    pub norepopath: bool,

    /// Only source packages
    #[arg(long)]
    pub source_only: bool,

    /// Print package URLs instead of downloading
    #[arg(long)]
    pub print_urls_only: bool,

    /// Directory to download into (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub download_path: Option<String>,

    /// Directory for metadata (default: the download path)
    #[arg(long, value_name = "DIR")]
    pub metadata_path: Option<String>,
}
