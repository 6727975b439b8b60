// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::GlobalOptions;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays usable from scripts
    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let opts = GlobalOptions {
        config: cli.config,
        setopts: cli.setopt,
        cache_only: cli.cache_only,
        refresh: cli.refresh,
        json: cli.json,
        verbose: cli.verbose,
        enable_repos: cli.enable_repo,
        disable_repos: cli.disable_repo,
    };

    match cli.command {
        Some(Commands::Makecache) => commands::cmd_makecache(&opts),
        Some(Commands::Repolist { all }) => commands::cmd_repolist(&opts, all),
        Some(Commands::SizeEstimate { packages }) => commands::cmd_size_estimate(&opts, &packages),
        Some(Commands::History(args)) => commands::cmd_history(&opts, &args),
        Some(Commands::Repoquery(args)) => commands::cmd_repoquery(&opts, &args),
        Some(Commands::Reposync(args)) => commands::cmd_reposync(&opts, &args),
        None => {
            println!("pkgmgr v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'pkgmgr --help' for usage information");
            Ok(())
        }
    }
}
