// build.rs

//! Man pages generated from the clap definitions in `src/cli`

use clap::CommandFactory;
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[allow(dead_code, unused_imports)]
#[path = "src/cli/mod.rs"]
mod cli;

fn render(cmd: clap::Command, title: &str, path: &Path) -> Result<(), String> {
    let mut buffer = Vec::new();
    Man::new(cmd)
        .title(title)
        .render(&mut buffer)
        .map_err(|e| format!("Failed to render {}: {}", path.display(), e))?;
    fs::write(path, buffer).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/cli");

    let Some(out_dir) = env::var_os("CARGO_MANIFEST_DIR").map(|d| PathBuf::from(d).join("man"))
    else {
        println!("cargo:warning=CARGO_MANIFEST_DIR not set, skipping man pages");
        return;
    };
    if let Err(e) = fs::create_dir_all(&out_dir) {
        println!("cargo:warning=Failed to create {}: {}", out_dir.display(), e);
        return;
    }

    let mut cmd = cli::Cli::command();
    cmd.build();

    // pkgmgr.1 plus one page per subcommand, e.g. pkgmgr-repoquery.1
    let mut pages = vec![("pkgmgr".to_string(), cmd.clone())];
    for sub in cmd.get_subcommands().filter(|s| s.get_name() != "help") {
        pages.push((format!("pkgmgr-{}", sub.get_name()), sub.clone()));
    }

    for (title, page) in pages {
        let path = out_dir.join(format!("{}.1", title));
        if let Err(e) = render(page, &title, &path) {
            println!("cargo:warning={}", e);
        }
    }
}
