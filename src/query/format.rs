// src/query/format.rs

//! `--qf` output formats
//!
//! A format is literal text with `%{tag}` placeholders; `\n` and `\t` are
//! unescaped. Parsing happens when the request is built, so an unknown tag
//! is reported before any repository is touched.

use crate::error::{Error, Result};
use crate::nevra::Evr;
use crate::pool::{Pool, SolvableId};
use crate::repository::package_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Name,
    Epoch,
    Version,
    Release,
    Evr,
    Arch,
    Nevra,
    RepoId,
    Location,
    InstallSize,
    DownloadSize,
    Summary,
    SourceRpm,
}

impl Tag {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "name" => Tag::Name,
            "epoch" => Tag::Epoch,
            "version" => Tag::Version,
            "release" => Tag::Release,
            "evr" => Tag::Evr,
            "arch" => Tag::Arch,
            "nevra" => Tag::Nevra,
            "repoid" => Tag::RepoId,
            "location" => Tag::Location,
            "installsize" => Tag::InstallSize,
            "downloadsize" => Tag::DownloadSize,
            "summary" => Tag::Summary,
            "sourcerpm" => Tag::SourceRpm,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Tag(Tag),
}

/// A parsed `--qf` string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFormat {
    segments: Vec<Segment>,
}

impl QueryFormat {
    pub fn parse(format: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = format;

        while let Some(c) = rest.chars().next() {
            if let Some(after) = rest.strip_prefix("%{") {
                let end = after.find('}').ok_or_else(|| {
                    Error::ParseError(format!("unterminated tag in query format '{}'", format))
                })?;
                let tag = Tag::from_name(&after[..end]).ok_or_else(|| {
                    Error::ParseError(format!("unknown query format tag '%{{{}}}'", &after[..end]))
                })?;
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Tag(tag));
                rest = &after[end + 1..];
            } else if let Some(after) = rest.strip_prefix("\\n") {
                literal.push('\n');
                rest = after;
            } else if let Some(after) = rest.strip_prefix("\\t") {
                literal.push('\t');
                rest = after;
            } else {
                literal.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Whether `%{location}` appears
    pub fn uses_location(&self) -> bool {
        self.segments.contains(&Segment::Tag(Tag::Location))
    }

    /// Render one solvable; with `resolve_location` locations become full URLs
    pub fn render(&self, pool: &Pool, id: SolvableId, resolve_location: bool) -> String {
        let solvable = pool.solvable(id);
        let evr = Evr::parse(pool.evr(id));
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Tag(tag) => match tag {
                    Tag::Name => out.push_str(pool.name(id)),
                    Tag::Epoch => out.push_str(&evr.epoch_num().to_string()),
                    Tag::Version => out.push_str(evr.version),
                    Tag::Release => out.push_str(evr.release.unwrap_or("")),
                    Tag::Evr => out.push_str(pool.evr(id)),
                    Tag::Arch => out.push_str(pool.arch(id)),
                    Tag::Nevra => out.push_str(&pool.nevra(id)),
                    Tag::RepoId => out.push_str(&pool.repo(solvable.repo).name),
                    Tag::Location => {
                        let location = if resolve_location {
                            location_url(pool, id)
                        } else {
                            solvable.location.clone()
                        };
                        out.push_str(location.as_deref().unwrap_or(""));
                    }
                    Tag::InstallSize => out.push_str(&solvable.install_size.to_string()),
                    Tag::DownloadSize => out.push_str(&solvable.download_size.to_string()),
                    Tag::Summary => out.push_str(&solvable.summary),
                    Tag::SourceRpm => out.push_str(solvable.sourcerpm.as_deref().unwrap_or("")),
                },
            }
        }
        out
    }
}

/// Download URL of a solvable, joined onto its repo's baseurl
pub fn location_url(pool: &Pool, id: SolvableId) -> Option<String> {
    let solvable = pool.solvable(id);
    let location = solvable.location.as_deref()?;
    Some(package_url(
        pool.repo(solvable.repo).baseurl.as_deref(),
        location,
    ))
}
