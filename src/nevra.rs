// src/nevra.rs

//! NEVRA identity parsing and EVR comparison
//!
//! A package identity is written `name-evr.arch`, where the evr is
//! `[epoch:]version-release`. Splitting is positional: the last `.` starts the
//! architecture and the two rightmost `-` before it bound the evr. This is a
//! fixed-format rule, not a general grammar; names may contain `-` but
//! versions and releases may not.

use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A split `name-evr.arch` identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nevra {
    pub name: String,
    /// Epoch-version-release, kept as one opaque field
    pub evr: String,
    pub arch: String,
}

impl Nevra {
    pub fn new(name: impl Into<String>, evr: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            evr: evr.into(),
            arch: arch.into(),
        }
    }

    /// Parse a canonical `name-evr.arch` string
    pub fn parse(s: &str) -> Result<Self> {
        let (name, evr, arch) = split_nevra(s)?;
        Ok(Self::new(name, evr, arch))
    }
}

impl fmt::Display for Nevra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}.{}", self.name, self.evr, self.arch)
    }
}

impl FromStr for Nevra {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Nevra::parse(s)
    }
}

/// Split `name-evr.arch` into its three parts
///
/// The input is only borrowed; the returned parts are owned copies.
///
/// ```
/// use pkgmgr::nevra::split_nevra;
///
/// let (name, evr, arch) = split_nevra("bash-5.1-2.ph5.x86_64").unwrap();
/// assert_eq!((name.as_str(), evr.as_str(), arch.as_str()), ("bash", "5.1-2.ph5", "x86_64"));
/// ```
pub fn split_nevra(nevra: &str) -> Result<(String, String, String)> {
    let dot = nevra
        .rfind('.')
        .ok_or_else(|| Error::ParseError(format!("no architecture in '{}'", nevra)))?;
    let arch = &nevra[dot + 1..];
    let head = &nevra[..dot];

    let release_dash = head
        .rfind('-')
        .ok_or_else(|| Error::ParseError(format!("no version-release in '{}'", nevra)))?;
    let version_dash = head[..release_dash]
        .rfind('-')
        .ok_or_else(|| Error::ParseError(format!("no version-release in '{}'", nevra)))?;

    let name = &head[..version_dash];
    let evr = &head[version_dash + 1..];

    if name.is_empty() || arch.is_empty() {
        return Err(Error::ParseError(format!(
            "empty name or architecture in '{}'",
            nevra
        )));
    }

    Ok((name.to_string(), evr.to_string(), arch.to_string()))
}

/// Split `name=evr` on the first `=`
pub fn split_name_equals_evr(nevr: &str) -> Result<(String, String)> {
    let (name, evr) = nevr
        .split_once('=')
        .ok_or_else(|| Error::ParseError(format!("expected 'name=evr', got '{}'", nevr)))?;
    Ok((name.to_string(), evr.to_string()))
}

/// Epoch, version and release of an evr string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evr<'a> {
    pub epoch: Option<&'a str>,
    pub version: &'a str,
    pub release: Option<&'a str>,
}

impl<'a> Evr<'a> {
    /// Split `[epoch:]version[-release]`
    pub fn parse(evr: &'a str) -> Self {
        let (epoch, rest) = match evr.split_once(':') {
            Some((e, r)) if e.bytes().all(|b| b.is_ascii_digit()) => (Some(e), r),
            _ => (None, evr),
        };
        let (version, release) = match rest.rfind('-') {
            Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
            None => (rest, None),
        };
        Self {
            epoch,
            version,
            release,
        }
    }

    /// Numeric epoch; missing or empty means 0
    pub fn epoch_num(&self) -> u64 {
        self.epoch
            .filter(|e| !e.is_empty())
            .and_then(|e| e.parse().ok())
            .unwrap_or(0)
    }
}

/// Compare two evr strings the way RPM orders package versions
pub fn evr_cmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let a = Evr::parse(a);
    let b = Evr::parse(b);

    a.epoch_num()
        .cmp(&b.epoch_num())
        .then_with(|| rpmvercmp(a.version, b.version))
        .then_with(|| match (a.release, b.release) {
            (Some(ra), Some(rb)) => rpmvercmp(ra, rb),
            _ => Ordering::Equal,
        })
}

/// Segment-wise version comparison
///
/// Digit runs compare numerically, alpha runs lexically, a digit run beats an
/// alpha run, `~` sorts before everything (pre-releases) and `^` sorts after
/// the bare version but before any further segment.
pub fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let mut one = a.as_bytes();
    let mut two = b.as_bytes();
    let is_sep = |c: u8| !c.is_ascii_alphanumeric() && c != b'~' && c != b'^';

    loop {
        while let Some(&c) = one.first() {
            if !is_sep(c) {
                break;
            }
            one = &one[1..];
        }
        while let Some(&c) = two.first() {
            if !is_sep(c) {
                break;
            }
            two = &two[1..];
        }

        let one_tilde = one.first() == Some(&b'~');
        let two_tilde = two.first() == Some(&b'~');
        if one_tilde || two_tilde {
            if !one_tilde {
                return Ordering::Greater;
            }
            if !two_tilde {
                return Ordering::Less;
            }
            one = &one[1..];
            two = &two[1..];
            continue;
        }

        let one_caret = one.first() == Some(&b'^');
        let two_caret = two.first() == Some(&b'^');
        if one_caret || two_caret {
            if one.is_empty() {
                return Ordering::Less;
            }
            if two.is_empty() {
                return Ordering::Greater;
            }
            if !one_caret {
                return Ordering::Greater;
            }
            if !two_caret {
                return Ordering::Less;
            }
            one = &one[1..];
            two = &two[1..];
            continue;
        }

        if one.is_empty() || two.is_empty() {
            break;
        }

        let numeric = one[0].is_ascii_digit();
        let take = |s: &[u8]| -> usize {
            s.iter()
                .take_while(|c| {
                    if numeric {
                        c.is_ascii_digit()
                    } else {
                        c.is_ascii_alphabetic()
                    }
                })
                .count()
        };
        let len_one = take(one);
        let len_two = take(two);
        let (seg_one, seg_two) = (&one[..len_one], &two[..len_two]);

        // Segments of different types: numeric is newer
        if seg_two.is_empty() {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ord = if numeric {
            let strip = |s: &[u8]| -> usize { s.iter().take_while(|&&c| c == b'0').count() };
            let s1 = &seg_one[strip(seg_one)..];
            let s2 = &seg_two[strip(seg_two)..];
            s1.len().cmp(&s2.len()).then_with(|| s1.cmp(s2))
        } else {
            seg_one.cmp(seg_two)
        };
        if ord != Ordering::Equal {
            return ord;
        }

        one = &one[len_one..];
        two = &two[len_two..];
    }

    match (one.is_empty(), two.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        _ => Ordering::Greater,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_nevra() {
        let (name, evr, arch) = split_nevra("bash-5.1-2.ph5.x86_64").unwrap();
        assert_eq!(name, "bash");
        assert_eq!(evr, "5.1-2.ph5");
        assert_eq!(arch, "x86_64");
        assert_eq!(format!("{}-{}.{}", name, evr, arch), "bash-5.1-2.ph5.x86_64");
    }

    #[test]
    fn test_split_nevra_dashed_name_and_epoch() {
        let nevra = Nevra::parse("perl-Data-Dumper-1:2.183-1.ph5.noarch").unwrap();
        assert_eq!(nevra.name, "perl-Data-Dumper");
        assert_eq!(nevra.evr, "1:2.183-1.ph5");
        assert_eq!(nevra.arch, "noarch");
        assert_eq!(nevra.to_string(), "perl-Data-Dumper-1:2.183-1.ph5.noarch");
    }

    #[test]
    fn test_split_nevra_errors() {
        assert!(matches!(split_nevra("badname"), Err(Error::ParseError(_))));
        // dot present, but only one dash
        assert!(matches!(split_nevra("bash-5.x86_64"), Err(Error::ParseError(_))));
        assert!(matches!(split_nevra("-5.1-2.x86_64"), Err(Error::ParseError(_))));
    }

    #[test]
    fn test_split_nevra_leaves_input_untouched() {
        let input = String::from("zlib-1.2.13-1.ph5.aarch64");
        let _ = split_nevra(&input).unwrap();
        assert_eq!(input, "zlib-1.2.13-1.ph5.aarch64");
    }

    #[test]
    fn test_split_name_equals_evr() {
        let (name, evr) = split_name_equals_evr("bash=5.1-2.ph5").unwrap();
        assert_eq!(name, "bash");
        assert_eq!(evr, "5.1-2.ph5");

        let (name, evr) = split_name_equals_evr("a=b=c").unwrap();
        assert_eq!((name.as_str(), evr.as_str()), ("a", "b=c"));

        assert!(matches!(
            split_name_equals_evr("bash"),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn test_evr_parse() {
        let evr = Evr::parse("2:1.2.3-4.el8");
        assert_eq!(evr.epoch, Some("2"));
        assert_eq!(evr.version, "1.2.3");
        assert_eq!(evr.release, Some("4.el8"));
        assert_eq!(evr.epoch_num(), 2);

        let evr = Evr::parse("1.0");
        assert_eq!(evr.epoch, None);
        assert_eq!(evr.release, None);
        assert_eq!(evr.epoch_num(), 0);
    }

    #[test]
    fn test_rpmvercmp() {
        assert_eq!(rpmvercmp("1.0", "1.0"), Ordering::Equal);
        assert_eq!(rpmvercmp("1.0", "2.0"), Ordering::Less);
        assert_eq!(rpmvercmp("1.10", "1.9"), Ordering::Greater);
        assert_eq!(rpmvercmp("1.0a", "1.0"), Ordering::Greater);
        assert_eq!(rpmvercmp("1.0", "1.0a"), Ordering::Less);
        assert_eq!(rpmvercmp("1.05", "1.5"), Ordering::Equal);
        assert_eq!(rpmvercmp("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(rpmvercmp("1.0^git1", "1.0"), Ordering::Greater);
        assert_eq!(rpmvercmp("1.0^git1", "1.0.1"), Ordering::Less);
        assert_eq!(rpmvercmp("2a", "2.0"), Ordering::Less);
    }

    #[test]
    fn test_evr_cmp() {
        assert_eq!(evr_cmp("1:1.0-1", "2.0-1"), Ordering::Greater);
        assert_eq!(evr_cmp("5.1-2.ph5", "5.1-10.ph5"), Ordering::Less);
        assert_eq!(evr_cmp("0:5.1-2", "5.1-2"), Ordering::Equal);
        assert_eq!(evr_cmp("5.1", "5.1-2"), Ordering::Equal);
    }
}
