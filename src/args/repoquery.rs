// src/args/repoquery.rs

//! `repoquery` request

use super::push_arches;
use crate::error::{Error, Result};
use crate::pool::DepKind;
use crate::query::{QueryFormat, Scope};

/// Dependency array printed instead of package names; at most one per query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepKey {
    Provides,
    Obsoletes,
    Conflicts,
    Requires,
    Recommends,
    Suggests,
    Supplements,
    Enhances,
    Depends,
    RequiresPre,
}

impl DepKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepKey::Provides => "provides",
            DepKey::Obsoletes => "obsoletes",
            DepKey::Conflicts => "conflicts",
            DepKey::Requires => "requires",
            DepKey::Recommends => "recommends",
            DepKey::Suggests => "suggests",
            DepKey::Supplements => "supplements",
            DepKey::Enhances => "enhances",
            DepKey::Depends => "depends",
            DepKey::RequiresPre => "requires-pre",
        }
    }

    /// Pool dependency arrays behind this key
    pub fn kinds(&self) -> &'static [DepKind] {
        match self {
            DepKey::Provides => &[DepKind::Provides],
            DepKey::Obsoletes => &[DepKind::Obsoletes],
            DepKey::Conflicts => &[DepKind::Conflicts],
            DepKey::Requires => &[DepKind::Requires],
            DepKey::Recommends => &[DepKind::Recommends],
            DepKey::Suggests => &[DepKind::Suggests],
            DepKey::Supplements => &[DepKind::Supplements],
            DepKey::Enhances => &[DepKind::Enhances],
            DepKey::Depends => DEPENDS_KINDS,
            DepKey::RequiresPre => &[DepKind::RequiresPre],
        }
    }
}

const DEPENDS_KINDS: &[DepKind] = &[
    DepKind::Requires,
    DepKind::Recommends,
    DepKind::Suggests,
    DepKind::Supplements,
    DepKind::Enhances,
];

/// Reverse-dependency selector (`--whatrequires` and friends)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhatKey {
    Provides,
    Obsoletes,
    Conflicts,
    Requires,
    Recommends,
    Suggests,
    Supplements,
    Enhances,
    Depends,
}

impl WhatKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhatKey::Provides => "whatprovides",
            WhatKey::Obsoletes => "whatobsoletes",
            WhatKey::Conflicts => "whatconflicts",
            WhatKey::Requires => "whatrequires",
            WhatKey::Recommends => "whatrecommends",
            WhatKey::Suggests => "whatsuggests",
            WhatKey::Supplements => "whatsupplements",
            WhatKey::Enhances => "whatenhances",
            WhatKey::Depends => "whatdepends",
        }
    }

    pub fn kinds(&self) -> &'static [DepKind] {
        match self {
            WhatKey::Provides => &[DepKind::Provides],
            WhatKey::Obsoletes => &[DepKind::Obsoletes],
            WhatKey::Conflicts => &[DepKind::Conflicts],
            WhatKey::Requires => &[DepKind::Requires],
            WhatKey::Recommends => &[DepKind::Recommends],
            WhatKey::Suggests => &[DepKind::Suggests],
            WhatKey::Supplements => &[DepKind::Supplements],
            WhatKey::Enhances => &[DepKind::Enhances],
            WhatKey::Depends => DEPENDS_KINDS,
        }
    }
}

/// A validated repoquery request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoqueryRequest {
    pub arches: Vec<String>,
    pub dep_key: Option<DepKey>,
    /// Reverse-dependency selectors, each with its capability list
    pub what: Vec<(WhatKey, Vec<String>)>,
    pub available: bool,
    pub installed: bool,
    pub extras: bool,
    pub duplicates: bool,
    pub upgrades: bool,
    pub downgrades: bool,
    /// Print file lists
    pub list: bool,
    /// Print download locations
    pub location: bool,
    /// Print source package names
    pub source: bool,
    /// Only packages owning one of these paths
    pub files: Vec<String>,
    pub query_format: Option<QueryFormat>,
    pub spec: Option<String>,
}

impl RepoqueryRequest {
    /// Scope implied by the selection flags
    pub fn scope(&self) -> Scope {
        if self.installed || self.extras || self.duplicates {
            Scope::Installed
        } else if self.available || self.upgrades || self.downgrades {
            Scope::Available
        } else {
            Scope::None
        }
    }
}

/// Builder for [`RepoqueryRequest`]
#[derive(Debug, Default)]
pub struct RepoqueryRequestBuilder {
    req: RepoqueryRequest,
}

impl RepoqueryRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add architectures; the value may be comma-separated
    pub fn arch(&mut self, value: &str) -> Result<&mut Self> {
        push_arches(&mut self.req.arches, value)?;
        Ok(self)
    }

    /// Select the dependency array to print
    pub fn dep_key(&mut self, key: DepKey) -> Result<&mut Self> {
        if self.req.dep_key.is_some() {
            return Err(Error::OneDepOnly);
        }
        if self.req.query_format.is_some() {
            return Err(Error::MixedQueryFormat);
        }
        self.req.dep_key = Some(key);
        Ok(self)
    }

    /// Add a reverse-dependency selector with a comma-separated capability list
    pub fn what(&mut self, key: WhatKey, value: &str) -> Result<&mut Self> {
        let caps: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
        if caps.is_empty() {
            return Err(Error::InvalidParameter(format!(
                "--{} needs at least one capability",
                key.as_str()
            )));
        }
        match self.req.what.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.extend(caps),
            None => self.req.what.push((key, caps)),
        }
        Ok(self)
    }

    pub fn query_format(&mut self, format: &str) -> Result<&mut Self> {
        if self.req.dep_key.is_some() {
            return Err(Error::MixedQueryFormat);
        }
        self.req.query_format = Some(QueryFormat::parse(format)?);
        Ok(self)
    }

    pub fn file(&mut self, path: &str) -> &mut Self {
        self.req.files.push(path.to_string());
        self
    }

    pub fn available(&mut self, v: bool) -> &mut Self {
        self.req.available |= v;
        self
    }

    pub fn installed(&mut self, v: bool) -> &mut Self {
        self.req.installed |= v;
        self
    }

    pub fn extras(&mut self, v: bool) -> &mut Self {
        self.req.extras |= v;
        self
    }

    pub fn duplicates(&mut self, v: bool) -> &mut Self {
        self.req.duplicates |= v;
        self
    }

    pub fn upgrades(&mut self, v: bool) -> &mut Self {
        self.req.upgrades |= v;
        self
    }

    pub fn downgrades(&mut self, v: bool) -> &mut Self {
        self.req.downgrades |= v;
        self
    }

    pub fn list(&mut self, v: bool) -> &mut Self {
        self.req.list |= v;
        self
    }

    pub fn location(&mut self, v: bool) -> &mut Self {
        self.req.location |= v;
        self
    }

    pub fn source(&mut self, v: bool) -> &mut Self {
        self.req.source |= v;
        self
    }

    /// The package spec; only one may be given
    pub fn positional(&mut self, spec: &str) -> Result<&mut Self> {
        if let Some(existing) = &self.req.spec {
            return Err(Error::InvalidParameter(format!(
                "only one package spec may be given (have '{}', got '{}')",
                existing, spec
            )));
        }
        self.req.spec = Some(spec.to_string());
        Ok(self)
    }

    pub fn build(&self) -> Result<RepoqueryRequest> {
        let mut req = self.req.clone();

        if req.query_format.is_some() && req.dep_key.is_some() {
            return Err(Error::MixedQueryFormat);
        }
        if req.query_format.as_ref().is_some_and(QueryFormat::uses_location) {
            req.location = true;
        }

        let installed_side = req.installed || req.extras || req.duplicates;
        let available_side = req.available || req.upgrades || req.downgrades;
        if installed_side && available_side {
            return Err(Error::InvalidParameter(
                "installed-only and available-only selections cannot be combined".to_string(),
            ));
        }

        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_dep_key_only() {
        let mut b = RepoqueryRequestBuilder::new();
        b.dep_key(DepKey::Requires).unwrap();
        assert!(matches!(
            b.dep_key(DepKey::Provides),
            Err(Error::OneDepOnly)
        ));
    }

    #[test]
    fn test_query_format_excludes_dep_key() {
        let mut b = RepoqueryRequestBuilder::new();
        b.query_format("%{name}").unwrap();
        assert!(matches!(
            b.dep_key(DepKey::Requires),
            Err(Error::MixedQueryFormat)
        ));

        let mut b = RepoqueryRequestBuilder::new();
        b.dep_key(DepKey::Provides).unwrap();
        assert!(matches!(
            b.query_format("%{name}"),
            Err(Error::MixedQueryFormat)
        ));
    }

    #[test]
    fn test_query_format_parsed_eagerly() {
        let mut b = RepoqueryRequestBuilder::new();
        assert!(matches!(
            b.query_format("%{colour}"),
            Err(Error::ParseError(_))
        ));
        assert!(matches!(
            b.query_format("%{name"),
            Err(Error::ParseError(_))
        ));

        b.query_format("%{name}-%{evr}").unwrap();
        assert_eq!(
            b.build().unwrap().query_format,
            Some(QueryFormat::parse("%{name}-%{evr}").unwrap())
        );
    }

    #[test]
    fn test_location_tag_implies_location() {
        let mut b = RepoqueryRequestBuilder::new();
        b.query_format("%{name} %{location}").unwrap();
        let req = b.build().unwrap();
        assert!(req.location);

        let mut b = RepoqueryRequestBuilder::new();
        b.query_format("%{name}").unwrap();
        assert!(!b.build().unwrap().location);
    }

    #[test]
    fn test_what_selectors_accumulate() {
        let mut b = RepoqueryRequestBuilder::new();
        b.what(WhatKey::Requires, "glibc, zlib").unwrap();
        b.what(WhatKey::Provides, "/bin/sh").unwrap();
        b.what(WhatKey::Requires, "openssl").unwrap();
        let req = b.build().unwrap();
        assert_eq!(
            req.what,
            vec![
                (
                    WhatKey::Requires,
                    vec!["glibc".to_string(), "zlib".to_string(), "openssl".to_string()]
                ),
                (WhatKey::Provides, vec!["/bin/sh".to_string()]),
            ]
        );
        assert!(b.what(WhatKey::Enhances, " , ").is_err());
    }

    #[test]
    fn test_single_positional() {
        let mut b = RepoqueryRequestBuilder::new();
        b.positional("bash").unwrap();
        assert!(matches!(
            b.positional("zsh"),
            Err(Error::InvalidParameter(_))
        ));
        assert_eq!(b.build().unwrap().spec.as_deref(), Some("bash"));
    }

    #[test]
    fn test_scope_selection() {
        let mut b = RepoqueryRequestBuilder::new();
        b.extras(true);
        assert_eq!(b.build().unwrap().scope(), Scope::Installed);

        b.upgrades(true);
        assert!(matches!(b.build(), Err(Error::InvalidParameter(_))));

        let mut b = RepoqueryRequestBuilder::new();
        b.available(true);
        assert_eq!(b.build().unwrap().scope(), Scope::Available);
        assert_eq!(
            RepoqueryRequestBuilder::new().build().unwrap().scope(),
            Scope::None
        );
    }

    #[test]
    fn test_depends_spans_weak_deps() {
        assert_eq!(DepKey::Depends.kinds().len(), 5);
        assert_eq!(WhatKey::Depends.kinds(), DepKey::Depends.kinds());
        assert_eq!(DepKey::RequiresPre.as_str(), "requires-pre");
    }
}
