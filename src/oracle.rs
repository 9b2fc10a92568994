// src/oracle.rs

//! Installed-module oracle seam
//!
//! The core never inspects the filesystem; it asks an injected oracle
//! whether a package is already present in the target environment. Probe
//! results are cached by the Master, so an oracle is queried at most once
//! per package per run.

use crate::version::Version;
use std::collections::HashMap;
use std::path::PathBuf;

/// What a probe reports about an installed module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledModule {
    pub name: String,
    pub version: Option<Version>,
    /// File the module was found in, when the backend knows it
    pub filename: Option<PathBuf>,
    /// Recorded git revision, for modules installed from a checkout
    pub rev: Option<String>,
}

impl InstalledModule {
    pub fn new(name: impl Into<String>, version: Option<Version>) -> Self {
        Self {
            name: name.into(),
            version,
            filename: None,
            rev: None,
        }
    }

    pub fn with_rev(mut self, rev: impl Into<String>) -> Self {
        self.rev = Some(rev.into());
        self
    }
}

/// Backend that inspects the target environment
pub trait InstalledOracle: Send {
    /// Look `package` up along `search_paths`; `None` when absent
    fn probe(&self, package: &str, search_paths: &[PathBuf]) -> Option<InstalledModule>;
}

/// An environment with nothing installed
#[derive(Debug, Default)]
pub struct EmptyOracle;

impl InstalledOracle for EmptyOracle {
    fn probe(&self, _package: &str, _search_paths: &[PathBuf]) -> Option<InstalledModule> {
        None
    }
}

/// Map-backed oracle; the standard test double and embedder shortcut
#[derive(Debug, Default)]
pub struct StaticOracle {
    modules: HashMap<String, InstalledModule>,
}

impl StaticOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: InstalledModule) {
        self.modules.insert(module.name.clone(), module);
    }

    pub fn with_module(mut self, name: &str, version: &str) -> Self {
        self.insert(InstalledModule::new(
            name,
            Some(Version::parse(version).expect("test version literal")),
        ));
        self
    }
}

impl InstalledOracle for StaticOracle {
    fn probe(&self, package: &str, _search_paths: &[PathBuf]) -> Option<InstalledModule> {
        self.modules.get(package).cloned()
    }
}
