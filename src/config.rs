// src/config.rs

//! Options the orchestration core recognizes

use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration handed to the Master at construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Version of the running runtime; the `perl` pseudo-package is
    /// satisfied against this (or `target_perl` when set)
    pub perl_version: Version,
    /// Hypothetical runtime whose core list satisfies requirements
    pub target_perl: Option<Version>,
    /// Global install: disables core-list side-checks
    pub global: bool,
    /// Force re-install of already-satisfied packages, once per run
    pub reinstall: bool,
    /// Directories the installed-module oracle searches
    pub search_inc: Vec<PathBuf>,
    /// Directories whose contents count as runtime core
    pub core_inc: Vec<PathBuf>,
    /// Emit `n/total` updates after every install
    pub show_progress: bool,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            perl_version: Version::parse("5.36.1").expect("default runtime version"),
            target_perl: None,
            global: false,
            reinstall: false,
            search_inc: Vec::new(),
            core_inc: Vec::new(),
            show_progress: false,
        }
    }
}

impl MasterConfig {
    pub fn new(perl_version: Version) -> Self {
        Self {
            perl_version,
            ..Default::default()
        }
    }

    pub fn with_target_perl(mut self, target: Version) -> Self {
        self.target_perl = Some(target);
        self
    }

    pub fn with_global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    pub fn with_reinstall(mut self, reinstall: bool) -> Self {
        self.reinstall = reinstall;
        self
    }

    pub fn with_search_inc(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_inc = dirs;
        self
    }

    pub fn with_core_inc(mut self, dirs: Vec<PathBuf>) -> Self {
        self.core_inc = dirs;
        self
    }

    pub fn with_show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// The runtime version requirements on `perl` are checked against
    pub fn effective_perl(&self) -> &Version {
        self.target_perl.as_ref().unwrap_or(&self.perl_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_perl_prefers_target() {
        let config = MasterConfig::new(Version::parse("5.36.0").unwrap());
        assert_eq!(config.effective_perl(), &Version::parse("5.36.0").unwrap());

        let config = config.with_target_perl(Version::parse("5.38.0").unwrap());
        assert_eq!(config.effective_perl(), &Version::parse("5.38.0").unwrap());
    }
}
