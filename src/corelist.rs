// src/corelist.rs

//! Core-module inventory for hypothetical target runtimes
//!
//! Maps a runtime version to the modules that ship with it. The table is
//! injected read-only at construction; the core never loads it itself.

use crate::version::Version;
use std::collections::BTreeMap;

/// Which packages each runtime release ships, and at what version
#[derive(Debug, Clone, Default)]
pub struct CoreInventory {
    releases: BTreeMap<Version, BTreeMap<String, Version>>,
}

impl CoreInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `runtime` ships `package` at `version`
    pub fn insert(&mut self, runtime: Version, package: impl Into<String>, version: Version) {
        self.releases
            .entry(runtime)
            .or_default()
            .insert(package.into(), version);
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_module(
        mut self,
        runtime: Version,
        package: impl Into<String>,
        version: Version,
    ) -> Self {
        self.insert(runtime, package, version);
        self
    }

    /// The version of `package` shipped with `runtime`, if it is core there
    pub fn core_version(&self, runtime: &Version, package: &str) -> Option<&Version> {
        self.releases.get(runtime)?.get(package)
    }

    pub fn is_core(&self, runtime: &Version, package: &str) -> bool {
        self.core_version(runtime, package).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_lookup() {
        let inventory = CoreInventory::new()
            .with_module(v("5.36.0"), "File.Temp", v("0.2311"))
            .with_module(v("5.36.0"), "Scalar.Util", v("1.62"))
            .with_module(v("5.38.0"), "File.Temp", v("0.2312"));

        assert_eq!(
            inventory.core_version(&v("5.36.0"), "File.Temp"),
            Some(&v("0.2311"))
        );
        assert!(inventory.is_core(&v("5.38.0"), "File.Temp"));
        assert!(!inventory.is_core(&v("5.38.0"), "Scalar.Util"));
        assert!(!inventory.is_core(&v("5.34.0"), "File.Temp"));
    }
}
