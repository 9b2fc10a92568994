// src/master/satisfy.rs

//! Requirement satisfaction pass
//!
//! Walks a flat requirement list and classifies every entry: satisfied by
//! the runtime, by the core list, by a known distribution, or by an already
//! installed module; everything else lands in `need_resolve`. The pass never
//! short-circuits, so one call collects the complete picture.

use super::Master;
use crate::distribution::Source;
use crate::oracle::InstalledModule;
use crate::report::{Outcome, ReportRecord};
use crate::requirement::RequirementEntry;
use crate::version::{Version, VersionRange};

/// Overall verdict of one satisfaction pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SatisfyStatus {
    Satisfied,
    Unsatisfied,
    /// The `perl` pseudo-package cannot be satisfied by the target runtime
    PerlVersionFail,
}

/// Result of [`Master::is_satisfied`]
#[derive(Debug, Clone)]
pub struct Satisfaction {
    pub status: SatisfyStatus,
    /// A requirement disagrees with its provider about the source
    pub conflict: bool,
    /// Entries that need a resolve job
    pub need_resolve: Vec<RequirementEntry>,
}

/// What the installed-oracle said about one package
#[derive(Debug, Clone)]
pub struct InstalledQuery {
    pub satisfied: bool,
    pub version: Option<Version>,
    pub rev: Option<String>,
}

impl Master {
    /// Query the installed-module oracle, caching the probe
    ///
    /// In reinstall mode the first query per package reports the module
    /// absent so it is forced through the pipeline; later queries tell the
    /// truth, which bounds each package to one forced pass per run.
    pub fn is_installed(
        &mut self,
        package: &str,
        range: &VersionRange,
        git_ref: Option<&str>,
    ) -> InstalledQuery {
        self.probe_cached(package);
        let module = self
            .installed_cache
            .get(package)
            .expect("probe cached above");
        let version = module.as_ref().and_then(|m| m.version.clone());
        let rev = module.as_ref().and_then(|m| m.rev.clone());

        if self.config.reinstall && self.reinstall_done.insert(package.to_string()) {
            return InstalledQuery {
                satisfied: false,
                version,
                rev,
            };
        }

        let satisfied = Self::module_satisfies(module, range, git_ref);
        InstalledQuery {
            satisfied,
            version,
            rev,
        }
    }

    /// Run the oracle once per package and remember its answer
    fn probe_cached(&mut self, package: &str) {
        if !self.installed_cache.contains_key(package) {
            let probed = self.oracle.probe(package, &self.config.search_inc);
            self.installed_cache.insert(package.to_string(), probed);
        }
    }

    /// Whether a probed module satisfies a range and, when demanded, a ref
    fn module_satisfies(
        module: &Option<InstalledModule>,
        range: &VersionRange,
        git_ref: Option<&str>,
    ) -> bool {
        match module {
            None => false,
            Some(m) => {
                let version_ok = match &m.version {
                    Some(v) => v.satisfies(range),
                    None => Version::parse("0").expect("literal zero").satisfies(range),
                };
                let ref_ok = match git_ref {
                    None => true,
                    Some(wanted) => m.rev.as_deref() == Some(wanted),
                };
                version_ok && ref_ok
            }
        }
    }

    /// Root requirement entries nothing satisfies at terminal
    ///
    /// A root holds when an installed distribution provides it, the core
    /// list covers it, or the environment already has it. The reinstall
    /// forcing of [`Master::is_installed`] does not apply here; the terminal
    /// check wants the truth. The `perl` pseudo-package got its verdict at
    /// registration time and is skipped.
    pub(super) fn unsatisfied_roots(&mut self) -> Vec<RequirementEntry> {
        let entries = self.roots.as_slice().to_vec();
        let mut missing = Vec::new();
        for entry in entries {
            if entry.package == "perl" {
                continue;
            }
            if self.satisfied_by_core(&entry) {
                continue;
            }
            let provided = self.distributions.values().any(|d| {
                d.installed() && d.providing(&entry.package, &entry.range, entry.git_ref())
            });
            if provided {
                continue;
            }
            self.probe_cached(&entry.package);
            let module = self
                .installed_cache
                .get(&entry.package)
                .expect("probe cached above");
            if Self::module_satisfies(module, &entry.range, entry.git_ref()) {
                continue;
            }
            missing.push(entry);
        }
        missing
    }

    /// Classify a flat requirement list
    pub fn is_satisfied(&mut self, entries: &[RequirementEntry]) -> Satisfaction {
        let mut perl_fail = false;
        let mut conflict = false;
        let mut pending = false;
        let mut need_resolve: Vec<RequirementEntry> = Vec::new();

        for entry in entries {
            if entry.package == "perl" {
                // The runtime itself is never installed; collect the verdict
                // and keep going.
                if !self.config.effective_perl().satisfies(&entry.range) {
                    perl_fail = true;
                }
                continue;
            }

            if self.satisfied_by_core(entry) {
                continue;
            }

            match self.find_provider(entry) {
                Some(distfile) => {
                    let dist = self
                        .distributions
                        .get(&distfile)
                        .expect("provider index from live map");
                    let source_ok = match (entry.git(), dist.source == Source::Git) {
                        (None, false) => true,
                        (Some(uri), true) => dist.uri == uri,
                        _ => false,
                    };
                    if !source_ok {
                        conflict = true;
                        let record = ReportRecord::new(
                            Outcome::Fail,
                            format!(
                                "Source conflict for {}: requirement disagrees with {}",
                                entry.package,
                                dist.distvname()
                            ),
                        );
                        self.sink.log_fail(record);
                        pending = true;
                        continue;
                    }

                    if self.config.reinstall {
                        let query =
                            self.is_installed(&entry.package, &entry.range, entry.git_ref());
                        if !query.satisfied {
                            need_resolve.push(entry.clone());
                            continue;
                        }
                    }

                    let dist = self
                        .distributions
                        .get(&distfile)
                        .expect("provider index from live map");
                    if dist.installed() {
                        continue;
                    }
                    // A known provider that has not finished yet: wait.
                    pending = true;
                }
                None => {
                    let query = self.is_installed(&entry.package, &entry.range, entry.git_ref());
                    if query.satisfied {
                        continue;
                    }
                    need_resolve.push(entry.clone());
                }
            }
        }

        let status = if perl_fail {
            SatisfyStatus::PerlVersionFail
        } else if pending || !need_resolve.is_empty() {
            SatisfyStatus::Unsatisfied
        } else {
            SatisfyStatus::Satisfied
        };

        Satisfaction {
            status,
            conflict,
            need_resolve,
        }
    }

    /// Core-list consultation, including the one-shot demotion warning
    fn satisfied_by_core(&mut self, entry: &RequirementEntry) -> bool {
        if self.config.global {
            return false;
        }
        let Some(target) = self.config.target_perl.clone() else {
            return false;
        };
        let Some(core_version) = self.corelist.core_version(&target, &entry.package) else {
            return false;
        };
        if !core_version.satisfies(&entry.range) {
            return false;
        }

        // Core of the target but missing from the running runtime: warn once
        // and proceed as if installed.
        if !self.corelist.is_core(&self.config.perl_version, &entry.package)
            && self.removed_core.insert(entry.package.clone())
        {
            let record = ReportRecord::new(
                Outcome::Warn,
                format!(
                    "{} used to be core; treating it as provided by perl {}",
                    entry.package, target
                ),
            );
            self.sink.log(record);
        }
        true
    }

    /// First distribution whose provides satisfy the entry
    pub(super) fn find_provider(&self, entry: &RequirementEntry) -> Option<String> {
        self.distributions
            .values()
            .find(|d| d.providing(&entry.package, &entry.range, entry.git_ref()))
            .map(|d| d.distfile.clone())
    }
}
