// src/distribution.rs

//! Per-distribution pipeline state
//!
//! One `Distribution` exists per unique distfile. It is a data carrier: the
//! Master advances its stage flags as worker results come back. Stage flags
//! are monotonic; setting an already-set flag is a no-op.

use crate::requirement::{Requirement, RequirementEntry};
use crate::version::{Version, VersionRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Where a distribution comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// A registry archive
    #[default]
    Cpan,
    /// A git checkout
    Git,
    /// A local file or directory
    Local,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpan => write!(f, "cpan"),
            Self::Git => write!(f, "git"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Requirement phases a distribution may declare
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Configure,
    Build,
    Test,
    Runtime,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configure => write!(f, "configure"),
            Self::Build => write!(f, "build"),
            Self::Test => write!(f, "test"),
            Self::Runtime => write!(f, "runtime"),
        }
    }
}

/// A package a distribution makes available
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provide {
    pub package: String,
    pub version: Option<Version>,
    pub git_ref: Option<String>,
}

impl Provide {
    pub fn new(package: impl Into<String>, version: Option<Version>) -> Self {
        Self {
            package: package.into(),
            version,
            git_ref: None,
        }
    }

    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = Some(git_ref.into());
        self
    }
}

/// The stage a distribution has reached in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    Resolved,
    Fetched,
    Configured,
    Installed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved => write!(f, "resolved"),
            Self::Fetched => write!(f, "fetched"),
            Self::Configured => write!(f, "configured"),
            Self::Installed => write!(f, "installed"),
        }
    }
}

/// Mutable record tracking one distribution through the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    pub distfile: String,
    pub source: Source,
    pub uri: String,
    pub rev: Option<String>,
    pub git_ref: Option<String>,
    pub version: Option<Version>,
    pub features: Vec<String>,

    pub meta: Option<serde_json::Value>,
    pub distdata: Option<serde_json::Value>,
    pub directory: Option<PathBuf>,
    pub static_builder: bool,
    pub prebuilt: bool,

    distvname: String,
    provides: Vec<Provide>,
    requirements: BTreeMap<Phase, Requirement>,

    resolved: bool,
    fetched: bool,
    configured: bool,
    installed: bool,

    registered: bool,
    configure_deps_registered: bool,
    install_deps_registered: bool,
}

impl Distribution {
    pub fn new(distfile: impl Into<String>, source: Source, uri: impl Into<String>) -> Self {
        let distfile = distfile.into();
        let distvname = default_distvname(&distfile);
        Self {
            distfile,
            source,
            uri: uri.into(),
            rev: None,
            git_ref: None,
            version: None,
            features: Vec::new(),
            meta: None,
            distdata: None,
            directory: None,
            static_builder: false,
            prebuilt: false,
            distvname,
            provides: Vec::new(),
            requirements: BTreeMap::new(),
            resolved: false,
            fetched: false,
            configured: false,
            installed: false,
            registered: false,
            configure_deps_registered: false,
            install_deps_registered: false,
        }
    }

    /// Human display name, `name-version` where known
    pub fn distvname(&self) -> &str {
        &self.distvname
    }

    pub fn set_distvname(&mut self, name: impl Into<String>) {
        self.distvname = name.into();
    }

    // Stage flags. Each setter implies the earlier stages so the ordering
    // invariant resolved <= fetched <= configured <= installed cannot be
    // violated by a caller.

    pub fn resolved(&self) -> bool {
        self.resolved
    }

    pub fn set_resolved(&mut self) {
        self.resolved = true;
    }

    pub fn fetched(&self) -> bool {
        self.fetched
    }

    pub fn set_fetched(&mut self) {
        self.resolved = true;
        self.fetched = true;
    }

    pub fn configured(&self) -> bool {
        self.configured
    }

    pub fn set_configured(&mut self) {
        self.resolved = true;
        self.fetched = true;
        self.configured = true;
    }

    pub fn installed(&self) -> bool {
        self.installed
    }

    pub fn set_installed(&mut self) {
        self.resolved = true;
        self.fetched = true;
        self.configured = true;
        self.installed = true;
    }

    /// The highest stage reached so far
    pub fn stage(&self) -> PipelineStage {
        if self.installed {
            PipelineStage::Installed
        } else if self.configured {
            PipelineStage::Configured
        } else if self.fetched {
            PipelineStage::Fetched
        } else {
            PipelineStage::Resolved
        }
    }

    // The registered latch marks "the follow-on job for the current stage is
    // queued". The handler that promotes the stage consumes (clears) it.

    pub fn registered(&self) -> bool {
        self.registered
    }

    pub fn set_registered(&mut self) {
        self.registered = true;
    }

    pub fn clear_registered(&mut self) {
        self.registered = false;
    }

    /// One-shot latch: resolve jobs for this stage's deps are already queued
    pub fn deps_registered(&self, stage: PipelineStage) -> bool {
        match stage {
            PipelineStage::Fetched => self.configure_deps_registered,
            PipelineStage::Configured => self.install_deps_registered,
            _ => false,
        }
    }

    pub fn set_deps_registered(&mut self, stage: PipelineStage) {
        match stage {
            PipelineStage::Fetched => self.configure_deps_registered = true,
            PipelineStage::Configured => self.install_deps_registered = true,
            _ => {}
        }
    }

    // Provides.

    pub fn provides(&self) -> &[Provide] {
        &self.provides
    }

    pub fn set_provides(&mut self, provides: Vec<Provide>) {
        self.provides = provides;
    }

    /// Merge provides from another sighting of the same distfile
    pub fn absorb_provides(&mut self, incoming: &[Provide]) {
        for p in incoming {
            if !self.provides.iter().any(|q| q.package == p.package) {
                self.provides.push(p.clone());
            }
        }
    }

    /// True iff a provide matches the package, satisfies the range, and
    /// (when requested) carries the same ref
    pub fn providing(&self, package: &str, range: &VersionRange, git_ref: Option<&str>) -> bool {
        self.provides.iter().any(|p| {
            if p.package != package {
                return false;
            }
            if let Some(wanted) = git_ref {
                if p.git_ref.as_deref() != Some(wanted) {
                    return false;
                }
            }
            match &p.version {
                Some(v) => v.satisfies(range),
                // A versionless provide only counts for an unbounded range.
                None => Version::parse("0").expect("literal zero").satisfies(range),
            }
        })
    }

    // Requirements.

    pub fn set_requirements(&mut self, phase: Phase, requirement: Requirement) {
        self.requirements.insert(phase, requirement);
    }

    /// The requirements declared for one phase (empty when absent)
    pub fn requirements(&self, phase: Phase) -> Requirement {
        self.requirements.get(&phase).cloned().unwrap_or_default()
    }

    /// Merge requirements across phases into a flat entry list
    pub fn merged_requirements(
        &self,
        phases: &[Phase],
    ) -> crate::error::Result<Vec<RequirementEntry>> {
        let mut merged = Requirement::new();
        for phase in phases {
            if let Some(req) = self.requirements.get(phase) {
                merged.merge(req)?;
            }
        }
        Ok(merged.as_slice().to_vec())
    }
}

/// Derive the default display name from a distfile identifier
///
/// `A/AB/ABC/Some-Module-1.23.tar.gz` becomes `Some-Module-1.23`.
pub fn default_distvname(distfile: &str) -> String {
    let base = distfile.rsplit('/').next().unwrap_or(distfile);
    for suffix in [".tar.gz", ".tgz", ".tar.bz2", ".tar.xz", ".zip"] {
        if let Some(stripped) = base.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    base.to_string()
}
