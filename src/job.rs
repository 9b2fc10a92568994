// src/job.rs

//! Work-item descriptors exchanged with workers
//!
//! A `Job` is immutable after construction and identified by a deterministic
//! uid digested from its identifying fields; equality ignores everything
//! else, which is what makes submission deduplication work. Results come
//! back as a separate `JobResult` value; the stored job is only read for
//! context, never overwritten.

use crate::distribution::{Phase, Provide, Source};
use crate::requirement::Requirement;
use crate::version::{Version, VersionRange};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// The four pipeline job types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Resolve,
    Fetch,
    Configure,
    Install,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve => write!(f, "resolve"),
            Self::Fetch => write!(f, "fetch"),
            Self::Configure => write!(f, "configure"),
            Self::Install => write!(f, "install"),
        }
    }
}

/// Per-type job payload handed to a worker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JobSpec {
    Resolve {
        package: String,
        range: VersionRange,
        reinstall: bool,
        features: Vec<String>,
        git: Option<String>,
        git_ref: Option<String>,
    },
    Fetch {
        distfile: String,
        source: Source,
        uri: String,
        rev: Option<String>,
        git_ref: Option<String>,
        features: Vec<String>,
    },
    Configure {
        distfile: String,
        source: Source,
        uri: String,
        rev: Option<String>,
        git_ref: Option<String>,
        meta: Option<serde_json::Value>,
        directory: Option<PathBuf>,
        version: Option<Version>,
        distvname: String,
    },
    Install {
        distfile: String,
        source: Source,
        uri: String,
        rev: Option<String>,
        git_ref: Option<String>,
        meta: Option<serde_json::Value>,
        distdata: Option<serde_json::Value>,
        directory: Option<PathBuf>,
        distvname: String,
        static_builder: bool,
        prebuilt: bool,
    },
}

impl JobSpec {
    pub fn kind(&self) -> JobType {
        match self {
            Self::Resolve { .. } => JobType::Resolve,
            Self::Fetch { .. } => JobType::Fetch,
            Self::Configure { .. } => JobType::Configure,
            Self::Install { .. } => JobType::Install,
        }
    }

    /// The identifying fields: type, package or distfile, source, uri, ref
    fn identity(&self) -> String {
        match self {
            Self::Resolve {
                package, git, git_ref, ..
            } => format!(
                "resolve\x1f{}\x1f{}\x1f{}\x1f{}",
                package,
                if git.is_some() { "git" } else { "cpan" },
                git.as_deref().unwrap_or(""),
                git_ref.as_deref().unwrap_or("")
            ),
            Self::Fetch {
                distfile,
                source,
                uri,
                git_ref,
                ..
            } => format!(
                "fetch\x1f{}\x1f{}\x1f{}\x1f{}",
                distfile,
                source,
                uri,
                git_ref.as_deref().unwrap_or("")
            ),
            Self::Configure {
                distfile,
                source,
                uri,
                git_ref,
                ..
            } => format!(
                "configure\x1f{}\x1f{}\x1f{}\x1f{}",
                distfile,
                source,
                uri,
                git_ref.as_deref().unwrap_or("")
            ),
            Self::Install {
                distfile,
                source,
                uri,
                git_ref,
                ..
            } => format!(
                "install\x1f{}\x1f{}\x1f{}\x1f{}",
                distfile,
                source,
                uri,
                git_ref.as_deref().unwrap_or("")
            ),
        }
    }
}

/// One unit of external work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    uid: String,
    spec: JobSpec,
    in_charge: bool,
}

impl Job {
    pub fn new(spec: JobSpec) -> Self {
        let uid = digest_uid(&spec.identity());
        Self {
            uid,
            spec,
            in_charge: false,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn kind(&self) -> JobType {
        self.spec.kind()
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    /// Whether a worker currently holds this job
    pub fn in_charge(&self) -> bool {
        self.in_charge
    }

    pub fn set_in_charge(&mut self, value: bool) {
        self.in_charge = value;
    }

    /// The distfile this job targets, when it has one
    pub fn distfile(&self) -> Option<&str> {
        match &self.spec {
            JobSpec::Resolve { .. } => None,
            JobSpec::Fetch { distfile, .. }
            | JobSpec::Configure { distfile, .. }
            | JobSpec::Install { distfile, .. } => Some(distfile),
        }
    }

    /// The package a resolve job targets
    pub fn package(&self) -> Option<&str> {
        match &self.spec {
            JobSpec::Resolve { package, .. } => Some(package),
            _ => None,
        }
    }
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        // Identity fields only; uid formatting and payload are irrelevant.
        self.spec.identity() == other.spec.identity()
    }
}

impl Eq for Job {}

fn digest_uid(identity: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..16].to_string()
}

/// Type-specific payload of a successful result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JobOutcome {
    Resolve {
        distfile: String,
        source: Source,
        uri: String,
        version: Option<Version>,
        rev: Option<String>,
        provides: Vec<Provide>,
    },
    Fetch {
        directory: Option<PathBuf>,
        meta: Option<serde_json::Value>,
        provides: Vec<Provide>,
        requirements: BTreeMap<Phase, Requirement>,
        rev: Option<String>,
        version: Option<Version>,
        prebuilt: bool,
    },
    Configure {
        requirements: BTreeMap<Phase, Requirement>,
        distdata: Option<serde_json::Value>,
        static_builder: bool,
    },
    Install,
}

/// What a worker returns for one job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub uid: String,
    pub ok: bool,
    pub pid: Option<u32>,
    /// Wall-clock seconds the worker spent
    pub elapsed: Option<f64>,
    pub message: Option<String>,
    /// Present on success, absent on failure
    pub outcome: Option<JobOutcome>,
}

impl JobResult {
    pub fn success(job: &Job, outcome: JobOutcome) -> Self {
        Self {
            uid: job.uid().to_string(),
            ok: true,
            pid: None,
            elapsed: None,
            message: None,
            outcome: Some(outcome),
        }
    }

    pub fn failure(job: &Job, message: impl Into<String>) -> Self {
        Self {
            uid: job.uid().to_string(),
            ok: false,
            pid: None,
            elapsed: None,
            message: Some(message.into()),
            outcome: None,
        }
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_elapsed(mut self, seconds: f64) -> Self {
        self.elapsed = Some(seconds);
        self
    }
}
