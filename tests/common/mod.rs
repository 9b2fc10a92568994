// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.
//!
//! `ScriptedWorker` plays the part of the external worker pool: it answers
//! resolve/fetch/configure/install jobs from a table the test sets up and
//! records everything it executed.

use foreman::distribution::{Phase, Provide, Source};
use foreman::driver::Worker;
use foreman::job::{Job, JobOutcome, JobResult, JobSpec, JobType};
use foreman::requirement::{Requirement, RequirementEntry};
use foreman::version::{Version, VersionRange};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

/// What the scripted resolver answers for one package
pub struct Resolution {
    pub distfile: String,
    pub source: Source,
    pub uri: String,
    pub version: Version,
    pub rev: Option<String>,
    pub provides: Vec<Provide>,
}

/// Table-driven worker double
#[derive(Default)]
pub struct ScriptedWorker {
    resolutions: HashMap<String, Resolution>,
    fetch_deps: HashMap<String, Vec<RequirementEntry>>,
    runtime_deps: HashMap<String, Vec<RequirementEntry>>,
    fetch_provides: HashMap<String, Vec<Provide>>,
    prebuilt: HashSet<String>,
    fail_stages: HashSet<(JobType, String)>,
    executed: Mutex<Vec<String>>,
}

impl ScriptedWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver answer: `package` lives in `distfile` at `version`
    pub fn resolves(mut self, package: &str, distfile: &str, version: &str) -> Self {
        let version = Version::parse(version).unwrap();
        self.resolutions.insert(
            package.to_string(),
            Resolution {
                distfile: distfile.to_string(),
                source: Source::Cpan,
                uri: format!("https://registry.example.org/{}", distfile),
                version: version.clone(),
                rev: None,
                provides: vec![Provide::new(package, Some(version))],
            },
        );
        self
    }

    /// Resolver answer for a git-pinned package
    pub fn resolves_git(mut self, package: &str, uri: &str, version: &str) -> Self {
        self.resolutions.insert(
            package.to_string(),
            Resolution {
                distfile: uri.to_string(),
                source: Source::Git,
                uri: uri.to_string(),
                version: Version::parse(version).unwrap(),
                rev: Some("0deadbee".to_string()),
                provides: Vec::new(),
            },
        );
        self
    }

    /// Configure-phase dependency reported with the fetch result
    pub fn with_configure_dep(mut self, distfile: &str, package: &str, range: &str) -> Self {
        self.fetch_deps
            .entry(distfile.to_string())
            .or_default()
            .push(RequirementEntry::new(
                package,
                VersionRange::parse(range).unwrap(),
            ));
        self
    }

    /// Runtime dependency reported with the configure result
    pub fn with_runtime_dep(mut self, distfile: &str, package: &str, range: &str) -> Self {
        self.runtime_deps
            .entry(distfile.to_string())
            .or_default()
            .push(RequirementEntry::new(
                package,
                VersionRange::parse(range).unwrap(),
            ));
        self
    }

    /// Provides list reported with the fetch result
    pub fn with_fetch_provides(mut self, distfile: &str, provides: Vec<Provide>) -> Self {
        self.fetch_provides.insert(distfile.to_string(), provides);
        self
    }

    /// Mark a distfile as arriving prebuilt from fetch
    pub fn with_prebuilt(mut self, distfile: &str) -> Self {
        self.prebuilt.insert(distfile.to_string());
        self
    }

    /// Make one stage fail (resolve keyed by package, others by distfile)
    pub fn fails(mut self, kind: JobType, key: &str) -> Self {
        self.fail_stages.insert((kind, key.to_string()));
        self
    }

    /// Everything executed, as "kind key" strings in execution order
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn executed_count(&self, prefix: &str) -> usize {
        self.executed()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    fn requirement_map(
        entries: Option<&Vec<RequirementEntry>>,
        phase: Phase,
    ) -> BTreeMap<Phase, Requirement> {
        let mut map = BTreeMap::new();
        if let Some(entries) = entries {
            map.insert(phase, Requirement::from_entries(entries.clone()).unwrap());
        }
        map
    }
}

impl Worker for ScriptedWorker {
    fn execute(&self, job: &Job) -> JobResult {
        let key = job
            .package()
            .or_else(|| job.distfile())
            .unwrap_or("?")
            .to_string();
        self.executed
            .lock()
            .unwrap()
            .push(format!("{} {}", job.kind(), key));

        let pid = std::process::id();
        if self.fail_stages.contains(&(job.kind(), key.clone())) {
            return JobResult::failure(job, format!("{} {} failed", job.kind(), key))
                .with_pid(pid);
        }

        match job.spec() {
            JobSpec::Resolve { package, .. } => match self.resolutions.get(package) {
                Some(r) => JobResult::success(
                    job,
                    JobOutcome::Resolve {
                        distfile: r.distfile.clone(),
                        source: r.source,
                        uri: r.uri.clone(),
                        version: Some(r.version.clone()),
                        rev: r.rev.clone(),
                        provides: r.provides.clone(),
                    },
                )
                .with_elapsed(0.01)
                .with_pid(pid),
                None => {
                    JobResult::failure(job, format!("couldn't find {}", package)).with_pid(pid)
                }
            },
            JobSpec::Fetch { distfile, .. } => {
                let mut requirements =
                    Self::requirement_map(self.fetch_deps.get(distfile), Phase::Configure);
                let prebuilt = self.prebuilt.contains(distfile);
                if prebuilt {
                    // A prebuilt layout already knows its runtime deps.
                    for (phase, req) in
                        Self::requirement_map(self.runtime_deps.get(distfile), Phase::Runtime)
                    {
                        requirements.insert(phase, req);
                    }
                }
                JobResult::success(
                    job,
                    JobOutcome::Fetch {
                        directory: Some(PathBuf::from(format!("/tmp/work/{}", distfile))),
                        meta: None,
                        provides: self
                            .fetch_provides
                            .get(distfile)
                            .cloned()
                            .unwrap_or_default(),
                        requirements,
                        rev: None,
                        version: None,
                        prebuilt,
                    },
                )
                .with_elapsed(0.02)
                .with_pid(pid)
            }
            JobSpec::Configure { distfile, .. } => JobResult::success(
                job,
                JobOutcome::Configure {
                    requirements: Self::requirement_map(
                        self.runtime_deps.get(distfile),
                        Phase::Runtime,
                    ),
                    distdata: None,
                    static_builder: false,
                },
            )
            .with_elapsed(0.03)
            .with_pid(pid),
            JobSpec::Install { .. } => JobResult::success(job, JobOutcome::Install)
                .with_elapsed(0.04)
                .with_pid(pid),
        }
    }
}

/// Root requirement shorthand
pub fn root(package: &str, range: &str) -> RequirementEntry {
    RequirementEntry::new(package, VersionRange::parse(range).unwrap())
}
