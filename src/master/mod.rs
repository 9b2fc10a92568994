// src/master/mod.rs

//! The Master: scheduler and state machine of the install pipeline
//!
//! The Master owns every distribution under consideration and every pending
//! job. Workers pull jobs with [`Master::get_job`] and push results with
//! [`Master::register_result`]; between the two, [`Master::calculate_jobs`]
//! advances each distribution through resolve -> fetch -> configure ->
//! install. Failures are sticky and never abort the run; the terminal
//! verdict comes from [`Master::fail`].

mod satisfy;

pub use satisfy::{InstalledQuery, Satisfaction, SatisfyStatus};

use crate::config::MasterConfig;
use crate::corelist::CoreInventory;
use crate::cycle::CycleDetector;
use crate::distribution::{Distribution, Phase, PipelineStage, Provide, Source};
use crate::job::{Job, JobOutcome, JobResult, JobSpec, JobType};
use crate::oracle::{EmptyOracle, InstalledModule, InstalledOracle};
use crate::progress::{CliProgress, ProgressTracker, SilentProgress};
use crate::report::{EventSink, Outcome, ReportRecord, TracingSink};
use crate::requirement::{Requirement, RequirementEntry};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Terminal failure summary returned by [`Master::fail`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    /// Packages the resolver permanently failed on
    pub resolve_failures: Vec<String>,
    /// Distfiles that failed or never finished, cycle members included
    pub install_failures: Vec<String>,
    /// Cycle paths (distvnames) keyed by member distfile
    pub cycles: BTreeMap<String, Vec<String>>,
}

/// The scheduler state machine
pub struct Master {
    pub(crate) config: MasterConfig,
    pub(crate) corelist: CoreInventory,
    pub(crate) oracle: Box<dyn InstalledOracle>,
    pub(crate) sink: Arc<dyn EventSink>,
    progress: Arc<dyn ProgressTracker>,

    jobs: BTreeMap<String, Job>,
    pub(crate) distributions: BTreeMap<String, Distribution>,
    pub(crate) roots: Requirement,
    fail_resolve: BTreeSet<String>,
    fail_install: BTreeSet<String>,
    pub(crate) installed_cache: HashMap<String, Option<InstalledModule>>,
    pub(crate) removed_core: HashSet<String>,
    pub(crate) reinstall_done: HashSet<String>,
    installed_count: u64,
}

impl Master {
    pub fn new(config: MasterConfig) -> Self {
        let progress: Arc<dyn ProgressTracker> = if config.show_progress {
            Arc::new(CliProgress::new(0))
        } else {
            Arc::new(SilentProgress::new())
        };
        Self {
            config,
            corelist: CoreInventory::new(),
            oracle: Box::new(EmptyOracle),
            sink: Arc::new(TracingSink),
            progress,
            jobs: BTreeMap::new(),
            distributions: BTreeMap::new(),
            roots: Requirement::new(),
            fail_resolve: BTreeSet::new(),
            fail_install: BTreeSet::new(),
            installed_cache: HashMap::new(),
            removed_core: HashSet::new(),
            reinstall_done: HashSet::new(),
            installed_count: 0,
        }
    }

    pub fn with_corelist(mut self, corelist: CoreInventory) -> Self {
        self.corelist = corelist;
        self
    }

    pub fn with_oracle(mut self, oracle: Box<dyn InstalledOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressTracker>) -> Self {
        self.progress = progress;
        self
    }

    // Introspection.

    pub fn installed_count(&self) -> u64 {
        self.installed_count
    }

    pub fn distribution(&self, distfile: &str) -> Option<&Distribution> {
        self.distributions.get(distfile)
    }

    pub fn distributions(&self) -> impl Iterator<Item = &Distribution> {
        self.distributions.values()
    }

    /// Jobs known to the Master, pending or handed out
    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Jobs currently held by workers
    pub fn in_flight(&self) -> usize {
        self.jobs.values().filter(|j| j.in_charge()).count()
    }

    // Public operations.

    /// Enqueue a job unless an equal one is already present
    pub fn add_job(&mut self, job: Job) -> bool {
        if self.jobs.values().any(|existing| existing == &job) {
            debug!("job {} already queued, skipping", job.uid());
            return false;
        }
        debug!("queue {} job {}", job.kind(), job.uid());
        self.jobs.insert(job.uid().to_string(), job);
        true
    }

    /// Hand out every job not yet taken by a worker
    ///
    /// When nothing is ready, runs [`Master::calculate_jobs`] to advance
    /// distributions and tries once more. Empty means "nothing to do right
    /// now": the caller must wait for an outstanding result or give up.
    pub fn get_job(&mut self) -> Vec<Job> {
        let mut ready = self.take_ready_jobs();
        if ready.is_empty() {
            self.calculate_jobs();
            ready = self.take_ready_jobs();
        }
        ready
    }

    fn take_ready_jobs(&mut self) -> Vec<Job> {
        let mut taken = Vec::new();
        for job in self.jobs.values_mut() {
            if !job.in_charge() {
                job.set_in_charge(true);
                taken.push(job.clone());
            }
        }
        taken
    }

    /// Seed the run from the root requirement set
    ///
    /// The merged entries are retained: [`Master::fail`] re-verifies every
    /// root against the installed set at terminal, so a resolver that hands
    /// back the wrong version cannot turn into silent success. Returns false
    /// when a requirement is already hopeless (perl version, source
    /// conflict, or a package in a failure set).
    pub fn register_root_requirements(&mut self, entries: &[RequirementEntry]) -> bool {
        if let Err(err) = self.roots.add(entries) {
            let record = ReportRecord::new(Outcome::Fail, err.to_string());
            self.sink.log_fail(record);
            return false;
        }
        let sat = self.is_satisfied(entries);
        if sat.status == SatisfyStatus::PerlVersionFail {
            let record = ReportRecord::new(
                Outcome::Fail,
                format!(
                    "perl version {} does not satisfy the root requirements",
                    self.config.effective_perl()
                ),
            );
            self.sink.log_fail(record);
            return false;
        }
        if sat.conflict {
            return false;
        }
        if sat.need_resolve.is_empty() {
            return true;
        }
        self.register_resolve_jobs(&sat.need_resolve)
    }

    /// Track a new distribution, or merge provides into a known one
    pub fn add_distribution(&mut self, dist: Distribution) -> bool {
        match self.distributions.get_mut(&dist.distfile) {
            Some(existing) => {
                existing.absorb_provides(dist.provides());
                false
            }
            None => {
                self.distributions.insert(dist.distfile.clone(), dist);
                true
            }
        }
    }

    /// Ingest one worker result
    pub fn register_result(&mut self, result: JobResult) {
        let Some(job) = self.jobs.remove(&result.uid) else {
            warn!("result for unknown job uid {}", result.uid);
            return;
        };
        match job.kind() {
            JobType::Resolve => self.register_resolve_result(&job, result),
            JobType::Fetch => self.register_fetch_result(&job, result),
            JobType::Configure => self.register_configure_result(&job, result),
            JobType::Install => self.register_install_result(&job, result),
        }
    }

    /// Queue resolve jobs for packages that need one
    ///
    /// Packages already in a failure set are skipped; the return value says
    /// whether every package produced a job.
    pub fn register_resolve_jobs(&mut self, entries: &[RequirementEntry]) -> bool {
        let mut all_ok = true;
        for entry in entries {
            if self.fail_resolve.contains(&entry.package)
                || self.fail_install.contains(&entry.package)
            {
                all_ok = false;
                continue;
            }
            let features = entry
                .options
                .as_ref()
                .map(|o| o.features.clone())
                .unwrap_or_default();
            self.add_job(Job::new(JobSpec::Resolve {
                package: entry.package.clone(),
                range: entry.range.clone(),
                reinstall: self.config.reinstall,
                features,
                git: entry.git().map(str::to_string),
                git_ref: entry.git_ref().map(str::to_string),
            }));
        }
        all_ok
    }

    // The advancement pass.

    /// Advance distributions: three independent top-down sweeps
    ///
    /// Sweep order (fetch, configure, install) guarantees a distribution
    /// promoted by a result between passes is examined by at most one sweep
    /// per pass.
    pub fn calculate_jobs(&mut self) {
        let candidates: Vec<String> = self
            .distributions
            .keys()
            .filter(|df| !self.fail_install.contains(*df))
            .cloned()
            .collect();

        self.sweep_fetch(&candidates);
        self.sweep_configure(&candidates);
        self.sweep_install(&candidates);
    }

    fn sweep_fetch(&mut self, candidates: &[String]) {
        for distfile in candidates {
            let Some(dist) = self.distributions.get(distfile) else {
                continue;
            };
            if dist.stage() != PipelineStage::Resolved || dist.registered() {
                continue;
            }
            let job = Job::new(JobSpec::Fetch {
                distfile: dist.distfile.clone(),
                source: dist.source,
                uri: dist.uri.clone(),
                rev: dist.rev.clone(),
                git_ref: dist.git_ref.clone(),
                features: dist.features.clone(),
            });
            self.distributions
                .get_mut(distfile)
                .expect("candidate present")
                .set_registered();
            self.add_job(job);
        }
    }

    fn sweep_configure(&mut self, candidates: &[String]) {
        for distfile in candidates {
            if self.fail_install.contains(distfile) {
                continue;
            }
            let Some(dist) = self.distributions.get(distfile) else {
                continue;
            };
            if dist.stage() != PipelineStage::Fetched || dist.registered() {
                continue;
            }
            let entries = dist.requirements(Phase::Configure).as_slice().to_vec();
            let job = Job::new(JobSpec::Configure {
                distfile: dist.distfile.clone(),
                source: dist.source,
                uri: dist.uri.clone(),
                rev: dist.rev.clone(),
                git_ref: dist.git_ref.clone(),
                meta: dist.meta.clone(),
                directory: dist.directory.clone(),
                version: dist.version.clone(),
                distvname: dist.distvname().to_string(),
            });
            self.advance_stage(distfile, PipelineStage::Fetched, &entries, job);
        }
    }

    fn sweep_install(&mut self, candidates: &[String]) {
        for distfile in candidates {
            if self.fail_install.contains(distfile) {
                continue;
            }
            let Some(dist) = self.distributions.get(distfile) else {
                continue;
            };
            if dist.stage() != PipelineStage::Configured || dist.registered() {
                continue;
            }
            let phases: &[Phase] = if dist.prebuilt {
                &[Phase::Configure, Phase::Build, Phase::Test, Phase::Runtime]
            } else {
                &[Phase::Build, Phase::Test, Phase::Runtime]
            };
            let entries = match dist.merged_requirements(phases) {
                Ok(entries) => entries,
                Err(err) => {
                    let record = ReportRecord::new(Outcome::Fail, err.to_string())
                        .with_context(dist.distvname());
                    self.sink.log_fail(record);
                    self.fail_install.insert(distfile.clone());
                    continue;
                }
            };
            let job = Job::new(JobSpec::Install {
                distfile: dist.distfile.clone(),
                source: dist.source,
                uri: dist.uri.clone(),
                rev: dist.rev.clone(),
                git_ref: dist.git_ref.clone(),
                meta: dist.meta.clone(),
                distdata: dist.distdata.clone(),
                directory: dist.directory.clone(),
                distvname: dist.distvname().to_string(),
                static_builder: dist.static_builder,
                prebuilt: dist.prebuilt,
            });
            self.advance_stage(distfile, PipelineStage::Configured, &entries, job);
        }
    }

    /// Shared four-branch advancement logic for the configure/install sweeps
    fn advance_stage(
        &mut self,
        distfile: &str,
        stage: PipelineStage,
        entries: &[RequirementEntry],
        job: Job,
    ) {
        let sat = self.is_satisfied(entries);
        let distvname = self
            .distributions
            .get(distfile)
            .map(|d| d.distvname().to_string())
            .unwrap_or_else(|| distfile.to_string());

        if sat.conflict {
            if let Some(dist) = self.distributions.get_mut(distfile) {
                dist.set_deps_registered(stage);
            }
            self.fail_install.insert(distfile.to_string());
            return;
        }

        match sat.status {
            SatisfyStatus::Satisfied => {
                if let Some(dist) = self.distributions.get_mut(distfile) {
                    dist.set_registered();
                }
                self.add_job(job);
            }
            SatisfyStatus::PerlVersionFail => {
                let record = ReportRecord::new(
                    Outcome::Fail,
                    format!(
                        "requires a perl version that {} cannot satisfy",
                        self.config.effective_perl()
                    ),
                )
                .with_context(&distvname);
                self.sink.log_fail(record);
                self.fail_install.insert(distfile.to_string());
            }
            SatisfyStatus::Unsatisfied => {
                let deps_done = self
                    .distributions
                    .get(distfile)
                    .map(|d| d.deps_registered(stage))
                    .unwrap_or(true);
                if sat.need_resolve.is_empty() || deps_done {
                    return;
                }
                let names: Vec<&str> =
                    sat.need_resolve.iter().map(|e| e.package.as_str()).collect();
                debug!("{} needs {}", distvname, names.join(", "));
                if let Some(dist) = self.distributions.get_mut(distfile) {
                    dist.set_deps_registered(stage);
                }
                if !self.register_resolve_jobs(&sat.need_resolve) {
                    let record = ReportRecord::new(
                        Outcome::Fail,
                        "depends on a package that already failed".to_string(),
                    )
                    .with_context(&distvname);
                    self.sink.log_fail(record);
                    self.fail_install.insert(distfile.to_string());
                }
            }
        }
    }

    // Stage handlers.

    fn register_resolve_result(&mut self, job: &Job, result: JobResult) {
        let JobSpec::Resolve {
            package,
            range,
            git_ref,
            features,
            ..
        } = job.spec()
        else {
            warn!("resolve result for non-resolve job {}", job.uid());
            return;
        };
        let package = package.clone();

        if !result.ok {
            self.fail_resolve.insert(package.clone());
            let record = ReportRecord::new(
                Outcome::Fail,
                result
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("couldn't resolve {}", package)),
            )
            .with_kind(JobType::Resolve)
            .with_elapsed(result.elapsed)
            .with_pid(result.pid);
            self.sink.log_fail(record);
            return;
        }

        let Some(JobOutcome::Resolve {
            distfile,
            source,
            uri,
            version,
            rev,
            provides,
        }) = result.outcome
        else {
            warn!("malformed resolve result for {}", package);
            self.fail_resolve.insert(package);
            return;
        };

        // Never replace the runtime itself.
        let basename = distfile.rsplit('/').next().unwrap_or(&distfile);
        if basename.starts_with("perl-5") {
            let record = ReportRecord::new(
                Outcome::Fail,
                format!("cannot upgrade core module {}", package),
            )
            .with_kind(JobType::Resolve)
            .with_elapsed(result.elapsed)
            .with_pid(result.pid);
            self.sink.log_fail(record);
            self.fail_install.insert(distfile);
            return;
        }

        if !self.config.reinstall {
            let range = match &version {
                Some(v) => crate::version::VersionRange::parse(&v.to_string())
                    .unwrap_or_else(|_| crate::version::VersionRange::any()),
                None => crate::version::VersionRange::any(),
            };
            let query = self.is_installed(&package, &range, rev.as_deref());
            if query.satisfied {
                let record = ReportRecord::new(
                    Outcome::Done,
                    crate::distribution::default_distvname(&distfile),
                )
                .with_kind(JobType::Install)
                .with_elapsed(result.elapsed)
                .with_pid(result.pid)
                .with_annotation("already installed");
                self.sink.log(record);
                return;
            }
        }

        let mut dist = Distribution::new(distfile, source, uri);
        dist.rev = rev;
        dist.git_ref = git_ref.clone();
        dist.version = version.clone();
        dist.features = features.clone();
        dist.set_provides(if provides.is_empty() {
            let mut provide = Provide::new(package.clone(), version);
            if let Some(r) = &dist.git_ref {
                provide = provide.with_ref(r.clone());
            }
            vec![provide]
        } else {
            provides
        });
        dist.set_resolved();

        // A resolution that cannot satisfy the requested range must not
        // enter the pipeline; installing the wrong version is not progress.
        if !dist.providing(&package, range, git_ref.as_deref()) {
            let record = ReportRecord::new(
                Outcome::Fail,
                format!(
                    "{} resolved to {} which does not satisfy {}",
                    package,
                    dist.distvname(),
                    range
                ),
            )
            .with_kind(JobType::Resolve)
            .with_elapsed(result.elapsed)
            .with_pid(result.pid);
            self.sink.log_fail(record);
            self.fail_resolve.insert(package);
            return;
        }

        let record = ReportRecord::new(
            Outcome::Done,
            format!("{} -> {}", package, dist.distvname()),
        )
        .with_kind(JobType::Resolve)
        .with_elapsed(result.elapsed)
        .with_pid(result.pid);
        self.sink.log(record);

        self.add_distribution(dist);
    }

    fn register_fetch_result(&mut self, job: &Job, result: JobResult) {
        let Some(distfile) = job.distfile().map(str::to_string) else {
            warn!("fetch result without distfile, uid {}", job.uid());
            return;
        };

        if !result.ok {
            self.fail_stage(&distfile, JobType::Fetch, &result);
            return;
        }
        let Some(JobOutcome::Fetch {
            directory,
            meta,
            provides,
            requirements,
            rev,
            version,
            prebuilt,
        }) = result.outcome
        else {
            warn!("malformed fetch result for {}", distfile);
            self.fail_install.insert(distfile);
            return;
        };
        let Some(dist) = self.distributions.get_mut(&distfile) else {
            warn!("fetch result for unknown distribution {}", distfile);
            return;
        };

        if directory.is_some() {
            dist.directory = directory;
        }
        if meta.is_some() {
            dist.meta = meta;
        }
        if !provides.is_empty() {
            dist.set_provides(provides);
        }

        if dist.source == Source::Git {
            if rev.is_some() {
                dist.rev = rev;
            }
            if version.is_some() {
                dist.version = version;
            }
            if let Some(name) = dist
                .meta
                .as_ref()
                .and_then(|m| m.get("name"))
                .and_then(|n| n.as_str())
            {
                let display = match &dist.version {
                    Some(v) => format!("{}-{}", name, v),
                    None => name.to_string(),
                };
                dist.set_distvname(display);
            }
        }

        // Configure-phase requirements ride on the fetch result (from the
        // distribution metadata); a prebuilt layout carries them all.
        for (phase, req) in requirements {
            dist.set_requirements(phase, req);
        }

        let annotation = if prebuilt {
            dist.set_configured();
            dist.prebuilt = true;
            Some("using prebuilt")
        } else {
            dist.set_fetched();
            None
        };
        dist.clear_registered();

        let mut record = ReportRecord::new(Outcome::Done, dist.distvname().to_string())
            .with_kind(JobType::Fetch)
            .with_elapsed(result.elapsed)
            .with_pid(result.pid);
        if let Some(a) = annotation {
            record = record.with_annotation(a);
        } else if let Some(message) = result.message {
            record = record.with_annotation(message);
        }
        self.sink.log(record);
    }

    fn register_configure_result(&mut self, job: &Job, result: JobResult) {
        let Some(distfile) = job.distfile().map(str::to_string) else {
            warn!("configure result without distfile, uid {}", job.uid());
            return;
        };

        if !result.ok {
            self.fail_stage(&distfile, JobType::Configure, &result);
            return;
        }
        let Some(JobOutcome::Configure {
            requirements,
            distdata,
            static_builder,
        }) = result.outcome
        else {
            warn!("malformed configure result for {}", distfile);
            self.fail_install.insert(distfile);
            return;
        };
        let Some(dist) = self.distributions.get_mut(&distfile) else {
            warn!("configure result for unknown distribution {}", distfile);
            return;
        };

        dist.set_configured();
        for (phase, req) in requirements {
            dist.set_requirements(phase, req);
        }
        dist.static_builder = static_builder;
        dist.distdata = distdata;

        if dist.source == Source::Git {
            if let Some(name) = dist
                .distdata
                .as_ref()
                .and_then(|d| d.get("distvname"))
                .and_then(|n| n.as_str())
            {
                dist.set_distvname(name.to_string());
            }
        }

        // The post-configure provides list is authoritative; the inherited
        // ref carries over.
        if let Some(listed) = dist
            .distdata
            .as_ref()
            .and_then(|d| d.get("provides"))
            .and_then(|p| p.as_array())
        {
            let inherited_ref = dist.git_ref.clone();
            let mut derived = Vec::new();
            for item in listed {
                let Some(pkg) = item.get("package").and_then(|p| p.as_str()) else {
                    continue;
                };
                let parsed = item
                    .get("version")
                    .and_then(|v| v.as_str())
                    .and_then(|v| crate::version::Version::parse(v).ok());
                let mut provide = Provide::new(pkg, parsed);
                provide.git_ref = inherited_ref.clone();
                derived.push(provide);
            }
            if !derived.is_empty() {
                derived.sort_by(|a, b| a.package.cmp(&b.package));
                dist.set_provides(derived);
            }
        }
        dist.clear_registered();

        let listed: Vec<&str> = dist.provides().iter().map(|p| p.package.as_str()).collect();
        debug!("{} provides {}", dist.distvname(), listed.join(", "));

        let record = ReportRecord::new(Outcome::Done, dist.distvname().to_string())
            .with_kind(JobType::Configure)
            .with_elapsed(result.elapsed)
            .with_pid(result.pid);
        self.sink.log(record);
    }

    fn register_install_result(&mut self, job: &Job, result: JobResult) {
        let Some(distfile) = job.distfile().map(str::to_string) else {
            warn!("install result without distfile, uid {}", job.uid());
            return;
        };

        if !result.ok {
            self.fail_stage(&distfile, JobType::Install, &result);
            return;
        }
        let Some(dist) = self.distributions.get_mut(&distfile) else {
            warn!("install result for unknown distribution {}", distfile);
            return;
        };

        dist.set_installed();
        dist.clear_registered();
        self.installed_count += 1;

        let distvname = dist.distvname().to_string();
        if self.config.show_progress {
            self.progress.set_length(self.distributions.len() as u64);
            self.progress.increment(1);
            self.progress.set_message(&distvname);
        }

        let record = ReportRecord::new(Outcome::Done, distvname)
            .with_kind(JobType::Install)
            .with_elapsed(result.elapsed)
            .with_pid(result.pid);
        self.sink.log(record);
    }

    /// Shared failure path for fetch/configure/install results
    fn fail_stage(&mut self, distfile: &str, kind: JobType, result: &JobResult) {
        self.fail_install.insert(distfile.to_string());
        let context = self
            .distributions
            .get(distfile)
            .map(|d| d.distvname().to_string())
            .unwrap_or_else(|| distfile.to_string());
        let record = ReportRecord::new(
            Outcome::Fail,
            result
                .message
                .clone()
                .unwrap_or_else(|| format!("{} failed", kind)),
        )
        .with_kind(kind)
        .with_elapsed(result.elapsed)
        .with_pid(result.pid)
        .with_context(context);
        self.sink.log_fail(record);
    }

    // Terminal report.

    /// Compute the terminal verdict; `None` means everything installed
    ///
    /// Besides the sticky failure sets and the never-finished survivors,
    /// every retained root requirement is re-verified against the installed
    /// set, so a run only reports success when the roots actually hold.
    pub fn fail(&mut self) -> Option<FailureReport> {
        let missing_roots = self.unsatisfied_roots();

        let survivors: Vec<String> = self
            .distributions
            .values()
            .filter(|d| !d.installed() && !self.fail_install.contains(&d.distfile))
            .map(|d| d.distfile.clone())
            .collect();

        if self.fail_resolve.is_empty()
            && self.fail_install.is_empty()
            && survivors.is_empty()
            && missing_roots.is_empty()
        {
            return None;
        }

        let mut detector = CycleDetector::new();
        for distfile in &survivors {
            let dist = &self.distributions[distfile];
            let provides: Vec<String> = dist
                .provides()
                .iter()
                .map(|p| p.package.clone())
                .collect();
            let mut requires: Vec<String> = Vec::new();
            for phase in [Phase::Configure, Phase::Build, Phase::Test, Phase::Runtime] {
                for entry in dist.requirements(phase).iter() {
                    if !requires.contains(&entry.package) {
                        requires.push(entry.package.clone());
                    }
                }
            }
            detector.add(dist.distfile.clone(), dist.distvname(), provides, requires);
        }
        detector.finalize();
        let cycles = detector.detect();

        let mut seen_paths: BTreeSet<Vec<String>> = BTreeSet::new();
        for path in cycles.values() {
            if seen_paths.insert(path.clone()) {
                let record = ReportRecord::new(
                    Outcome::Fail,
                    format!("Detected circular dependencies {}", path.join(" -> ")),
                );
                self.sink.log_fail(record);
            }
        }
        for distfile in &survivors {
            if cycles.contains_key(distfile) {
                continue;
            }
            let record = ReportRecord::new(
                Outcome::Fail,
                format!(
                    "{} failed because of dependencies",
                    self.distributions[distfile].distvname()
                ),
            );
            self.sink.log_fail(record);
        }

        // Roots nothing accounts for: no failed or pending distribution
        // provides the package, yet it is not installed either.
        let mut resolve_failures: BTreeSet<String> = self.fail_resolve.iter().cloned().collect();
        for entry in &missing_roots {
            let explained = self.distributions.values().any(|d| {
                !d.installed() && d.provides().iter().any(|p| p.package == entry.package)
            });
            if explained {
                continue;
            }
            if resolve_failures.insert(entry.package.clone()) {
                let record = ReportRecord::new(
                    Outcome::Fail,
                    format!("{} is not installed (requires {})", entry.package, entry.range),
                );
                self.sink.log_fail(record);
            }
        }

        let mut install_failures: BTreeSet<String> = self.fail_install.clone();
        install_failures.extend(survivors);

        Some(FailureReport {
            resolve_failures: resolve_failures.into_iter().collect(),
            install_failures: install_failures.into_iter().collect(),
            cycles,
        })
    }
}
