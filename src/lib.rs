// src/lib.rs

//! Foreman: orchestration core for a parallel module installer
//!
//! Foreman drives a set of root requirements through the four pipeline
//! stages resolve -> fetch -> configure -> install while respecting
//! inter-distribution dependencies, version ranges, alternate sources
//! (registry vs. git), and the modules already present in the target
//! environment.
//!
//! # Architecture
//!
//! - Pure decision engine: the [`Master`] owns all state, emits jobs, and
//!   ingests results; it performs no I/O of its own
//! - Workers are external: they pull [`Job`]s and return [`JobResult`]s
//!   through two serialized boundary operations
//! - Failures are sticky: an individual failure never aborts the run, and
//!   the terminal verdict comes from [`Master::fail`]
//! - The installed-module oracle and the core-module table are injected

pub mod config;
pub mod corelist;
pub mod cycle;
pub mod distribution;
pub mod driver;
mod error;
pub mod job;
pub mod master;
pub mod oracle;
pub mod progress;
pub mod report;
pub mod requirement;
pub mod version;

pub use config::MasterConfig;
pub use distribution::{Distribution, Phase, PipelineStage, Provide, Source};
pub use error::{Error, Result};
pub use job::{Job, JobOutcome, JobResult, JobSpec, JobType};
pub use master::{FailureReport, Master, Satisfaction, SatisfyStatus};
pub use oracle::{InstalledModule, InstalledOracle};
pub use report::{EventSink, Outcome, ReportRecord};
pub use requirement::{Requirement, RequirementEntry, RequirementOptions};
pub use version::{Version, VersionRange};
