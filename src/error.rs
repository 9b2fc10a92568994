// src/error.rs

//! Crate-wide error type and result alias

use thiserror::Error;

/// Errors produced by the orchestration core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Version literal could not be parsed
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    /// Version range literal could not be parsed
    #[error("Invalid version range '{0}'")]
    InvalidRange(String),

    /// Intersection of two version ranges accepts no version
    #[error("Illegal version range: '{left}' and '{right}' have no common version")]
    IllegalRange { left: String, right: String },

    /// Two requirement entries for the same package could not be merged
    #[error("Couldn't merge version range {left} with {right} for package {package}")]
    RequirementMerge {
        package: String,
        left: String,
        right: String,
    },

    /// Two requirement entries demand different git refs
    #[error("Conflicting refs '{left}' and '{right}' for package {package}")]
    RefConflict {
        package: String,
        left: String,
        right: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
