// src/requirement.rs

//! Ordered requirement collections with range-merging semantics
//!
//! A `Requirement` is the unit the satisfaction pass consumes: an ordered,
//! package-unique list of `{package, version range, options}` entries.
//! Adding an entry for a package already present intersects the version
//! ranges; the collection is never left half-updated on a failed add.

use crate::error::{Error, Result};
use crate::version::{range_merge, VersionRange};
use serde::{Deserialize, Serialize};

/// Source and feature options attached to a requirement entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementOptions {
    /// Git repository URI, when the requirement pins an alternate source
    pub git: Option<String>,
    /// Branch, tag or commit within the git repository
    pub git_ref: Option<String>,
    /// Feature names requested for the providing distribution
    pub features: Vec<String>,
}

impl RequirementOptions {
    pub fn is_empty(&self) -> bool {
        self.git.is_none() && self.git_ref.is_none() && self.features.is_empty()
    }
}

/// One requirement: a package name, an acceptable version range, and options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementEntry {
    pub package: String,
    pub range: VersionRange,
    pub options: Option<RequirementOptions>,
}

impl RequirementEntry {
    pub fn new(package: impl Into<String>, range: VersionRange) -> Self {
        Self {
            package: package.into(),
            range,
            options: None,
        }
    }

    pub fn with_options(mut self, options: RequirementOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// The requested git ref, if any
    pub fn git_ref(&self) -> Option<&str> {
        self.options.as_ref().and_then(|o| o.git_ref.as_deref())
    }

    /// The requested git URI, if any
    pub fn git(&self) -> Option<&str> {
        self.options.as_ref().and_then(|o| o.git.as_deref())
    }
}

/// An ordered collection of requirement entries, unique per package
///
/// Iteration order is insertion order. Package names are case-sensitive
/// literals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    entries: Vec<RequirementEntry>,
}

impl Requirement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection from entries, merging duplicates
    pub fn from_entries(entries: Vec<RequirementEntry>) -> Result<Self> {
        let mut req = Self::new();
        req.add(&entries)?;
        Ok(req)
    }

    /// Merge entries into the collection
    ///
    /// A failed range intersection (or ref disagreement) returns the error
    /// and leaves the collection exactly as it was.
    pub fn add(&mut self, entries: &[RequirementEntry]) -> Result<()> {
        let mut staged = self.entries.clone();

        for entry in entries {
            match staged.iter_mut().find(|e| e.package == entry.package) {
                Some(existing) => {
                    let merged =
                        range_merge(&existing.range, &entry.range).map_err(|_| {
                            Error::RequirementMerge {
                                package: entry.package.clone(),
                                left: existing.range.to_string(),
                                right: entry.range.to_string(),
                            }
                        })?;
                    let options = merge_options(
                        &entry.package,
                        existing.options.as_ref(),
                        entry.options.as_ref(),
                    )?;
                    existing.range = merged;
                    existing.options = options;
                }
                None => staged.push(entry.clone()),
            }
        }

        self.entries = staged;
        Ok(())
    }

    /// Merge another collection into this one
    pub fn merge(&mut self, other: &Requirement) -> Result<()> {
        self.add(&other.entries)
    }

    pub fn has(&self, package: &str) -> bool {
        self.entries.iter().any(|e| e.package == package)
    }

    pub fn get(&self, package: &str) -> Option<&RequirementEntry> {
        self.entries.iter().find(|e| e.package == package)
    }

    /// Remove the entries for the named packages
    pub fn delete<S: AsRef<str>>(&mut self, packages: &[S]) {
        self.entries
            .retain(|e| !packages.iter().any(|p| p.as_ref() == e.package));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RequirementEntry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[RequirementEntry] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a Requirement {
    type Item = &'a RequirementEntry;
    type IntoIter = std::slice::Iter<'a, RequirementEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Merge the options of two entries for the same package
///
/// Both carrying a ref means they must agree. Differing git URIs are kept
/// as-is (first writer wins) so the source conflict surfaces during the
/// satisfaction pass, where the requiring distribution is known. Options
/// that end up carrying nothing normalize to `None`.
fn merge_options(
    package: &str,
    existing: Option<&RequirementOptions>,
    incoming: Option<&RequirementOptions>,
) -> Result<Option<RequirementOptions>> {
    let merged = match (existing, incoming) {
        (None, None) => return Ok(None),
        (Some(a), None) => a.clone(),
        (None, Some(b)) => b.clone(),
        (Some(a), Some(b)) => {
            if let (Some(left), Some(right)) = (&a.git_ref, &b.git_ref) {
                if left != right {
                    return Err(Error::RefConflict {
                        package: package.to_string(),
                        left: left.clone(),
                        right: right.clone(),
                    });
                }
            }

            let mut features = a.features.clone();
            for f in &b.features {
                if !features.contains(f) {
                    features.push(f.clone());
                }
            }

            RequirementOptions {
                git: a.git.clone().or_else(|| b.git.clone()),
                git_ref: a.git_ref.clone().or_else(|| b.git_ref.clone()),
                features,
            }
        }
    };

    if merged.is_empty() {
        return Ok(None);
    }
    Ok(Some(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn entry(package: &str, range: &str) -> RequirementEntry {
        RequirementEntry::new(package, VersionRange::parse(range).unwrap())
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut req = Requirement::new();
        req.add(&[entry("B", "1.0"), entry("A", "2.0"), entry("C", "")])
            .unwrap();

        let names: Vec<&str> = req.iter().map(|e| e.package.as_str()).collect();
        assert_eq!(names, ["B", "A", "C"]);
    }

    #[test]
    fn test_add_merges_ranges() {
        let mut req = Requirement::new();
        req.add(&[entry("A", ">= 1.0")]).unwrap();
        req.add(&[entry("A", "< 2.0")]).unwrap();

        assert_eq!(req.len(), 1);
        let merged = &req.get("A").unwrap().range;
        assert!(Version::parse("1.5").unwrap().satisfies(merged));
        assert!(!Version::parse("2.0").unwrap().satisfies(merged));
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut req = Requirement::new();
        req.add(&[entry("A", ">= 1.0, < 2.0")]).unwrap();
        let before = req.clone();
        req.add(&[entry("A", ">= 1.0, < 2.0")]).unwrap();
        assert_eq!(req, before);
    }

    #[test]
    fn test_failed_merge_leaves_collection_intact() {
        let mut req = Requirement::new();
        req.add(&[entry("A", ">= 2.0"), entry("B", "1.0")]).unwrap();
        let before = req.clone();

        let err = req.add(&[entry("B", "2.0"), entry("A", "< 1.0")]).unwrap_err();
        assert!(matches!(err, Error::RequirementMerge { .. }));
        assert_eq!(req, before);
    }

    #[test]
    fn test_merge_error_names_package_and_ranges() {
        let mut req = Requirement::new();
        req.add(&[entry("Some.Module", ">= 2.0")]).unwrap();
        let err = req.add(&[entry("Some.Module", "< 1.0")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Couldn't merge version range >= 2.0 with < 1.0 for package Some.Module"
        );
    }

    #[test]
    fn test_ref_conflict() {
        let mut req = Requirement::new();
        let opts = |r: &str| RequirementOptions {
            git: Some("https://example.com/repo.git".to_string()),
            git_ref: Some(r.to_string()),
            features: Vec::new(),
        };
        req.add(&[entry("A", "").with_options(opts("main"))]).unwrap();
        let err = req
            .add(&[entry("A", "").with_options(opts("devel"))])
            .unwrap_err();
        assert!(matches!(err, Error::RefConflict { .. }));
    }

    #[test]
    fn test_delete() {
        let mut req = Requirement::new();
        req.add(&[entry("A", ""), entry("B", ""), entry("C", "")])
            .unwrap();
        req.delete(&["A", "C"]);

        assert!(!req.has("A"));
        assert!(req.has("B"));
        assert_eq!(req.len(), 1);
    }

    #[test]
    fn test_empty_options_normalize_away() {
        let mut req = Requirement::new();
        req.add(&[entry("A", "1.0").with_options(RequirementOptions::default())])
            .unwrap();
        req.add(&[entry("A", "")]).unwrap();
        assert!(req.get("A").unwrap().options.is_none());
    }

    #[test]
    fn test_case_sensitive_packages() {
        let mut req = Requirement::new();
        req.add(&[entry("Foo", "1.0"), entry("foo", "2.0")]).unwrap();
        assert_eq!(req.len(), 2);
    }
}
