// src/version/mod.rs

//! Version handling and range satisfaction for module requirements
//!
//! This module provides version parsing and comparison for the decimal and
//! dotted-decimal version literals found in distribution metadata, plus the
//! comma-separated range predicates used by requirements (`>= 1.2, < 2.0`).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A parsed version literal
///
/// Two spellings are accepted:
/// - dotted-decimal: `5.36.0`, `v1.2.3` (leading `v` allowed), where each
///   dotted component is one comparison segment
/// - decimal: `1.23`, `0.9912`, where the fraction is split into 3-digit groups,
///   so `1.23` compares as `[1, 230]` and `0.9912` as `[0, 991, 200]`
///
/// Dev-release underscores (`1.23_01`) are ignored. Trailing zero segments
/// are trimmed, so `1.0`, `1.000` and `v1.0.0` compare equal.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    segments: Vec<u64>,
}

impl Version {
    /// Parse a version string
    pub fn parse(s: &str) -> Result<Self> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(Error::InvalidVersion(s.to_string()));
        }

        let cleaned: String = raw.chars().filter(|&c| c != '_').collect();
        let dotted = cleaned.starts_with('v') || cleaned.matches('.').count() >= 2;
        let body = cleaned.strip_prefix('v').unwrap_or(&cleaned);

        let mut segments = if dotted {
            body.split('.')
                .map(|part| {
                    part.parse::<u64>()
                        .map_err(|_| Error::InvalidVersion(s.to_string()))
                })
                .collect::<Result<Vec<u64>>>()?
        } else {
            let (int_part, frac_part) = match body.split_once('.') {
                Some((i, f)) => (i, f),
                None => (body, ""),
            };
            let mut segs = vec![int_part
                .parse::<u64>()
                .map_err(|_| Error::InvalidVersion(s.to_string()))?];
            if !frac_part.is_empty() {
                if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(Error::InvalidVersion(s.to_string()));
                }
                let mut frac = frac_part.to_string();
                while frac.len() % 3 != 0 {
                    frac.push('0');
                }
                for group in frac.as_bytes().chunks(3) {
                    let group = std::str::from_utf8(group).expect("ascii digits");
                    segs.push(group.parse::<u64>().expect("ascii digits"));
                }
            }
            segs
        };

        if segments.is_empty() {
            return Err(Error::InvalidVersion(s.to_string()));
        }
        while segments.len() > 1 && segments.last() == Some(&0) {
            segments.pop();
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The comparison segments after normalization
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// Whether this version satisfies every clause of a range
    pub fn satisfies(&self, range: &VersionRange) -> bool {
        range.satisfies(self)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for Version {}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.segments.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // Trailing zeros are trimmed, so plain lexicographic compare matches
        // the zero-padded component compare.
        self.segments.cmp(&other.segments)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Version {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Version::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Comparison operator of one range clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RangeOp {
    /// `==`
    Exact,
    /// `!=`
    NotEqual,
    /// `>=` (also the meaning of a bare version)
    GreaterOrEqual,
    /// `>`
    GreaterThan,
    /// `<=`
    LessOrEqual,
    /// `<`
    LessThan,
}

impl fmt::Display for RangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Exact => "==",
            Self::NotEqual => "!=",
            Self::GreaterOrEqual => ">=",
            Self::GreaterThan => ">",
            Self::LessOrEqual => "<=",
            Self::LessThan => "<",
        };
        write!(f, "{}", s)
    }
}

/// One clause of a version range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeClause {
    pub op: RangeOp,
    pub version: Version,
}

impl RangeClause {
    fn holds(&self, v: &Version) -> bool {
        match self.op {
            RangeOp::Exact => v == &self.version,
            RangeOp::NotEqual => v != &self.version,
            RangeOp::GreaterOrEqual => v >= &self.version,
            RangeOp::GreaterThan => v > &self.version,
            RangeOp::LessOrEqual => v <= &self.version,
            RangeOp::LessThan => v < &self.version,
        }
    }
}

impl fmt::Display for RangeClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.version)
    }
}

/// A version range: comma-separated clauses, all of which must hold
///
/// A bare version means "at least that version"; an empty string or `0`
/// accepts anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRange {
    clauses: Vec<RangeClause>,
}

impl VersionRange {
    /// The range accepting any version (`>= 0`)
    pub fn any() -> Self {
        Self {
            clauses: vec![RangeClause {
                op: RangeOp::GreaterOrEqual,
                version: Version::parse("0").expect("literal zero"),
            }],
        }
    }

    /// Parse a comma-separated range expression
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s == "0" {
            return Ok(Self::any());
        }

        let mut clauses = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(Error::InvalidRange(s.to_string()));
            }
            let (op, rest) = if let Some(rest) = part.strip_prefix("==") {
                (RangeOp::Exact, rest)
            } else if let Some(rest) = part.strip_prefix("!=") {
                (RangeOp::NotEqual, rest)
            } else if let Some(rest) = part.strip_prefix(">=") {
                (RangeOp::GreaterOrEqual, rest)
            } else if let Some(rest) = part.strip_prefix("<=") {
                (RangeOp::LessOrEqual, rest)
            } else if let Some(rest) = part.strip_prefix('>') {
                (RangeOp::GreaterThan, rest)
            } else if let Some(rest) = part.strip_prefix('<') {
                (RangeOp::LessThan, rest)
            } else {
                (RangeOp::GreaterOrEqual, part)
            };
            clauses.push(RangeClause {
                op,
                version: Version::parse(rest.trim())?,
            });
        }

        Ok(Self { clauses })
    }

    /// Whether a version satisfies every clause
    pub fn satisfies(&self, v: &Version) -> bool {
        self.clauses.iter().all(|c| c.holds(v))
    }

    /// The clauses in their current order
    pub fn clauses(&self) -> &[RangeClause] {
        &self.clauses
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.clauses.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        // Clause order is presentation only.
        let mut a = self.clauses.clone();
        let mut b = other.clauses.clone();
        let key = |c: &RangeClause| (c.version.segments().to_vec(), c.op);
        a.sort_by_key(key);
        b.sort_by_key(key);
        a == b
    }
}

impl Eq for VersionRange {}

/// Intersect two ranges into their canonical conjunction
///
/// The result holds for exactly the versions both inputs accept. Fails with
/// [`Error::IllegalRange`] when no version can satisfy the intersection.
/// Canonicalization (tightest lower bound, tightest upper bound, surviving
/// exclusions sorted) makes the operation commutative and idempotent.
pub fn range_merge(a: &VersionRange, b: &VersionRange) -> Result<VersionRange> {
    let illegal = || Error::IllegalRange {
        left: a.to_string(),
        right: b.to_string(),
    };

    let combined: Vec<&RangeClause> = a.clauses.iter().chain(b.clauses.iter()).collect();

    // An exact pin dominates: every other clause must agree with it.
    let mut exact: Option<&Version> = None;
    for c in combined.iter().filter(|c| c.op == RangeOp::Exact) {
        match exact {
            Some(v) if v != &c.version => return Err(illegal()),
            _ => exact = Some(&c.version),
        }
    }
    if let Some(v) = exact {
        if !combined.iter().all(|c| c.holds(v)) {
            return Err(illegal());
        }
        return Ok(VersionRange {
            clauses: vec![RangeClause {
                op: RangeOp::Exact,
                version: v.clone(),
            }],
        });
    }

    // Tightest lower bound: highest version, strict beating inclusive on ties.
    let mut lower: Option<(Version, bool)> = None;
    for c in &combined {
        let strict = match c.op {
            RangeOp::GreaterThan => true,
            RangeOp::GreaterOrEqual => false,
            _ => continue,
        };
        lower = Some(match lower.take() {
            None => (c.version.clone(), strict),
            Some((v, s)) => match c.version.cmp(&v) {
                Ordering::Greater => (c.version.clone(), strict),
                Ordering::Equal => (v, s || strict),
                Ordering::Less => (v, s),
            },
        });
    }

    // Tightest upper bound: lowest version, strict beating inclusive on ties.
    let mut upper: Option<(Version, bool)> = None;
    for c in &combined {
        let strict = match c.op {
            RangeOp::LessThan => true,
            RangeOp::LessOrEqual => false,
            _ => continue,
        };
        upper = Some(match upper.take() {
            None => (c.version.clone(), strict),
            Some((v, s)) => match c.version.cmp(&v) {
                Ordering::Less => (c.version.clone(), strict),
                Ordering::Equal => (v, s || strict),
                Ordering::Greater => (v, s),
            },
        });
    }

    if let (Some((lv, ls)), Some((uv, us))) = (&lower, &upper) {
        match lv.cmp(uv) {
            Ordering::Greater => return Err(illegal()),
            Ordering::Equal if *ls || *us => return Err(illegal()),
            _ => {}
        }
    }

    // Bounds that pin a single version collapse to an exact clause.
    if let (Some((lv, false)), Some((uv, false))) = (&lower, &upper) {
        if lv == uv {
            if combined
                .iter()
                .any(|c| c.op == RangeOp::NotEqual && &c.version == lv)
            {
                return Err(illegal());
            }
            return Ok(VersionRange {
                clauses: vec![RangeClause {
                    op: RangeOp::Exact,
                    version: lv.clone(),
                }],
            });
        }
    }

    let in_bounds = |v: &Version| {
        let above = match &lower {
            Some((lv, true)) => v > lv,
            Some((lv, false)) => v >= lv,
            None => true,
        };
        let below = match &upper {
            Some((uv, true)) => v < uv,
            Some((uv, false)) => v <= uv,
            None => true,
        };
        above && below
    };

    let mut exclusions: Vec<Version> = combined
        .iter()
        .filter(|c| c.op == RangeOp::NotEqual)
        .map(|c| c.version.clone())
        .filter(|v| in_bounds(v))
        .collect();
    exclusions.sort();
    exclusions.dedup();

    let mut clauses = Vec::new();
    if let Some((v, strict)) = lower {
        clauses.push(RangeClause {
            op: if strict {
                RangeOp::GreaterThan
            } else {
                RangeOp::GreaterOrEqual
            },
            version: v,
        });
    }
    if let Some((v, strict)) = upper {
        clauses.push(RangeClause {
            op: if strict {
                RangeOp::LessThan
            } else {
                RangeOp::LessOrEqual
            },
            version: v,
        });
    }
    for v in exclusions {
        clauses.push(RangeClause {
            op: RangeOp::NotEqual,
            version: v,
        });
    }

    if clauses.is_empty() {
        return Ok(VersionRange::any());
    }
    Ok(VersionRange { clauses })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn r(s: &str) -> VersionRange {
        VersionRange::parse(s).unwrap()
    }

    #[test]
    fn test_version_parse_decimal() {
        assert_eq!(v("1.23").segments(), &[1, 230]);
        assert_eq!(v("0.9912").segments(), &[0, 991, 200]);
        assert_eq!(v("2").segments(), &[2]);
    }

    #[test]
    fn test_version_parse_dotted() {
        assert_eq!(v("5.36.0").segments(), &[5, 36]);
        assert_eq!(v("v1.2.3").segments(), &[1, 2, 3]);
    }

    #[test]
    fn test_version_parse_underscore() {
        assert_eq!(v("1.23_01"), v("1.2301"));
    }

    #[test]
    fn test_version_parse_invalid() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("abc").is_err());
        assert!(Version::parse("1.x.3").is_err());
    }

    #[test]
    fn test_version_decimal_ordering() {
        // Decimal comparison, not string comparison: 0.9912 < 0.992
        assert!(v("0.9912") < v("0.992"));
        assert!(v("1.9.0") < v("1.10.0"));
        // Decimal 1.9 is 1.900, which outranks dotted 1.10.0
        assert!(v("1.9") > v("1.10.0"));
        assert!(v("1.2") < v("1.23"));
    }

    #[test]
    fn test_version_trailing_zero_equality() {
        assert_eq!(v("1.0"), v("1"));
        assert_eq!(v("v1.0.0"), v("1"));
    }

    #[test]
    fn test_version_display_keeps_input() {
        assert_eq!(v("v5.36.0").to_string(), "v5.36.0");
    }

    #[test]
    fn test_range_bare_means_at_least() {
        let range = r("1.0");
        assert!(v("1.0").satisfies(&range));
        assert!(v("2.0").satisfies(&range));
        assert!(!v("0.9").satisfies(&range));
    }

    #[test]
    fn test_range_any() {
        assert!(v("99.99").satisfies(&r("")));
        assert!(v("0.001").satisfies(&r("0")));
    }

    #[test]
    fn test_range_compound() {
        let range = r(">= 1.2, < 2.0");
        assert!(v("1.5").satisfies(&range));
        assert!(!v("2.0").satisfies(&range));
        assert!(!v("1.1").satisfies(&range));
    }

    #[test]
    fn test_range_exact_and_not_equal() {
        assert!(v("1.0").satisfies(&r("== 1.0")));
        assert!(!v("1.1").satisfies(&r("== 1.0")));
        assert!(!v("1.0").satisfies(&r("!= 1.0")));
    }

    #[test]
    fn test_merge_bounds() {
        let merged = range_merge(&r(">= 1.0"), &r("< 2.0")).unwrap();
        assert!(v("1.5").satisfies(&merged));
        assert!(!v("2.0").satisfies(&merged));
        assert!(!v("0.5").satisfies(&merged));
    }

    #[test]
    fn test_merge_commutative() {
        let ab = range_merge(&r(">= 1.0, != 1.5"), &r("< 2.0")).unwrap();
        let ba = range_merge(&r("< 2.0"), &r(">= 1.0, != 1.5")).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_merge_idempotent() {
        let a = r("< 2.0, >= 1.2");
        assert_eq!(range_merge(&a, &a).unwrap(), a);
    }

    #[test]
    fn test_merge_empty_intersection() {
        assert!(range_merge(&r(">= 2.0"), &r("< 1.0")).is_err());
        assert!(range_merge(&r("> 1.0"), &r("< 1.0")).is_err());
        assert!(range_merge(&r("== 1.0"), &r("== 2.0")).is_err());
        assert!(range_merge(&r("== 1.5"), &r(">= 2.0")).is_err());
    }

    #[test]
    fn test_merge_bounds_collapse_to_exact() {
        let merged = range_merge(&r(">= 1.0"), &r("<= 1.0")).unwrap();
        assert_eq!(merged, r("== 1.0"));
        assert!(range_merge(&r(">= 1.0, <= 1.0"), &r("!= 1.0")).is_err());
    }

    #[test]
    fn test_merge_exact_pin_wins() {
        let merged = range_merge(&r("== 1.5"), &r(">= 1.0, < 2.0")).unwrap();
        assert_eq!(merged, r("== 1.5"));
    }

    #[test]
    fn test_merge_drops_out_of_bounds_exclusion() {
        let merged = range_merge(&r(">= 1.0, != 0.5"), &r("< 2.0")).unwrap();
        assert_eq!(merged, r(">= 1.0, < 2.0"));
    }
}
