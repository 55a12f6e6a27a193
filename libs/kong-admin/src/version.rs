//! Gateway versions and version ranges.
//!
//! Versions have three or four numeric components (`3.4.1`, `2.8.1.0`), an
//! optional `-pre-release` and an optional `+build`. A missing fourth component
//! compares as `0`, a pre-release sorts before the release it precedes, and
//! build metadata never affects ordering.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("empty version")]
    Empty,

    #[error("invalid version {input:?}: {reason}")]
    Invalid { input: String, reason: String },

    #[error("invalid version range {input:?}: {reason}")]
    InvalidRange { input: String, reason: String },
}

impl VersionError {
    fn invalid(input: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }

    fn range(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            input: input.to_owned(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Fourth component used by enterprise builds.
    pub revision: Option<u64>,
    pub pre_release: String,
    pub build: String,
}

impl Version {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            revision: None,
            pre_release: String::new(),
            build: String::new(),
        }
    }

    /// Parse `[v]M.m.p[.r][-pre][+build]`.
    ///
    /// # Errors
    /// [`VersionError`] when the text is empty, has other than three or four
    /// numeric components, or has an empty pre-release or build part.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let text = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        if text.is_empty() {
            return Err(VersionError::Empty);
        }

        let (rest, build) = match text.split_once('+') {
            Some((rest, build)) if build.is_empty() => {
                return Err(VersionError::invalid(input, "empty build metadata"));
            }
            Some((rest, build)) => (rest, build),
            None => (text, ""),
        };
        let (core, pre_release) = match rest.split_once('-') {
            Some((_, pre)) if pre.is_empty() => {
                return Err(VersionError::invalid(input, "empty pre-release"));
            }
            Some((core, pre)) => (core, pre),
            None => (rest, ""),
        };

        let numbers = core
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(VersionError::invalid(
                        input,
                        format!("component {part:?} is not a number"),
                    ));
                }
                part.parse::<u64>()
                    .map_err(|e| VersionError::invalid(input, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (major, minor, patch, revision) = match numbers.as_slice() {
            [major, minor, patch] => (*major, *minor, *patch, None),
            [major, minor, patch, revision] => (*major, *minor, *patch, Some(*revision)),
            _ => {
                return Err(VersionError::invalid(
                    input,
                    "expected three or four components",
                ));
            }
        };

        Ok(Self {
            major,
            minor,
            patch,
            revision,
            pre_release: pre_release.to_owned(),
            build: build.to_owned(),
        })
    }

    #[must_use]
    pub fn is_pre_release(&self) -> bool {
        !self.pre_release.is_empty()
    }

    /// The same version with pre-release and build metadata removed.
    #[must_use]
    pub fn release(&self) -> Self {
        Self {
            pre_release: String::new(),
            build: String::new(),
            ..self.clone()
        }
    }

    fn numeric(&self) -> (u64, u64, u64, u64) {
        (
            self.major,
            self.minor,
            self.patch,
            self.revision.unwrap_or(0),
        )
    }
}

/// Dot-separated identifiers: numeric ones compare numerically and sort before
/// alphanumeric ones; a shorter prefix sorts first.
fn compare_pre_release(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => match (l.parse::<u64>(), r.parse::<u64>()) {
                (Ok(l), Ok(r)) => l.cmp(&r),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => l.cmp(r),
            },
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numeric()
            .cmp(&other.numeric())
            .then_with(|| compare_pre_release(&self.pre_release, &other.pre_release))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numeric().hash(state);
        self.pre_release.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(revision) = self.revision {
            write!(f, ".{revision}")?;
        }
        if !self.pre_release.is_empty() {
            write!(f, "-{}", self.pre_release)?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl Op {
    /// Longest operators first so `>=` is not read as `>`.
    const TOKENS: [(&'static str, Op); 8] = [
        (">=", Op::Ge),
        ("<=", Op::Le),
        ("!=", Op::Ne),
        ("==", Op::Eq),
        (">", Op::Gt),
        ("<", Op::Lt),
        ("=", Op::Eq),
        ("!", Op::Ne),
    ];

    fn split(token: &str) -> (Op, &str) {
        Self::TOKENS
            .iter()
            .find_map(|(prefix, op)| token.strip_prefix(*prefix).map(|rest| (*op, rest)))
            .unwrap_or((Op::Eq, token))
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Op::Gt => ordering == Ordering::Greater,
            Op::Ge => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Le => ordering != Ordering::Greater,
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    fn matches(&self, version: &Version) -> bool {
        self.op.holds(version.cmp(&self.version))
    }
}

/// A set of versions such as `>=2.8.0 <3.0.0 || >=3.2.0`.
///
/// Comparators separated by whitespace must all hold; `||` separates
/// alternatives of which one must hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    alternatives: Vec<Vec<Comparator>>,
}

impl Range {
    /// # Errors
    /// [`VersionError::InvalidRange`] for an empty alternative, a dangling
    /// operator or an unparsable version.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let mut alternatives = Vec::new();
        for alternative in input.split("||") {
            let mut comparators = Vec::new();
            let mut tokens = alternative.split_whitespace();
            while let Some(token) = tokens.next() {
                let (op, mut text) = Op::split(token);
                if text.is_empty() {
                    text = tokens
                        .next()
                        .ok_or_else(|| VersionError::range(input, format!("{token:?} has no version")))?;
                }
                let version = Version::parse(text)
                    .map_err(|e| VersionError::range(input, e.to_string()))?;
                comparators.push(Comparator { op, version });
            }
            if comparators.is_empty() {
                return Err(VersionError::range(input, "empty alternative"));
            }
            alternatives.push(comparators);
        }
        Ok(Self { alternatives })
    }

    /// Whether `version` satisfies the range, ignoring its pre-release and build.
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        let version = version.release();
        self.alternatives
            .iter()
            .any(|all| all.iter().all(|c| c.matches(&version)))
    }
}

impl FromStr for Range {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
