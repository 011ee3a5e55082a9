// src/recipe/requirements.rs

//! Build-requirement resolution
//!
//! A pure decision table:
//!
//! | condition                                  | requirement            |
//! |--------------------------------------------|------------------------|
//! | Windows host and no configured shell path  | `msys2/20200517`       |
//! | MSVC compiler                              | `automake/[>=1.16.3]`  |
//!
//! The profile provides requirements as `[dependencies.<name>]` entries.

use crate::profile::Profile;
use crate::settings::{Compiler, CompilerFamily};
use semver::{Version, VersionReq};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Portable POSIX shell toolset
pub const MSYS2: &str = "msys2";

/// Version constraint of a requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// Exactly this reference (date-versioned packages)
    Exact(String),
    /// A semver range
    Range(VersionReq),
}

impl VersionSpec {
    /// Whether a provided version satisfies the constraint
    pub fn matches(&self, provided: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == provided,
            Self::Range(req) => lenient_version(provided).is_some_and(|v| req.matches(&v)),
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => f.write_str(v),
            Self::Range(req) => write!(f, "[{}]", req),
        }
    }
}

/// A tool the recipe needs at build time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequirement {
    pub name: String,
    pub version: VersionSpec,
}

impl fmt::Display for BuildRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

impl Serialize for BuildRequirement {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Apply the decision table
pub fn build_requirements(
    windows_host: bool,
    bash_path: Option<&Path>,
    compiler: &Compiler,
) -> Vec<BuildRequirement> {
    let mut requirements = Vec::new();

    if windows_host && bash_path.is_none() {
        requirements.push(BuildRequirement {
            name: MSYS2.to_string(),
            version: VersionSpec::Exact("20200517".to_string()),
        });
    }

    match compiler.family() {
        CompilerFamily::Msvc => requirements.push(BuildRequirement {
            name: crate::build::toolchain::AUTOMAKE.to_string(),
            version: VersionSpec::Range(VersionReq {
                comparators: vec![semver::Comparator {
                    op: semver::Op::GreaterEq,
                    major: 1,
                    minor: Some(16),
                    patch: Some(3),
                    pre: semver::Prerelease::EMPTY,
                }],
            }),
        }),
        CompilerFamily::Other => {}
    }

    requirements
}

/// Requirements the profile does not provide, rendered for error messages
pub fn unsatisfied(requirements: &[BuildRequirement], profile: &Profile) -> Vec<String> {
    requirements
        .iter()
        .filter(|req| {
            !profile.dependency(&req.name).is_some_and(|dep| {
                dep.version
                    .as_deref()
                    .is_some_and(|v| req.version.matches(v))
            })
        })
        .map(ToString::to_string)
        .collect()
}

/// Accept `1.16`, `1.16.3` and `1.16.3-p1` style versions
///
/// A `-` suffix is a packaging revision of that release, not a semver
/// prerelease, so it is dropped before comparing.
fn lenient_version(raw: &str) -> Option<Version> {
    let release = raw.split_once('-').map_or(raw, |(release, _)| release);
    if let Ok(v) = Version::parse(release) {
        return Some(v);
    }
    let mut parts = release.split('.').map(|p| p.parse::<u64>());
    let major = parts.next()?.ok()?;
    let minor = parts.next().unwrap_or(Ok(0)).ok()?;
    let patch = parts.next().unwrap_or(Ok(0)).ok()?;
    Some(Version::new(major, minor, patch))
}

/// Result of looking up one host tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolCheck {
    pub tool: &'static str,
    pub purpose: &'static str,
    pub path: Option<PathBuf>,
}

impl ToolCheck {
    pub fn found(&self) -> bool {
        self.path.is_some()
    }
}

/// Host tools every build needs
const HOST_TOOLS: &[(&str, &str)] = &[
    ("git", "Clone the upstream helper repository"),
    ("sh", "Run the fetch and configure scripts"),
    ("make", "Build and install"),
];

/// Look up the host tools on `PATH`
pub fn check_host_tools() -> Vec<ToolCheck> {
    HOST_TOOLS
        .iter()
        .map(|(tool, purpose)| ToolCheck {
            tool,
            purpose,
            path: which::which(tool).ok(),
        })
        .collect()
}
