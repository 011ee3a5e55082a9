// src/recipe/descriptor.rs

//! Static package descriptor and upstream source pin

use serde::Serialize;

/// Package identity and metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDescriptor {
    pub name: &'static str,
    pub version: &'static str,
    pub license: &'static [&'static str],
    pub author: &'static str,
    pub url: &'static str,
    pub homepage: &'static str,
    pub description: &'static str,
    pub topics: &'static [&'static str],
    /// Settings the package binary depends on
    pub settings: &'static [&'static str],
    /// Option names with their defaults
    pub default_options: &'static [(&'static str, bool)],
}

/// Where the sources come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamSource {
    /// COIN-OR helper repository that wraps the METIS sources
    pub repository: &'static str,
    pub branch: &'static str,
    /// Vendor script that downloads METIS into the clone
    pub fetch_script: &'static str,
}

impl UpstreamSource {
    pub fn clone_url(&self) -> String {
        format!("https://github.com/coin-or-tools/{}.git", self.repository)
    }
}

pub const DESCRIPTOR: PackageDescriptor = PackageDescriptor {
    name: "coinmetis",
    version: "4.0.3",
    license: &["https://github.com/CIBC-Internal/metis-4.0.3/blob/master/LICENSE"],
    author: "SINTEF Ocean",
    url: "https://github.com/sintef-ocean/conan-coinmetis",
    homepage: "http://glaros.dtc.umn.edu/gkhome/metis/metis/overview",
    description: "METIS is a set of serial programs for partitioning graphs, \
                  partitioning finite element meshes, and producing fill \
                  reducing orderings for sparse matrices.",
    topics: &["Matrix ordering", "Partitioning graphs", "COIN-OR"],
    settings: &["os", "compiler", "build_type", "arch"],
    default_options: &[("shared", true), ("fPIC", true)],
};

pub const UPSTREAM: UpstreamSource = UpstreamSource {
    repository: "ThirdParty-Metis",
    branch: "stable/2.0",
    fetch_script: "./get.Metis",
};

/// Library name published to consumers
pub const LIBRARY: &str = "coinmetis";

/// Libtool archive removed from the package
pub const LIBTOOL_ARCHIVE: &str = "libcoinmetis.la";

/// Installation note shipped as the license file
pub const LICENSE_NOTE: &str = "INSTALL.Metis";
