// src/profile.rs

//! Profile file parsing
//!
//! A profile is a TOML file describing one recipe invocation:
//!
//! ```toml
//! jobs = 8
//!
//! [settings]
//! os = "Windows"
//! compiler = "Visual Studio"
//! "compiler.version" = "16"
//! "compiler.runtime" = "MD"
//! build_type = "Release"
//! arch = "x86_64"
//!
//! [options]
//! shared = false
//!
//! [env]
//! CONAN_BASH_PATH = "C:/msys64/usr/bin/bash.exe"
//!
//! [folders]
//! source = "work/source"
//! build = "work/build"
//! package = "work/package"
//! imports = "work/imports"
//!
//! [dependencies.automake]
//! version = "1.16.3"
//! root = "C:/deps/automake"
//!
//! [dependencies.automake.user_info]
//! compile = "C:/deps/automake/share/automake-1.16/compile"
//! ar_lib = "C:/deps/automake/share/automake-1.16/ar-lib"
//! ```
//!
//! Every section is optional. Command-line `-s`/`-o` pairs are layered on
//! top of the file before settings and options are resolved.

use crate::error::{Error, Result};
use crate::options::Options;
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at an already installed POSIX shell
pub const BASH_PATH_ENV: &str = "CONAN_BASH_PATH";

/// Profile as written on disk
#[derive(Debug, Default, Deserialize)]
pub struct ProfileFile {
    /// Parallel make jobs
    #[serde(default)]
    pub jobs: Option<u32>,

    /// Raw `key = value` settings
    #[serde(default)]
    pub settings: BTreeMap<String, String>,

    /// Raw option values (booleans or strings)
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,

    /// Extra environment for external commands
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Working folders
    #[serde(default)]
    pub folders: Folders,

    /// Dependencies provided to the recipe (build requirements)
    #[serde(default)]
    pub dependencies: BTreeMap<String, Dependency>,
}

impl ProfileFile {
    /// Parse a profile from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a profile from a file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading profile from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Default profile location (`<config dir>/coinmetis-recipe/profile.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("coinmetis-recipe").join("profile.toml"))
    }
}

/// Working folders of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Folders {
    /// Pristine upstream snapshot
    pub source: PathBuf,
    /// Copy of the snapshot where configure and make run
    pub build: PathBuf,
    /// Install prefix and final package layout
    pub package: PathBuf,
    /// Destination of imported dependency files
    pub imports: PathBuf,
}

impl Default for Folders {
    fn default() -> Self {
        Self::under(Path::new("work"))
    }
}

impl Folders {
    /// All folders below a common root
    pub fn under(root: &Path) -> Self {
        Self {
            source: root.join("source"),
            build: root.join("build"),
            package: root.join("package"),
            imports: root.join("imports"),
        }
    }

    /// Anchor relative folders at the current directory
    ///
    /// Configure needs an absolute `--prefix` and runs inside the build
    /// folder, so nothing downstream may see a relative path.
    pub fn absolute(self) -> Result<Self> {
        Ok(Self {
            source: std::path::absolute(self.source)?,
            build: std::path::absolute(self.build)?,
            package: std::path::absolute(self.package)?,
            imports: std::path::absolute(self.imports)?,
        })
    }
}

/// A dependency made available to the recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Version of the provided package
    #[serde(default)]
    pub version: Option<String>,

    /// Root folder of the installed dependency
    pub root: PathBuf,

    /// Free-form values the dependency publishes to consumers
    #[serde(default)]
    pub user_info: BTreeMap<String, String>,
}

impl Dependency {
    /// Look up a user-info value, failing with a descriptive error
    pub fn user_info(&self, name: &str, key: &str) -> Result<&str> {
        self.user_info
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::DependencyInfo {
                name: name.to_string(),
                key: key.to_string(),
            })
    }
}

/// Fully resolved profile
#[derive(Debug, Clone)]
pub struct Profile {
    pub settings: Settings,
    /// Options after removal of those meaningless for the target OS
    pub options: Options,
    pub env: BTreeMap<String, String>,
    pub folders: Folders,
    pub dependencies: BTreeMap<String, Dependency>,
    pub jobs: u32,
}

impl Default for Profile {
    fn default() -> Self {
        let settings = Settings::default();
        let options = Options::default().configure_for(settings.os);
        Self {
            settings,
            options,
            env: BTreeMap::new(),
            folders: Folders::default(),
            dependencies: BTreeMap::new(),
            jobs: default_jobs(),
        }
    }
}

impl Profile {
    /// Resolve a profile file plus command-line overrides
    ///
    /// `settings` and `options` hold `key=value` overrides that win over the
    /// file's values.
    pub fn resolve(
        file: ProfileFile,
        settings: &[(String, String)],
        options: &[(String, String)],
    ) -> Result<Self> {
        let mut setting_pairs = file.settings;
        setting_pairs.extend(settings.iter().cloned());
        let settings = Settings::from_pairs(&setting_pairs)?;

        let mut option_pairs = BTreeMap::new();
        for (key, value) in file.options {
            option_pairs.insert(key, option_value_string(value)?);
        }
        option_pairs.extend(options.iter().cloned());
        let options = Options::from_pairs(&option_pairs)?.configure_for(settings.os);

        let folders = file.folders.absolute()?;
        debug!("Package folder: {}", folders.package.display());

        Ok(Self {
            settings,
            options,
            env: file.env,
            folders,
            dependencies: file.dependencies,
            jobs: file.jobs.filter(|j| *j > 0).unwrap_or_else(default_jobs),
        })
    }

    /// Configured POSIX shell, from the profile env first, then the process
    pub fn bash_path(&self) -> Option<PathBuf> {
        self.env
            .get(BASH_PATH_ENV)
            .cloned()
            .or_else(|| std::env::var(BASH_PATH_ENV).ok())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    /// Look up a dependency by name
    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.get(name)
    }
}

/// Parse a `key=value` command-line pair
pub fn parse_pair(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn option_value_string(value: toml::Value) -> Result<String> {
    match value {
        toml::Value::Boolean(b) => Ok(if b { "True" } else { "False" }.to_string()),
        toml::Value::String(s) => Ok(s),
        other => Err(Error::InvalidOption(format!(
            "option values must be booleans or strings, got {}",
            other
        ))),
    }
}

fn default_jobs() -> u32 {
    std::thread::available_parallelism()
        .map(|p| p.get() as u32)
        .unwrap_or(4)
}
