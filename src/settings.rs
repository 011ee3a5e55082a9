// src/settings.rs

//! Build settings: operating system, compiler, build type and architecture
//!
//! Settings are resolved from `key=value` pairs (profile `[settings]` table
//! and `-s` flags on the command line) on top of defaults for the host.
//! Recognized keys:
//!
//! - `os`
//! - `compiler`, `compiler.version`, `compiler.runtime`
//! - `build_type`
//! - `arch`
//!
//! Compiler identity is a closed enum. Every platform decision in the recipe
//! goes through [`Compiler::family`] and an exhaustive match, so a new
//! compiler cannot silently fall into a default branch.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Target operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Os {
    Windows,
    Linux,
    Macos,
    FreeBsd,
}

impl Os {
    /// The operating system this binary runs on
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Macos
        } else if cfg!(target_os = "freebsd") {
            Self::FreeBsd
        } else {
            Self::Linux
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Linux => "Linux",
            Self::Macos => "Macos",
            Self::FreeBsd => "FreeBSD",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Os {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" => Ok(Self::Macos),
            "freebsd" => Ok(Self::FreeBsd),
            _ => Err(Error::invalid_setting("os", s)),
        }
    }
}

/// MSVC C runtime selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsvcRuntime {
    /// Multithreaded DLL
    MD,
    /// Multithreaded static
    MT,
    /// Multithreaded debug DLL
    MDd,
    /// Multithreaded debug static
    MTd,
}

impl MsvcRuntime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MD => "MD",
            Self::MT => "MT",
            Self::MDd => "MDd",
            Self::MTd => "MTd",
        }
    }

    /// Compiler flag selecting this runtime (`-MD`, `-MT`, ...)
    pub fn flag(&self) -> String {
        format!("-{}", self.as_str())
    }
}

impl fmt::Display for MsvcRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MsvcRuntime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MD" => Ok(Self::MD),
            "MT" => Ok(Self::MT),
            "MDd" => Ok(Self::MDd),
            "MTd" => Ok(Self::MTd),
            _ => Err(Error::invalid_setting("compiler.runtime", s)),
        }
    }
}

/// Two-valued projection of [`Compiler`] used by all toolchain decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerFamily {
    /// `cl.exe` and friends
    Msvc,
    /// Any GCC-compatible driver
    Other,
}

/// Compiler setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum Compiler {
    Msvc { version: String, runtime: MsvcRuntime },
    Gcc { version: String },
    Clang { version: String },
    AppleClang { version: String },
}

impl Compiler {
    /// Default compiler for an operating system
    pub fn default_for(os: Os) -> Self {
        match os {
            Os::Windows => Self::Msvc {
                version: "16".to_string(),
                runtime: MsvcRuntime::MD,
            },
            Os::Macos => Self::AppleClang {
                version: "12.0".to_string(),
            },
            Os::FreeBsd => Self::Clang {
                version: "11".to_string(),
            },
            Os::Linux => Self::Gcc {
                version: "9".to_string(),
            },
        }
    }

    /// Build a compiler from its setting name and sub-settings
    pub fn from_parts(name: &str, version: Option<&str>, runtime: Option<&str>) -> Result<Self> {
        let version = version.unwrap_or_default().to_string();

        let compiler = match name {
            "Visual Studio" | "msvc" => Self::Msvc {
                version,
                runtime: runtime
                    .map(str::parse::<MsvcRuntime>)
                    .transpose()?
                    .unwrap_or(MsvcRuntime::MD),
            },
            "gcc" => Self::Gcc { version },
            "clang" => Self::Clang { version },
            "apple-clang" => Self::AppleClang { version },
            _ => return Err(Error::invalid_setting("compiler", name)),
        };

        if runtime.is_some() && compiler.family() != CompilerFamily::Msvc {
            return Err(Error::invalid_setting(
                "compiler.runtime",
                format!("{} (only valid for Visual Studio)", runtime.unwrap_or_default()),
            ));
        }

        Ok(compiler)
    }

    pub fn family(&self) -> CompilerFamily {
        match self {
            Self::Msvc { .. } => CompilerFamily::Msvc,
            Self::Gcc { .. } | Self::Clang { .. } | Self::AppleClang { .. } => {
                CompilerFamily::Other
            }
        }
    }

    /// Setting name, as written in profiles
    pub fn name(&self) -> &'static str {
        match self {
            Self::Msvc { .. } => "Visual Studio",
            Self::Gcc { .. } => "gcc",
            Self::Clang { .. } => "clang",
            Self::AppleClang { .. } => "apple-clang",
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Self::Msvc { version, .. }
            | Self::Gcc { version }
            | Self::Clang { version }
            | Self::AppleClang { version } => version,
        }
    }

    /// MSVC runtime, `None` for every other compiler
    pub fn runtime(&self) -> Option<MsvcRuntime> {
        match self {
            Self::Msvc { runtime, .. } => Some(*runtime),
            Self::Gcc { .. } | Self::Clang { .. } | Self::AppleClang { .. } => None,
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.version())?;
        if let Some(runtime) = self.runtime() {
            write!(f, " ({})", runtime)?;
        }
        Ok(())
    }
}

/// Build type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
            Self::RelWithDebInfo => "RelWithDebInfo",
            Self::MinSizeRel => "MinSizeRel",
        }
    }

    pub fn is_debug(&self) -> bool {
        matches!(self, Self::Debug)
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Debug" => Ok(Self::Debug),
            "Release" => Ok(Self::Release),
            "RelWithDebInfo" => Ok(Self::RelWithDebInfo),
            "MinSizeRel" => Ok(Self::MinSizeRel),
            _ => Err(Error::invalid_setting("build_type", s)),
        }
    }
}

/// Target architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arch {
    X86,
    X86_64,
    Armv7,
    Armv8,
}

impl Arch {
    pub fn host() -> Self {
        if cfg!(target_arch = "x86") {
            Self::X86
        } else if cfg!(target_arch = "arm") {
            Self::Armv7
        } else if cfg!(target_arch = "aarch64") {
            Self::Armv8
        } else {
            Self::X86_64
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Armv7 => "armv7",
            Self::Armv8 => "armv8",
        }
    }

    /// Argument accepted by `vcvarsall.bat`
    pub fn vcvars_arch(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "amd64",
            Self::Armv7 => "x86_arm",
            Self::Armv8 => "x86_arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "x86" | "i686" => Ok(Self::X86),
            "x86_64" | "amd64" | "x64" => Ok(Self::X86_64),
            "armv7" | "arm" => Ok(Self::Armv7),
            "armv8" | "aarch64" | "arm64" => Ok(Self::Armv8),
            _ => Err(Error::invalid_setting("arch", s)),
        }
    }
}

/// Fully resolved settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub os: Os,
    pub compiler: Compiler,
    pub build_type: BuildType,
    pub arch: Arch,
}

impl Default for Settings {
    fn default() -> Self {
        let os = Os::host();
        Self {
            os,
            compiler: Compiler::default_for(os),
            build_type: BuildType::default(),
            arch: Arch::host(),
        }
    }
}

impl Settings {
    /// Resolve settings from `key=value` pairs over host defaults
    ///
    /// When `os` is given but `compiler` is not, the compiler follows the
    /// default for that OS.
    pub fn from_pairs(pairs: &BTreeMap<String, String>) -> Result<Self> {
        for key in pairs.keys() {
            match key.as_str() {
                "os" | "compiler" | "compiler.version" | "compiler.runtime" | "build_type"
                | "arch" => {}
                _ => return Err(Error::invalid_setting(key.clone(), &pairs[key])),
            }
        }

        let mut settings = Self::default();

        if let Some(os) = pairs.get("os") {
            settings.os = os.parse()?;
            settings.compiler = Compiler::default_for(settings.os);
        }

        let version = pairs.get("compiler.version").map(String::as_str);
        let runtime = pairs.get("compiler.runtime").map(String::as_str);
        if let Some(name) = pairs.get("compiler") {
            settings.compiler = Compiler::from_parts(name, version, runtime)?;
        } else if version.is_some() || runtime.is_some() {
            let current = settings.compiler.clone();
            settings.compiler = Compiler::from_parts(
                current.name(),
                version.or(Some(current.version())),
                runtime.or(current.runtime().map(|r| r.as_str())),
            )?;
        }

        if let Some(build_type) = pairs.get("build_type") {
            settings.build_type = build_type.parse()?;
        }
        if let Some(arch) = pairs.get("arch") {
            settings.arch = arch.parse()?;
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> BTreeMap<String, String> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_visual_studio_is_msvc_family() {
        let compiler = Compiler::from_parts("Visual Studio", Some("16"), Some("MT")).unwrap();
        assert_eq!(compiler.family(), CompilerFamily::Msvc);
        assert_eq!(compiler.runtime(), Some(MsvcRuntime::MT));
    }

    #[test]
    fn test_gcc_is_other_family() {
        let compiler = Compiler::from_parts("gcc", Some("11"), None).unwrap();
        assert_eq!(compiler.family(), CompilerFamily::Other);
        assert_eq!(compiler.runtime(), None);
    }

    #[test]
    fn test_unknown_compiler_rejected() {
        assert!(Compiler::from_parts("intel", None, None).is_err());
    }

    #[test]
    fn test_runtime_only_for_msvc() {
        assert!(Compiler::from_parts("clang", Some("12"), Some("MD")).is_err());
    }

    #[test]
    fn test_from_pairs_windows_defaults_to_msvc() {
        let settings = Settings::from_pairs(&pairs(&[("os", "Windows")])).unwrap();
        assert_eq!(settings.os, Os::Windows);
        assert_eq!(settings.compiler.family(), CompilerFamily::Msvc);
    }

    #[test]
    fn test_from_pairs_full() {
        let settings = Settings::from_pairs(&pairs(&[
            ("os", "Linux"),
            ("compiler", "clang"),
            ("compiler.version", "14"),
            ("build_type", "Debug"),
            ("arch", "armv8"),
        ]))
        .unwrap();

        assert_eq!(settings.os, Os::Linux);
        assert_eq!(
            settings.compiler,
            Compiler::Clang {
                version: "14".to_string()
            }
        );
        assert_eq!(settings.build_type, BuildType::Debug);
        assert_eq!(settings.arch, Arch::Armv8);
    }

    #[test]
    fn test_from_pairs_runtime_on_default_msvc() {
        let settings = Settings::from_pairs(&pairs(&[
            ("os", "Windows"),
            ("compiler.runtime", "MTd"),
        ]))
        .unwrap();
        assert_eq!(settings.compiler.runtime(), Some(MsvcRuntime::MTd));
    }

    #[test]
    fn test_from_pairs_unknown_key() {
        assert!(Settings::from_pairs(&pairs(&[("libcxx", "libstdc++11")])).is_err());
    }

    #[test]
    fn test_parse_arch_aliases() {
        assert_eq!("amd64".parse::<Arch>().unwrap(), Arch::X86_64);
        assert_eq!("aarch64".parse::<Arch>().unwrap(), Arch::Armv8);
        assert!("mips".parse::<Arch>().is_err());
    }
}
