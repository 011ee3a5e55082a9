// src/recipe/package_info.rs

//! Consumer metadata published with the package

use crate::error::Result;
use crate::recipe::descriptor::LIBRARY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// File name written into the package folder
pub const PACKAGE_INFO_FILE: &str = "package_info.json";

/// What consumers link against and where to find it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub libs: Vec<String>,
    pub includedirs: Vec<String>,
    pub libdirs: Vec<String>,
    pub bindirs: Vec<String>,
}

impl Default for PackageInfo {
    fn default() -> Self {
        Self {
            libs: vec![LIBRARY.to_string()],
            includedirs: vec!["include/coin-or/metis".to_string()],
            libdirs: vec!["lib".to_string()],
            bindirs: vec!["bin".to_string()],
        }
    }
}

impl PackageInfo {
    /// Write `package_info.json` into the package folder
    pub fn write(&self, package: &Path) -> Result<PathBuf> {
        let path = package.join(PACKAGE_INFO_FILE);
        fs::create_dir_all(package)?;
        fs::write(&path, serde_json::to_string_pretty(self)?)?;
        info!("Wrote {}", path.display());
        Ok(path)
    }

    /// Read a previously written `package_info.json`
    pub fn load(package: &Path) -> Result<Self> {
        let content = fs::read_to_string(package.join(PACKAGE_INFO_FILE))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Library names the package actually ships, derived from file names
    /// in the lib and bin directories
    pub fn installed_libraries(&self, package: &Path) -> Vec<String> {
        let mut names: Vec<String> = self
            .libdirs
            .iter()
            .chain(&self.bindirs)
            .flat_map(|dir| WalkDir::new(package.join(dir)).max_depth(1).into_iter())
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() || e.file_type().is_symlink())
            .filter_map(|e| library_name(&e.file_name().to_string_lossy()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Warn about declared libraries no installed file provides
    ///
    /// The published metadata is left as is. On Windows the DLL can be named
    /// `coinmetis-2` while consumers are told to link `coinmetis`.
    pub fn warn_unmatched(&self, package: &Path) -> Vec<String> {
        let installed = self.installed_libraries(package);
        let missing: Vec<String> = self
            .libs
            .iter()
            .filter(|lib| !installed.contains(lib))
            .cloned()
            .collect();
        for lib in &missing {
            warn!(
                "Declared library '{}' matches no installed file (found: {})",
                lib,
                installed.join(", ")
            );
        }
        missing
    }
}

/// Library name of a file, if it looks like a library
///
/// `libcoinmetis.so.2.0.0`, `libcoinmetis.2.dylib` and `coinmetis.lib` all
/// yield `coinmetis`; `coinmetis-2.dll` yields `coinmetis-2`.
fn library_name(file_name: &str) -> Option<String> {
    const SUFFIXES: &[&str] = &[".so", ".a", ".dylib", ".lib", ".dll"];

    let (stem, suffix) = SUFFIXES
        .iter()
        .filter_map(|suffix| {
            file_name
                .find(suffix)
                .filter(|&at| {
                    let rest = &file_name[at + suffix.len()..];
                    rest.is_empty() || rest.starts_with('.')
                })
                .map(|at| (&file_name[..at], *suffix))
        })
        .next()?;

    let mut stem = stem.strip_prefix("lib").unwrap_or(stem);
    stem = stem.strip_suffix(".dll").unwrap_or(stem);
    while let Some((base, tail)) = stem.rsplit_once('.').filter(|_| suffix == ".dylib") {
        if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
            break;
        }
        stem = base;
    }
    (!stem.is_empty()).then(|| stem.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let info = PackageInfo::default();
        assert_eq!(info.libs, vec!["coinmetis"]);
        assert_eq!(info.includedirs, vec!["include/coin-or/metis"]);
        assert_eq!(info.libdirs, vec!["lib"]);
        assert_eq!(info.bindirs, vec!["bin"]);
    }

    #[test]
    fn test_library_name() {
        assert_eq!(library_name("libcoinmetis.so"), Some("coinmetis".to_string()));
        assert_eq!(library_name("libcoinmetis.so.2.0.0"), Some("coinmetis".to_string()));
        assert_eq!(library_name("libcoinmetis.a"), Some("coinmetis".to_string()));
        assert_eq!(library_name("libcoinmetis.2.dylib"), Some("coinmetis".to_string()));
        assert_eq!(library_name("libcoinmetis.2.0.0.dylib"), Some("coinmetis".to_string()));
        assert_eq!(library_name("libcoinmetis.dylib"), Some("coinmetis".to_string()));
        assert_eq!(library_name("coinmetis.lib"), Some("coinmetis".to_string()));
        assert_eq!(library_name("coinmetis-2.dll"), Some("coinmetis-2".to_string()));
        assert_eq!(library_name("metis.h"), None);
        assert_eq!(library_name("libcoinmetis.la"), None);
    }

    #[test]
    fn test_write_and_load() {
        let dir = TempDir::new().unwrap();
        let info = PackageInfo::default();
        let path = info.write(dir.path()).unwrap();

        assert!(path.ends_with(PACKAGE_INFO_FILE));
        assert_eq!(PackageInfo::load(dir.path()).unwrap(), info);
    }

    #[test]
    fn test_warn_unmatched() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::write(dir.path().join("bin/coinmetis-2.dll"), b"").unwrap();

        let info = PackageInfo::default();
        assert_eq!(info.warn_unmatched(dir.path()), vec!["coinmetis"]);

        fs::write(dir.path().join("lib/libcoinmetis.so"), b"").unwrap();
        assert!(info.warn_unmatched(dir.path()).is_empty());
    }

    #[test]
    fn test_versioned_dylib_satisfies_declared_library() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/libcoinmetis.2.dylib"), b"").unwrap();

        assert!(PackageInfo::default().warn_unmatched(dir.path()).is_empty());
    }
}
