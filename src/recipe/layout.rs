// src/recipe/layout.rs

//! Folder layout: preparing the build folder and normalizing the package
//!
//! After `make install` the package folder is cleaned up for consumers:
//!
//! - `lib/pkgconfig/` is removed (it is fine if it was never installed)
//! - `lib/libcoinmetis.la` is deleted; its absence means the install went
//!   wrong and is an error
//! - `INSTALL.Metis` from the build folder lands under `licenses/`

use crate::error::{Error, Result};
use crate::recipe::descriptor::{LIBTOOL_ARCHIVE, LICENSE_NOTE};
use crate::recipe::state::STATE_FILE;
use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Directory name under the package folder holding license files
pub const LICENSES_DIR: &str = "licenses";

/// Copy the source snapshot into the build folder
///
/// The snapshot's `.git` directory is left behind. Existing files in the
/// build folder are overwritten.
pub fn prepare_build_folder(source: &Path, build: &Path) -> Result<usize> {
    if !source.is_dir() {
        return Err(Error::NotFound(format!(
            "source folder {}",
            source.display()
        )));
    }

    fs::create_dir_all(build)?;
    let mut copied = 0;

    let walker = WalkDir::new(source)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");
    for entry in walker {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        if relative.as_os_str().is_empty() || relative == Path::new(STATE_FILE) {
            continue;
        }

        let target = build.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    info!(
        "Prepared build folder {} ({} files)",
        build.display(),
        copied
    );
    Ok(copied)
}

/// Copy every file below `src` whose name matches `pattern` to `dst`,
/// keeping its path relative to `src`
///
/// Returns the copied destinations.
pub fn copy_matching(
    src: &Path,
    dst: &Path,
    pattern: &str,
    case_sensitive: bool,
) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(pattern)?;
    let options = MatchOptions {
        case_sensitive,
        ..MatchOptions::new()
    };

    let mut copied = Vec::new();
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !pattern.matches_with(&name, options) {
            continue;
        }

        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target)?;
        debug!("Copied {} -> {}", entry.path().display(), target.display());
        copied.push(target);
    }
    Ok(copied)
}

/// Clean up the installed tree
pub fn normalize_package(package: &Path, build: &Path) -> Result<()> {
    let lib = package.join("lib");

    let pkgconfig = lib.join("pkgconfig");
    if pkgconfig.exists() {
        fs::remove_dir_all(&pkgconfig)?;
        debug!("Removed {}", pkgconfig.display());
    }

    let archive = lib.join(LIBTOOL_ARCHIVE);
    if !archive.is_file() {
        return Err(Error::NotFound(format!(
            "libtool archive {}",
            archive.display()
        )));
    }
    fs::remove_file(&archive)?;
    debug!("Removed {}", archive.display());

    let licenses = copy_matching(build, &package.join(LICENSES_DIR), LICENSE_NOTE, true)?;
    if licenses.is_empty() {
        return Err(Error::NotFound(format!(
            "{} in {}",
            LICENSE_NOTE,
            build.display()
        )));
    }

    info!("Normalized package folder {}", package.display());
    Ok(())
}
