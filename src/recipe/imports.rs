// src/recipe/imports.rs

//! License files of dependencies

use crate::error::Result;
use crate::profile::Dependency;
use crate::recipe::layout::{LICENSES_DIR, copy_matching};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Case-insensitive file-name pattern of license files
pub const LICENSE_PATTERN: &str = "license*";

/// Copy every dependency's license files to `<imports>/licenses/<name>/`
///
/// A dependency whose root does not exist is skipped.
pub fn import_licenses(
    dependencies: &BTreeMap<String, Dependency>,
    imports: &Path,
) -> Result<Vec<PathBuf>> {
    let mut imported = Vec::new();
    for (name, dependency) in dependencies {
        if !dependency.root.is_dir() {
            debug!(
                "Dependency {} has no folder at {}, skipping",
                name,
                dependency.root.display()
            );
            continue;
        }
        let dst = imports.join(LICENSES_DIR).join(name);
        let copied = copy_matching(&dependency.root, &dst, LICENSE_PATTERN, false)?;
        debug!("Imported {} license files from {}", copied.len(), name);
        imported.extend(copied);
    }
    info!("Imported {} license files", imported.len());
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn dependency(root: PathBuf) -> Dependency {
        Dependency {
            version: None,
            root,
            user_info: BTreeMap::new(),
        }
    }

    #[test]
    fn test_import_preserves_structure() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("automake");
        fs::create_dir_all(root.join("licenses")).unwrap();
        fs::write(root.join("licenses/COPYING"), b"gpl").unwrap();
        fs::write(root.join("licenses/LICENSE.txt"), b"gpl").unwrap();
        fs::write(root.join("license"), b"gpl").unwrap();

        let mut deps = BTreeMap::new();
        deps.insert("automake".to_string(), dependency(root));
        deps.insert("msys2".to_string(), dependency(dir.path().join("absent")));

        let imports = dir.path().join("imports");
        let imported = import_licenses(&deps, &imports).unwrap();

        assert_eq!(imported.len(), 2);
        assert!(imports.join("licenses/automake/license").is_file());
        assert!(imports.join("licenses/automake/licenses/LICENSE.txt").is_file());
        assert!(!imports.join("licenses/automake/licenses/COPYING").exists());
        assert!(!imports.join("licenses/msys2").exists());
    }
}
