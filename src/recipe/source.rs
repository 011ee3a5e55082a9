// src/recipe/source.rs

//! Fetching the upstream snapshot
//!
//! Two commands, no retries: a shallow clone of the COIN-OR helper
//! repository at the pinned branch, then its vendor script, which downloads
//! the METIS sources into the clone.

use crate::error::Result;
use crate::process::{CommandRunner, Invocation};
use crate::recipe::descriptor::UpstreamSource;
use std::fs;
use std::path::Path;
use tracing::info;

/// Clone `upstream` into `source_folder` and run its fetch script there
///
/// `bash` is set on Windows hosts, where the script runs inside the POSIX
/// shell.
pub fn fetch(
    runner: &dyn CommandRunner,
    upstream: &UpstreamSource,
    source_folder: &Path,
    bash: Option<&Path>,
) -> Result<()> {
    if let Some(parent) = source_folder.parent().filter(|_| !runner.records_only()) {
        fs::create_dir_all(parent)?;
    }

    info!(
        "Cloning {} ({}) into {}",
        upstream.clone_url(),
        upstream.branch,
        source_folder.display()
    );
    let clone = Invocation::new("clone", "git")
        .args(["clone", "--depth", "1", "--branch", upstream.branch])
        .arg(upstream.clone_url())
        .arg(source_folder.to_string_lossy());
    runner.run(&clone)?;

    info!("Running {}", upstream.fetch_script);
    let mut script = Invocation::new("get-sources", upstream.fetch_script).current_dir(source_folder);
    if let Some(bash) = bash {
        script = script.through_shell(bash);
    }
    runner.run(&script)?;

    Ok(())
}
