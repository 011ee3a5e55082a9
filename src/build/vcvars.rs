// src/build/vcvars.rs

//! MSVC developer environment capture
//!
//! `cl.exe` only works after `vcvarsall.bat` has populated `PATH`, `INCLUDE`,
//! `LIB` and friends. The script is run once through `cmd`, followed by
//! `set`, and the printed environment is parsed back into a map.

use crate::error::{Error, Result};
use crate::process::{CommandRunner, Invocation};
use crate::settings::Arch;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Profile env key overriding the `vcvarsall.bat` location
pub const VCVARSALL_ENV: &str = "VCVARSALL";

const VSWHERE: &str = r"C:\Program Files (x86)\Microsoft Visual Studio\Installer\vswhere.exe";

/// Capture the developer environment for `arch`
///
/// `vcvarsall` is the script location when already known; otherwise
/// `vswhere` is asked for the latest installation with the C++ tools.
/// A recording runner gets both invocations and yields an empty layer.
pub fn capture(
    runner: &dyn CommandRunner,
    arch: Arch,
    vcvarsall: Option<PathBuf>,
) -> Result<BTreeMap<String, String>> {
    let script = match vcvarsall {
        Some(path) => path,
        None => match locate_vcvarsall(runner) {
            Err(Error::Vcvars(reason)) if runner.records_only() => {
                debug!("(dry run) {}", reason);
                PathBuf::from("vcvarsall.bat")
            }
            located => located?,
        },
    };

    info!("Capturing MSVC environment from {}", script.display());
    let invocation = Invocation::new("vcvars", "cmd").args([
        "/s".to_string(),
        "/c".to_string(),
        format!("\"{}\" {} && set", script.display(), arch.vcvars_arch()),
    ]);
    let output = runner.run(&invocation)?;

    let env = parse_set_output(&output.stdout);
    debug!("Captured {} variables", env.len());
    Ok(env)
}

fn locate_vcvarsall(runner: &dyn CommandRunner) -> Result<PathBuf> {
    let invocation = Invocation::new("vswhere", VSWHERE).args([
        "-latest",
        "-products",
        "*",
        "-requires",
        "Microsoft.VisualStudio.Component.VC.Tools.x86.x64",
        "-property",
        "installationPath",
    ]);
    let output = runner.run(&invocation)?;

    let install = output
        .stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| Error::Vcvars("no Visual Studio installation with C++ tools".to_string()))?;

    Ok(PathBuf::from(install)
        .join("VC")
        .join("Auxiliary")
        .join("Build")
        .join("vcvarsall.bat"))
}

/// Parse the output of `set` into a variable map
///
/// Lines without `=`, or whose name is empty (cmd's hidden `=C:` entries),
/// are skipped.
pub fn parse_set_output(output: &str) -> BTreeMap<String, String> {
    output
        .lines()
        .filter_map(|line| line.trim_end_matches('\r').split_once('='))
        .filter(|(name, _)| !name.is_empty() && !name.contains(' '))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
