// src/lib.rs

//! coinmetis recipe
//!
//! Builds and packages the COIN-OR flavor of METIS 4.0.3 from the
//! `ThirdParty-Metis` helper repository with autotools.
//!
//! # Architecture
//!
//! - Profiles: settings, options, env and folders in one TOML file
//! - Plan: configure arguments and flags computed once per invocation
//! - Toolchain scope: MSVC wrappers layered over an invocation-local
//!   environment, never the process environment
//! - Lifecycle: `UNCONFIGURED -> SOURCED -> CONFIGURED -> BUILT -> PACKAGED`,
//!   persisted in the build folder
//! - Runners: every external command goes through a [`process::CommandRunner`]

pub mod build;
mod error;
pub mod options;
pub mod process;
pub mod profile;
pub mod recipe;
pub mod settings;

pub use build::{AutotoolsPlan, Environment, Toolchain, ToolchainScope};
pub use error::{Error, Result};
pub use options::Options;
pub use process::{CommandOutput, CommandRunner, DryRunRunner, Invocation, SystemRunner};
pub use profile::{Dependency, Folders, Profile, ProfileFile};
pub use recipe::{BuildRequirement, PackageInfo, Recipe, RecipeState, Stage};
pub use settings::{Arch, BuildType, Compiler, CompilerFamily, MsvcRuntime, Os, Settings};
