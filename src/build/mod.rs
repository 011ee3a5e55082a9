// src/build/mod.rs

//! Native build plumbing
//!
//! - [`autotools`]: configure plan and configure/make/install driver
//! - [`toolchain`]: scoped compiler environment (MSVC wrappers)
//! - [`vcvars`]: MSVC developer environment capture
//! - [`paths`]: Windows to MSYS path conversion

pub mod autotools;
pub mod paths;
pub mod toolchain;
pub mod vcvars;

pub use autotools::{Autotools, AutotoolsPlan};
pub use paths::unix_path;
pub use toolchain::{Environment, Toolchain, ToolchainScope};
