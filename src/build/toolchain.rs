// src/build/toolchain.rs

//! Scoped toolchain environment
//!
//! External commands never read or modify the process environment directly.
//! They get their variables from an [`Environment`]: a stack of layers owned
//! by one recipe invocation. Entering a [`ToolchainScope`] pushes the
//! toolchain's layers; dropping the scope pops them again, also when the
//! guarded step bails out with `?`.
//!
//! With MSVC the scope holds two layers: the captured developer environment
//! (`vcvarsall.bat`) and the compiler/linker/archiver wrappers that make
//! `cl.exe` usable from autotools. Every other compiler gets an empty scope.

use crate::build::paths::unix_path;
use crate::error::{Error, Result};
use crate::profile::Profile;
use crate::settings::CompilerFamily;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Name of the dependency that provides the `compile` and `ar-lib` wrappers
pub const AUTOMAKE: &str = "automake";

/// Layered environment for the external commands of one invocation
#[derive(Debug, Default, Clone)]
pub struct Environment {
    layers: Vec<BTreeMap<String, String>>,
}

impl Environment {
    /// Start with a base layer (typically the profile's `[env]` table)
    pub fn new(base: BTreeMap<String, String>) -> Self {
        Self { layers: vec![base] }
    }

    /// Effective variables, later layers winning
    pub fn vars(&self) -> BTreeMap<String, String> {
        let mut merged = BTreeMap::new();
        for layer in &self.layers {
            merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    /// Number of layers currently pushed
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    fn push(&mut self, layer: BTreeMap<String, String>) {
        self.layers.push(layer);
    }

    fn pop(&mut self) {
        self.layers.pop();
    }
}

/// Toolchain selected for an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toolchain {
    /// `cl.exe` behind the automake wrappers
    Msvc {
        /// Captured developer environment, empty when not on a Windows host
        vcvars: BTreeMap<String, String>,
        compile_wrapper: String,
        ar_wrapper: String,
    },
    /// Whatever the environment already provides
    Passthrough,
}

impl Toolchain {
    /// Pick the toolchain for the profile's compiler
    ///
    /// `vcvars` is only consulted for MSVC.
    pub fn resolve(
        profile: &Profile,
        vcvars: impl FnOnce() -> Result<BTreeMap<String, String>>,
    ) -> Result<Self> {
        match profile.settings.compiler.family() {
            CompilerFamily::Msvc => {
                let automake = profile
                    .dependency(AUTOMAKE)
                    .ok_or_else(|| Error::MissingRequirements(vec![AUTOMAKE.to_string()]))?;
                let compile = automake.user_info(AUTOMAKE, "compile")?;
                let ar_lib = automake.user_info(AUTOMAKE, "ar_lib")?;

                Ok(Self::Msvc {
                    vcvars: vcvars()?,
                    compile_wrapper: unix_path(Path::new(compile)),
                    ar_wrapper: unix_path(Path::new(ar_lib)),
                })
            }
            CompilerFamily::Other => Ok(Self::Passthrough),
        }
    }

    /// Compiler, linker and archiver overrides
    ///
    /// Empty for every toolchain but MSVC.
    pub fn overrides(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        match self {
            Self::Msvc {
                compile_wrapper,
                ar_wrapper,
                ..
            } => {
                env.insert("CC".to_string(), format!("{} cl -nologo", compile_wrapper));
                env.insert("CXX".to_string(), format!("{} cl -nologo", compile_wrapper));
                env.insert("LD".to_string(), "link -nologo".to_string());
                env.insert("AR".to_string(), format!("{} lib", ar_wrapper));
            }
            Self::Passthrough => {}
        }
        env
    }

    /// Enter the toolchain's scope on `env`
    pub fn enter<'a>(&self, env: &'a mut Environment) -> ToolchainScope<'a> {
        ToolchainScope::enter(env, self)
    }
}

/// Guard keeping a toolchain's variables pushed on an [`Environment`]
///
/// Dropping the guard restores the environment to its previous depth.
#[must_use = "the toolchain environment is popped as soon as the scope is dropped"]
pub struct ToolchainScope<'a> {
    env: &'a mut Environment,
    pushed: usize,
}

impl<'a> ToolchainScope<'a> {
    fn enter(env: &'a mut Environment, toolchain: &Toolchain) -> Self {
        let mut pushed = 0;
        match toolchain {
            Toolchain::Msvc { vcvars, .. } => {
                debug!("Entering MSVC toolchain scope");
                env.push(vcvars.clone());
                env.push(toolchain.overrides());
                pushed = 2;
            }
            Toolchain::Passthrough => {}
        }
        Self { env, pushed }
    }

    /// Effective variables inside the scope
    pub fn vars(&self) -> BTreeMap<String, String> {
        self.env.vars()
    }
}

impl Drop for ToolchainScope<'_> {
    fn drop(&mut self) {
        for _ in 0..self.pushed {
            self.env.pop();
        }
        if self.pushed > 0 {
            debug!("Left toolchain scope");
        }
    }
}
