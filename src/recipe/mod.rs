// src/recipe/mod.rs

//! The coinmetis recipe
//!
//! [`Recipe`] drives one invocation against a resolved [`Profile`]:
//!
//! - **source**: shallow clone of `ThirdParty-Metis` plus `./get.Metis`
//! - **build**: copy the snapshot to the build folder, configure once, make
//! - **package**: `make install`, then normalize the installed tree and
//!   publish `package_info.json`
//! - **imports**: collect dependency license files
//!
//! The configure plan is computed once when the recipe is created. Build
//! and package steps run inside the toolchain scope, which is popped again
//! when the step ends, successfully or not.

pub mod descriptor;
pub mod imports;
pub mod layout;
pub mod package_info;
pub mod requirements;
pub mod source;
pub mod state;

pub use descriptor::{DESCRIPTOR, PackageDescriptor, UPSTREAM, UpstreamSource};
pub use package_info::PackageInfo;
pub use requirements::{BuildRequirement, ToolCheck, VersionSpec};
pub use state::{RecipeState, Stage};

use crate::build::vcvars::{self, VCVARSALL_ENV};
use crate::build::{Autotools, AutotoolsPlan, Environment, Toolchain};
use crate::error::{Error, Result};
use crate::process::CommandRunner;
use crate::profile::Profile;
use crate::settings::Os;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// One recipe invocation
pub struct Recipe<'a> {
    runner: &'a dyn CommandRunner,
    profile: Profile,
    plan: AutotoolsPlan,
    env: Environment,
    host: Os,
    /// Lifecycle state, loaded from the build folder on first use
    state: Option<RecipeState>,
    /// Resolved on first use; capturing vcvars is slow
    toolchain: Option<Toolchain>,
}

impl<'a> Recipe<'a> {
    /// Create a recipe for the current host
    pub fn new(profile: Profile, runner: &'a dyn CommandRunner) -> Self {
        Self::for_host(profile, runner, Os::host())
    }

    /// Create a recipe as if running on `host`
    pub fn for_host(profile: Profile, runner: &'a dyn CommandRunner, host: Os) -> Self {
        let plan = AutotoolsPlan::resolve(
            &profile.settings,
            &profile.options,
            &profile.folders.package,
            profile.jobs,
            host == Os::Windows,
        );
        debug!("Configure plan: {:?}", plan.configure_args);
        let env = Environment::new(profile.env.clone());
        Self {
            runner,
            profile,
            plan,
            env,
            host,
            state: None,
            toolchain: None,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// The configure plan of this invocation
    pub fn plan(&self) -> &AutotoolsPlan {
        &self.plan
    }

    /// Lifecycle stage of the build folder
    pub fn stage(&mut self) -> Result<Stage> {
        Ok(self.state()?.stage)
    }

    /// Build requirements for the resolved settings
    pub fn requirements(&self) -> Vec<BuildRequirement> {
        requirements::build_requirements(
            self.windows_host(),
            self.profile.bash_path().as_deref(),
            &self.profile.settings.compiler,
        )
    }

    /// Fail if the profile does not provide every build requirement
    pub fn check_requirements(&self) -> Result<()> {
        let missing = requirements::unsatisfied(&self.requirements(), &self.profile);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingRequirements(missing))
        }
    }

    /// Fetch the upstream snapshot into the source folder
    pub fn source(&mut self) -> Result<()> {
        let mut state = self.state()?;
        state.advance(Stage::Sourced)?;
        self.check_requirements()?;

        let bash = self.shell()?;
        source::fetch(
            self.runner,
            &UPSTREAM,
            &self.profile.folders.source,
            bash.as_deref(),
        )?;

        self.commit(state)?;
        info!("Sources ready in {}", self.profile.folders.source.display());
        Ok(())
    }

    /// Run `./configure`, unless this build folder is already configured
    ///
    /// The first call copies the source snapshot into the build folder.
    /// Returns the plan used.
    pub fn configure(&mut self) -> Result<&AutotoolsPlan> {
        let mut state = self.state()?;
        state.check_plan(&self.plan)?;
        if !state.advance(Stage::Configured)? {
            debug!("Build folder already configured");
            return Ok(&self.plan);
        }
        self.check_requirements()?;

        let build = self.profile.folders.build.clone();
        if self.runner.records_only() {
            info!("(dry run) would copy sources into {}", build.display());
        } else {
            layout::prepare_build_folder(&self.profile.folders.source, &build)?;
        }

        let bash = self.shell()?;
        let toolchain = self.toolchain()?.clone();
        {
            let scope = toolchain.enter(&mut self.env);
            Autotools::new(self.runner, &build, bash).configure(&self.plan, &scope.vars())?;
        }

        state.plan = Some(self.plan.clone());
        self.commit(state)?;
        Ok(&self.plan)
    }

    /// Configure (once) and run `make`
    pub fn build(&mut self) -> Result<()> {
        self.configure()?;

        let mut state = self.state()?;
        state.advance(Stage::Built)?;

        let build = self.profile.folders.build.clone();
        let bash = self.shell()?;
        let toolchain = self.toolchain()?.clone();
        {
            let scope = toolchain.enter(&mut self.env);
            Autotools::new(self.runner, &build, bash).make(&self.plan, &scope.vars(), None)?;
        }

        self.commit(state)?;
        info!("Build finished in {}", build.display());
        Ok(())
    }

    /// Install into the package folder, normalize it and publish the
    /// consumer metadata
    pub fn package(&mut self) -> Result<PackageInfo> {
        let mut state = self.state()?;
        state.check_plan(&self.plan)?;
        state.advance(Stage::Packaged)?;
        self.check_requirements()?;

        let build = self.profile.folders.build.clone();
        let package = self.profile.folders.package.clone();
        let bash = self.shell()?;
        let toolchain = self.toolchain()?.clone();
        {
            let scope = toolchain.enter(&mut self.env);
            Autotools::new(self.runner, &build, bash).install(&self.plan, &scope.vars())?;
        }

        let published = PackageInfo::default();
        if self.runner.records_only() {
            info!("(dry run) would normalize {}", package.display());
        } else {
            layout::normalize_package(&package, &build)?;
            published.warn_unmatched(&package);
            published.write(&package)?;
        }

        self.commit(state)?;
        info!("Package ready in {}", package.display());
        Ok(published)
    }

    /// Copy dependency license files into the imports folder
    pub fn imports(&self) -> Result<Vec<PathBuf>> {
        if self.runner.records_only() {
            info!("(dry run) would import dependency licenses");
            return Ok(Vec::new());
        }
        imports::import_licenses(&self.profile.dependencies, &self.profile.folders.imports)
    }

    /// Every step in order: source, build, package, imports
    pub fn create(&mut self) -> Result<PackageInfo> {
        self.source()?;
        self.build()?;
        let published = self.package()?;
        self.imports()?;
        Ok(published)
    }

    fn windows_host(&self) -> bool {
        self.host == Os::Windows
    }

    /// Working copy of the lifecycle state
    fn state(&mut self) -> Result<RecipeState> {
        if self.state.is_none() {
            self.state = Some(RecipeState::load(&self.profile.folders.build)?);
        }
        Ok(self.state.clone().unwrap_or_default())
    }

    /// Keep a finished step's state, and persist it unless only recording
    fn commit(&mut self, state: RecipeState) -> Result<()> {
        if !self.runner.records_only() {
            state.save(&self.profile.folders.build)?;
        }
        self.state = Some(state);
        Ok(())
    }

    /// POSIX shell wrapping scripts on Windows hosts
    ///
    /// The configured `CONAN_BASH_PATH` wins; otherwise the msys2 build
    /// requirement provides it.
    fn shell(&self) -> Result<Option<PathBuf>> {
        if !self.windows_host() {
            return Ok(None);
        }
        if let Some(bash) = self.profile.bash_path() {
            return Ok(Some(bash));
        }
        let msys2 = self
            .profile
            .dependency(requirements::MSYS2)
            .ok_or_else(|| Error::MissingRequirements(vec![requirements::MSYS2.to_string()]))?;
        Ok(Some(msys2.root.join("usr").join("bin").join("bash.exe")))
    }

    fn toolchain(&mut self) -> Result<&Toolchain> {
        if self.toolchain.is_none() {
            let toolchain = Toolchain::resolve(&self.profile, || self.capture_vcvars())?;
            self.toolchain = Some(toolchain);
        }
        self.toolchain
            .as_ref()
            .ok_or_else(|| Error::NotFound("toolchain".to_string()))
    }

    fn capture_vcvars(&self) -> Result<BTreeMap<String, String>> {
        if !self.windows_host() {
            debug!("Not a Windows host, skipping vcvars capture");
            return Ok(BTreeMap::new());
        }
        let vcvarsall = self.profile.env.get(VCVARSALL_ENV).map(PathBuf::from);
        vcvars::capture(self.runner, self.profile.settings.arch, vcvarsall)
    }
}
