// src/build/autotools.rs

//! Autotools driver: configure plan and configure/make/install invocations
//!
//! The [`AutotoolsPlan`] is computed once from settings, options and the
//! package folder, and then only read. It carries the configure arguments
//! and the flag variables exported to configure and make.

use crate::build::paths::unix_path;
use crate::error::Result;
use crate::options::Options;
use crate::process::{CommandRunner, Invocation};
use crate::settings::{Arch, BuildType, Compiler, Settings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Immutable description of how the native build is configured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutotoolsPlan {
    /// Arguments passed to `./configure`
    pub configure_args: Vec<String>,
    /// `CFLAGS`, `CXXFLAGS`, `CPPFLAGS`, `LDFLAGS` and `LIBS`
    pub env: BTreeMap<String, String>,
    /// Parallel make jobs
    pub jobs: u32,
}

impl AutotoolsPlan {
    /// Derive the plan
    ///
    /// `windows_host` selects POSIX rendering of the install prefix, since
    /// configure then runs inside the MSYS shell.
    pub fn resolve(
        settings: &Settings,
        options: &Options,
        package_folder: &Path,
        jobs: u32,
        windows_host: bool,
    ) -> Self {
        let prefix = if windows_host {
            unix_path(package_folder)
        } else {
            package_folder.display().to_string()
        };

        let mut configure_args = vec![
            format!("--prefix={}", prefix),
            "--bindir=${prefix}/bin".to_string(),
            "--sbindir=${prefix}/bin".to_string(),
            "--libexecdir=${prefix}/bin".to_string(),
            "--libdir=${prefix}/lib".to_string(),
            "--includedir=${prefix}/include".to_string(),
            "--oldincludedir=${prefix}/include".to_string(),
            "--datarootdir=${prefix}/share".to_string(),
        ];
        configure_args.extend(linkage_args(options));
        if let Some(runtime) = settings.compiler.runtime() {
            configure_args.push(format!("--enable-msvc={}", runtime));
        }

        let flags = compiler_flags(settings, options).join(" ");
        let mut env = BTreeMap::new();
        env.insert("CFLAGS".to_string(), flags.clone());
        env.insert("CXXFLAGS".to_string(), flags);
        env.insert("CPPFLAGS".to_string(), defines(settings.build_type).join(" "));
        env.insert("LDFLAGS".to_string(), link_flags(settings).join(" "));
        env.insert("LIBS".to_string(), String::new());

        Self {
            configure_args,
            env,
            jobs,
        }
    }
}

/// `--enable-shared` / `--enable-static`, always complements of each other
pub fn linkage_args(options: &Options) -> [String; 2] {
    let yes_no = |v: bool| if v { "yes" } else { "no" };
    [
        format!("--enable-shared={}", yes_no(options.shared)),
        format!("--enable-static={}", yes_no(!options.shared)),
    ]
}

fn compiler_flags(settings: &Settings, options: &Options) -> Vec<String> {
    let mut flags = Vec::new();
    match &settings.compiler {
        Compiler::Msvc { runtime, .. } => {
            flags.push(runtime.flag());
            flags.extend(msvc_build_type_flags(settings.build_type).iter().map(|f| f.to_string()));
            flags.push("-FS".to_string());
        }
        Compiler::Gcc { .. } | Compiler::Clang { .. } | Compiler::AppleClang { .. } => {
            if let Some(flag) = arch_flag(settings.arch) {
                flags.push(flag.to_string());
            }
            if options.pic_enabled() {
                flags.push("-fPIC".to_string());
            }
            flags.extend(gnu_build_type_flags(settings.build_type).iter().map(|f| f.to_string()));
        }
    }
    flags
}

fn link_flags(settings: &Settings) -> Vec<String> {
    match &settings.compiler {
        Compiler::Msvc { .. } => Vec::new(),
        Compiler::Gcc { .. } | Compiler::Clang { .. } | Compiler::AppleClang { .. } => {
            arch_flag(settings.arch).map(|f| vec![f.to_string()]).unwrap_or_default()
        }
    }
}

fn defines(build_type: BuildType) -> Vec<String> {
    if build_type.is_debug() {
        Vec::new()
    } else {
        vec!["-DNDEBUG".to_string()]
    }
}

fn arch_flag(arch: Arch) -> Option<&'static str> {
    match arch {
        Arch::X86 => Some("-m32"),
        Arch::X86_64 => Some("-m64"),
        Arch::Armv7 | Arch::Armv8 => None,
    }
}

fn gnu_build_type_flags(build_type: BuildType) -> &'static [&'static str] {
    match build_type {
        BuildType::Debug => &["-g"],
        BuildType::Release => &["-O3"],
        BuildType::RelWithDebInfo => &["-O2", "-g"],
        BuildType::MinSizeRel => &["-Os"],
    }
}

fn msvc_build_type_flags(build_type: BuildType) -> &'static [&'static str] {
    match build_type {
        BuildType::Debug => &["-Zi", "-Ob0", "-Od"],
        BuildType::Release => &["-O2", "-Ob2"],
        BuildType::RelWithDebInfo => &["-Zi", "-O2", "-Ob1"],
        BuildType::MinSizeRel => &["-O1", "-Ob1"],
    }
}

/// Runs configure and make in a build folder
pub struct Autotools<'a> {
    runner: &'a dyn CommandRunner,
    build_folder: PathBuf,
    /// POSIX shell to run through, on Windows hosts
    bash: Option<PathBuf>,
}

impl<'a> Autotools<'a> {
    pub fn new(runner: &'a dyn CommandRunner, build_folder: &Path, bash: Option<PathBuf>) -> Self {
        Self {
            runner,
            build_folder: build_folder.to_path_buf(),
            bash,
        }
    }

    /// Run `./configure` with the plan's arguments
    pub fn configure(&self, plan: &AutotoolsPlan, env: &BTreeMap<String, String>) -> Result<()> {
        info!("Configuring in {}", self.build_folder.display());
        let invocation = Invocation::new("configure", "./configure")
            .args(plan.configure_args.iter().cloned());
        self.run(invocation, plan, env)
    }

    /// Run `make`, optionally for a target such as `install`
    pub fn make(
        &self,
        plan: &AutotoolsPlan,
        env: &BTreeMap<String, String>,
        target: Option<&str>,
    ) -> Result<()> {
        let step = target.unwrap_or("make");
        let mut invocation = Invocation::new(step, "make").arg(format!("-j{}", plan.jobs));
        if let Some(target) = target {
            invocation = invocation.arg(target);
        }
        self.run(invocation, plan, env)
    }

    /// Run `make install`
    pub fn install(&self, plan: &AutotoolsPlan, env: &BTreeMap<String, String>) -> Result<()> {
        self.make(plan, env, Some("install"))
    }

    fn run(
        &self,
        invocation: Invocation,
        plan: &AutotoolsPlan,
        env: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut invocation = invocation
            .current_dir(&self.build_folder)
            .envs(&plan.env)
            .envs(env);
        if let Some(bash) = &self.bash {
            invocation = invocation.through_shell(bash);
        }
        self.runner.run(&invocation)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::DryRunRunner;
    use crate::settings::{MsvcRuntime, Os};

    fn linux_gcc() -> Settings {
        Settings {
            os: Os::Linux,
            compiler: Compiler::Gcc {
                version: "11".to_string(),
            },
            build_type: BuildType::Release,
            arch: Arch::X86_64,
        }
    }

    fn windows_msvc(runtime: MsvcRuntime) -> Settings {
        Settings {
            os: Os::Windows,
            compiler: Compiler::Msvc {
                version: "16".to_string(),
                runtime,
            },
            build_type: BuildType::Release,
            arch: Arch::X86_64,
        }
    }

    #[test]
    fn test_shared_linkage() {
        let options = Options::default();
        assert_eq!(
            linkage_args(&options),
            ["--enable-shared=yes".to_string(), "--enable-static=no".to_string()]
        );
    }

    #[test]
    fn test_static_linkage() {
        let options = Options {
            shared: false,
            ..Options::default()
        };
        assert_eq!(
            linkage_args(&options),
            ["--enable-shared=no".to_string(), "--enable-static=yes".to_string()]
        );
    }

    #[test]
    fn test_gcc_plan_has_no_msvc_flag() {
        let plan = AutotoolsPlan::resolve(
            &linux_gcc(),
            &Options::default(),
            Path::new("/tmp/pkg"),
            4,
            false,
        );
        assert!(plan.configure_args.contains(&"--prefix=/tmp/pkg".to_string()));
        assert!(!plan.configure_args.iter().any(|a| a.starts_with("--enable-msvc")));
        assert_eq!(plan.env["CFLAGS"], "-m64 -fPIC -O3");
        assert_eq!(plan.env["CPPFLAGS"], "-DNDEBUG");
        assert_eq!(plan.env["LDFLAGS"], "-m64");
        assert_eq!(plan.env["LIBS"], "");
    }

    #[test]
    fn test_msvc_plan() {
        let options = Options::default().configure_for(Os::Windows);
        let plan = AutotoolsPlan::resolve(
            &windows_msvc(MsvcRuntime::MT),
            &options,
            Path::new(r"C:\work\pkg"),
            2,
            true,
        );
        assert_eq!(plan.configure_args[0], "--prefix=/c/work/pkg");
        assert_eq!(plan.configure_args.last().unwrap(), "--enable-msvc=MT");
        assert_eq!(plan.env["CFLAGS"], "-MT -O2 -Ob2 -FS");
        assert_eq!(plan.env["LDFLAGS"], "");
    }

    #[test]
    fn test_debug_has_no_ndebug() {
        let mut settings = linux_gcc();
        settings.build_type = BuildType::Debug;
        let plan = AutotoolsPlan::resolve(&settings, &Options::default(), Path::new("/p"), 1, false);
        assert_eq!(plan.env["CPPFLAGS"], "");
        assert!(plan.env["CFLAGS"].ends_with("-g"));
    }

    #[test]
    fn test_configure_and_make_invocations() {
        let runner = DryRunRunner::new();
        let plan =
            AutotoolsPlan::resolve(&linux_gcc(), &Options::default(), Path::new("/p"), 3, false);
        let tools = Autotools::new(&runner, Path::new("/b"), None);

        tools.configure(&plan, &BTreeMap::new()).unwrap();
        tools.make(&plan, &BTreeMap::new(), None).unwrap();
        tools.install(&plan, &BTreeMap::new()).unwrap();

        let seen = runner.recorded();
        assert_eq!(seen[0].program, "./configure");
        assert_eq!(seen[0].cwd, PathBuf::from("/b"));
        assert_eq!(seen[0].env["CFLAGS"], plan.env["CFLAGS"]);
        assert_eq!(seen[1].args, vec!["-j3".to_string()]);
        assert_eq!(seen[2].step, "install");
        assert_eq!(seen[2].args, vec!["-j3".to_string(), "install".to_string()]);
    }

    #[test]
    fn test_windows_host_goes_through_bash() {
        let runner = DryRunRunner::new();
        let plan =
            AutotoolsPlan::resolve(&linux_gcc(), &Options::default(), Path::new("/p"), 1, false);
        let tools = Autotools::new(&runner, Path::new("/b"), Some(PathBuf::from("/msys/bash")));

        tools.make(&plan, &BTreeMap::new(), None).unwrap();
        let seen = runner.recorded();
        assert_eq!(seen[0].program, "/msys/bash");
        assert_eq!(seen[0].args, vec!["-c".to_string(), "make -j1".to_string()]);
    }
}
