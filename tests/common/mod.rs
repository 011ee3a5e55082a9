// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use coinmetis_recipe::process::{CommandOutput, CommandRunner, Invocation};
use coinmetis_recipe::profile::{Dependency, Folders, Profile};
use coinmetis_recipe::settings::{Arch, BuildType, Compiler, MsvcRuntime, Os, Settings};
use coinmetis_recipe::{Error, Options, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

/// Command runner that simulates git, the fetch script and autotools
/// by creating the files they would produce.
pub struct FakeRunner {
    folders: Folders,
    fail_step: Option<String>,
    seen: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new(folders: &Folders) -> Self {
        Self {
            folders: folders.clone(),
            fail_step: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Make every invocation of `step` exit with status 2
    pub fn failing(folders: &Folders, step: &str) -> Self {
        Self {
            fail_step: Some(step.to_string()),
            ..Self::new(folders)
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.seen.lock().unwrap().clone()
    }

    pub fn steps(&self) -> Vec<String> {
        self.invocations().into_iter().map(|i| i.step).collect()
    }

    pub fn count(&self, step: &str) -> usize {
        self.steps().iter().filter(|s| *s == step).count()
    }

    pub fn find(&self, step: &str) -> Option<Invocation> {
        self.invocations().into_iter().find(|i| i.step == step)
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.seen.lock().unwrap().push(invocation.clone());

        if self.fail_step.as_deref() == Some(invocation.step.as_str()) {
            return Err(Error::CommandFailed {
                step: invocation.step.clone(),
                code: Some(2),
                stderr: "simulated failure".to_string(),
            });
        }

        match invocation.step.as_str() {
            "clone" => {
                let source = &self.folders.source;
                write(&source.join("configure"), "#!/bin/sh\n");
                write(&source.join("get.Metis"), "#!/bin/sh\n");
                write(&source.join("INSTALL.Metis"), "METIS is copyrighted by the regents of the University of Minnesota.\n");
                write(&source.join(".git/HEAD"), "ref: refs/heads/stable/2.0\n");
            }
            "get-sources" => {
                write(&self.folders.source.join("metis-4.0.3/Lib/metis.h"), "/* metis */\n");
            }
            "install" => {
                let package = &self.folders.package;
                write(&package.join("lib/pkgconfig/coinmetis.pc"), "Name: coinmetis\n");
                write(&package.join("lib/libcoinmetis.la"), "# libtool archive\n");
                write(&package.join("lib/libcoinmetis.so"), "");
                write(&package.join("include/coin-or/metis/metis.h"), "/* metis */\n");
            }
            "vcvars" => {
                return Ok(CommandOutput {
                    stdout: "PATH=C:\\VS\\bin\r\nINCLUDE=C:\\VS\\include\r\nLIB=C:\\VS\\lib\r\n"
                        .to_string(),
                    stderr: String::new(),
                });
            }
            _ => {}
        }

        Ok(CommandOutput::default())
    }
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Linux/gcc profile with every folder below `root`
pub fn linux_profile(root: &Path) -> Profile {
    let settings = Settings {
        os: Os::Linux,
        compiler: Compiler::Gcc {
            version: "11".to_string(),
        },
        build_type: BuildType::Release,
        arch: Arch::X86_64,
    };
    Profile {
        options: Options::default().configure_for(settings.os),
        settings,
        env: BTreeMap::new(),
        folders: Folders::under(root),
        dependencies: BTreeMap::new(),
        jobs: 4,
    }
}

/// Windows/MSVC profile providing automake, a shell and a vcvarsall path
pub fn msvc_profile(root: &Path) -> Profile {
    let settings = Settings {
        os: Os::Windows,
        compiler: Compiler::Msvc {
            version: "16".to_string(),
            runtime: MsvcRuntime::MD,
        },
        build_type: BuildType::Release,
        arch: Arch::X86_64,
    };

    let mut user_info = BTreeMap::new();
    user_info.insert(
        "compile".to_string(),
        r"C:\deps\automake\share\automake-1.16\compile".to_string(),
    );
    user_info.insert(
        "ar_lib".to_string(),
        r"C:\deps\automake\share\automake-1.16\ar-lib".to_string(),
    );
    let mut dependencies = BTreeMap::new();
    dependencies.insert(
        "automake".to_string(),
        Dependency {
            version: Some("1.16.3".to_string()),
            root: root.join("deps/automake"),
            user_info,
        },
    );

    let mut env = BTreeMap::new();
    env.insert(
        "CONAN_BASH_PATH".to_string(),
        "C:/msys64/usr/bin/bash.exe".to_string(),
    );
    env.insert(
        "VCVARSALL".to_string(),
        r"C:\VS\VC\Auxiliary\Build\vcvarsall.bat".to_string(),
    );

    Profile {
        options: Options::default().configure_for(settings.os),
        settings,
        env,
        folders: Folders::under(root),
        dependencies,
        jobs: 2,
    }
}
