// src/main.rs

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use coinmetis_recipe::process::{CommandRunner, DryRunRunner, SystemRunner};
use coinmetis_recipe::profile::{Profile, ProfileFile, parse_pair};
use coinmetis_recipe::recipe::requirements::check_host_tools;
use coinmetis_recipe::recipe::{DESCRIPTOR, PackageInfo, Recipe};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "coinmetis-recipe")]
#[command(author, version, about = "Build and package COIN-OR METIS with autotools", long_about = None)]
struct Cli {
    /// Profile file (default: <config dir>/coinmetis-recipe/profile.toml if present)
    #[arg(short, long, global = true)]
    profile: Option<PathBuf>,

    /// Setting override, e.g. -s build_type=Debug
    #[arg(short = 's', long = "setting", value_parser = parse_pair, global = true)]
    settings: Vec<(String, String)>,

    /// Option override, e.g. -o shared=False
    #[arg(short = 'o', long = "option", value_parser = parse_pair, global = true)]
    options: Vec<(String, String)>,

    /// Print external commands instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the package descriptor, resolved options and consumer metadata
    Info,
    /// Print the build requirements for the resolved settings
    Requirements,
    /// Check that git, sh and make are on PATH
    Check,
    /// Fetch the upstream snapshot
    Source,
    /// Configure (once) and make
    Build,
    /// Install and normalize the package folder
    Package,
    /// Copy dependency license files
    Imports,
    /// Source, build, package and imports in one go
    Create,
}

fn load_profile(cli: &Cli) -> Result<Profile> {
    let file = match &cli.profile {
        Some(path) => ProfileFile::load(path)
            .with_context(|| format!("Failed to load profile {}", path.display()))?,
        None => match ProfileFile::default_path().filter(|p| p.is_file()) {
            Some(path) => ProfileFile::load(&path)
                .with_context(|| format!("Failed to load profile {}", path.display()))?,
            None => ProfileFile::default(),
        },
    };
    Ok(Profile::resolve(file, &cli.settings, &cli.options)?)
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let profile = load_profile(&cli)?;

    let system = SystemRunner;
    let dry_run = DryRunRunner::new();
    let runner: &dyn CommandRunner = if cli.dry_run { &dry_run } else { &system };
    let mut recipe = Recipe::new(profile, runner);

    match cli.command {
        Commands::Info => {
            let profile = recipe.profile();
            let report = json!({
                "descriptor": DESCRIPTOR,
                "settings": profile.settings,
                "options": profile.options,
                "configure": recipe.plan(),
                "package_info": PackageInfo::default(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Requirements => {
            let requirements = recipe.requirements();
            if requirements.is_empty() {
                println!("No build requirements");
            }
            for requirement in requirements {
                println!("{}", requirement);
            }
        }
        Commands::Check => {
            let checks = check_host_tools();
            for check in &checks {
                match &check.path {
                    Some(path) => println!("  [ok] {:<5} {}", check.tool, path.display()),
                    None => println!("  [missing] {:<5} {}", check.tool, check.purpose),
                }
            }
            let missing: Vec<_> = checks.iter().filter(|c| !c.found()).map(|c| c.tool).collect();
            if !missing.is_empty() {
                bail!("Missing host tools: {}", missing.join(", "));
            }
        }
        Commands::Source => recipe.source().context("source step failed")?,
        Commands::Build => recipe.build().context("build step failed")?,
        Commands::Package => {
            let info = recipe.package().context("package step failed")?;
            info!("Published libs: {}", info.libs.join(", "));
        }
        Commands::Imports => {
            let imported = recipe.imports().context("imports step failed")?;
            println!("Imported {} license files", imported.len());
        }
        Commands::Create => {
            recipe.create().context("create failed")?;
            println!(
                "{}/{} packaged in {}",
                DESCRIPTOR.name,
                DESCRIPTOR.version,
                recipe.profile().folders.package.display()
            );
        }
    }

    if cli.dry_run {
        for invocation in dry_run.recorded() {
            println!("{}", invocation);
        }
    }

    Ok(())
}
