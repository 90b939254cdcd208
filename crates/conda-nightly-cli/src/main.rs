use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};

use conda_nightly::auth;
use conda_nightly::config::{self, NightlyConfig};
use conda_nightly::engine::{self, Reporter, RunOptions};
use conda_nightly::platform;
use conda_nightly::process::ToolPaths;
use conda_nightly::types::RunReceipt;

#[derive(Parser, Debug)]
#[command(name = "conda-nightly", version)]
#[command(about = "Build a conda package per supported Python and upload the nightly archives")]
struct Cli {
    /// Directory the recipe repository is cloned into.
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Package to build and upload (overrides the config file).
    #[arg(long)]
    package: Option<String>,

    /// Anaconda.org account the archives are uploaded to.
    #[arg(long)]
    user: Option<String>,

    /// Label attached to the uploaded builds.
    #[arg(long)]
    label: Option<String>,

    /// Recipe repository URL.
    #[arg(long)]
    recipes_url: Option<String>,

    /// Write the run receipt as JSON to this path.
    #[arg(long)]
    receipt: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute the pipeline: detect, prepare, fetch recipes, build, upload.
    Run,
    /// Print the commands a run would execute, without side effects.
    Plan,
    /// Print tool and credential diagnostics.
    Doctor,
}

struct CliReporter;

impl Reporter for CliReporter {
    fn info(&mut self, msg: &str) {
        eprintln!("[info] {msg}");
    }

    fn warn(&mut self, msg: &str) {
        eprintln!("[warn] {msg}");
    }

    fn error(&mut self, msg: &str) {
        eprintln!("[error] {msg}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config(&cli.workdir)?;
    apply_overrides(&mut config, &cli);

    let home = dirs::home_dir().context("could not determine the home directory")?;
    let opts = RunOptions {
        workdir: cli.workdir.clone(),
        home,
        today: Local::now().date_naive(),
        tools: ToolPaths::from_env(),
    };

    let mut reporter = CliReporter;

    match cli.cmd {
        Commands::Run => {
            let receipt = engine::run(&config, &opts, &mut reporter)?;
            print_receipt(&receipt);
            if let Some(path) = &cli.receipt {
                write_receipt(&receipt, path)?;
            }
        }
        Commands::Plan => {
            for line in engine::plan(&config, &opts)? {
                println!("{line}");
            }
        }
        Commands::Doctor => {
            run_doctor(&config, &opts, &mut reporter);
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut NightlyConfig, cli: &Cli) {
    if let Some(package) = &cli.package {
        config.package = package.clone();
    }
    if let Some(user) = &cli.user {
        config.user = user.clone();
    }
    if let Some(label) = &cli.label {
        config.label = label.clone();
    }
    if let Some(url) = &cli.recipes_url {
        config.recipes_url = url.clone();
    }
}

fn print_receipt(receipt: &RunReceipt) {
    println!("package:  {}@{}", receipt.package, receipt.version);
    println!("platform: {}", receipt.platform);
    println!();

    for step in &receipt.steps {
        println!(
            "{}: {} command(s), {}ms",
            step.step,
            step.commands.len(),
            step.duration_ms
        );
    }
}

fn write_receipt(receipt: &RunReceipt, path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(receipt).context("failed to serialize the run receipt")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write receipt to {}", path.display()))?;
    Ok(())
}

fn run_doctor(config: &NightlyConfig, opts: &RunOptions, reporter: &mut dyn Reporter) {
    println!("workdir: {}", opts.workdir.display());
    println!(
        "package: {} (user {}, label {})",
        config.package, config.user, config.label
    );
    println!("build_root: {}", engine::build_root(&opts.home).display());
    println!("token_detected: {}", auth::token_detected());
    println!();

    // Diagnose against the same search path the pipeline hands to every
    // command, so a miniconda install shadows the system tools here too.
    let search_path = platform::search_path(&opts.home);
    print_tool(&opts.tools.conda, &search_path, reporter);
    print_tool(&opts.tools.git, &search_path, reporter);
    print_tool(&opts.tools.anaconda, &search_path, reporter);
}

fn print_tool(program: &Path, search_path: &str, reporter: &mut dyn Reporter) {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let resolved = match which::which_in(program, Some(search_path), cwd) {
        Ok(path) => path,
        Err(_) => {
            reporter.warn(&format!("{} not found on the search path", program.display()));
            return;
        }
    };

    let out = Command::new(&resolved).arg("--version").output();
    match out {
        Ok(o) if o.status.success() => {
            let version = String::from_utf8_lossy(&o.stdout).trim().to_string();
            println!("{}: {} ({})", program.display(), version, resolved.display());
        }
        Ok(o) => {
            reporter.warn(&format!(
                "{} --version failed: {}",
                program.display(),
                String::from_utf8_lossy(&o.stderr).trim()
            ));
        }
        Err(e) => {
            reporter.warn(&format!(
                "unable to run {} --version: {e}",
                program.display()
            ));
        }
    }
}
