//! The nightly pipeline: detect → prepare → fetch → build → upload.
//!
//! Steps run strictly in sequence and the first failure is terminal — no
//! retries, no rollback, no cleanup of partially created directories or
//! clones. That matches the shell script this replaces, where every line
//! implicitly gated the next.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};

use crate::config::NightlyConfig;
use crate::process::{CommandLine, ToolPaths};
use crate::types::{RECEIPT_VERSION, RunReceipt, StepKind, StepReceipt};
use crate::{auth, conda, git, platform, upload, version};

/// Operator-facing output sink. The CLI prints `[info]`-style lines to
/// stderr; tests collect them.
pub trait Reporter {
    fn info(&mut self, msg: &str);
    fn warn(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

/// Runtime inputs, threaded explicitly instead of read from process-global
/// state. The run date lives here so the date-derived version is fixed once
/// near the start of execution and used consistently through to the upload
/// path.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory the recipe repository is cloned into.
    pub workdir: PathBuf,
    /// Home directory; the miniconda toolchain and the build root live
    /// under it.
    pub home: PathBuf,
    /// Run date, `YYYY.MM.DD` of which becomes the nightly version.
    pub today: NaiveDate,
    pub tools: ToolPaths,
}

/// Where `conda build` drops archives: `<home>/conda-bld`.
pub fn build_root(home: &Path) -> PathBuf {
    home.join("conda-bld")
}

fn run_logged(
    cmd: &CommandLine,
    reporter: &mut dyn Reporter,
    commands: &mut Vec<String>,
) -> Result<()> {
    let rendered = cmd.rendered();
    reporter.info(&rendered);
    commands.push(rendered);
    cmd.run()
}

fn step_receipt(step: StepKind, commands: Vec<String>, start: Instant) -> StepReceipt {
    StepReceipt {
        step,
        commands,
        duration_ms: start.elapsed().as_millis(),
    }
}

/// Execute the full pipeline. Returns the receipt on success; on failure
/// the error carries the failing step's context and nothing after it has
/// run.
pub fn run(
    config: &NightlyConfig,
    opts: &RunOptions,
    reporter: &mut dyn Reporter,
) -> Result<RunReceipt> {
    let total = Instant::now();
    let started_at = Utc::now();
    let search_path = platform::search_path(&opts.home);
    let mut steps: Vec<StepReceipt> = Vec::new();

    // detect-os
    let start = Instant::now();
    let mut commands = Vec::new();
    let uname = platform::uname_command(&opts.tools, &search_path);
    commands.push(uname.rendered());
    let os_report = uname
        .run_capture()
        .context("failed to query the OS report")?;
    let profile = platform::select_profile(&os_report);
    reporter.info(platform::announcement(&profile));
    if profile.update_conda {
        run_logged(
            &conda::update_self(&opts.tools, &search_path),
            reporter,
            &mut commands,
        )
        .context("conda self-update failed")?;
    }
    steps.push(step_receipt(StepKind::DetectOs, commands, start));

    // prepare-build-root
    let start = Instant::now();
    let mut commands = Vec::new();
    let bld_path = build_root(&opts.home);
    fs::create_dir_all(&bld_path)
        .with_context(|| format!("failed to create build root at {}", bld_path.display()))?;
    run_logged(
        &conda::install_build_tools(&opts.tools, &search_path),
        reporter,
        &mut commands,
    )
    .context("failed to install the upload client and build tool")?;
    run_logged(
        &conda::disable_auto_upload(&opts.tools, &search_path),
        reporter,
        &mut commands,
    )
    .context("failed to disable upload-on-build")?;
    // From here on the date-derived version shadows the configured one.
    let version = version::date_version(opts.today);
    steps.push(step_receipt(StepKind::PrepareBuildRoot, commands, start));

    // fetch-recipes
    let start = Instant::now();
    let mut commands = Vec::new();
    run_logged(
        &git::clone_command(&opts.tools, &search_path, &config.recipes_url, &opts.workdir),
        reporter,
        &mut commands,
    )
    .context("failed to clone the recipe repository")?;
    let recipes_dir = opts.workdir.join(git::repo_dir_name(&config.recipes_url));
    let conflict = recipes_dir.join(&config.conflict_dir);
    if conflict.exists() {
        fs::remove_dir_all(&conflict).with_context(|| {
            format!(
                "failed to remove conflicting recipe dir {}",
                conflict.display()
            )
        })?;
    }
    steps.push(step_receipt(StepKind::FetchRecipes, commands, start));

    // build, once per Python version
    let start = Instant::now();
    let mut commands = Vec::new();
    for python in &config.pythons {
        run_logged(
            &conda::build(
                &opts.tools,
                &search_path,
                config,
                &profile,
                python,
                &version,
                &bld_path,
                &recipes_dir,
            ),
            reporter,
            &mut commands,
        )
        .with_context(|| format!("conda build failed for python {python}"))?;
    }
    steps.push(step_receipt(StepKind::Build, commands, start));

    // upload
    let start = Instant::now();
    let mut commands = Vec::new();
    let token = auth::resolve_token()?;
    let archive_dir = upload::platform_dir(&bld_path, profile.platform);
    let archives = upload::archives_to_upload(&archive_dir, &config.package, &version);
    run_logged(
        &upload::upload_command(&opts.tools, &search_path, config, &token, &archives),
        reporter,
        &mut commands,
    )
    .context("anaconda upload failed")?;
    steps.push(step_receipt(StepKind::Upload, commands, start));

    reporter.info(&format!(
        "nightly pipeline finished in {}",
        humantime::format_duration(Duration::from_secs(total.elapsed().as_secs()))
    ));

    Ok(RunReceipt {
        receipt_version: RECEIPT_VERSION.to_string(),
        package: config.package.clone(),
        platform: profile.platform,
        version,
        started_at,
        finished_at: Utc::now(),
        steps,
    })
}

/// Render the command lines `run` would execute, without side effects.
/// Only the OS report is queried (profile selection needs it); nothing is
/// installed, cloned, built, or uploaded, and the token is never read.
pub fn plan(config: &NightlyConfig, opts: &RunOptions) -> Result<Vec<String>> {
    let search_path = platform::search_path(&opts.home);
    let os_report = platform::os_report(&opts.tools, &search_path)
        .context("failed to query the OS report")?;
    let profile = platform::select_profile(&os_report);
    let version = version::date_version(opts.today);
    let bld_path = build_root(&opts.home);
    let recipes_dir = opts.workdir.join(git::repo_dir_name(&config.recipes_url));

    let mut lines = Vec::new();
    lines.push(format!(
        "# profile: {} ({})",
        profile.platform,
        platform::announcement(&profile)
    ));
    if profile.update_conda {
        lines.push(conda::update_self(&opts.tools, &search_path).rendered());
    }
    lines.push(format!("mkdir -p {}", bld_path.display()));
    lines.push(conda::install_build_tools(&opts.tools, &search_path).rendered());
    lines.push(conda::disable_auto_upload(&opts.tools, &search_path).rendered());
    lines.push(
        git::clone_command(&opts.tools, &search_path, &config.recipes_url, &opts.workdir)
            .rendered(),
    );
    lines.push(format!(
        "rm -rf {}",
        recipes_dir.join(&config.conflict_dir).display()
    ));
    for python in &config.pythons {
        lines.push(
            conda::build(
                &opts.tools,
                &search_path,
                config,
                &profile,
                python,
                &version,
                &bld_path,
                &recipes_dir,
            )
            .rendered(),
        );
    }
    let pattern = upload::platform_dir(&bld_path, profile.platform)
        .join(upload::archive_pattern(&config.package, &version));
    lines.push(
        upload::upload_command(&opts.tools, &search_path, config, "[REDACTED]", &[pattern])
            .rendered(),
    );
    Ok(lines)
}
