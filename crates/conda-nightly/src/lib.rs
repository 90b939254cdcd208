//! # conda-nightly
//!
//! A typed port of the CI glue that publishes nightly conda builds of a
//! scientific-computing package to Anaconda.org.
//!
//! The original automation was a linear shell script: detect the host OS,
//! install conda's build tooling, clone a recipe repository, run
//! `conda build` once per supported Python version, and push the resulting
//! archives to a hosted channel under the `nightly` label. This crate keeps
//! that shape — one strictly sequential, fail-fast pipeline — while making
//! the implicit parts explicit:
//!
//! - Configuration is threaded through function parameters instead of
//!   process-wide environment mutation. Environment variables are set only
//!   at the subprocess boundary where the external tool requires them
//!   (`CONDA_BLD_PATH` and `VERSION` for `conda build`).
//! - Every step returns a `Result`; the first failure short-circuits the
//!   remaining steps. There are no retries and no cleanup of partial state,
//!   matching the script's semantics.
//! - Each external invocation is recorded (with credentials redacted) in a
//!   [`types::RunReceipt`] so CI logs show exactly what ran.
//!
//! ## Pipeline
//!
//! The core flow is **detect → prepare → fetch → build → upload**:
//!
//! 1. [`platform::select_profile`] maps the OS report to a build profile
//!    (platform id plus the OS-dependent ESMF channel).
//! 2. [`engine::run`] creates the build root, installs `anaconda-client`
//!    and `conda-build` into the base environment, disables upload-on-build,
//!    and recomputes the package version from the run date.
//! 3. [`git::clone_command`] checks out the recipe repository and the
//!    engine drops the known-conflicting recipe subdirectory.
//! 4. [`conda::build`] runs once per Python version with a fixed
//!    channel priority order.
//! 5. [`upload::upload_command`] pushes everything the build produced for
//!    this package and version, forcing over any prior nightly.
//!
//! All heavy lifting stays in the external tools; this crate never
//! reimplements package building or the upload protocol.

/// Upload-token resolution from the process environment.
pub mod auth;

/// `conda` CLI invocations: self-update, tooling install, config, build.
pub mod conda;

/// Defaults and `conda-nightly.toml` loading.
pub mod config;

/// The fail-fast pipeline, plan rendering, and the `Reporter` trait.
pub mod engine;

/// Recipe repository checkout.
pub mod git;

/// OS detection and build-profile selection.
pub mod platform;

/// External command construction, execution, and redacted rendering.
pub mod process;

/// Domain types: profiles, step receipts, run receipts.
pub mod types;

/// Archive discovery and the `anaconda upload` invocation.
pub mod upload;

/// The initial version constant and the date-derived version string.
pub mod version;

/// Executable fakes shared by the module test suites.
#[cfg(test)]
pub(crate) mod testutil;
