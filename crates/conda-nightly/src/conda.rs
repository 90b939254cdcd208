//! `conda` CLI invocations.
//!
//! Each function builds the exact argv the script ran; the engine decides
//! when to execute them. `CONDA_BLD_PATH` and `VERSION` are attached to the
//! build invocation only — the one boundary where conda genuinely reads the
//! environment — instead of being exported process-wide.

use std::path::Path;

use crate::config::NightlyConfig;
use crate::process::{CommandLine, ToolPaths};
use crate::types::OsProfile;

/// `conda update -y -q conda`. Runs on the Linux branch only.
pub fn update_self(tools: &ToolPaths, search_path: &str) -> CommandLine {
    CommandLine::new(&tools.conda)
        .args(["update", "-y", "-q", "conda"])
        .env("PATH", search_path)
}

/// Install the upload client and build tool into the base environment.
/// The script's `source activate base` becomes explicit `-n base`
/// targeting here; there is no shell to mutate.
pub fn install_build_tools(tools: &ToolPaths, search_path: &str) -> CommandLine {
    CommandLine::new(&tools.conda)
        .args([
            "install",
            "-n",
            "base",
            "-q",
            "-y",
            "anaconda-client",
            "conda-build",
        ])
        .env("PATH", search_path)
}

/// Disable upload-on-build; the upload happens as an explicit later step.
pub fn disable_auto_upload(tools: &ToolPaths, search_path: &str) -> CommandLine {
    CommandLine::new(&tools.conda)
        .args(["config", "--set", "anaconda_upload", "no"])
        .env("PATH", search_path)
}

/// One `conda build` invocation for `python`, run inside the recipe
/// checkout. Channels are passed in the fixed priority order from
/// [`NightlyConfig::channels`].
#[allow(clippy::too_many_arguments)]
pub fn build(
    tools: &ToolPaths,
    search_path: &str,
    config: &NightlyConfig,
    profile: &OsProfile,
    python: &str,
    version: &str,
    bld_path: &Path,
    recipes_dir: &Path,
) -> CommandLine {
    let mut cmd = CommandLine::new(&tools.conda).arg("build");
    for channel in config.channels(profile) {
        cmd = cmd.arg("-c").arg(channel);
    }
    cmd.arg(format!("--python={python}"))
        .arg(&config.package)
        .current_dir(recipes_dir)
        .env("PATH", search_path)
        .env("CONDA_BLD_PATH", bld_path.display().to_string())
        .env("VERSION", version)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::platform::select_profile;

    fn tools() -> ToolPaths {
        ToolPaths::default()
    }

    #[test]
    fn update_self_argv() {
        let cmd = update_self(&tools(), "/usr/bin");
        assert_eq!(cmd.arg_slice(), ["update", "-y", "-q", "conda"]);
    }

    #[test]
    fn install_targets_the_base_environment() {
        let cmd = install_build_tools(&tools(), "/usr/bin");
        assert_eq!(
            cmd.arg_slice(),
            [
                "install",
                "-n",
                "base",
                "-q",
                "-y",
                "anaconda-client",
                "conda-build"
            ]
        );
    }

    #[test]
    fn auto_upload_is_switched_off() {
        let cmd = disable_auto_upload(&tools(), "/usr/bin");
        assert_eq!(cmd.arg_slice(), ["config", "--set", "anaconda_upload", "no"]);
    }

    #[test]
    fn build_lists_four_channels_then_python_then_package() {
        let config = NightlyConfig::default();
        let profile = select_profile("Linux");
        let cmd = build(
            &tools(),
            "/usr/bin",
            &config,
            &profile,
            "2.7",
            "2018.01.15",
            &PathBuf::from("/home/ci/conda-bld"),
            &PathBuf::from("/work/conda-recipes"),
        );

        assert_eq!(
            cmd.arg_slice(),
            [
                "build",
                "-c",
                "cdat/label/nightly",
                "-c",
                "conda-forge",
                "-c",
                "nesii/label/dev-esmf",
                "-c",
                "cdat",
                "--python=2.7",
                "cdutil"
            ]
        );
    }

    #[test]
    fn build_env_carries_bld_path_and_version() {
        let config = NightlyConfig::default();
        let profile = select_profile("Darwin");
        let cmd = build(
            &tools(),
            "/usr/bin",
            &config,
            &profile,
            "3.6",
            "2018.01.15",
            &PathBuf::from("/home/ci/conda-bld"),
            &PathBuf::from("/work/conda-recipes"),
        );

        let rendered = cmd.rendered();
        assert!(rendered.contains("CONDA_BLD_PATH=/home/ci/conda-bld"));
        assert!(rendered.contains("VERSION=2018.01.15"));
        assert!(rendered.contains("--python=3.6"));
        assert!(rendered.contains("-c nesii -c cdat"));
    }
}
