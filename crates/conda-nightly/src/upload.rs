//! Archive discovery and the `anaconda upload` invocation.
//!
//! `conda build` drops archives under `<build root>/<platform>/`. The shell
//! matched them with a glob; here the match is explicit: everything named
//! `<package>-<version>-*_0.tar.bz2`, where `<version>` is the date-derived
//! value. When nothing matches, the literal pattern is handed to the upload
//! client verbatim — exactly what an unexpanded shell glob would have done —
//! so the failure surfaces in the external tool, not as a preflight check
//! the script never had.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::NightlyConfig;
use crate::process::{CommandLine, ToolPaths};
use crate::types::Platform;

/// Suffix conda gives the first build of a recipe.
const ARCHIVE_SUFFIX: &str = "_0.tar.bz2";

/// The wildcard the script uploaded: `<package>-<version>-*_0.tar.bz2`.
pub fn archive_pattern(package: &str, version: &str) -> String {
    format!("{package}-{version}-*{ARCHIVE_SUFFIX}")
}

/// Where the selected profile's archives land: `<build root>/<platform>/`.
pub fn platform_dir(bld_path: &Path, platform: Platform) -> PathBuf {
    bld_path.join(platform.as_str())
}

/// Archives to upload, sorted for deterministic command lines. Falls back
/// to the literal pattern path when the directory is missing or nothing
/// matches.
pub fn archives_to_upload(dir: &Path, package: &str, version: &str) -> Vec<PathBuf> {
    let prefix = format!("{package}-{version}-");
    let mut matches: Vec<PathBuf> = Vec::new();

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(&prefix) && name.ends_with(ARCHIVE_SUFFIX) {
                matches.push(entry.path());
            }
        }
    }

    if matches.is_empty() {
        return vec![dir.join(archive_pattern(package, version))];
    }
    matches.sort();
    matches
}

/// `anaconda -t <token> upload -u <user> -l <label> --force <archives…>`.
/// `--force` overwrites any previously uploaded artifact of the same
/// identity, so re-running a nightly is idempotent from CI's view.
pub fn upload_command(
    tools: &ToolPaths,
    search_path: &str,
    config: &NightlyConfig,
    token: &str,
    archives: &[PathBuf],
) -> CommandLine {
    let mut cmd = CommandLine::new(&tools.anaconda)
        .arg("-t")
        .arg(token)
        .arg("upload")
        .arg("-u")
        .arg(&config.user)
        .arg("-l")
        .arg(&config.label)
        .arg("--force");
    for archive in archives {
        cmd = cmd.arg(archive.display().to_string());
    }
    cmd.env("PATH", search_path)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn pattern_interpolates_package_and_version() {
        assert_eq!(
            archive_pattern("cdutil", "2018.01.15"),
            "cdutil-2018.01.15-*_0.tar.bz2"
        );
    }

    #[test]
    fn platform_dir_is_the_conda_subdir() {
        let dir = platform_dir(Path::new("/home/ci/conda-bld"), Platform::Linux64);
        assert_eq!(dir, Path::new("/home/ci/conda-bld/linux-64"));
    }

    #[test]
    fn archives_match_version_and_suffix_only() {
        let td = tempdir().expect("tempdir");
        let mk = |name: &str| fs::write(td.path().join(name), b"").expect("touch");

        mk("cdutil-2018.01.15-py27_0.tar.bz2");
        mk("cdutil-2018.01.15-py36_0.tar.bz2");
        mk("cdutil-2.12-py27_0.tar.bz2"); // stale initial-version build
        mk("cdutil-2018.01.15-py27_1.tar.bz2"); // not the first build number
        mk("genutil-2018.01.15-py27_0.tar.bz2"); // different package

        let found = archives_to_upload(td.path(), "cdutil", "2018.01.15");
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().expect("name").to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            [
                "cdutil-2018.01.15-py27_0.tar.bz2",
                "cdutil-2018.01.15-py36_0.tar.bz2"
            ]
        );
    }

    #[test]
    fn empty_match_falls_back_to_the_literal_pattern() {
        let td = tempdir().expect("tempdir");
        let found = archives_to_upload(&td.path().join("linux-64"), "cdutil", "2018.01.15");
        assert_eq!(found.len(), 1);
        assert!(
            found[0]
                .to_string_lossy()
                .ends_with("linux-64/cdutil-2018.01.15-*_0.tar.bz2")
        );
    }

    #[test]
    fn upload_always_forces_under_the_nightly_label() {
        let config = NightlyConfig::default();
        let cmd = upload_command(
            &ToolPaths::default(),
            "/usr/bin",
            &config,
            "tok",
            &[PathBuf::from("/bld/linux-64/cdutil-2018.01.15-py27_0.tar.bz2")],
        );

        let args = cmd.arg_slice();
        assert_eq!(
            &args[..8],
            ["-t", "tok", "upload", "-u", "cdat", "-l", "nightly", "--force"]
        );
        assert_eq!(args[8], "/bld/linux-64/cdutil-2018.01.15-py27_0.tar.bz2");
    }

    #[test]
    fn upload_rendering_never_shows_the_token() {
        let config = NightlyConfig::default();
        let cmd = upload_command(&ToolPaths::default(), "/usr/bin", &config, "s3cr3t", &[]);
        let rendered = cmd.rendered();
        assert!(rendered.contains("-t [REDACTED]"));
        assert!(!rendered.contains("s3cr3t"));
    }
}
