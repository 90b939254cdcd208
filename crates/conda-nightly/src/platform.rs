//! OS detection and build-profile selection.
//!
//! The pipeline asks the host for its OS report (`uname`) and maps it onto
//! one of two profiles. The mapping is deliberately binary: `Linux` gets
//! the Linux profile, anything else gets the Mac profile, exactly as the
//! original two-branch check behaved.

use std::path::Path;

use anyhow::Result;

use crate::process::{CommandLine, ToolPaths};
use crate::types::{OsProfile, Platform};

/// The `uname` invocation producing the OS report.
pub fn uname_command(tools: &ToolPaths, search_path: &str) -> CommandLine {
    CommandLine::new(&tools.uname).env("PATH", search_path)
}

/// Run `uname` and return the trimmed report (e.g. `Linux`, `Darwin`).
pub fn os_report(tools: &ToolPaths, search_path: &str) -> Result<String> {
    uname_command(tools, search_path).run_capture()
}

/// Map an OS report onto a build profile.
///
/// `Linux` selects the `linux-64` platform, the ESMF dev-build channel, and
/// a conda self-update before anything else runs. Every other report is
/// treated as a Mac: `osx-64`, the plain ESMF channel, no self-update.
pub fn select_profile(report: &str) -> OsProfile {
    if report == "Linux" {
        OsProfile {
            platform: Platform::Linux64,
            esmf_channel: "nesii/label/dev-esmf".to_string(),
            update_conda: true,
        }
    } else {
        OsProfile {
            platform: Platform::Osx64,
            esmf_channel: "nesii".to_string(),
            update_conda: false,
        }
    }
}

/// Operator-facing announcement for the selected profile. These are the
/// only informational lines the original script printed.
pub fn announcement(profile: &OsProfile) -> &'static str {
    match profile.platform {
        Platform::Linux64 => "Linux OS",
        Platform::Osx64 => "Mac OS",
    }
}

/// The directory prepended to the search path so the miniconda toolchain
/// shadows any system conda: `<home>/miniconda/bin`.
pub fn miniconda_bin(home: &Path) -> std::path::PathBuf {
    home.join("miniconda").join("bin")
}

/// `PATH` value passed to every spawned command: the miniconda bin
/// directory ahead of the inherited search path.
pub fn search_path(home: &Path) -> String {
    let bin = miniconda_bin(home);
    match std::env::var("PATH") {
        Ok(current) if !current.is_empty() => format!("{}:{current}", bin.display()),
        _ => bin.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::testutil::write_fake_tool;

    #[test]
    fn linux_report_selects_the_linux_profile() {
        let profile = select_profile("Linux");
        assert_eq!(profile.platform, Platform::Linux64);
        assert_eq!(profile.esmf_channel, "nesii/label/dev-esmf");
        assert!(profile.update_conda);
        assert_eq!(announcement(&profile), "Linux OS");
    }

    #[test]
    fn any_other_report_selects_the_mac_profile() {
        for report in ["Darwin", "FreeBSD", "SunOS", ""] {
            let profile = select_profile(report);
            assert_eq!(profile.platform, Platform::Osx64, "report {report:?}");
            assert_eq!(profile.esmf_channel, "nesii");
            assert!(!profile.update_conda);
            assert_eq!(announcement(&profile), "Mac OS");
        }
    }

    #[test]
    fn os_report_comes_from_uname_stdout() {
        let td = tempdir().expect("tempdir");
        let uname = td.path().join("uname");
        write_fake_tool(&uname, "#!/usr/bin/env sh\necho Linux\n");

        let tools = ToolPaths {
            uname,
            ..ToolPaths::default()
        };
        let report = os_report(&tools, "/usr/bin").expect("report");
        assert_eq!(report, "Linux");
    }

    #[test]
    fn search_path_puts_miniconda_first() {
        let home = Path::new("/home/ci");
        let path = search_path(home);
        assert!(path.starts_with("/home/ci/miniconda/bin"));
    }
}
