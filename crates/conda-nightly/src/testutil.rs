//! Helpers shared by the module test suites: executable fakes standing in
//! for the external tools.

use std::fs;
use std::path::{Path, PathBuf};

/// Write an executable shell script at `path`.
pub(crate) fn write_fake_tool(path: &Path, script: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, script).expect("write fake tool");
    let mut perms = fs::metadata(path).expect("meta").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod");
}

/// A fake tool that appends `<name> <argv>` to `log` and exits 0. `prelude`
/// is spliced in before the logging line for fakes that need extra
/// behavior (failing on a subcommand, creating a clone directory, ...).
pub(crate) fn recording_tool(dir: &Path, name: &str, log: &Path, prelude: &str) -> PathBuf {
    let path = dir.join(name);
    let script = format!(
        "#!/usr/bin/env sh\n{prelude}\necho \"{name} $*\" >> \"{log}\"\nexit 0\n",
        log = log.display(),
    );
    write_fake_tool(&path, &script);
    path
}

/// Lines recorded by [`recording_tool`] fakes, in invocation order.
pub(crate) fn recorded(log: &Path) -> Vec<String> {
    if !log.exists() {
        return Vec::new();
    }
    fs::read_to_string(log)
        .expect("read log")
        .lines()
        .map(|l| l.trim_end().to_string())
        .collect()
}
