use std::path::Path;

use crate::process::{CommandLine, ToolPaths};

/// `git clone <url>` into `workdir`, the way the script cloned into its
/// current directory.
pub fn clone_command(
    tools: &ToolPaths,
    search_path: &str,
    url: &str,
    workdir: &Path,
) -> CommandLine {
    CommandLine::new(&tools.git)
        .arg("clone")
        .arg(url)
        .current_dir(workdir)
        .env("PATH", search_path)
}

/// Directory a `git clone <url>` produces: the last path segment of the
/// URL, minus a `.git` suffix.
pub fn repo_dir_name(url: &str) -> String {
    let tail = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(url);
    tail.strip_suffix(".git").unwrap_or(tail).to_string()
}
