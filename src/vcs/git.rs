use std::path::Path;

use log::{debug, info};

use crate::{
    exec::{CommandRunner, ProcessRunner},
    resolver::FetchError,
};

use super::DvcsBackend;

pub struct GitBackend<R = ProcessRunner> {
    runner: R,
}

impl<R: CommandRunner> GitBackend<R> {
    pub fn new(runner: R) -> Self {
        GitBackend { runner }
    }

    fn remote_branches(&self, dir: &Path) -> Result<Vec<String>, FetchError> {
        let lines = self
            .runner
            .run_collect(&["git", "ls-remote", "--heads", "origin"], Some(dir))?;
        Ok(parse_heads(&lines))
    }
}

impl<R: CommandRunner> DvcsBackend for GitBackend<R> {
    fn vcs_name(&self) -> &'static str {
        "git"
    }

    /// Clones and then creates a local tracking branch for every remote
    /// head, so that any branch later requested in a fragment can be checked
    /// out from this clone without further network access.
    fn clone_repo(&self, from: &str, to: &Path) -> Result<(), FetchError> {
        info!("Cloning {} to {}", from, to.display());
        let to_path = to.to_string_lossy();
        self.runner
            .run_logged(&["git", "clone", from, &to_path], None)?;

        for branch in self.remote_branches(to)? {
            debug!("Tracking remote branch {}", branch);
            let args = tracking_args(&branch);
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            self.runner.run_logged(&args, Some(to))?;
        }
        Ok(())
    }

    fn checkout(&self, reference: &str, dir: &Path) -> Result<(), FetchError> {
        self.runner
            .run_logged(&["git", "checkout", "-q", reference], Some(dir))?;
        Ok(())
    }
}

fn tracking_args(branch: &str) -> Vec<String> {
    vec![
        "git".to_owned(),
        "branch".to_owned(),
        "--track".to_owned(),
        "--force".to_owned(),
        branch.to_owned(),
        format!("origin/{branch}"),
    ]
}

/// Branch names from `git ls-remote --heads` output lines
/// (`<hash>\trefs/heads/<name>`).
fn parse_heads(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| line.split_whitespace().nth(1))
        .filter_map(|reference| reference.strip_prefix("refs/heads/"))
        .map(str::to_owned)
        .collect()
}
