use std::path::Path;

use log::info;

use crate::exec::{CommandRunner, ProcessRunner};

use super::{FetchAction, FetchError, ResolveRequest, SourceResolver};

/// Subversion sources have no bare-mirror tier: the fragment is a pinned
/// revision, so each distinct (repository, revision) pair checks out into
/// its own single staging directory.
pub struct SvnResolver {
    runner: ProcessRunner,
}

impl SvnResolver {
    pub fn new(runner: ProcessRunner) -> Self {
        SvnResolver { runner }
    }
}

impl SourceResolver for SvnResolver {
    fn resolve(&self, request: &ResolveRequest) -> Option<FetchAction> {
        let normalized = request.uri.normalized("svn");
        let staging = request.staging.clone();
        // Fragment included in the key: a revision needs its own checkout.
        let target = staging.subdirectory_for(&normalized.to_string());
        let url = request.uri.remote_url();
        let revision = request.uri.fragment().map(str::to_owned);
        let runner = self.runner.clone();

        Some(FetchAction::new(target.clone(), move || {
            staging.create_once(&target, || {
                info!("Checking out {} to {}", url, target.display());
                let args = checkout_args(&url, &target, revision.as_deref());
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                runner.run_logged(&args, None).map_err(FetchError::from)
            })
        }))
    }
}

fn checkout_args(url: &str, destination: &Path, revision: Option<&str>) -> Vec<String> {
    let mut args = vec!["svn".to_owned(), "checkout".to_owned(), "-q".to_owned()];
    if let Some(revision) = revision {
        args.push("-r".to_owned());
        args.push(revision.to_owned());
    }
    args.push(url.to_owned());
    args.push(destination.to_string_lossy().into_owned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::staging::StagingArea;

    use pretty_assertions::assert_eq;

    #[test]
    fn pinned_revision_adds_the_revision_flag() {
        let args = checkout_args("https://host/repo", Path::new("/stage/abc"), Some("42"));
        assert_eq!(
            args,
            vec!["svn", "checkout", "-q", "-r", "42", "https://host/repo", "/stage/abc"]
        );
    }

    #[test]
    fn head_checkout_has_no_revision_flag() {
        let args = checkout_args("https://host/repo", Path::new("/stage/abc"), None);
        assert_eq!(
            args,
            vec!["svn", "checkout", "-q", "https://host/repo", "/stage/abc"]
        );
    }

    #[test]
    fn revision_is_part_of_the_cache_key() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingArea::new(dir.path().join("staging")).unwrap();
        let resolver = SvnResolver::new(ProcessRunner::new());

        let head = ResolveRequest {
            uri: "svn+https://host/repo".parse().unwrap(),
            staging: staging.clone(),
        };
        let pinned = ResolveRequest {
            uri: "svn+https://host/repo#42".parse().unwrap(),
            staging,
        };

        let head_target = resolver.resolve(&head).unwrap().target().to_path_buf();
        let pinned_target = resolver.resolve(&pinned).unwrap().target().to_path_buf();
        assert_ne!(head_target, pinned_target);
    }
}
