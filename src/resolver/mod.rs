mod local;
mod remote;
mod svn;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    exec::{ExecError, ProcessRunner},
    model::SourceUri,
    staging::StagingArea,
    vcs::{DvcsResolver, GitBackend, MercurialBackend},
};

pub use local::LocalResolver;
pub use remote::RemoteResolver;
pub use svn::SvnResolver;

/// A resolution request: the declared source URI and the staging area the
/// materialized directory should land in. Read-only to resolvers.
#[derive(Clone)]
pub struct ResolveRequest {
    pub uri: SourceUri,
    pub staging: StagingArea,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Process error: {0}")]
    Exec(#[from] ExecError),
    #[error("Download error: {0}")]
    Download(#[from] Box<ureq::Error>),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

/// A deferred fetch. Constructing one performs no I/O; all copying,
/// downloading and process spawning happens when it is run, inside the
/// staging area's fetch-or-reuse guard.
pub struct FetchAction {
    target: PathBuf,
    fetch: Box<dyn FnOnce() -> Result<PathBuf, FetchError> + Send>,
}

impl FetchAction {
    pub(crate) fn new<F>(target: PathBuf, fetch: F) -> Self
    where
        F: FnOnce() -> Result<PathBuf, FetchError> + Send + 'static,
    {
        FetchAction {
            target,
            fetch: Box::new(fetch),
        }
    }

    /// The directory this action will populate (or reuse) when run.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Perform the fetch, returning the populated staging directory.
    pub fn run(self) -> Result<PathBuf, FetchError> {
        (self.fetch)()
    }
}

/// Decides whether a resolver can service a request. `None` means "no
/// opinion" (for example, a local path that is not a directory), not a
/// failure; fetch failures only surface when the returned action runs.
pub trait SourceResolver: Send + Sync {
    fn resolve(&self, request: &ResolveRequest) -> Option<FetchAction>;
}

/// The scheme dispatch table: an immutable mapping from a URI's dispatch
/// scheme to the single resolver registered for it.
pub struct ResolverRegistry {
    table: HashMap<&'static str, Box<dyn SourceResolver>>,
}

impl ResolverRegistry {
    /// The standard table: `file`, `http`/`https`, `svn`, `hg` and `git`
    /// (the VCS schemes also match their `vcs+transport` marker forms).
    pub fn standard(runner: ProcessRunner) -> Self {
        let mut table: HashMap<&'static str, Box<dyn SourceResolver>> = HashMap::new();
        table.insert("file", Box::new(LocalResolver));
        table.insert("http", Box::new(RemoteResolver));
        table.insert("https", Box::new(RemoteResolver));
        table.insert("svn", Box::new(SvnResolver::new(runner.clone())));
        table.insert(
            "git",
            Box::new(DvcsResolver::new(GitBackend::new(runner.clone()))),
        );
        table.insert(
            "hg",
            Box::new(DvcsResolver::new(MercurialBackend::new(runner))),
        );
        ResolverRegistry { table }
    }

    pub fn lookup(&self, scheme: &str) -> Option<&dyn SourceResolver> {
        self.table.get(scheme).map(|resolver| &**resolver)
    }

    /// Select the resolver for the request's dispatch scheme and ask it for
    /// a fetch action. `None` either means the scheme is unknown or the
    /// resolver declined; callers wanting to distinguish use [`lookup`]
    /// directly.
    ///
    /// [`lookup`]: ResolverRegistry::lookup
    pub fn resolve(&self, request: &ResolveRequest) -> Option<FetchAction> {
        self.lookup(request.uri.dispatch_scheme())?.resolve(request)
    }
}
