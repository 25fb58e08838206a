mod git;
mod hg;

pub use git::GitBackend;
pub use hg::MercurialBackend;

use std::{path::Path, sync::Arc};

use crate::resolver::{FetchAction, FetchError, ResolveRequest, SourceResolver};

/// The two operations a distributed VCS tool must provide. The shared
/// two-tier caching protocol is assembled once, in [`DvcsResolver`], against
/// this interface.
pub trait DvcsBackend: Send + Sync {
    /// Canonical scheme name (`git`, `hg`); used only to normalize URIs for
    /// cache-key derivation, never passed to the external tool.
    fn vcs_name(&self) -> &'static str;

    fn clone_repo(&self, from: &str, to: &Path) -> Result<(), FetchError>;

    fn checkout(&self, reference: &str, dir: &Path) -> Result<(), FetchError>;
}

/// Resolver template shared by all distributed-VCS backends.
///
/// Every repository gets a branch-independent bare mirror keyed by the
/// fragment-free normalized URI. A URI without a fragment resolves to that
/// mirror. A URI with a fragment additionally gets a branch-specific copy,
/// cloned *from the mirror's local path* and then checked out at the
/// requested reference — only the first fetch of a repository pays the
/// network cost, later branches clone locally.
pub struct DvcsResolver<B> {
    backend: Arc<B>,
}

impl<B> DvcsResolver<B> {
    pub fn new(backend: B) -> Self {
        DvcsResolver {
            backend: Arc::new(backend),
        }
    }
}

impl<B: DvcsBackend + 'static> SourceResolver for DvcsResolver<B> {
    fn resolve(&self, request: &ResolveRequest) -> Option<FetchAction> {
        let backend = Arc::clone(&self.backend);
        let staging = request.staging.clone();
        let normalized = request.uri.normalized(backend.vcs_name());
        let remote = request.uri.remote_url();
        let bare = staging.subdirectory_for(&normalized.without_fragment().to_string());

        let action = match normalized.fragment().map(str::to_owned) {
            None => FetchAction::new(bare.clone(), move || {
                staging.create_once(&bare, || backend.clone_repo(&remote, &bare))
            }),
            Some(reference) => {
                let target = staging.subdirectory_for(&normalized.to_string());
                FetchAction::new(target.clone(), move || {
                    // Tier 1: bare mirror, shared by every branch of this
                    // repository.
                    let mirror =
                        staging.create_once(&bare, || backend.clone_repo(&remote, &bare))?;
                    // Tier 2: branch copy derived from the local mirror.
                    staging.create_once(&target, || {
                        backend.clone_repo(&mirror.to_string_lossy(), &target)?;
                        backend.checkout(&reference, &target)
                    })
                })
            }
        };
        Some(action)
    }
}
