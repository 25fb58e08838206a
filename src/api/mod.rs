use std::path::{Path, PathBuf};

use anyhow::bail;

use crate::{
    model::SourceUri,
    resolver::{ResolveRequest, ResolverRegistry},
    staging::StagingArea,
};

mod builder;

pub use builder::SrcfetchBuilder;

pub struct Srcfetch {
    staging: StagingArea,
    resolvers: ResolverRegistry,
}

impl Srcfetch {
    pub fn builder() -> SrcfetchBuilder {
        SrcfetchBuilder::default()
    }

    /// Resolves a source URI into a populated directory under the staging
    /// root, reusing the directory staged by an earlier resolution of the
    /// same reference.
    pub fn fetch(&self, uri: &str) -> anyhow::Result<PathBuf> {
        let uri: SourceUri = uri.parse()?;

        let resolver = match self.resolvers.lookup(uri.dispatch_scheme()) {
            Some(resolver) => resolver,
            None => bail!("Unsupported scheme `{}` in {}", uri.dispatch_scheme(), uri),
        };

        let request = ResolveRequest {
            uri: uri.clone(),
            staging: self.staging.clone(),
        };
        match resolver.resolve(&request) {
            Some(action) => Ok(action.run()?),
            None => bail!("{uri} does not name a fetchable source"),
        }
    }

    pub fn staging_root(&self) -> &Path {
        self.staging.root()
    }

    /// Delete every staged source.
    pub fn clear_staging(&self) -> anyhow::Result<()> {
        self.staging.clear()
    }
}
