use std::path::PathBuf;

use anyhow::Context;
use home::home_dir;

use crate::{
    exec::ProcessRunner, resolver::ResolverRegistry, staging::StagingArea, Srcfetch,
};

#[derive(Default)]
pub struct SrcfetchBuilder {
    staging_directory: Option<PathBuf>,
}

impl SrcfetchBuilder {
    /// Location of the staging area.
    ///
    /// Defaults to `$HOME/.srcfetch/staging`.
    pub fn staging_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.staging_directory = Some(path.into());
        self
    }

    pub fn try_build(self) -> anyhow::Result<Srcfetch> {
        let staging_directory = match self.staging_directory {
            Some(staging_directory) => staging_directory,
            None => default_staging_directory()?,
        };

        let staging = StagingArea::new(staging_directory)?;
        let resolvers = ResolverRegistry::standard(ProcessRunner::new());

        Ok(Srcfetch { staging, resolvers })
    }
}

fn default_staging_directory() -> anyhow::Result<PathBuf> {
    let mut staging_directory =
        home_dir().context("Could not find home dir. Please define $HOME env variable.")?;
    staging_directory.push(".srcfetch/staging");
    Ok(staging_directory)
}
