use std::path::Path;

use log::info;

use crate::{
    exec::{CommandRunner, ProcessRunner},
    resolver::FetchError,
};

use super::DvcsBackend;

/// Mercurial needs no branch pre-tracking: a plain clone can check out any
/// named branch directly.
pub struct MercurialBackend<R = ProcessRunner> {
    runner: R,
}

impl<R: CommandRunner> MercurialBackend<R> {
    pub fn new(runner: R) -> Self {
        MercurialBackend { runner }
    }
}

impl<R: CommandRunner> DvcsBackend for MercurialBackend<R> {
    fn vcs_name(&self) -> &'static str {
        "hg"
    }

    fn clone_repo(&self, from: &str, to: &Path) -> Result<(), FetchError> {
        info!("Cloning {} to {}", from, to.display());
        let to_path = to.to_string_lossy();
        self.runner.run_logged(&["hg", "clone", from, &to_path], None)?;
        Ok(())
    }

    fn checkout(&self, reference: &str, dir: &Path) -> Result<(), FetchError> {
        self.runner
            .run_logged(&["hg", "checkout", "-q", reference], Some(dir))?;
        Ok(())
    }
}
