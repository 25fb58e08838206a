use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Stages build sources (local directories, remote archives, VCS
/// repositories) into a content-addressed staging area.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Location of the staging area, overriding SRCFETCH_STAGING_DIR and the
    /// default under the home directory
    #[clap(short, long)]
    pub staging_directory: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetches the given source URIs into the staging area
    Fetch {
        /// Source URIs (file://, http(s)://, git://, hg://, svn://, or a
        /// vcs+transport marker form), with an optional #fragment selecting
        /// a branch, tag or revision
        #[clap(required = true)]
        uris: Vec<String>,
    },
    /// Deletes every staged source
    ClearStaging,
}
