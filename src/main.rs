use clap::Parser;
use log::error;

use srcfetch::{
    cli::{
        args::{CliArgs, Command},
        command_handlers,
    },
    config::SrcfetchConfig,
    Srcfetch,
};

fn run() -> anyhow::Result<()> {
    let cli_args = CliArgs::parse();
    let config = SrcfetchConfig::load()?;

    let mut builder = Srcfetch::builder();
    if let Some(staging_directory) = cli_args.staging_directory.or(config.staging_dir) {
        builder = builder.staging_directory(staging_directory);
    }
    let srcfetch = builder.try_build()?;

    match cli_args.cmd {
        Command::Fetch { uris } => command_handlers::do_fetch(&srcfetch, &uris),
        Command::ClearStaging => command_handlers::do_clear_staging(&srcfetch),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("{e:#}");
        std::process::exit(1);
    }
}
