pub mod auth;
pub mod cli;
pub mod config;
pub mod datastore;
pub mod daterange;
pub mod filter;
pub mod lifecycle;
pub mod notify;
pub mod pages;
pub mod render;
pub mod task;
pub mod vocab;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::info;

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);
    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting daybook CLI");

    let mut prefs = config::Preferences::load(cli.config.as_deref())?;
    let data_dir = config::resolve_data_dir(&prefs, cli.data.as_deref())
        .context("failed to resolve data directory")?;

    let store = datastore::DataStore::open(&data_dir)
        .with_context(|| format!("failed to open datastore at {}", data_dir.display()))?;
    let mut renderer = render::Renderer::new(&prefs);

    pages::dispatch(
        &store,
        &mut prefs,
        cli.config.as_deref(),
        &mut renderer,
        cli.command,
        Utc::now(),
    )?;

    info!("done");
    Ok(())
}
