#![forbid(unsafe_code)]

//! termtint render test binary entry point.

use std::io;
use std::process;

use termtint::{Config, TableFlags};
use termtint_demo::{cli, render};
use tracing_subscriber::EnvFilter;

/// Log filter variable; logging stays off when unset.
const LOG_ENV: &str = "TERMTINT_LOG";

fn init_tracing() {
    let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() {
    init_tracing();
    let opts = cli::Opts::parse();

    let mut config = Config::from_env().with_tables(TableFlags::ALL);
    if let Some(escape) = opts.escape.clone() {
        config = config.with_escape(escape);
    }
    if let Err(err) = termtint::init(config) {
        tracing::warn!(%err, "running without emergency terminal restore");
    }

    let mut stdout = io::stdout().lock();
    if let Err(err) = render::color_support_test(&mut stdout, &opts) {
        eprintln!("termtint-demo: {err}");
        process::exit(1);
    }
}
