mod bulk;
mod cli;
mod config;
mod confirm;
mod error;
mod gitops;
mod logging;
mod materialize;
mod report;
mod runner;
mod schema;
mod templates;
mod tree;

use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let app = cli::parse();
    logging::init(app.verbose);
    runner::run(app).map(ExitCode::from)
}
