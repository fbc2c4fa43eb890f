//! Main application entry point.

use clap::Parser;
use snapdraft_app::CliArgs;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Starting SnapDraft");

    let args = CliArgs::parse();
    snapdraft_app::run(args)
}
