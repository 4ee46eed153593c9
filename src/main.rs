mod args;
#[cfg(feature = "browser")]
mod browser;
mod config;
mod context;
mod download;
mod engine;
mod fetch;
#[cfg(test)]
mod fixtures;
mod genre;
mod identity;
mod logging;
mod magnet;
mod model;
mod parser;
mod render;
mod shell;
mod store;
mod units;
mod wait;

use args::{Args, Command};
use config::Config;
use context::Context;
use download::CommandDelegate;
use shell::Shell;
use store::Store;
use tracing::info;

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::from_settings(args.settings)?;
    logging::init(&config.log_path);
    info!(base_url = %config.base_url, store = %config.store_path.display(), "starting");

    let context = Context::new(config)?;
    let mut store = Store::load(&context.config.store_path);
    let delegate = CommandDelegate::new(context.config.download_command.clone());
    let mut shell = Shell::new(&context, &mut store, &delegate);

    match args.command {
        Some(command) => shell.execute(command),
        None => shell.execute(Command::Shell),
    }
}
