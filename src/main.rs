use std::{process, sync::Arc};

use clap::Parser;
use log::{error, info};
use tokio::sync::Mutex;

use sterling::{App, Cli, Config, FileStorage, NoteStore, Result, SettingsProvider};

pub fn initialize_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    info!("Using data directory {}", config.data_dir.display());

    let store = NoteStore::load_from(Box::new(FileStorage::new(config.data_dir.clone())))?;
    let settings = SettingsProvider::load(FileStorage::new(config.data_dir.clone()));

    let app = App::new(
        Arc::new(Mutex::new(store)),
        Arc::new(Mutex::new(settings)),
        config,
        cli.verbose,
    );
    app.run(cli.command).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    info!("Application starting up");
    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    info!("Application shutting down");
}
