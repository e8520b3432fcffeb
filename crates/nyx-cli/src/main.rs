use clap::Parser;
use cli::{Args, Commands};
use logging::setup_logging;
use lookup::lookup_package;
use nyx_config::{
    config::{self, config_path, generate_default_config, get_config, set_config_path},
    error::ConfigError,
};
use nyx_core::Result;
use nyx_utils::path::resolve_path;
use progress::spawn_event_handler;
use state::AppState;
use status::show_status;
use sync::sync_repository;
use utils::set_color;

mod cli;
mod logging;
mod lookup;
mod progress;
mod state;
mod status;
mod sync;
mod utils;

/// Opens the catalog, runs `f` against it and waits for the event handler
/// to drain once the state is dropped.
fn with_state<F>(f: F) -> Result<()>
where
    F: FnOnce(&AppState) -> Result<()>,
{
    let (events, progress) = spawn_event_handler();
    let result = AppState::init(events).and_then(|state| f(&state));
    progress.finish();
    result
}

fn handle_cli() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args);

    if args.no_color {
        set_color(false);
    }

    if let Some(ref path) = args.config {
        set_config_path(resolve_path(path).map_err(ConfigError::from)?);
    }

    let json = args.json;
    match args.command {
        Commands::DefConfig => generate_default_config(&config_path())?,
        Commands::Config => {
            config::init()?;
            print!("{}", get_config().to_toml()?);
        }
        Commands::Sync {
            repo,
            snapshot,
            force,
        } => with_state(|state| sync_repository(state, &repo, &snapshot, force, json))?,
        Commands::Lookup {
            name,
            repo,
            arch,
            all,
        } => {
            with_state(|state| {
                lookup_package(state, &name, repo.as_deref(), arch.as_deref(), all, json)
            })?
        }
        Commands::Status => with_state(|state| show_status(state, json))?,
    }

    Ok(())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    if let Err(err) = handle_cli() {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
