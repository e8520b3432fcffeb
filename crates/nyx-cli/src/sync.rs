use std::fs;

use nu_ansi_term::Color::{Cyan, Green, Yellow};
use nyx_config::error::ConfigError;
use nyx_core::Result;
use nyx_registry::ErrorContext;
use nyx_utils::path::resolve_path;
use tracing::info;

use crate::{
    state::AppState,
    utils::{print_json, Colored},
};

/// Synchronizes the configured repository `repo` from the snapshot file at
/// `snapshot`. An already applied snapshot is skipped unless `force` is set.
pub fn sync_repository(
    state: &AppState,
    repo: &str,
    snapshot: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    state.config().get_repository(repo)?;

    let path = resolve_path(snapshot).map_err(ConfigError::from)?;
    let blob = fs::read(&path).with_context(|| format!("reading snapshot {}", path.display()))?;

    if !force && state.sync().is_current(repo, &blob)? {
        info!(
            "[{}] {}",
            Colored(Cyan, repo),
            Colored(Yellow, "Snapshot already applied, use --force to reconcile again")
        );
        if json {
            print_json(&state.sync().status(repo)?)?;
        }
        return Ok(());
    }

    let report = state.sync().synchronize(repo, &blob)?;

    if json {
        print_json(&report)?;
    } else {
        info!(
            "[{}] {} {} packages unchanged",
            Colored(Cyan, repo),
            Colored(Green, "Synchronized."),
            report.unchanged
        );
    }

    Ok(())
}
