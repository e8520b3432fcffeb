use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use nu_ansi_term::Color::{Blue, Cyan, Green, Red, Yellow};
use nyx_config::repository::Repository;
use nyx_core::{CatalogStore, Result, SyncStatus};
use serde::Serialize;
use tracing::info;

use crate::{
    state::AppState,
    utils::{print_json, Colored},
};

const SHORT_DIGEST_LEN: usize = 12;

#[derive(Debug, Serialize)]
struct RepoStatus {
    repo: String,
    /// Whether the tag is an enabled repository of the config; `false` for
    /// tags whose records are only left over in the catalog.
    configured: bool,
    packages: usize,
    synced_at: Option<DateTime<Utc>>,
    snapshot_digest: Option<String>,
    due: bool,
}

fn repo_status(
    repo: Option<&Repository>,
    name: &str,
    packages: usize,
    status: Option<SyncStatus>,
    now: DateTime<Utc>,
) -> Result<RepoStatus> {
    let due = match (repo, &status) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(repo), Some(status)) => {
            let elapsed = (now - status.synced_at).to_std().unwrap_or_default();
            repo.sync_interval()?.is_due(elapsed)
        }
    };

    Ok(RepoStatus {
        repo: name.to_string(),
        configured: repo.is_some(),
        packages,
        synced_at: status.as_ref().map(|status| status.synced_at),
        snapshot_digest: status.map(|status| status.snapshot_digest),
        due,
    })
}

/// Lists the configured repositories with their catalog state, followed by
/// tags that are still stored but no longer configured.
pub fn show_status(state: &AppState, json: bool) -> Result<()> {
    let store = state.sync().store();
    let now = Utc::now();

    let mut stored: BTreeMap<String, SyncStatus> = store
        .sync_statuses()?
        .into_iter()
        .map(|status| (status.repo.clone(), status))
        .collect();

    let mut rows = Vec::new();
    for repo in state.config().enabled_repositories() {
        let status = stored.remove(&repo.name);
        let count = store.count(&repo.name)?;
        rows.push(repo_status(Some(repo), &repo.name, count, status, now)?);
    }
    for (name, status) in stored {
        let count = store.count(&name)?;
        rows.push(repo_status(None, &name, count, Some(status), now)?);
    }

    if json {
        return print_json(&rows);
    }

    for row in &rows {
        info!("{}", format_row(row));
    }

    Ok(())
}

fn format_row(row: &RepoStatus) -> String {
    let synced = match (&row.synced_at, &row.snapshot_digest) {
        (Some(at), Some(digest)) => {
            let short = digest.get(..SHORT_DIGEST_LEN).unwrap_or(digest);
            format!(
                "synced {} ({})",
                Colored(Green, at.format("%Y-%m-%d %H:%M:%S UTC")),
                Colored(Blue, short)
            )
        }
        _ => Colored(Yellow, "never synced").to_string(),
    };

    let mut line = format!(
        "{}: {} packages, {synced}",
        Colored(Cyan, &row.repo),
        row.packages
    );
    if !row.configured {
        line.push_str(&format!(" [{}]", Colored(Red, "not configured")));
    } else if row.due {
        line.push_str(&format!(" [{}]", Colored(Yellow, "due")));
    }
    line
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serial_test::serial;

    use super::*;
    use crate::utils::set_color;

    fn status(synced_at: DateTime<Utc>) -> SyncStatus {
        SyncStatus {
            repo: "core".into(),
            snapshot_digest: "0123456789abcdef0123".into(),
            package_count: 2,
            synced_at,
        }
    }

    #[test]
    fn test_due_follows_sync_interval() {
        let now = Utc::now();
        let mut repo = Repository::new("core", "https://mirror.example/core.db");
        repo.sync_interval = Some("3h".into());

        let fresh = repo_status(Some(&repo), "core", 2, Some(status(now)), now).unwrap();
        assert!(fresh.configured);
        assert!(!fresh.due);

        let stale = status(now - Duration::hours(4));
        assert!(repo_status(Some(&repo), "core", 2, Some(stale), now).unwrap().due);

        assert!(repo_status(Some(&repo), "core", 0, None, now).unwrap().due);
    }

    #[test]
    fn test_unconfigured_tag_is_never_due() {
        let now = Utc::now();
        let row = repo_status(None, "old", 5, Some(status(now)), now).unwrap();
        assert!(!row.configured);
        assert!(!row.due);
    }

    #[test]
    #[serial]
    fn test_format_row() {
        set_color(false);
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let repo = Repository::new("core", "https://mirror.example/core.db");

        let row = repo_status(Some(&repo), "core", 2, Some(status(now)), now).unwrap();
        assert_eq!(
            format_row(&row),
            "core: 2 packages, synced 2023-11-14 22:13:20 UTC (0123456789ab)"
        );

        let row = repo_status(Some(&repo), "core", 0, None, now).unwrap();
        assert_eq!(format_row(&row), "core: 0 packages, never synced [due]");
    }
}
