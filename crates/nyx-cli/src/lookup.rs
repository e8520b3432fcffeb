use nu_ansi_term::Color::{Blue, Cyan, Green, Purple, White, Yellow};
use nyx_core::Result;
use nyx_registry::PackageRecord;
use tracing::{info, warn};

use crate::{
    state::AppState,
    utils::{print_json, Colored, Icons},
};

pub fn lookup_package(
    state: &AppState,
    name: &str,
    repo: Option<&str>,
    arch: Option<&str>,
    all: bool,
    json: bool,
) -> Result<()> {
    let sync = state.sync();
    let records: Vec<PackageRecord> = match (repo, arch) {
        (Some(repo), Some(arch)) => sync.lookup_arch(name, arch, repo)?.into_iter().collect(),
        (Some(repo), None) if all => sync.family(name, repo)?,
        (Some(repo), None) => sync.lookup(name, repo)?.into_iter().collect(),
        (None, _) => sync.lookup_any(name)?.into_iter().collect(),
    };

    if json {
        return print_json(&records);
    }

    if records.is_empty() {
        match repo {
            Some(repo) => warn!("Package {name} not found in {repo}"),
            None => warn!("Package {name} not found"),
        }
        return Ok(());
    }

    for record in &records {
        info!("{}", format_record(record));
    }

    Ok(())
}

fn format_record(record: &PackageRecord) -> String {
    let mut lines = vec![format!(
        "\n{} {}: {} ({}/{})",
        Icons::PACKAGE,
        Colored(Purple, "Name"),
        Colored(Cyan, &record.name),
        Colored(Green, &record.repo),
        Colored(Blue, &record.arch),
    )];

    if let Some(base) = record.base.as_ref().filter(|base| **base != record.name) {
        lines.push(format!("   {}: {}", Colored(Purple, "Base"), Colored(Cyan, base)));
    }
    lines.push(format!(
        "{} {}: {}",
        Icons::VERSION,
        Colored(Purple, "Version"),
        Colored(Blue, &record.version)
    ));
    if let Some(description) = &record.description {
        lines.push(format!(
            "{} {}: {}",
            Icons::DESCRIPTION,
            Colored(Purple, "Description"),
            Colored(White, description)
        ));
    }
    if let Some(url) = &record.url {
        lines.push(format!(
            "{} {}: {}",
            Icons::LINK,
            Colored(Purple, "URL"),
            Colored(Blue, url)
        ));
    }
    lines.push(format!(
        "{} {}: {}",
        Icons::ARCH,
        Colored(Purple, "Arch"),
        Colored(Blue, &record.arch)
    ));
    lines.push(format!(
        "{} {}: {}",
        Icons::MAINTAINER,
        Colored(Purple, "Packager"),
        Colored(Yellow, &record.packager)
    ));
    lines.push(format!(
        "{} {}: {}",
        Icons::CALENDAR,
        Colored(Purple, "Build Date"),
        Colored(Green, record.build_date.format("%Y-%m-%d %H:%M:%S UTC"))
    ));
    lines.push(format!(
        "{} {}: {}",
        Icons::FILE,
        Colored(Purple, "File"),
        Colored(White, &record.filename)
    ));

    lines.join("\n")
}
