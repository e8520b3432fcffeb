use std::io::Write;

use chrono::{TimeZone, Utc};
use flate2::{write::GzEncoder, Compression};
use nyx_registry::PackageRecord;
use tar::{Builder, Header};

use crate::store::CatalogStore;

/// A record whose filename is unique per (name, arch, version, repo).
pub(crate) fn record(name: &str, arch: &str, version: &str, repo: &str) -> PackageRecord {
    PackageRecord {
        filename: format!("{name}-{version}-{arch}.{repo}.pkg.tar.zst"),
        name: name.into(),
        base: None,
        version: version.into(),
        description: Some(format!("The {name} package")),
        url: Some(format!("https://example.org/{name}")),
        arch: arch.into(),
        packager: "Nyx <nyx@example.org>".into(),
        build_date: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        repo: repo.into(),
    }
}

/// Writes `records` straight into `store`, one transaction per repo.
pub(crate) fn seed<S: CatalogStore>(store: &S, records: &[PackageRecord]) {
    for record in records {
        store
            .transaction(&record.repo, |writer| {
                writer.insert_batch(std::slice::from_ref(record))
            })
            .unwrap();
    }
}

/// Renders `record` in the `desc` format.
pub(crate) fn desc(record: &PackageRecord) -> String {
    let mut out = String::new();
    let mut field = |key: &str, value: &str| {
        out.push_str(&format!("%{key}%\n{value}\n\n"));
    };

    field("FILENAME", &record.filename);
    field("NAME", &record.name);
    if let Some(base) = &record.base {
        field("BASE", base);
    }
    field("VERSION", &record.version);
    if let Some(description) = &record.description {
        field("DESC", description);
    }
    if let Some(url) = &record.url {
        field("URL", url);
    }
    field("ARCH", &record.arch);
    field("BUILDDATE", &record.build_date.timestamp().to_string());
    field("PACKAGER", &record.packager);
    out
}

/// Builds a gzip compressed snapshot from `(path, content)` entries.
pub(crate) fn blob_from_entries<C: AsRef<[u8]>>(entries: &[(String, C)]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    for (path, content) in entries {
        let mut header = Header::new_gnu();
        let content = content.as_ref();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content)
            .unwrap();
    }
    let tar = builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

/// Builds a snapshot holding one `desc` entry per record.
pub(crate) fn blob(records: &[PackageRecord]) -> Vec<u8> {
    let entries: Vec<_> = records
        .iter()
        .map(|r| (format!("{}-{}/desc", r.name, r.version), desc(r)))
        .collect();
    blob_from_entries(&entries)
}
