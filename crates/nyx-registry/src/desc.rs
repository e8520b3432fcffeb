//! Parser for the `%FIELD%` metadata format used by pacman repository
//! databases.
//!
//! A block is a sequence of marker lines (`%NAME%`) each followed by zero
//! or more value lines; blank lines separate fields. Only the first value
//! of a field is used, matching how `repo-add` consumers read it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    archive::DescBlock,
    error::{RegistryError, Result},
    record::PackageRecord,
};

pub const FILENAME: &str = "FILENAME";
pub const NAME: &str = "NAME";
pub const BASE: &str = "BASE";
pub const VERSION: &str = "VERSION";
pub const DESC: &str = "DESC";
pub const URL: &str = "URL";
pub const ARCH: &str = "ARCH";
pub const PACKAGER: &str = "PACKAGER";
pub const BUILDDATE: &str = "BUILDDATE";

/// Fields of one metadata block, each with its value lines in order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DescFields<'a> {
    fields: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> DescFields<'a> {
    /// Splits `text` into fields.
    ///
    /// Value lines appearing before the first marker belong to no field
    /// and are dropped. A repeated marker starts its value list afresh.
    pub fn parse(text: &'a str) -> Self {
        let mut fields: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
        let mut current: Option<&'a str> = None;

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            if let Some(key) = marker(line) {
                fields.insert(key, Vec::new());
                current = Some(key);
            } else if let Some(key) = current {
                fields.entry(key).or_default().push(line);
            }
        }

        Self { fields }
    }

    /// All value lines of `key`.
    pub fn values(&self, key: &str) -> &[&'a str] {
        self.fields.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First value line of `key`; a marker without values counts as absent.
    pub fn first(&self, key: &str) -> Option<&'a str> {
        self.values(key).first().copied()
    }

    fn required(&self, key: &'static str) -> Result<&'a str> {
        self.first(key).ok_or(RegistryError::MissingField(key))
    }

    fn optional(&self, key: &str) -> Option<String> {
        self.first(key).map(str::to_string)
    }
}

fn marker(line: &str) -> Option<&str> {
    let key = line.strip_prefix('%')?.strip_suffix('%')?;
    if !key.is_empty() && key.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
        Some(key)
    } else {
        None
    }
}

fn parse_build_date(raw: &str) -> Result<DateTime<Utc>> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| {
            RegistryError::MalformedField {
                field: BUILDDATE,
                value: raw.to_string(),
            }
        })
}

/// Parses one metadata block into a [`PackageRecord`] stamped with `repo`.
///
/// # Errors
///
/// * [`RegistryError::MissingField`] if FILENAME, NAME, VERSION, ARCH,
///   PACKAGER or BUILDDATE has no value
/// * [`RegistryError::MalformedField`] if BUILDDATE is not an epoch integer
pub fn parse_record(text: &str, repo: &str) -> Result<PackageRecord> {
    let fields = DescFields::parse(text);

    let filename = fields.required(FILENAME)?;
    let name = fields.required(NAME)?;
    let version = fields.required(VERSION)?;
    let arch = fields.required(ARCH)?;
    let packager = fields.required(PACKAGER)?;
    let build_date = parse_build_date(fields.required(BUILDDATE)?)?;

    Ok(PackageRecord {
        filename: filename.to_string(),
        name: name.to_string(),
        base: fields.optional(BASE),
        version: version.to_string(),
        description: fields.optional(DESC),
        url: fields.optional(URL),
        arch: arch.to_string(),
        packager: packager.to_string(),
        build_date,
        repo: repo.to_string(),
    })
}

impl DescBlock {
    /// The entry decoded as UTF-8.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.content).map_err(|source| {
            RegistryError::InvalidEncoding {
                path: self.path.clone(),
                source,
            }
        })
    }

    pub fn parse(&self, repo: &str) -> Result<PackageRecord> {
        parse_record(self.text()?, repo)
    }
}
