//! Snapshot reading and metadata parsing for pacman-style repositories.
//!
//! A repository snapshot (`<repo>.db`) is a compressed tar archive with one
//! `desc` file per package build. [`SnapshotArchive`] yields those files as
//! [`DescBlock`]s and [`parse_record`] turns each into a [`PackageRecord`].
//!
//! ```no_run
//! use nyx_registry::{parse_record, read_desc_blocks, ErrorContext};
//!
//! # fn main() -> nyx_registry::Result<()> {
//! let blob = std::fs::read("archlinuxcn.db").with_context(|| "reading snapshot".into())?;
//! for block in read_desc_blocks(&blob)? {
//!     let record = parse_record(block.text()?, "archlinuxcn")?;
//!     println!("{} {}", record.name, record.version);
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod desc;
pub mod error;
pub mod record;

pub use archive::{read_desc_blocks, Compression, DescBlock, DescBlocks, SnapshotArchive};
pub use desc::{parse_record, DescFields};
pub use error::{ErrorContext, RegistryError, Result};
pub use record::PackageRecord;
