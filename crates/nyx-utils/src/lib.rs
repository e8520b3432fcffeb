//! Small helpers shared by the nyx crates: XDG path handling, duration
//! parsing and advisory file locks.

pub mod error;
pub mod lock;
pub mod path;
pub mod time;
