use std::{
    fmt::Display,
    io::Write,
    sync::{LazyLock, RwLock},
};

use nu_ansi_term::Color;
use nyx_core::{Result, SyncError};
use serde::Serialize;

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub struct Icons;

impl Icons {
    pub const ARCH: &str = "🖥";
    pub const CALENDAR: &str = "📅";
    pub const DESCRIPTION: &str = "📝";
    pub const FILE: &str = "📄";
    pub const LINK: &str = "🔗";
    pub const MAINTAINER: &str = "👤";
    pub const PACKAGE: &str = "📦";
    pub const VERSION: &str = "🏁";
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().map(|c| *c).unwrap_or(false);
        if color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

pub fn set_color(enabled: bool) {
    if let Ok(mut color) = COLOR.write() {
        *color = enabled;
    }
}

/// Writes `value` to stdout as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(std::io::Error::from)
        .and_then(|_| writeln!(stdout))
        .map_err(|source| {
            SyncError::IoError {
                action: "writing JSON output".into(),
                source,
            }
        })
}

#[cfg(test)]
mod tests {
    use nu_ansi_term::Color::Blue;
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_colored_respects_switch() {
        set_color(false);
        assert_eq!(Colored(Blue, "foo").to_string(), "foo");

        set_color(true);
        assert_eq!(
            Colored(Blue, "foo").to_string(),
            format!("{}foo{}", Blue.prefix(), Blue.suffix())
        );
    }
}
