//! XDG base directories and `$VAR`/`~` expansion for configured paths.

use std::{
    env,
    iter::Peekable,
    path::PathBuf,
    str::Chars,
};

use nix::unistd::{getuid, User};

use crate::error::{PathError, PathResult};

/// Resolves a configured path into an absolute [`PathBuf`].
///
/// `$VAR` and `${VAR}` are expanded from the environment, a leading `~` is
/// replaced with the home directory, and relative results are joined onto
/// the current working directory.
///
/// # Errors
///
/// * [`PathError::Empty`] if the path is blank
/// * [`PathError::MissingEnvVar`] if a referenced variable is not set
/// * [`PathError::UnclosedVariable`] for `${VAR` without a closing brace
/// * [`PathError::CurrentDir`] if the working directory cannot be read
pub fn resolve_path(path: &str) -> PathResult<PathBuf> {
    let path = path.trim();
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let expanded = PathBuf::from(expand_variables(path)?);
    if expanded.is_absolute() {
        return Ok(expanded);
    }

    env::current_dir()
        .map(|cwd| cwd.join(expanded))
        .map_err(|source| PathError::CurrentDir { source })
}

/// Returns `$HOME`, falling back to the passwd entry of the current user.
pub fn home_dir() -> PathBuf {
    if let Ok(home) = env::var("HOME") {
        return PathBuf::from(home);
    }

    User::from_uid(getuid())
        .ok()
        .flatten()
        .map(|user| user.dir)
        .unwrap_or_else(|| PathBuf::from("/"))
}

pub fn xdg_config_home() -> PathBuf {
    env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

pub fn xdg_data_home() -> PathBuf {
    env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns `$XDG_RUNTIME_DIR`, or the system temp dir when it is unset.
pub fn xdg_runtime_dir() -> PathBuf {
    env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir())
}

fn expand_variables(path: &str) -> PathResult<String> {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                let name = braced_name(&mut chars)?;
                result.push_str(&lookup_var(&name, path)?);
            }
            '$' => {
                let name = bare_name(&mut chars);
                if name.is_empty() {
                    result.push('$');
                } else {
                    result.push_str(&lookup_var(&name, path)?);
                }
            }
            '~' if result.is_empty() => result.push_str(&home_dir().to_string_lossy()),
            _ => result.push(c),
        }
    }

    Ok(result)
}

fn braced_name(chars: &mut Peekable<Chars>) -> PathResult<String> {
    let mut name = String::new();
    for c in chars.by_ref() {
        if c == '}' {
            return Ok(name);
        }
        name.push(c);
    }

    Err(PathError::UnclosedVariable {
        input: format!("${{{name}"),
    })
}

fn bare_name(chars: &mut Peekable<Chars>) -> String {
    let mut name = String::new();
    while let Some(c) = chars.next_if(|c| c.is_alphanumeric() || *c == '_') {
        name.push(c);
    }
    name
}

fn lookup_var(name: &str, input: &str) -> PathResult<String> {
    match name {
        "HOME" => Ok(home_dir().to_string_lossy().into_owned()),
        "XDG_CONFIG_HOME" => Ok(xdg_config_home().to_string_lossy().into_owned()),
        "XDG_DATA_HOME" => Ok(xdg_data_home().to_string_lossy().into_owned()),
        _ => {
            env::var(name).map_err(|_| {
                PathError::MissingEnvVar {
                    var: name.into(),
                    input: input.into(),
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_resolve_absolute_path() {
        assert_eq!(
            resolve_path("/var/lib/nyx").unwrap(),
            PathBuf::from("/var/lib/nyx")
        );
    }

    #[test]
    #[serial]
    fn test_resolve_env_vars() {
        env::set_var("NYX_TEST_ROOT", "/srv/nyx");
        assert_eq!(
            resolve_path("$NYX_TEST_ROOT/db").unwrap(),
            PathBuf::from("/srv/nyx/db")
        );
        assert_eq!(
            resolve_path("${NYX_TEST_ROOT}/locks").unwrap(),
            PathBuf::from("/srv/nyx/locks")
        );
        env::remove_var("NYX_TEST_ROOT");
    }

    #[test]
    #[serial]
    fn test_resolve_tilde() {
        env::set_var("HOME", "/home/nyx");
        assert_eq!(
            resolve_path("~/pkginfo.db").unwrap(),
            PathBuf::from("/home/nyx/pkginfo.db")
        );
    }

    #[test]
    #[serial]
    fn test_resolve_errors() {
        assert!(matches!(resolve_path("   "), Err(PathError::Empty)));
        assert!(matches!(
            resolve_path("${UNCLOSED"),
            Err(PathError::UnclosedVariable { .. })
        ));
        env::remove_var("NYX_SURELY_UNSET");
        assert!(matches!(
            resolve_path("$NYX_SURELY_UNSET/x"),
            Err(PathError::MissingEnvVar { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_lone_dollar_is_kept() {
        assert_eq!(resolve_path("/tmp/$").unwrap(), PathBuf::from("/tmp/$"));
    }

    #[test]
    #[serial]
    fn test_xdg_fallbacks() {
        env::set_var("HOME", "/home/nyx");
        env::remove_var("XDG_CONFIG_HOME");
        env::remove_var("XDG_DATA_HOME");
        assert_eq!(xdg_config_home(), PathBuf::from("/home/nyx/.config"));
        assert_eq!(xdg_data_home(), PathBuf::from("/home/nyx/.local/share"));
    }
}
