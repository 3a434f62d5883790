//! Data and cache locations, with environment overrides.

use std::path::PathBuf;

use crate::consts::{APP_NAME, ROOT_ENV, SHELL_ENV};
use crate::util::hash::ObjectHash;

/// Returns the user's home directory, or the current directory if unknown.
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var("USERPROFILE").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the user's home directory, or the current directory if unknown.
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the directory for persisted plans.
#[cfg(windows)]
pub fn data_dir() -> PathBuf {
  std::env::var("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir())
    .join(APP_NAME)
}

/// Returns the directory for persisted plans.
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  let data_home = std::env::var("XDG_DATA_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".local").join("share"));
  data_home.join(APP_NAME)
}

/// Returns the directory holding build roots.
#[cfg(windows)]
pub fn cache_dir() -> PathBuf {
  std::env::var("LOCALAPPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir())
    .join(APP_NAME)
    .join("Cache")
}

/// Returns the directory holding build roots.
#[cfg(not(windows))]
pub fn cache_dir() -> PathBuf {
  let cache_home = std::env::var("XDG_CACHE_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".cache"));
  cache_home.join(APP_NAME)
}

pub fn plans_dir() -> PathBuf {
  data_dir().join("plans")
}

/// Build root for a plan: `BOXWRIGHT_ROOT` if set, else `<cache>/roots/<hash>`.
pub fn build_root(hash: &ObjectHash) -> PathBuf {
  match std::env::var(ROOT_ENV) {
    Ok(root) if !root.is_empty() => PathBuf::from(root),
    _ => cache_dir().join("roots").join(&hash.0),
  }
}

/// Shell override from `BOXWRIGHT_SHELL`.
pub fn shell_override() -> Option<String> {
  std::env::var(SHELL_ENV).ok().filter(|s| !s.is_empty())
}
