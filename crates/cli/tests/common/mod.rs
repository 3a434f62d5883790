//! Shared helpers for CLI tests.

#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated test environment.
///
/// The manifest lives in `<temp>/project/build.lua`; data, cache and build
/// root directories are siblings of the project so `copy(".")` never sees them.
pub struct TestEnv {
  pub temp: TempDir,
  pub manifest_path: PathBuf,
}

impl TestEnv {
  pub fn from_fixture(name: &str) -> Self {
    Self::from_source(&fixture_content(name))
  }

  pub fn from_source(source: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    std::fs::create_dir_all(&project).unwrap();
    let manifest_path = project.join("build.lua");
    std::fs::write(&manifest_path, source).unwrap();
    Self { temp, manifest_path }
  }

  /// Write a file relative to the project directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.project_path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn project_path(&self) -> PathBuf {
    self.temp.path().join("project")
  }

  fn dir(&self, name: &str) -> PathBuf {
    let p = self.temp.path().join(name);
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  pub fn data_path(&self) -> PathBuf {
    self.dir("data")
  }

  pub fn cache_path(&self) -> PathBuf {
    self.dir("cache")
  }

  /// Build root (isolated per test).
  pub fn root_path(&self) -> PathBuf {
    self.dir("root")
  }

  /// A `boxw` command running in the project directory with isolated
  /// `BOXWRIGHT_ROOT`, `XDG_DATA_HOME` and `XDG_CACHE_HOME`.
  pub fn boxw(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("boxw");
    cmd.current_dir(self.project_path());
    cmd.env("BOXWRIGHT_ROOT", self.root_path());
    cmd.env("XDG_DATA_HOME", self.data_path());
    cmd.env("XDG_CACHE_HOME", self.cache_path());
    cmd.env("APPDATA", self.data_path());
    cmd.env("LOCALAPPDATA", self.cache_path());
    cmd.env_remove("BOXWRIGHT_SHELL");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}
