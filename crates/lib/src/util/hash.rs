//! Hashing for plan identity and build root digests.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::consts::OBJ_HASH_PREFIX_LEN;

pub type HashError = serde_json::Error;

/// A truncated SHA-256 of the JSON-serialized value.
///
/// Plans are keyed by this hash on disk, so two evaluations of the same
/// manifest land in the same plan directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    let full = hex_digest(serialized.as_bytes());
    Ok(ObjectHash(full[..OBJ_HASH_PREFIX_LEN].to_string()))
  }
}

fn hex_digest(data: &[u8]) -> String {
  format!("{:x}", Sha256::digest(data))
}

/// Digest of a directory tree: relative paths, file contents and symlink targets.
///
/// Entries named in `exclude` are skipped together with everything below them.
/// Timestamps and modes do not contribute.
pub fn digest_tree(root: &Path, exclude: &[&str]) -> std::io::Result<String> {
  let mut hasher = Sha256::new();

  let walker = WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| e.depth() == 0 || !e.file_name().to_str().is_some_and(|n| exclude.contains(&n)));

  for entry in walker {
    let entry = entry.map_err(std::io::Error::other)?;
    if entry.depth() == 0 {
      continue;
    }
    let rel = entry.path().strip_prefix(root).unwrap_or(entry.path()).to_string_lossy();
    let kind = entry.file_type();

    let line = if kind.is_symlink() {
      let target = fs::read_link(entry.path())?;
      format!("L:{}:{}", rel, target.display())
    } else if kind.is_dir() {
      format!("D:{}", rel)
    } else if kind.is_file() {
      format!("F:{}:{}", rel, hex_digest(&fs::read(entry.path())?))
    } else {
      continue;
    };

    hasher.update(line.as_bytes());
    hasher.update(b"\n");
  }

  Ok(format!("{:x}", hasher.finalize()))
}
