//! Copying local files into the build root.

use std::fs;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::execute::types::ExecuteError;

fn copy_error(src: &Path, dst: &Path, message: impl ToString) -> ExecuteError {
  ExecuteError::Copy {
    src: src.display().to_string(),
    dst: dst.display().to_string(),
    message: message.to_string(),
  }
}

/// Copy `src` to `dst` the way a container build's `COPY` does.
///
/// A directory's contents are copied into `dst`. A file lands at `dst`, or
/// inside it when `dst` is an existing directory. Anything under `skip` (the
/// build root, when it lives inside the source tree) is left out.
///
/// Returns the number of files copied.
pub fn copy_into(src: &Path, dst: &Path, skip: &Path) -> Result<usize, ExecuteError> {
  let metadata = fs::symlink_metadata(src).map_err(|e| copy_error(src, dst, e))?;

  if !metadata.is_dir() {
    let target = if dst.is_dir() {
      match src.file_name() {
        Some(name) => dst.join(name),
        None => return Err(copy_error(src, dst, "source has no file name")),
      }
    } else {
      dst.to_path_buf()
    };
    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent)?;
    }
    copy_entry(src, &target, metadata.file_type().is_symlink())?;
    return Ok(1);
  }

  fs::create_dir_all(dst)?;
  let mut copied = 0;

  let walker = WalkDir::new(src)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| !e.path().starts_with(skip));

  for entry in walker {
    let entry = entry.map_err(|e| copy_error(src, dst, e))?;
    let rel = entry.path().strip_prefix(src).map_err(|e| copy_error(src, dst, e))?;
    if rel.as_os_str().is_empty() {
      continue;
    }
    let target = dst.join(rel);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&target)?;
    } else {
      copy_entry(entry.path(), &target, entry.file_type().is_symlink())?;
      copied += 1;
    }
  }

  debug!(src = %src.display(), dst = %dst.display(), files = copied, "copied tree");
  Ok(copied)
}

fn copy_entry(src: &Path, dst: &Path, is_symlink: bool) -> Result<(), ExecuteError> {
  if fs::symlink_metadata(dst).is_ok() && !dst.is_dir() {
    fs::remove_file(dst)?;
  }

  #[cfg(unix)]
  {
    if is_symlink {
      let target = fs::read_link(src)?;
      std::os::unix::fs::symlink(target, dst)?;
      return Ok(());
    }
  }

  #[cfg(not(unix))]
  let _ = is_symlink;

  fs::copy(src, dst).map_err(|e| copy_error(src, dst, e))?;
  Ok(())
}
