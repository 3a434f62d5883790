//! Permission and group changes applied directly to the build root.
//!
//! Groups live in `<root>/etc/group` using the usual `name:x:gid:members`
//! layout, so nothing touches the host's own user database.

use std::fs;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::execute::types::ExecuteError;

/// Set `mode` on `path`, and on everything below it when `recursive`.
///
/// Symlinks are not followed.
#[cfg(unix)]
pub fn chmod(path: &Path, mode: u32, recursive: bool) -> Result<usize, ExecuteError> {
  use std::os::unix::fs::PermissionsExt;

  let max_depth = if recursive { usize::MAX } else { 0 };
  let mut changed = 0;

  for entry in WalkDir::new(path).max_depth(max_depth) {
    let entry = entry.map_err(std::io::Error::other)?;
    if entry.path_is_symlink() {
      continue;
    }
    fs::set_permissions(entry.path(), fs::Permissions::from_mode(mode))?;
    changed += 1;
  }

  debug!(path = %path.display(), mode = %format!("{:o}", mode), changed, "permissions set");
  Ok(changed)
}

#[cfg(not(unix))]
pub fn chmod(path: &Path, mode: u32, _recursive: bool) -> Result<usize, ExecuteError> {
  debug!(path = %path.display(), mode = %format!("{:o}", mode), "unix modes unsupported, skipping");
  Ok(0)
}

struct GroupEntry {
  name: String,
  rest: String,
  gid: Option<u32>,
  members: Vec<String>,
}

fn parse_groups(content: &str) -> Vec<GroupEntry> {
  content
    .lines()
    .filter(|l| !l.trim().is_empty())
    .map(|line| {
      let mut fields = line.splitn(4, ':');
      let name = fields.next().unwrap_or_default().to_string();
      let password = fields.next().unwrap_or("x");
      let gid_field = fields.next().unwrap_or_default();
      let members = fields
        .next()
        .unwrap_or_default()
        .split(',')
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
      GroupEntry {
        name,
        rest: format!("{}:{}", password, gid_field),
        gid: gid_field.parse().ok(),
        members,
      }
    })
    .collect()
}

fn write_groups(path: &Path, groups: &[GroupEntry]) -> Result<(), ExecuteError> {
  let mut content = String::new();
  for group in groups {
    content.push_str(&format!("{}:{}:{}\n", group.name, group.rest, group.members.join(",")));
  }
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::write(path, content)?;
  Ok(())
}

fn read_groups(path: &Path) -> Result<Vec<GroupEntry>, ExecuteError> {
  match fs::read_to_string(path) {
    Ok(content) => Ok(parse_groups(&content)),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
    Err(e) => Err(e.into()),
  }
}

/// Add a group to `<root>/etc/group`.
pub fn create_group(root: &Path, name: &str, gid: u32) -> Result<(), ExecuteError> {
  let path = root.join("etc").join("group");
  let mut groups = read_groups(&path)?;

  if groups.iter().any(|g| g.name == name) {
    return Err(ExecuteError::Group {
      message: format!("group '{}' already exists", name),
    });
  }
  if let Some(existing) = groups.iter().find(|g| g.gid == Some(gid)) {
    return Err(ExecuteError::Group {
      message: format!("gid {} already used by '{}'", gid, existing.name),
    });
  }

  groups.push(GroupEntry {
    name: name.to_string(),
    rest: format!("x:{}", gid),
    gid: Some(gid),
    members: Vec::new(),
  });
  write_groups(&path, &groups)
}

/// Append `user` to the member list of `group` in `<root>/etc/group`.
///
/// Adding a user that is already a member is a no-op.
pub fn add_user_to_group(root: &Path, user: &str, group: &str) -> Result<(), ExecuteError> {
  let path = root.join("etc").join("group");
  let mut groups = read_groups(&path)?;

  let Some(entry) = groups.iter_mut().find(|g| g.name == group) else {
    return Err(ExecuteError::Group {
      message: format!("group '{}' does not exist", group),
    });
  };
  if !entry.members.iter().any(|m| m == user) {
    entry.members.push(user.to_string());
  }
  write_groups(&path, &groups)
}
