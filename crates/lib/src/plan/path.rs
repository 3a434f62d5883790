//! Container path arithmetic.
//!
//! Container paths are always `/`-separated, whatever the host platform is.

/// Resolve `path` against the absolute directory `base`, normalizing `.` and `..`.
///
/// `..` never climbs above `/`.
pub fn resolve(base: &str, path: &str) -> String {
  let mut parts: Vec<&str> = if path.starts_with('/') {
    Vec::new()
  } else {
    components(base).collect()
  };

  for part in path.split('/') {
    match part {
      "" | "." => {}
      ".." => {
        parts.pop();
      }
      other => parts.push(other),
    }
  }

  format!("/{}", parts.join("/"))
}

/// Whether `path` exists once the given copy destinations are in place.
///
/// A copy creates its destination, everything below it, and every parent
/// directory on the way there. `/` always exists.
pub fn is_established(path: &str, copies: &[String]) -> bool {
  path == "/"
    || copies
      .iter()
      .any(|dst| is_within(path, dst) || is_within(dst, path))
}

fn is_within(path: &str, dir: &str) -> bool {
  let mut path = components(path);
  components(dir).all(|d| path.next() == Some(d))
}

fn components(path: &str) -> impl Iterator<Item = &str> {
  path.split('/').filter(|p| !p.is_empty())
}
