//! Build script evaluation.
//!
//! Runs a Lua build script and collects the directives it declares into a
//! [`Manifest`]. Evaluation only records; validation happens in
//! [`crate::plan::evaluate`].

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use mlua::prelude::*;
use tracing::{debug, info};

use crate::lua::runtime;
use crate::manifest::Manifest;
use crate::plan::{self, BuildPlan, ManifestError};

/// Errors that can occur while evaluating a build script.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
  /// The script failed to run.
  #[error("lua error: {0}")]
  Lua(#[from] LuaError),

  /// The script ran but declared an invalid manifest.
  #[error("malformed manifest: {0}")]
  Manifest(#[from] ManifestError),
}

fn run_script(load: impl FnOnce(&Lua) -> LuaResult<()>) -> Result<Manifest, EvalError> {
  let manifest = Rc::new(RefCell::new(Manifest::default()));

  // lua holds clones of the manifest Rc; drop it before unwrapping
  {
    let lua = runtime::create_runtime(manifest.clone())?;
    load(&lua)?;
  }

  let manifest = Rc::try_unwrap(manifest)
    .map(RefCell::into_inner)
    .unwrap_or_else(|shared| shared.borrow().clone());

  debug!(directives = manifest.directives.len(), "build script evaluated");
  Ok(manifest)
}

/// Evaluate a build script file into a manifest.
///
/// # Example
/// ```ignore
/// use std::path::Path;
/// use boxwright_lib::eval::evaluate_manifest;
///
/// let manifest = evaluate_manifest(Path::new("build.lua"))?;
/// println!("directives: {}", manifest.directives.len());
/// ```
pub fn evaluate_manifest(path: &Path) -> Result<Manifest, EvalError> {
  info!(path = %path.display(), "evaluating build script");
  run_script(|lua| runtime::load_file(lua, path))
}

/// Evaluate build script source held in memory.
pub fn evaluate_source(source: &str, name: &str) -> Result<Manifest, EvalError> {
  run_script(|lua| runtime::load_source(lua, source, name))
}

/// Evaluate a build script file and validate it into a plan.
pub fn evaluate_plan(path: &Path) -> Result<BuildPlan, EvalError> {
  let manifest = evaluate_manifest(path)?;
  Ok(plan::evaluate(&manifest)?)
}
