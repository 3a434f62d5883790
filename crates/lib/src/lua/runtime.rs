use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use mlua::prelude::*;

use crate::lua::globals;
use crate::manifest::Manifest;

/// Create a Lua VM with the directive globals bound to `manifest`.
pub fn create_runtime(manifest: Rc<RefCell<Manifest>>) -> LuaResult<Lua> {
  let lua = Lua::new();
  globals::register_globals(&lua, manifest)?;
  Ok(lua)
}

/// Load and execute a build script. Sets `box.dir` to the script's directory.
pub fn load_file(lua: &Lua, path: &Path) -> LuaResult<()> {
  let canonical_path = dunce::canonicalize(path)
    .map_err(|e| LuaError::external(format!("cannot canonicalize '{}': {}", path.display(), e)))?;
  let content = std::fs::read_to_string(&canonical_path)
    .map_err(|e| LuaError::external(format!("cannot read '{}': {}", canonical_path.display(), e)))?;

  let boxt = lua.globals().get::<LuaTable>("box")?;
  boxt.set(
    "dir",
    canonical_path
      .parent()
      .unwrap_or(Path::new("."))
      .to_string_lossy()
      .to_string(),
  )?;

  load_source(lua, &content, &canonical_path.display().to_string())
}

/// Execute build script source. `name` appears in Lua error messages.
pub fn load_source(lua: &Lua, source: &str, name: &str) -> LuaResult<()> {
  lua.load(source).set_name(format!("@{}", name)).exec()
}
