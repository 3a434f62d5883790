//! Global directive functions for build scripts.
//!
//! Every directive function appends to the shared [`Manifest`] in call order:
//!
//! ```lua
//! from "golang"
//!
//! local remote = "/go/src/github.com/box-builder/overmount"
//! copy(".", remote)
//!
//! inside(remote, function()
//!   run "chmod 777 ."
//!   vendor { guard = "vendor", commands = { "go get github.com/LK4D4/vndr", "vndr" } }
//! end)
//!
//! group("docker", 999)
//! add_to_group("nobody", "docker")
//! chmod("/go", "777", { recursive = true })
//!
//! workdir(remote)
//! set_exec { entrypoint = {}, cmd = { "make", "docker-test" } }
//! ```
//!
//! The `box` table carries `box.dir` (directory of the loaded script),
//! `box.os` and `box.arch`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use mlua::prelude::*;

use crate::manifest::{Directive, ExecSpec, Manifest, PermissionOp};

/// Directories opened by nested `inside` blocks, innermost last.
type Scopes = Rc<RefCell<Vec<String>>>;

/// The directory a scoped directive runs in, combining nested `inside` paths.
fn current_scope(scopes: &Scopes) -> Option<String> {
  let scopes = scopes.borrow();
  let mut dir: Option<String> = None;
  for scope in scopes.iter() {
    dir = Some(match dir {
      Some(outer) if !scope.starts_with('/') => format!("{}/{}", outer.trim_end_matches('/'), scope),
      _ => scope.clone(),
    });
  }
  dir
}

/// Parse a file mode. Both `"755"` and `755` are read as octal digits.
fn parse_mode(value: LuaValue) -> LuaResult<u32> {
  let digits = match value {
    LuaValue::String(s) => s.to_str()?.trim().trim_start_matches("0o").to_string(),
    LuaValue::Integer(i) if i >= 0 => i.to_string(),
    other => {
      return Err(LuaError::external(format!(
        "chmod mode must be a string or integer, got {}",
        other.type_name()
      )));
    }
  };
  u32::from_str_radix(&digits, 8).map_err(|_| LuaError::external(format!("invalid octal mode '{}'", digits)))
}

fn string_list(table: Option<LuaTable>, field: &str) -> LuaResult<Vec<String>> {
  let Some(table) = table else {
    return Ok(Vec::new());
  };
  table
    .sequence_values::<String>()
    .collect::<LuaResult<Vec<_>>>()
    .map_err(|e| LuaError::external(format!("'{}' must be a list of strings: {}", field, e)))
}

fn env_value(key: &str, value: LuaValue) -> LuaResult<String> {
  match value {
    LuaValue::String(s) => Ok(s.to_str()?.to_string()),
    LuaValue::Integer(i) => Ok(i.to_string()),
    LuaValue::Number(n) => Ok(n.to_string()),
    LuaValue::Boolean(b) => Ok(b.to_string()),
    other => Err(LuaError::external(format!(
      "env value for '{}' must be a string, number or boolean, got {}",
      key,
      other.type_name()
    ))),
  }
}

/// Register the `box` table and the directive functions as Lua globals.
pub fn register_globals(lua: &Lua, manifest: Rc<RefCell<Manifest>>) -> LuaResult<()> {
  let globals = lua.globals();
  let scopes: Scopes = Rc::new(RefCell::new(Vec::new()));

  let boxt = lua.create_table()?;
  boxt.set("os", std::env::consts::OS)?;
  boxt.set("arch", std::env::consts::ARCH)?;
  boxt.set("dir", ".")?;
  globals.set("box", boxt)?;

  let m = manifest.clone();
  globals.set(
    "from",
    lua.create_function(move |_, image: String| {
      m.borrow_mut().push(Directive::From { image });
      Ok(())
    })?,
  )?;

  let m = manifest.clone();
  globals.set(
    "copy",
    lua.create_function(move |_, (src, dst): (String, String)| {
      m.borrow_mut().push(Directive::Copy { src, dst });
      Ok(())
    })?,
  )?;

  let m = manifest.clone();
  let s = scopes.clone();
  globals.set(
    "run",
    lua.create_function(move |_, command: String| {
      let cwd = current_scope(&s);
      m.borrow_mut().push(Directive::Run { command, cwd });
      Ok(())
    })?,
  )?;

  let s = scopes.clone();
  globals.set(
    "inside",
    lua.create_function(move |_, (path, body): (String, LuaFunction)| {
      if path.is_empty() {
        return Err(LuaError::external("inside requires a non-empty path"));
      }
      s.borrow_mut().push(path);
      let result = body.call::<()>(());
      s.borrow_mut().pop();
      result
    })?,
  )?;

  let m = manifest.clone();
  globals.set(
    "workdir",
    lua.create_function(move |_, path: String| {
      m.borrow_mut().push(Directive::Workdir { path });
      Ok(())
    })?,
  )?;

  let m = manifest.clone();
  globals.set(
    "env",
    lua.create_function(move |_, table: LuaTable| {
      let mut vars = BTreeMap::new();
      for pair in table.pairs::<String, LuaValue>() {
        let (key, value) = pair?;
        let value = env_value(&key, value)?;
        vars.insert(key, value);
      }
      m.borrow_mut().push(Directive::Env { vars });
      Ok(())
    })?,
  )?;

  let m = manifest.clone();
  globals.set(
    "user",
    lua.create_function(move |_, name: String| {
      m.borrow_mut().push(Directive::User { name });
      Ok(())
    })?,
  )?;

  let m = manifest.clone();
  let s = scopes.clone();
  globals.set(
    "vendor",
    lua.create_function(move |_, spec: LuaTable| {
      let guard: Option<String> = spec.get("guard")?;
      let commands = string_list(spec.get("commands")?, "commands")?;
      let cwd = current_scope(&s);
      m.borrow_mut().push(Directive::Vendor {
        guard: guard.unwrap_or_else(|| "vendor".to_string()),
        commands,
        cwd,
      });
      Ok(())
    })?,
  )?;

  let m = manifest.clone();
  globals.set(
    "group",
    lua.create_function(move |_, (name, gid): (String, u32)| {
      m.borrow_mut()
        .push(Directive::Permission(PermissionOp::CreateGroup { name, gid }));
      Ok(())
    })?,
  )?;

  let m = manifest.clone();
  globals.set(
    "add_to_group",
    lua.create_function(move |_, (user, group): (String, String)| {
      m.borrow_mut()
        .push(Directive::Permission(PermissionOp::AddUserToGroup { user, group }));
      Ok(())
    })?,
  )?;

  let m = manifest.clone();
  globals.set(
    "chmod",
    lua.create_function(move |_, (path, mode, opts): (String, LuaValue, Option<LuaTable>)| {
      let mode = parse_mode(mode)?;
      let recursive = match opts {
        Some(opts) => opts.get::<Option<bool>>("recursive")?.unwrap_or(false),
        None => false,
      };
      m.borrow_mut()
        .push(Directive::Permission(PermissionOp::Chmod { path, mode, recursive }));
      Ok(())
    })?,
  )?;

  let m = manifest.clone();
  globals.set(
    "set_exec",
    lua.create_function(move |_, spec: LuaTable| {
      let entrypoint = string_list(spec.get("entrypoint")?, "entrypoint")?;
      let cmd = string_list(spec.get("cmd")?, "cmd")?;
      m.borrow_mut().push(Directive::SetExec(ExecSpec { entrypoint, cmd }));
      Ok(())
    })?,
  )?;

  let m = manifest;
  globals.set(
    "tag",
    lua.create_function(move |_, name: String| {
      m.borrow_mut().tags.push(name);
      Ok(())
    })?,
  )?;

  globals.set(
    "getenv",
    lua.create_function(|_, name: String| Ok(std::env::var(name).unwrap_or_default()))?,
  )?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn eval(source: &str) -> LuaResult<Manifest> {
    let lua = Lua::new();
    let manifest = Rc::new(RefCell::new(Manifest::default()));
    register_globals(&lua, manifest.clone())?;
    lua.load(source).exec()?;
    let result = manifest.borrow().clone();
    Ok(result)
  }

  const GLOBALS: &[&str] = &[
    "from",
    "copy",
    "run",
    "inside",
    "workdir",
    "env",
    "user",
    "vendor",
    "group",
    "add_to_group",
    "chmod",
    "set_exec",
    "tag",
    "getenv",
  ];

  #[test]
  fn all_directives_are_registered() -> LuaResult<()> {
    let lua = Lua::new();
    register_globals(&lua, Rc::new(RefCell::new(Manifest::default())))?;
    for name in GLOBALS {
      assert!(lua.globals().contains_key(*name)?, "missing global {}", name);
    }
    let boxt: LuaTable = lua.globals().get("box")?;
    assert!(boxt.contains_key("dir")?);
    Ok(())
  }

  #[test]
  fn directives_are_recorded_in_call_order() -> LuaResult<()> {
    let manifest = eval(
      r#"
        from "golang"
        copy(".", "/src")
        workdir "/src"
        run "make"
        set_exec { cmd = { "make", "test" } }
      "#,
    )?;

    let names: Vec<_> = manifest.directives.iter().map(Directive::name).collect();
    assert_eq!(names, vec!["from", "copy", "workdir", "run", "set_exec"]);
    assert_eq!(
      manifest.directives[4],
      Directive::SetExec(ExecSpec {
        entrypoint: vec![],
        cmd: vec!["make".to_string(), "test".to_string()],
      })
    );
    Ok(())
  }

  #[test]
  fn inside_scopes_run_and_vendor() -> LuaResult<()> {
    let manifest = eval(
      r#"
        inside("/go/src/x", function()
          run "chmod 777 ."
          inside("sub", function()
            vendor { commands = { "vndr" } }
          end)
        end)
        run "ls"
      "#,
    )?;

    assert_eq!(
      manifest.directives[0],
      Directive::Run {
        command: "chmod 777 .".to_string(),
        cwd: Some("/go/src/x".to_string()),
      }
    );
    assert_eq!(
      manifest.directives[1],
      Directive::Vendor {
        guard: "vendor".to_string(),
        commands: vec!["vndr".to_string()],
        cwd: Some("/go/src/x/sub".to_string()),
      }
    );
    assert_eq!(
      manifest.directives[2],
      Directive::Run {
        command: "ls".to_string(),
        cwd: None,
      }
    );
    Ok(())
  }

  #[test]
  fn inside_pops_scope_on_error() -> LuaResult<()> {
    let lua = Lua::new();
    let manifest = Rc::new(RefCell::new(Manifest::default()));
    register_globals(&lua, manifest.clone())?;

    let result = lua.load(r#"inside("/a", function() error("boom") end)"#).exec();
    assert!(result.is_err());

    lua.load(r#"run "ls""#).exec()?;
    assert_eq!(
      manifest.borrow().directives[0],
      Directive::Run {
        command: "ls".to_string(),
        cwd: None,
      }
    );
    Ok(())
  }

  #[test]
  fn chmod_reads_octal_modes() -> LuaResult<()> {
    let manifest = eval(
      r#"
        chmod("/go", "777", { recursive = true })
        chmod(".", 755)
      "#,
    )?;

    assert_eq!(
      manifest.directives[0],
      Directive::Permission(PermissionOp::Chmod {
        path: "/go".to_string(),
        mode: 0o777,
        recursive: true,
      })
    );
    assert_eq!(
      manifest.directives[1],
      Directive::Permission(PermissionOp::Chmod {
        path: ".".to_string(),
        mode: 0o755,
        recursive: false,
      })
    );
    Ok(())
  }

  #[test]
  fn chmod_rejects_non_octal() {
    let err = eval(r#"chmod(".", "789")"#).unwrap_err().to_string();
    assert!(err.contains("invalid octal mode"), "unexpected error: {}", err);
  }

  #[test]
  fn env_accepts_scalars() -> LuaResult<()> {
    let manifest = eval(r#"env { GOPATH = "/go", CGO_ENABLED = 0, DEBUG = true }"#)?;
    let Directive::Env { vars } = &manifest.directives[0] else {
      panic!("expected env directive");
    };
    assert_eq!(vars["GOPATH"], "/go");
    assert_eq!(vars["CGO_ENABLED"], "0");
    assert_eq!(vars["DEBUG"], "true");
    Ok(())
  }

  #[test]
  fn group_and_tag() -> LuaResult<()> {
    let manifest = eval(
      r#"
        group("docker", 999)
        add_to_group("nobody", "docker")
        tag "overmount:latest"
      "#,
    )?;
    assert_eq!(manifest.directives.len(), 2);
    assert_eq!(manifest.tags, vec!["overmount:latest"]);
    Ok(())
  }

  #[test]
  fn getenv_returns_empty_for_unset() -> LuaResult<()> {
    let lua = Lua::new();
    register_globals(&lua, Rc::new(RefCell::new(Manifest::default())))?;
    let value: String = lua
      .load(r#"return getenv("BOXWRIGHT_SURELY_UNSET_VARIABLE")"#)
      .eval()?;
    assert_eq!(value, "");
    Ok(())
  }
}
