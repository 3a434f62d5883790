//! Manifest types.
//!
//! A manifest is the evaluated result of a Lua build script: the ordered list
//! of directives exactly as they were declared, before any validation.

mod types;

pub use types::*;
