//! Lua runtime for build scripts.
//!
//! - [`globals`] - directive functions (`from`, `copy`, `run`, `inside`, ...)
//! - [`runtime`] - VM creation and script loading

pub mod globals;
pub mod runtime;
