//! boxwright-lib: evaluating and executing container build manifests.
//!
//! A manifest is a Lua script that declares the steps of an image build:
//! - [`manifest`]: the raw, ordered directives a script produces
//! - [`plan`]: validation of those directives into a [`plan::BuildPlan`]
//! - [`execute`]: running a plan against a local build root

pub mod consts;
pub mod eval;
pub mod execute;
pub mod lua;
pub mod manifest;
pub mod plan;
pub mod util;
