//! Build plans.
//!
//! [`evaluate`] is the manifest interpreter: it walks the declared directives
//! top to bottom, checks them against the build state established so far, and
//! produces a [`BuildPlan`] with every working directory resolved. Nothing is
//! executed here; see [`crate::execute`] for that.

pub mod dockerfile;
mod evaluate;
mod path;
mod types;

pub use evaluate::{ManifestError, evaluate};
pub use path::{is_established, resolve};
pub use types::*;
