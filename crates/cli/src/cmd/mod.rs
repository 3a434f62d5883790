mod build;
mod check;
mod info;
mod plan;
mod render;

pub use build::{BuildArgs, cmd_build};
pub use check::cmd_check;
pub use info::cmd_info;
pub use plan::cmd_plan;
pub use render::cmd_render;
