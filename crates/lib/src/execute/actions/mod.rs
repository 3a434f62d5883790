//! Per-instruction actions used by the executor.

pub mod cmd;
pub mod copy;
pub mod permission;

pub use cmd::execute_cmd;
pub use copy::copy_into;
pub use permission::{add_user_to_group, chmod, create_group};
