mod apply;
mod plan;

pub use apply::cmd_apply;
pub use plan::cmd_plan;
