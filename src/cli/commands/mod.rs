pub mod env;
pub mod plan;

pub use env::{EnvCommands, handle_env_command};
pub use plan::{PlanCommands, handle_plan_command};
