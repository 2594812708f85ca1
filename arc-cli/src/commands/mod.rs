//! CLI command implementations

pub mod config;
pub mod promote;
pub mod solve;
pub mod units;

pub use config::{init_config_command, validate_config_command};
pub use promote::promote_command;
pub use solve::solve_command;
pub use units::units_command;
