mod addon;
mod config;
mod config_git;
mod config_log;

pub use self::addon::*;
pub use self::config::*;
pub use self::config_git::*;
pub use self::config_log::*;
