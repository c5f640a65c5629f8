pub mod cli;
pub mod navigator;
pub mod session;

pub use cli::{Cli, Commands, Overrides};
