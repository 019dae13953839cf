#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{PackArgs, PackSettings};
pub use toml_config::PackTomlConfig;
