mod error;
mod file;
mod options;

pub use error::{ConfigError, ConfigResult};
pub use file::{plugin_options, OptionValue};
pub use options::{parse_bool, parse_options, PluginOption};
