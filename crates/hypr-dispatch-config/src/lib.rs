//! Configuration parsing for hypr-dispatch
//!
//! This crate handles parsing the KDL configuration file that selects the
//! socket location, reconnection policy and handler modules.

mod error;
mod model;
mod parser;

pub use error::ConfigError;
pub use model::*;
pub use parser::{parse_config, parse_config_str};
