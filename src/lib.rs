//! Parse MySQL dumps into typed rows and migrate them into denormalised
//! documents whose identifiers stay stable across runs.

pub mod config;
pub mod diagnostics;
pub mod dump;
pub mod error;
pub mod idmap;
pub mod logging;
pub mod migrate;
pub mod parser;
pub mod progress;
pub mod schema;
pub mod sink;
pub mod transform;

pub use error::{Error, Result};
