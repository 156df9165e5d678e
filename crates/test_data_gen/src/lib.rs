//! Test data generator for dump-migrate tests and benchmarks.
//!
//! Generates deterministic, FK-consistent marketplace dumps in the shape
//! mysqldump writes them.
//!
//! # Example
//!
//! ```rust
//! use test_data_gen::{Generator, Scale};
//!
//! let data = Generator::new(42, Scale::Small).generate();
//! let sql = data.to_mysql_string(100);
//! assert!(sql.contains("INSERT INTO `users` VALUES"));
//! ```

pub mod fake;
pub mod generator;

pub use generator::{GeneratedData, Generator, Scale, SqlValue, TableData};
