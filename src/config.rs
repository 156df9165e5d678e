//! YAML configuration for the migrate command.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Command-line flags are applied on top by the CLI.

use crate::dump::ParseOptions;
use crate::error::{Error, Result};
use crate::idmap::{IdMapperConfig, DEFAULT_LISTING_ALIASES, DEFAULT_NAMESPACE};
use crate::parser::LexOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_DIAGNOSTICS_FILE: &str = "migration-diagnostics.log";
pub const DEFAULT_ID_MAP_FILE: &str = "id-map.json";

/// Source tables read by a default migration, in parse order.
pub const DEFAULT_TABLES: [&str; 13] = [
    "users",
    "businesses",
    "franchise",
    "investors",
    "plans",
    "subscriptions",
    "transactions",
    "chatrooms",
    "messages",
    "industries",
    "sub_industries",
    "cities",
    "states",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Dump file to read
    pub dump: PathBuf,
    /// Directory collections, diagnostics and the id map are written to
    pub output_dir: PathBuf,
    /// Tables to parse, in order
    pub tables: Vec<String>,
    /// Entity types mirrored into the consolidated `listings` namespace
    pub listing_aliases: Vec<String>,
    /// Namespace UUID for stable ids
    pub namespace: Option<Uuid>,
    /// String mixed into every stable id
    pub seed: String,
    /// Documents per sink batch
    pub batch_size: usize,
    /// Lex unquoted TRUE/FALSE as booleans
    pub detect_booleans: bool,
    /// Diagnostics report path (default: inside `output_dir`)
    pub diagnostics_file: Option<PathBuf>,
    /// Identifier map path (default: inside `output_dir`)
    pub id_map_file: Option<PathBuf>,
    /// Parse and transform without writing collections or the id map
    pub dry_run: bool,
    /// Show a progress bar while reading the dump
    pub progress: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            dump: PathBuf::new(),
            output_dir: PathBuf::from("migration-output"),
            tables: DEFAULT_TABLES.iter().map(|s| s.to_string()).collect(),
            listing_aliases: DEFAULT_LISTING_ALIASES.iter().map(|s| s.to_string()).collect(),
            namespace: None,
            seed: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            detect_booleans: false,
            diagnostics_file: None,
            id_map_file: None,
            dry_run: false,
            progress: false,
        }
    }
}

impl MigrationConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_yaml(path, &content)
    }

    fn from_yaml(path: &Path, content: &str) -> Result<Self> {
        let config: MigrationConfig =
            serde_yaml_ng::from_str(content).map_err(|e| Error::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(config)
    }

    /// Reject settings no run can succeed with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Error::Config {
            path: PathBuf::from("<effective configuration>"),
            message: message.to_string(),
        };
        if self.batch_size == 0 {
            return Err(invalid("batch_size must be at least 1"));
        }
        if self.tables.is_empty() {
            return Err(invalid("no tables to migrate"));
        }
        if self.dump.as_os_str().is_empty() {
            return Err(invalid("no dump file given"));
        }
        Ok(())
    }

    pub fn diagnostics_path(&self) -> PathBuf {
        self.diagnostics_file
            .clone()
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_DIAGNOSTICS_FILE))
    }

    pub fn id_map_path(&self) -> PathBuf {
        self.id_map_file
            .clone()
            .unwrap_or_else(|| self.output_dir.join(DEFAULT_ID_MAP_FILE))
    }

    pub fn mapper_config(&self) -> IdMapperConfig {
        IdMapperConfig {
            namespace: self.namespace.unwrap_or(DEFAULT_NAMESPACE),
            seed: self.seed.clone(),
            listing_aliases: self.listing_aliases.clone(),
        }
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            lex: LexOptions {
                detect_booleans: self.detect_booleans,
            },
        }
    }
}
