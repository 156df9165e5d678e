mod idmap;
mod inspect;
mod migrate;
mod schema;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dump-migrate")]
#[command(author = "Helge Sverre <helge.sverre@gmail.com>")]
#[command(version)]
#[command(about = "Migrate a MySQL dump into documents with stable cross-run identifiers", long_about = None)]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a dump, transform its rows and write one JSONL file per collection
    Migrate {
        /// Input SQL dump (supports .gz, .bz2, .xz, .zst compression)
        file: Option<PathBuf>,

        /// Output directory for collections, diagnostics and the id map
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// YAML config file; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Identifier map to load and update (default: <output>/id-map.json)
        #[arg(long)]
        id_map: Option<PathBuf>,

        /// Diagnostics file to append to (default: <output>/migration-diagnostics.log)
        #[arg(long)]
        diagnostics: Option<PathBuf>,

        /// Only migrate specific tables (comma-separated)
        #[arg(short, long)]
        tables: Option<String>,

        /// Namespace UUID for stable identifiers
        #[arg(long)]
        namespace: Option<Uuid>,

        /// Seed mixed into every stable identifier
        #[arg(long)]
        seed: Option<String>,

        /// Documents per output batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Treat unquoted TRUE/FALSE as booleans
        #[arg(long)]
        detect_booleans: bool,

        /// Parse and transform without writing collections or the id map
        #[arg(long)]
        dry_run: bool,

        /// Show progress while reading the dump
        #[arg(short, long)]
        progress: bool,

        /// Output the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a dump and report what each table yielded, without transforming
    Inspect {
        /// Input SQL dump (supports .gz, .bz2, .xz, .zst compression)
        file: PathBuf,

        /// Only inspect specific tables (comma-separated; default: every table in the dump)
        #[arg(short, long)]
        tables: Option<String>,

        /// Treat unquoted TRUE/FALSE as booleans
        #[arg(long)]
        detect_booleans: bool,

        /// Show progress while reading the dump
        #[arg(short, long)]
        progress: bool,

        /// Output results as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },

    /// Query a persisted identifier map
    Idmap {
        #[command(subcommand)]
        command: IdmapCommand,
    },

    /// Print JSON schemas for the --json outputs
    Schema {
        /// Schema to print (inspect, migrate, idmap); all when omitted
        name: Option<String>,

        /// Write <name>.schema.json files to this directory instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum IdmapCommand {
    /// Print the stable id of a source row
    Get {
        /// Identifier map file
        #[arg(short, long)]
        map: PathBuf,

        /// Entity type (table name, or "listings")
        entity_type: String,

        /// Source id as it appears in the dump
        source_id: String,
    },

    /// Print the entity type and source id behind a stable id
    Reverse {
        /// Identifier map file
        #[arg(short, long)]
        map: PathBuf,

        id: Uuid,
    },

    /// Print mapping counts per entity type
    Stats {
        /// Identifier map file
        #[arg(short, long)]
        map: PathBuf,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Migrate {
            file,
            output,
            config,
            id_map,
            diagnostics,
            tables,
            namespace,
            seed,
            batch_size,
            detect_booleans,
            dry_run,
            progress,
            json,
        } => migrate::run(migrate::MigrateArgs {
            file,
            output,
            config,
            id_map,
            diagnostics,
            tables,
            namespace,
            seed,
            batch_size,
            detect_booleans,
            dry_run,
            progress,
            json,
        }),
        Commands::Inspect {
            file,
            tables,
            detect_booleans,
            progress,
            json,
        } => inspect::run(file, tables, detect_booleans, progress, json),
        Commands::Idmap { command } => match command {
            IdmapCommand::Get {
                map,
                entity_type,
                source_id,
            } => idmap::get(map, entity_type, source_id),
            IdmapCommand::Reverse { map, id } => idmap::reverse(map, id),
            IdmapCommand::Stats { map, json } => idmap::stats(map, json),
        },
        Commands::Schema { name, output } => schema::run(name, output),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "dump-migrate",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}

/// Split a comma-separated table list, dropping empty entries.
pub(crate) fn split_tables(list: &str) -> Vec<String> {
    list.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_split_tables() {
        assert_eq!(split_tables(" users, ,plans "), vec!["users", "plans"]);
        assert!(split_tables("").is_empty());
    }

    #[test]
    fn test_parse_migrate_flags() {
        let cli = Cli::parse_from([
            "dump-migrate",
            "-vv",
            "migrate",
            "dump.sql",
            "--tables",
            "users",
            "--dry-run",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Migrate {
                file,
                tables,
                dry_run,
                ..
            } => {
                assert_eq!(file, Some(PathBuf::from("dump.sql")));
                assert_eq!(tables.as_deref(), Some("users"));
                assert!(dry_run);
            }
            _ => panic!("expected migrate"),
        }
    }
}
