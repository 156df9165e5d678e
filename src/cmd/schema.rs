//! JSON Schema generation for CLI output types.
//!
//! Schemas are generated with schemars for every command that supports
//! --json output.

use schemars::{schema_for, Schema};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Every --json output schema, keyed by command name.
/// BTreeMap for deterministic ordering.
pub fn all_schemas() -> BTreeMap<&'static str, Schema> {
    let mut schemas = BTreeMap::new();

    schemas.insert("idmap", schema_for!(dump_migrate::idmap::IdMapStats));
    schemas.insert("inspect", schema_for!(super::inspect::InspectJsonOutput));
    schemas.insert("migrate", schema_for!(dump_migrate::migrate::MigrationSummary));

    schemas
}

pub fn run(name: Option<String>, output: Option<PathBuf>) -> anyhow::Result<()> {
    let mut schemas = all_schemas();
    let selected: Vec<(&'static str, Schema)> = match name {
        Some(name) => match schemas.remove_entry(name.as_str()) {
            Some(entry) => vec![entry],
            None => anyhow::bail!(
                "unknown schema '{}'; available: {}",
                name,
                all_schemas().keys().copied().collect::<Vec<_>>().join(", ")
            ),
        },
        None => schemas.into_iter().collect(),
    };

    match output {
        Some(dir) => {
            fs::create_dir_all(&dir)?;
            for (name, schema) in &selected {
                let path = dir.join(format!("{}.schema.json", name));
                fs::write(&path, serde_json::to_string_pretty(schema)? + "\n")?;
                eprintln!("Wrote {}", path.display());
            }
        }
        None if selected.len() == 1 => {
            println!("{}", serde_json::to_string_pretty(&selected[0].1)?);
        }
        None => {
            let all: BTreeMap<_, _> = selected.into_iter().collect();
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
    }
    Ok(())
}
