use super::split_tables;
use dump_migrate::config::MigrationConfig;
use dump_migrate::migrate::{self, MigrationSummary};
use std::path::PathBuf;
use uuid::Uuid;

pub struct MigrateArgs {
    pub file: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub id_map: Option<PathBuf>,
    pub diagnostics: Option<PathBuf>,
    pub tables: Option<String>,
    pub namespace: Option<Uuid>,
    pub seed: Option<String>,
    pub batch_size: Option<usize>,
    pub detect_booleans: bool,
    pub dry_run: bool,
    pub progress: bool,
    pub json: bool,
}

pub fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let json = args.json;
    let config = effective_config(args)?;

    if !json {
        eprintln!(
            "Migrating {} -> {}{}",
            config.dump.display(),
            config.output_dir.display(),
            if config.dry_run { " (dry run)" } else { "" }
        );
    }

    let summary = migrate::run(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Config file values, overridden by whatever flags were given.
fn effective_config(args: MigrateArgs) -> anyhow::Result<MigrationConfig> {
    let mut config = match &args.config {
        Some(path) => MigrationConfig::load(path)?,
        None => MigrationConfig::default(),
    };

    if let Some(file) = args.file {
        config.dump = file;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if let Some(id_map) = args.id_map {
        config.id_map_file = Some(id_map);
    }
    if let Some(diagnostics) = args.diagnostics {
        config.diagnostics_file = Some(diagnostics);
    }
    if let Some(tables) = args.tables {
        config.tables = split_tables(&tables);
    }
    if let Some(namespace) = args.namespace {
        config.namespace = Some(namespace);
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    config.detect_booleans |= args.detect_booleans;
    config.dry_run |= args.dry_run;
    config.progress = (config.progress || args.progress) && !args.json;

    config.validate()?;
    Ok(config)
}

fn print_summary(summary: &MigrationSummary) {
    println!();
    println!("Migration summary:");
    println!("  Dump: {}", summary.dump);
    println!("  SHA-256: {}", summary.dump_sha256);
    println!(
        "  Parsed: {} tables, {} rows, {} issues",
        summary.tables_parsed, summary.rows_parsed, summary.parse_issues
    );
    if !summary.empty_tables.is_empty() {
        println!("  Empty tables: {}", summary.empty_tables.join(", "));
    }
    println!();
    println!(
        "  {:<16} {:>10} {:>8} {:>9}",
        "collection", "written", "skipped", "dangling"
    );
    for (name, c) in &summary.collections {
        println!(
            "  {:<16} {:>10} {:>8} {:>9}",
            name, c.written, c.skipped, c.dangling_references
        );
    }
    println!();
    println!(
        "  Identifier map: {} mappings ({} loaded)",
        summary.id_map.total, summary.mappings_loaded
    );
    if let Some(path) = &summary.id_map_path {
        println!("  Saved to: {}", path);
    }
    if let Some(dir) = &summary.output_dir {
        println!("  Output: {}", dir);
    }
    println!("  Diagnostics: {}", summary.diagnostics_path);
    println!("  Time: {:.3}s", summary.elapsed_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> MigrateArgs {
        MigrateArgs {
            file: Some(PathBuf::from("dump.sql")),
            output: None,
            config: None,
            id_map: None,
            diagnostics: None,
            tables: None,
            namespace: None,
            seed: None,
            batch_size: None,
            detect_booleans: false,
            dry_run: false,
            progress: true,
            json: false,
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let mut a = args();
        a.tables = Some("users,plans".into());
        a.seed = Some("staging".into());
        a.batch_size = Some(10);
        let config = effective_config(a).unwrap();
        assert_eq!(config.tables, vec!["users", "plans"]);
        assert_eq!(config.seed, "staging");
        assert_eq!(config.batch_size, 10);
        assert!(config.progress);
    }

    #[test]
    fn test_json_disables_progress() {
        let mut a = args();
        a.json = true;
        assert!(!effective_config(a).unwrap().progress);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut a = args();
        a.batch_size = Some(0);
        assert!(effective_config(a).is_err());
    }
}
