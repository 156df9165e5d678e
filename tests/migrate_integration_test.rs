use dump_migrate::config::MigrationConfig;
use dump_migrate::idmap::IdMapper;
use dump_migrate::migrate;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/marketplace.sql")
}

fn config_for(dump: PathBuf, out: &Path) -> MigrationConfig {
    MigrationConfig {
        dump,
        output_dir: out.to_path_buf(),
        batch_size: 2,
        ..Default::default()
    }
}

fn read_jsonl(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_full_migration_writes_collections() {
    let dir = TempDir::new().unwrap();
    let summary = migrate::run(&config_for(fixture(), dir.path())).unwrap();

    assert_eq!(summary.tables_parsed, 13);
    assert!(summary.empty_tables.is_empty(), "{:?}", summary.empty_tables);
    assert_eq!(summary.collections.len(), 11);
    assert_eq!(summary.collections["users"].written, 4);
    assert_eq!(summary.collections["listings"].written, 5);
    assert_eq!(summary.collections["listings"].dangling_references, 1);
    assert_eq!(summary.collections["messages"].written, 3);
    assert_eq!(summary.total_dangling(), 1);
    assert_eq!(summary.mappings_loaded, 0);

    for name in summary.collections.keys() {
        let path = dir.path().join(format!("{}.jsonl", name));
        assert!(path.exists(), "missing {}", path.display());
    }

    let users = read_jsonl(&dir.path().join("users.jsonl"));
    assert_eq!(users[0]["email"], "ann@example.com");
    assert_eq!(users[1]["last_name"], "O'Neil");
    assert_eq!(users[3]["role"], "admin");

    let listings = read_jsonl(&dir.path().join("listings.jsonl"));
    let kinds: Vec<&str> = listings.iter().map(|l| l["kind"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["business", "business", "franchise", "franchise", "investor"]);
    assert_eq!(listings[0]["industry"], "Food & Beverage");
}

#[test]
fn test_references_resolve_to_written_ids() {
    let dir = TempDir::new().unwrap();
    migrate::run(&config_for(fixture(), dir.path())).unwrap();

    let users = read_jsonl(&dir.path().join("users.jsonl"));
    let listings = read_jsonl(&dir.path().join("listings.jsonl"));
    let chatrooms = read_jsonl(&dir.path().join("chatrooms.jsonl"));

    // Corner Cafe is owned by Ann
    assert_eq!(listings[0]["owner_id"], users[0]["id"]);
    // First chatroom is about Corner Cafe, second about the Burger Co franchise
    assert_eq!(chatrooms[0]["listing_id"], listings[0]["id"]);
    assert_eq!(chatrooms[1]["listing_id"], listings[2]["id"]);
}

#[test]
fn test_second_run_reuses_identifier_map() {
    let dir = TempDir::new().unwrap();
    let config = config_for(fixture(), dir.path());

    let first = migrate::run(&config).unwrap();
    let first_users = read_jsonl(&dir.path().join("users.jsonl"));
    assert!(config.id_map_path().exists());

    let second = migrate::run(&config).unwrap();
    let second_users = read_jsonl(&dir.path().join("users.jsonl"));

    assert_eq!(second.mappings_loaded, first.id_map.total);
    assert_eq!(second.id_map.total, first.id_map.total);
    assert_eq!(first_users, second_users);

    let ids = IdMapper::open(&config.id_map_path(), config.listing_aliases.clone()).unwrap();
    let ann = first_users[0]["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(ids.get("users", 1), Some(ann));
}

#[test]
fn test_seed_changes_ids() {
    let plain_dir = TempDir::new().unwrap();
    let seeded_dir = TempDir::new().unwrap();
    let mut seeded = config_for(fixture(), seeded_dir.path());
    seeded.seed = "staging".into();

    migrate::run(&config_for(fixture(), plain_dir.path())).unwrap();
    migrate::run(&seeded).unwrap();

    let a = read_jsonl(&plain_dir.path().join("plans.jsonl"));
    let b = read_jsonl(&seeded_dir.path().join("plans.jsonl"));
    assert_ne!(a[0]["id"], b[0]["id"]);
    assert_eq!(a[0]["name"], b[0]["name"]);
}

#[test]
fn test_dry_run_writes_only_diagnostics() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(fixture(), dir.path());
    config.dry_run = true;

    let summary = migrate::run(&config).unwrap();
    assert!(summary.dry_run);
    assert_eq!(summary.collections["plans"].written, 2);
    assert!(summary.id_map_path.is_none());
    assert!(!config.id_map_path().exists());
    assert!(!dir.path().join("users.jsonl").exists());
    assert!(config.diagnostics_path().exists());
}

#[test]
fn test_table_subset() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(fixture(), dir.path());
    config.tables = vec!["states".into(), "cities".into(), "orders".into()];

    let summary = migrate::run(&config).unwrap();
    assert_eq!(
        summary.collections.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["cities", "states"]
    );
    assert_eq!(summary.empty_tables, vec!["orders"]);

    let log = fs::read_to_string(config.diagnostics_path()).unwrap();
    assert!(log.contains("[orders]"));
    assert!(log.contains("schema: not found"));
}

#[test]
fn test_missing_dump_is_fatal_and_logged() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path().join("nope.sql"), dir.path());

    let err = migrate::run(&config).unwrap_err();
    assert!(format!("{:#}", err).contains("nope.sql"));

    let log = fs::read_to_string(config.diagnostics_path()).unwrap();
    assert!(log.contains("FATAL"));
    assert!(!config.id_map_path().exists());
}

#[test]
fn test_diagnostics_are_appended_per_run() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(fixture(), dir.path());
    config.dry_run = true;

    migrate::run(&config).unwrap();
    let once = fs::read_to_string(config.diagnostics_path()).unwrap();
    migrate::run(&config).unwrap();
    let twice = fs::read_to_string(config.diagnostics_path()).unwrap();

    assert!(twice.starts_with(&once));
    assert!(twice.len() > once.len());
}

#[test]
fn test_gzip_dump() {
    let dir = TempDir::new().unwrap();
    let gz_path = dir.path().join("marketplace.sql.gz");
    let mut encoder = GzEncoder::new(fs::File::create(&gz_path).unwrap(), Compression::default());
    encoder.write_all(&fs::read(fixture()).unwrap()).unwrap();
    encoder.finish().unwrap();

    let out = dir.path().join("out");
    let plain = migrate::run(&config_for(fixture(), &dir.path().join("plain"))).unwrap();
    let gz = migrate::run(&config_for(gz_path, &out)).unwrap();

    assert_eq!(gz.rows_parsed, plain.rows_parsed);
    assert_eq!(gz.dump_sha256, plain.dump_sha256);
    assert_eq!(
        read_jsonl(&out.join("users.jsonl")),
        read_jsonl(&dir.path().join("plain").join("users.jsonl"))
    );
}
