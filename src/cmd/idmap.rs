use dump_migrate::idmap::{IdMapper, DEFAULT_LISTING_ALIASES};
use std::path::{Path, PathBuf};
use uuid::Uuid;

fn open(map: &Path) -> anyhow::Result<IdMapper> {
    if !map.exists() {
        anyhow::bail!("identifier map does not exist: {}", map.display());
    }
    let aliases = DEFAULT_LISTING_ALIASES.iter().map(|s| s.to_string()).collect();
    Ok(IdMapper::open(map, aliases)?)
}

pub fn get(map: PathBuf, entity_type: String, source_id: String) -> anyhow::Result<()> {
    let ids = open(&map)?;
    match ids.get(&entity_type, source_id.as_str()) {
        Some(id) => {
            println!("{}", id);
            Ok(())
        }
        None => anyhow::bail!("no mapping for {}/{}", entity_type, source_id.trim()),
    }
}

pub fn reverse(map: PathBuf, id: Uuid) -> anyhow::Result<()> {
    let ids = open(&map)?;
    match ids.reverse_lookup(&id) {
        Some((entity_type, source_id)) => {
            println!("{}\t{}", entity_type, source_id);
            Ok(())
        }
        None => anyhow::bail!("{} is not in {}", id, map.display()),
    }
}

pub fn stats(map: PathBuf, json: bool) -> anyhow::Result<()> {
    let ids = open(&map)?;
    let stats = ids.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Identifier map: {}", map.display());
    println!("  Namespace: {}", stats.namespace);
    if let Some(seed) = &stats.seed {
        println!("  Seed: {}", seed);
    }
    println!("  Mappings: {}", stats.total);
    println!("  Reverse entries: {}", stats.reverse_entries);
    println!();
    for (entity_type, count) in &stats.by_type {
        println!("  {:<20} {:>10}", entity_type, count);
    }
    Ok(())
}
