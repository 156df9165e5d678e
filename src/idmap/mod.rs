//! Deterministic cross-run identifier mapping.
//!
//! Every entity gets a stable id derived from its entity type and source
//! primary key with a name-based (v5) UUID, so independently migrated
//! collections reference each other without coordination. The map can be
//! persisted and reloaded to pin ids across runs.
//!
//! Listing variants (`businesses`, `franchise`, `investors` by default) are
//! also mirrored into the consolidated `listings` namespace under the same
//! source id. When two variants share a source id, the variant listed first
//! in the alias list owns the consolidated entry, whichever registered first.
//!
//! All operations take `&self`; the mapper is shared by reference between
//! concurrent transforms. Lock order is always forward, then consolidated,
//! then reverse.

mod persist;
mod source_id;

pub use persist::{IdMapFile, IdMapMetadata};
pub use source_id::{IntoSourceId, SourceId};

use crate::error::{Error, Result};
use ahash::AHashSet;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: Uuid = Uuid::from_u128(0x5d0c_9a71_3e2f_4b86_a4c1_7f3b_92d0_e615);

/// Entity type that listing variants are mirrored into.
pub const CONSOLIDATED_TYPE: &str = "listings";

pub const DEFAULT_LISTING_ALIASES: [&str; 3] = ["businesses", "franchise", "investors"];

#[derive(Debug, Clone)]
pub struct IdMapperConfig {
    pub namespace: Uuid,
    /// Mixed into every id name; empty means no seed
    pub seed: String,
    /// Entity types mirrored into [`CONSOLIDATED_TYPE`]
    pub listing_aliases: Vec<String>,
}

impl Default for IdMapperConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE,
            seed: String::new(),
            listing_aliases: DEFAULT_LISTING_ALIASES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Mapping counts, for `idmap stats`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct IdMapStats {
    pub total: usize,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    pub by_type: BTreeMap<String, usize>,
    pub reverse_entries: usize,
}

type Key = (String, SourceId);

pub struct IdMapper {
    config: IdMapperConfig,
    aliases: AHashSet<String>,
    forward: DashMap<Key, Uuid>,
    /// `listings` entries, direct and mirrored
    consolidated: DashMap<SourceId, Uuid>,
    reverse: DashMap<Uuid, Key>,
}

impl Default for IdMapper {
    fn default() -> Self {
        Self::new(IdMapperConfig::default())
    }
}

impl IdMapper {
    pub fn new(config: IdMapperConfig) -> Self {
        let aliases = config.listing_aliases.iter().cloned().collect();
        Self {
            config,
            aliases,
            forward: DashMap::new(),
            consolidated: DashMap::new(),
            reverse: DashMap::new(),
        }
    }

    /// Open a persisted map with the namespace and seed recorded in it.
    pub fn open(path: &Path, listing_aliases: Vec<String>) -> Result<Self> {
        let file = read_file(path)?;
        let namespace = match file.metadata.namespace.as_deref() {
            Some(ns) => Uuid::parse_str(ns).map_err(|_| Error::IdMapValue {
                path: path.to_path_buf(),
                entity_type: "metadata".into(),
                source_id: "namespace".into(),
                value: ns.to_string(),
            })?,
            None => DEFAULT_NAMESPACE,
        };
        let mapper = Self::new(IdMapperConfig {
            namespace,
            seed: file.metadata.seed.clone().unwrap_or_default(),
            listing_aliases,
        });
        mapper.merge_file(path, file)?;
        Ok(mapper)
    }

    pub fn config(&self) -> &IdMapperConfig {
        &self.config
    }

    pub fn is_alias(&self, entity_type: &str) -> bool {
        self.aliases.contains(entity_type)
    }

    /// The id `(entity_type, source_id)` derives to, ignoring any stored or
    /// pinned mapping.
    pub fn stable_id_for(&self, entity_type: &str, source_id: &SourceId) -> Uuid {
        let name = if self.config.seed.is_empty() {
            format!("{}:{}", entity_type, source_id)
        } else {
            format!("{}:{}:{}", self.config.seed, entity_type, source_id)
        };
        Uuid::new_v5(&self.config.namespace, name.as_bytes())
    }

    /// Return the stored id for the pair, creating it on first use.
    ///
    /// `None` means "no reference" (null, zero or empty source id); nothing is
    /// stored in that case. Concurrent first calls for one key all observe
    /// the same id.
    pub fn get_or_create(&self, entity_type: &str, source: impl IntoSourceId) -> Option<Uuid> {
        let sid = source.into_source_id()?;

        if entity_type == CONSOLIDATED_TYPE {
            let id = match self.consolidated.entry(sid) {
                Entry::Occupied(e) => *e.get(),
                Entry::Vacant(e) => {
                    let id = self.stable_id_for(entity_type, e.key());
                    self.reverse
                        .insert(id, (entity_type.to_string(), e.key().clone()));
                    *e.insert(id)
                }
            };
            return Some(id);
        }

        let id = match self.forward.entry((entity_type.to_string(), sid)) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let (ty, sid) = e.key();
                let id = self.stable_id_for(ty, sid);
                self.reverse.insert(id, e.key().clone());
                if self.is_alias(ty) {
                    self.mirror(ty, sid, id);
                }
                *e.insert(id)
            }
        };
        Some(id)
    }

    /// Read-only lookup. Aliased types fall back to the consolidated
    /// namespace when they have no entry of their own.
    pub fn get(&self, entity_type: &str, source: impl IntoSourceId) -> Option<Uuid> {
        let sid = source.into_source_id()?;

        if entity_type == CONSOLIDATED_TYPE {
            return self.consolidated.get(&sid).map(|r| *r);
        }

        let key = (entity_type.to_string(), sid);
        if let Some(id) = self.forward.get(&key).map(|r| *r) {
            return Some(id);
        }
        if self.is_alias(entity_type) {
            return self.consolidated.get(&key.1).map(|r| *r);
        }
        None
    }

    /// Pin a stable id, overwriting any existing mapping for the pair.
    ///
    /// Returns `false` without storing anything when the source id is "no
    /// reference".
    pub fn set(&self, entity_type: &str, source: impl IntoSourceId, id: Uuid) -> bool {
        let Some(sid) = source.into_source_id() else {
            return false;
        };

        let previous = if entity_type == CONSOLIDATED_TYPE {
            self.consolidated.insert(sid.clone(), id)
        } else {
            let previous = self.forward.insert((entity_type.to_string(), sid.clone()), id);
            if self.is_alias(entity_type) {
                self.consolidated.insert(sid.clone(), id);
            }
            previous
        };

        if let Some(old) = previous.filter(|old| *old != id) {
            self.reverse
                .remove_if(&old, |_, (t, s)| t == entity_type && *s == sid);
        }
        self.reverse.insert(id, (entity_type.to_string(), sid));
        true
    }

    fn alias_rank(&self, entity_type: &str) -> Option<usize> {
        self.config
            .listing_aliases
            .iter()
            .position(|a| a == entity_type)
    }

    fn mirror(&self, entity_type: &str, sid: &SourceId, id: Uuid) {
        match self.consolidated.entry(sid.clone()) {
            Entry::Vacant(e) => {
                e.insert(id);
            }
            Entry::Occupied(mut e) => {
                let existing = *e.get();
                if existing == id {
                    return;
                }
                let holder = self.reverse.get(&existing).map(|r| r.value().0.clone());
                let replace = match (
                    self.alias_rank(entity_type),
                    holder.as_deref().and_then(|h| self.alias_rank(h)),
                ) {
                    (Some(new), Some(old)) => new < old,
                    _ => false,
                };
                warn!(
                    entity_type,
                    source_id = %sid,
                    holder = holder.as_deref().unwrap_or("listings"),
                    "source id shared by two listing variants; the earlier variant keeps it"
                );
                if replace {
                    e.insert(id);
                }
            }
        }
    }

    /// Entity type and source id a stable id was created for.
    pub fn reverse_lookup(&self, id: &Uuid) -> Option<(String, SourceId)> {
        self.reverse.get(id).map(|r| r.value().clone())
    }

    /// Distinct stored mappings. A `listings` entry that mirrors a variant's
    /// own entry is counted once, under the variant.
    pub fn len(&self) -> usize {
        let consolidated: Vec<(SourceId, Uuid)> = self
            .consolidated
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect();
        let direct = consolidated
            .iter()
            .filter(|(sid, id)| !self.is_mirror(sid, id))
            .count();
        self.forward.len() + direct
    }

    fn is_mirror(&self, sid: &SourceId, id: &Uuid) -> bool {
        self.config.listing_aliases.iter().any(|alias| {
            self.forward
                .get(&(alias.clone(), sid.clone()))
                .is_some_and(|r| *r == *id)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty() && self.consolidated.is_empty()
    }

    pub fn count_for(&self, entity_type: &str) -> usize {
        if entity_type == CONSOLIDATED_TYPE {
            self.consolidated.len()
        } else {
            self.forward.iter().filter(|r| r.key().0 == entity_type).count()
        }
    }

    /// Sorted copy of every mapping: entity type -> source id -> stable id.
    pub fn snapshot(&self) -> BTreeMap<String, BTreeMap<SourceId, Uuid>> {
        let mut out: BTreeMap<String, BTreeMap<SourceId, Uuid>> = BTreeMap::new();
        for r in self.forward.iter() {
            let (ty, sid) = r.key();
            out.entry(ty.clone()).or_default().insert(sid.clone(), *r.value());
        }
        if !self.consolidated.is_empty() {
            let listings = out.entry(CONSOLIDATED_TYPE.to_string()).or_default();
            for r in self.consolidated.iter() {
                listings.insert(r.key().clone(), *r.value());
            }
        }
        out
    }

    pub fn stats(&self) -> IdMapStats {
        let by_type = self
            .snapshot()
            .into_iter()
            .map(|(ty, m)| (ty, m.len()))
            .collect();
        IdMapStats {
            total: self.len(),
            namespace: self.config.namespace.to_string(),
            seed: (!self.config.seed.is_empty()).then(|| self.config.seed.clone()),
            by_type,
            reverse_entries: self.reverse.len(),
        }
    }

    /// Write the whole map to `path` atomically.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let io_err = |source| Error::IdMapIo {
            path: path.to_path_buf(),
            source,
        };

        let snapshot = self.snapshot();
        let mut file = IdMapFile {
            metadata: IdMapMetadata {
                last_updated: chrono::Utc::now().to_rfc3339(),
                total_mappings: self.len(),
                namespace: Some(self.config.namespace.to_string()),
                seed: (!self.config.seed.is_empty()).then(|| self.config.seed.clone()),
            },
            ..Default::default()
        };
        for (ty, entries) in snapshot {
            file.mappings.insert(
                ty,
                entries
                    .into_iter()
                    .map(|(sid, id)| (sid.to_string(), id.to_string()))
                    .collect(),
            );
        }
        for r in self.reverse.iter() {
            let (ty, sid) = r.value();
            file.reverse
                .insert(r.key().to_string(), (ty.clone(), sid.to_string()));
        }

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        {
            let mut w = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut w, &file)
                .map_err(|e| io_err(std::io::Error::from(e)))?;
            w.write_all(b"\n").map_err(io_err)?;
            w.flush().map_err(io_err)?;
        }
        tmp.persist(path).map_err(|e| io_err(e.error))?;

        info!(path = %path.display(), mappings = file.metadata.total_mappings, "identifier map persisted");
        Ok(())
    }

    /// Merge a persisted map into this one. In-memory entries win over the
    /// file's; the reverse index is rebuilt afterwards. Returns the number of
    /// distinct mappings added.
    pub fn load(&self, path: &Path) -> Result<usize> {
        let file = read_file(path)?;
        self.merge_file(path, file)
    }

    /// Like [`IdMapper::load`], but a missing file adds nothing.
    pub fn load_if_exists(&self, path: &Path) -> Result<usize> {
        if !path.exists() {
            debug!(path = %path.display(), "no identifier map to load");
            return Ok(0);
        }
        self.load(path)
    }

    fn merge_file(&self, path: &Path, file: IdMapFile) -> Result<usize> {
        if let Some(ns) = &file.metadata.namespace {
            if *ns != self.config.namespace.to_string() {
                warn!(
                    path = %path.display(),
                    file_namespace = %ns,
                    namespace = %self.config.namespace,
                    "identifier map was written with a different namespace; its ids stay pinned"
                );
            }
        }

        let before = self.len();

        // The file's own `listings` entries go in first so mirrors never
        // displace them
        let mut restored: AHashSet<SourceId> = AHashSet::new();
        if let Some(entries) = file.mappings.get(CONSOLIDATED_TYPE) {
            for (raw_sid, raw_id) in entries {
                if let Some((sid, id)) = parse_entry(path, CONSOLIDATED_TYPE, raw_sid, raw_id)? {
                    restored.insert(sid.clone());
                    insert_if_vacant(&self.consolidated, sid, id);
                }
            }
        }

        // Aliases in rank order, so an earlier variant claims a free slot first
        let ranked = self
            .config
            .listing_aliases
            .iter()
            .filter_map(|a| file.mappings.get_key_value(a.as_str()));
        let rest = file
            .mappings
            .iter()
            .filter(|(ty, _)| *ty != CONSOLIDATED_TYPE && !self.is_alias(ty));

        for (ty, entries) in ranked.chain(rest) {
            for (raw_sid, raw_id) in entries {
                let Some((sid, id)) = parse_entry(path, ty, raw_sid, raw_id)? else {
                    continue;
                };
                if insert_if_vacant(&self.forward, (ty.clone(), sid.clone()), id)
                    && self.is_alias(ty)
                    && !restored.contains(&sid)
                {
                    insert_if_vacant(&self.consolidated, sid, id);
                }
            }
        }

        let added = self.len().saturating_sub(before);
        self.rebuild_reverse();
        info!(path = %path.display(), added, total = self.len(), "identifier map loaded");
        Ok(added)
    }

    /// Rebuild the reverse index from the forward maps. Direct entries take
    /// precedence over consolidated mirrors of the same id.
    fn rebuild_reverse(&self) {
        self.reverse.clear();
        for r in self.forward.iter() {
            self.reverse.insert(*r.value(), r.key().clone());
        }
        for r in self.consolidated.iter() {
            self.reverse
                .entry(*r.value())
                .or_insert_with(|| (CONSOLIDATED_TYPE.to_string(), r.key().clone()));
        }
    }
}

fn insert_if_vacant<K: Eq + std::hash::Hash>(map: &DashMap<K, Uuid>, key: K, id: Uuid) -> bool {
    match map.entry(key) {
        Entry::Vacant(e) => {
            e.insert(id);
            true
        }
        Entry::Occupied(_) => false,
    }
}

/// Parse one persisted `source id -> stable id` pair. `Ok(None)` skips an
/// entry whose source id is "no reference".
fn parse_entry(
    path: &Path,
    entity_type: &str,
    raw_sid: &str,
    raw_id: &str,
) -> Result<Option<(SourceId, Uuid)>> {
    let Some(sid) = SourceId::parse(raw_sid) else {
        warn!(entity_type, source_id = %raw_sid, "skipping mapping without a source id");
        return Ok(None);
    };
    let id = Uuid::parse_str(raw_id).map_err(|_| Error::IdMapValue {
        path: path.to_path_buf(),
        entity_type: entity_type.to_string(),
        source_id: raw_sid.to_string(),
        value: raw_id.to_string(),
    })?;
    Ok(Some((sid, id)))
}

fn read_file(path: &Path) -> Result<IdMapFile> {
    let file = File::open(path).map_err(|source| Error::IdMapIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::IdMapFormat {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use tempfile::TempDir;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let m = IdMapper::default();
        let a = m.get_or_create("users", 7).unwrap();
        let b = m.get_or_create("users", "7").unwrap();
        assert_eq!(a, b);
        assert_eq!(m.count_for("users"), 1);
        assert_eq!(a.get_version_num(), 5);
    }

    #[test]
    fn test_distinct_pairs_distinct_ids() {
        let m = IdMapper::default();
        let u = m.get_or_create("users", 1).unwrap();
        let p = m.get_or_create("plans", 1).unwrap();
        let u2 = m.get_or_create("users", 2).unwrap();
        assert_ne!(u, p);
        assert_ne!(u, u2);
    }

    #[test]
    fn test_deterministic_across_instances() {
        let a = IdMapper::default().get_or_create("plans", 3);
        let b = IdMapper::default().get_or_create("plans", 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_and_namespace_change_ids() {
        let plain = IdMapper::default().get_or_create("users", 1);
        let seeded = IdMapper::new(IdMapperConfig {
            seed: "staging".into(),
            ..Default::default()
        })
        .get_or_create("users", 1);
        let other_ns = IdMapper::new(IdMapperConfig {
            namespace: Uuid::NAMESPACE_OID,
            ..Default::default()
        })
        .get_or_create("users", 1);
        assert_ne!(plain, seeded);
        assert_ne!(plain, other_ns);
    }

    #[test]
    fn test_zero_and_null_are_no_reference() {
        let m = IdMapper::default();
        assert_eq!(m.get_or_create("users", 0), None);
        assert_eq!(m.get_or_create("users", "0"), None);
        assert_eq!(m.get_or_create("users", None::<i64>), None);
        assert_eq!(m.get("users", 0), None);
        assert!(m.is_empty());
        assert!(!m.set("users", 0, Uuid::nil()));
    }

    #[test]
    fn test_alias_mirrors_into_listings() {
        let m = IdMapper::default();
        let x = m.get_or_create("businesses", 7).unwrap();
        assert_eq!(m.get("listings", 7), Some(x));
        assert_eq!(m.get_or_create("listings", 7), Some(x));
        assert_eq!(m.count_for("listings"), 1);
        assert_eq!(m.reverse_lookup(&x).unwrap().0, "businesses");
    }

    #[test]
    fn test_alias_get_falls_back_to_consolidated() {
        let m = IdMapper::default();
        let l = m.get_or_create("listings", 12).unwrap();
        assert_eq!(m.get("franchise", 12), Some(l));
        assert_eq!(m.get("users", 12), None);
    }

    #[test]
    fn test_conflicting_mirror_prefers_earlier_variant() {
        let m = IdMapper::default();
        let b = m.get_or_create("businesses", 5).unwrap();
        let f = m.get_or_create("franchise", 5).unwrap();
        assert_ne!(b, f);
        assert_eq!(m.get("listings", 5), Some(b));
        assert_eq!(m.get("franchise", 5), Some(f));

        // Registration order does not matter
        let m = IdMapper::default();
        let f = m.get_or_create("franchise", 5).unwrap();
        let b = m.get_or_create("businesses", 5).unwrap();
        assert_eq!(m.get("listings", 5), Some(b));
        assert_eq!(m.get("franchise", 5), Some(f));
    }

    #[test]
    fn test_direct_listing_keeps_mirror_slot() {
        let m = IdMapper::default();
        let l = m.get_or_create("listings", 8).unwrap();
        let b = m.get_or_create("businesses", 8).unwrap();
        assert_ne!(l, b);
        assert_eq!(m.get("listings", 8), Some(l));
    }

    #[test]
    fn test_len_counts_mirrors_once() {
        let m = IdMapper::default();
        m.get_or_create("businesses", 1);
        m.get_or_create("franchise", 1);
        m.get_or_create("listings", 2);
        m.get_or_create("users", 1);
        // businesses/1, franchise/1, listings/2, users/1
        assert_eq!(m.len(), 4);
        assert_eq!(m.count_for("listings"), 2);
    }

    #[test]
    fn test_set_overwrites_and_updates_reverse() {
        let m = IdMapper::default();
        let old = m.get_or_create("investors", 9).unwrap();
        let pinned = Uuid::from_u128(42);
        assert!(m.set("investors", 9, pinned));
        assert_eq!(m.get("investors", 9), Some(pinned));
        assert_eq!(m.get("listings", 9), Some(pinned));
        assert!(m.reverse_lookup(&old).is_none());
        assert_eq!(
            m.reverse_lookup(&pinned),
            Some(("investors".to_string(), SourceId::parse("9").unwrap()))
        );
    }

    #[test]
    fn test_persist_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("maps").join("id-map.json");

        let m = IdMapper::default();
        let u = m.get_or_create("users", 1).unwrap();
        let b = m.get_or_create("businesses", 2).unwrap();
        m.set("plans", 3, Uuid::from_u128(3));
        m.persist(&path).unwrap();

        let fresh = IdMapper::default();
        assert_eq!(m.len(), 3);
        assert_eq!(fresh.load(&path).unwrap(), 3);
        assert_eq!(fresh.get("users", 1), Some(u));
        assert_eq!(fresh.get("businesses", 2), Some(b));
        assert_eq!(fresh.get("listings", 2), Some(b));
        assert_eq!(fresh.get("plans", 3), Some(Uuid::from_u128(3)));
        assert_eq!(fresh.len(), m.len());
        assert_eq!(fresh.reverse_lookup(&b).unwrap().0, "businesses");

        // Loading again adds nothing
        assert_eq!(fresh.load(&path).unwrap(), 0);
    }

    #[test]
    fn test_load_merges_with_memory_winning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("id-map.json");

        let first = IdMapper::default();
        first.set("users", 1, Uuid::from_u128(1));
        first.set("users", 2, Uuid::from_u128(2));
        first.persist(&path).unwrap();

        let second = IdMapper::default();
        second.set("users", 1, Uuid::from_u128(100));
        assert_eq!(second.load(&path).unwrap(), 1);
        assert_eq!(second.get("users", 1), Some(Uuid::from_u128(100)));
        assert_eq!(second.get("users", 2), Some(Uuid::from_u128(2)));
        assert!(second.reverse_lookup(&Uuid::from_u128(1)).is_none());
    }

    #[test]
    fn test_open_uses_file_namespace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("id-map.json");
        let m = IdMapper::new(IdMapperConfig {
            namespace: Uuid::NAMESPACE_URL,
            seed: "s".into(),
            ..Default::default()
        });
        let id = m.get_or_create("users", 5).unwrap();
        m.persist(&path).unwrap();

        let opened = IdMapper::open(&path, Vec::new()).unwrap();
        assert_eq!(opened.config().namespace, Uuid::NAMESPACE_URL);
        assert_eq!(opened.get_or_create("users", 6), m.get_or_create("users", 6));
        assert_eq!(opened.get("users", 5), Some(id));
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let dir = TempDir::new().unwrap();
        let m = IdMapper::default();
        assert_eq!(m.load_if_exists(&dir.path().join("none.json")).unwrap(), 0);
        assert!(matches!(
            m.load(&dir.path().join("none.json")),
            Err(Error::IdMapIo { .. })
        ));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(m.load(&bad), Err(Error::IdMapFormat { .. })));

        let bad_id = dir.path().join("bad_id.json");
        std::fs::write(&bad_id, r#"{"mappings":{"users":{"1":"nope"}}}"#).unwrap();
        assert!(matches!(m.load(&bad_id), Err(Error::IdMapValue { .. })));
    }

    #[test]
    fn test_concurrent_get_or_create_single_id() {
        let m = Arc::new(IdMapper::default());
        let barrier = Arc::new(Barrier::new(16));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let m = Arc::clone(&m);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    m.get_or_create("listings", 99).unwrap()
                })
            })
            .collect();
        let ids: AHashSet<Uuid> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(m.count_for("listings"), 1);
    }
}
