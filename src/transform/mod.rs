//! Entity document builders.
//!
//! Each builder turns one parsed row into a fixed, typed document. Stable ids
//! and every cross-entity reference come from the [`IdMapper`]; builders
//! never fabricate identifiers. A [`TransformContext`] carries the parsed
//! dump, the mapper and lookup indexes for denormalised names.

pub mod billing;
pub mod fields;
pub mod listings;
pub mod lookups;
pub mod messaging;
pub mod users;

use crate::dump::{ParsedDump, Row};
use crate::idmap::{IdMapper, IntoSourceId, SourceId, CONSOLIDATED_TYPE};
use crate::parser::ScalarValue;
use ahash::{AHashMap, AHashSet};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::trace;
use uuid::Uuid;

/// City or state reference with its display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub city_id: Option<Uuid>,
    pub city: Option<String>,
    pub state_id: Option<Uuid>,
    pub state: Option<String>,
}

/// Documents built for one collection.
#[derive(Debug)]
pub struct Built<T> {
    pub collection: &'static str,
    pub docs: Vec<T>,
    /// Rows that produced no document (no usable source id)
    pub skipped: usize,
}

/// Name indexes for lookup tables, keyed by source id.
#[derive(Debug, Default)]
pub struct Lookups {
    pub states: AHashMap<SourceId, String>,
    /// city -> (name, state)
    pub cities: AHashMap<SourceId, (String, Option<SourceId>)>,
    pub industries: AHashMap<SourceId, String>,
    pub sub_industries: AHashMap<SourceId, String>,
    /// industry -> its sub-industries, in dump order
    pub sub_industries_by_industry: AHashMap<SourceId, Vec<SourceId>>,
    /// subscription -> plan
    pub subscription_plans: AHashMap<SourceId, SourceId>,
    /// chatroom -> latest message timestamp (RFC 3339)
    pub last_message_at: AHashMap<SourceId, String>,
}

impl Lookups {
    pub fn build(dump: &ParsedDump) -> Self {
        let mut l = Lookups::default();

        for row in dump.rows("states") {
            if let (Some(id), Some(name)) = (source_id(row), fields::text(row, &["name", "state_name"])) {
                l.states.insert(id, name);
            }
        }
        for row in dump.rows("cities") {
            if let (Some(id), Some(name)) = (source_id(row), fields::text(row, &["name", "city_name"])) {
                l.cities.insert(id, (name, row.value("state_id").into_source_id()));
            }
        }
        for row in dump.rows("industries") {
            if let (Some(id), Some(name)) = (source_id(row), fields::text(row, &["name", "title"])) {
                l.industries.insert(id, name);
            }
        }
        for row in dump.rows("sub_industries") {
            let Some(id) = source_id(row) else {
                continue;
            };
            if let Some(name) = fields::text(row, &["name", "title"]) {
                l.sub_industries.insert(id.clone(), name);
            }
            if let Some(parent) = row.value("industry_id").into_source_id() {
                l.sub_industries_by_industry.entry(parent).or_default().push(id);
            }
        }
        for row in dump.rows("subscriptions") {
            let plan = row.value("plan_id").into_source_id();
            if let (Some(id), Some(plan)) = (source_id(row), plan) {
                l.subscription_plans.insert(id, plan);
            }
        }
        for row in dump.rows("messages") {
            let (Some(room), Some(at)) = (
                row.value("chatroom_id").into_source_id(),
                fields::timestamp(row, &["created_at"]),
            ) else {
                continue;
            };
            // RFC 3339 UTC strings of one format order lexically
            let latest = l.last_message_at.entry(room).or_default();
            if at > *latest {
                *latest = at;
            }
        }

        l
    }
}

/// Shared, read-only state for the builders. `Sync`, so builders for
/// different collections may run on several threads at once.
pub struct TransformContext<'a> {
    pub dump: &'a ParsedDump,
    pub ids: &'a IdMapper,
    pub lookups: Lookups,
    /// Source ids present per parsed table
    known: AHashMap<String, AHashSet<SourceId>>,
    listing_variants: Vec<String>,
    dangling: DashMap<String, usize>,
}

impl<'a> TransformContext<'a> {
    pub fn new(dump: &'a ParsedDump, ids: &'a IdMapper, listing_variants: &[String]) -> Self {
        let mut known: AHashMap<String, AHashSet<SourceId>> = AHashMap::new();
        for table in dump.iter() {
            let set = table
                .rows
                .iter()
                .filter_map(source_id)
                .collect();
            known.insert(table.name.clone(), set);
        }

        let variant_sets: Vec<&AHashSet<SourceId>> = listing_variants
            .iter()
            .filter_map(|v| known.get(v.as_str()))
            .collect();
        if !variant_sets.is_empty() {
            let all: AHashSet<SourceId> = variant_sets.into_iter().flatten().cloned().collect();
            known.insert(CONSOLIDATED_TYPE.to_string(), all);
        }

        Self {
            dump,
            ids,
            lookups: Lookups::build(dump),
            known,
            listing_variants: listing_variants.to_vec(),
            dangling: DashMap::new(),
        }
    }

    pub fn listing_variants(&self) -> &[String] {
        &self.listing_variants
    }

    /// Stable id of the row itself, from its `id` column.
    pub fn own_id(&self, entity_type: &str, row: &Row) -> Option<(SourceId, Uuid)> {
        let sid = source_id(row)?;
        let id = self.ids.get_or_create(entity_type, &sid)?;
        Some((sid, id))
    }

    /// Resolve the first non-empty column among `columns` as a reference to
    /// `target`. "No reference" values give `None`. A reference to a source id
    /// with no row in the parsed target table still gets its stable id and is
    /// counted as dangling for `from`.
    pub fn reference(&self, from: &str, target: &str, row: &Row, columns: &[&str]) -> Option<Uuid> {
        let sid = columns
            .iter()
            .find_map(|c| row.value(c).into_source_id())?;
        self.reference_id(from, target, &sid)
    }

    pub fn reference_id(&self, from: &str, target: &str, sid: &SourceId) -> Option<Uuid> {
        if let Some(present) = self.known.get(target) {
            if !present.contains(sid) {
                trace!(from, target, source_id = %sid, "dangling reference");
                *self.dangling.entry(from.to_string()).or_default() += 1;
            }
        }
        self.ids.get_or_create(target, sid)
    }

    /// City/state reference for a row with `city_id` and/or `state_id`. The
    /// state falls back to the city's state.
    pub fn location(&self, from: &str, row: &Row) -> Option<Location> {
        let city_sid = row.value("city_id").into_source_id();
        let city = city_sid.as_ref().and_then(|c| self.lookups.cities.get(c));

        let state_sid = row
            .value("state_id")
            .into_source_id()
            .or_else(|| city.and_then(|(_, s)| s.clone()));

        if city_sid.is_none() && state_sid.is_none() {
            return None;
        }

        Some(Location {
            city_id: city_sid.as_ref().and_then(|s| self.reference_id(from, "cities", s)),
            city: city.map(|(name, _)| name.clone()),
            state_id: state_sid.as_ref().and_then(|s| self.reference_id(from, "states", s)),
            state: state_sid.as_ref().and_then(|s| self.lookups.states.get(s).cloned()),
        })
    }

    /// Dangling reference counts per collection so far.
    pub fn dangling_counts(&self) -> BTreeMap<String, usize> {
        self.dangling
            .iter()
            .map(|r| (r.key().clone(), *r.value()))
            .collect()
    }

    pub fn dangling_for(&self, collection: &str) -> usize {
        self.dangling.get(collection).map(|r| *r).unwrap_or(0)
    }

    /// Run `build` over every row of `table`.
    pub fn build_collection<T, F>(&self, collection: &'static str, table: &str, build: F) -> Built<T>
    where
        F: Fn(&Row, &TransformContext<'a>) -> Option<T>,
    {
        let rows = self.dump.rows(table);
        let docs: Vec<T> = rows.iter().filter_map(|r| build(r, self)).collect();
        Built {
            collection,
            skipped: rows.len() - docs.len(),
            docs,
        }
    }
}

/// The row's own source id, from its `id` column.
pub fn source_id(row: &Row) -> Option<SourceId> {
    row.value("id").into_source_id()
}

/// Source id as it appears in documents (`legacy_id`).
pub(crate) fn legacy(sid: &SourceId) -> ScalarValue {
    match sid.as_i64() {
        Some(n) => ScalarValue::Int(n),
        None => ScalarValue::Str(sid.to_string()),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_lookups() {
        let dump = parsed();
        let l = Lookups::build(&dump);
        let austin = SourceId::parse("10").unwrap();
        let one = SourceId::parse("1").unwrap();
        assert_eq!(l.cities.get(&austin).unwrap().0, "Austin");
        assert_eq!(l.states.get(&one).unwrap(), "Texas");
        assert_eq!(l.sub_industries_by_industry.get(&one).unwrap().len(), 2);
        assert_eq!(l.last_message_at.get(&one).unwrap(), "2023-04-01T10:00:00Z");
    }

    #[test]
    fn test_reference_counts_dangling() {
        let dump = parsed();
        let ids = IdMapper::default();
        let ctx = TransformContext::new(&dump, &ids, &variants());
        let row: Row = [("user_id", ScalarValue::Int(99)), ("owner", ScalarValue::Int(1))]
            .into_iter()
            .collect();

        let dangling = ctx.reference("listings", "users", &row, &["user_id"]);
        assert_eq!(dangling, ids.get("users", 99));
        assert!(dangling.is_some());
        assert_eq!(ctx.dangling_for("listings"), 1);

        ctx.reference("listings", "users", &row, &["owner"]);
        assert_eq!(ctx.dangling_for("listings"), 1);
        assert_eq!(ctx.reference("listings", "users", &row, &["nope"]), None);
    }

    #[test]
    fn test_location_state_from_city() {
        let dump = parsed();
        let ids = IdMapper::default();
        let ctx = TransformContext::new(&dump, &ids, &variants());
        let row: Row = [("city_id", ScalarValue::Int(10))].into_iter().collect();
        let loc = ctx.location("users", &row).unwrap();
        assert_eq!(loc.city.as_deref(), Some("Austin"));
        assert_eq!(loc.state.as_deref(), Some("Texas"));
        assert_eq!(loc.state_id, ids.get("states", 1));

        let empty = Row::new();
        assert!(ctx.location("users", &empty).is_none());
    }
}
