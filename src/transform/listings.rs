//! Listings: businesses, franchises and investor profiles in one collection.
//!
//! The three source tables are variants of a single output type. Each
//! variant keeps its own entity type for id derivation; the mapper mirrors
//! the ids into the consolidated `listings` namespace.

use super::fields::{flag, int, keyword, money, text, timestamp};
use super::{legacy, Built, Location, TransformContext};
use crate::dump::Row;
use crate::idmap::{IntoSourceId, SourceId};
use crate::parser::ScalarValue;
use ahash::AHashMap;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

pub const COLLECTION: &str = "listings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Business,
    Franchise,
    Investor,
}

impl ListingKind {
    /// Kind for a source table (or a `listing_type` value naming one).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "businesses" | "business" => Some(ListingKind::Business),
            "franchise" | "franchises" => Some(ListingKind::Franchise),
            "investors" | "investor" => Some(ListingKind::Investor),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ListingKind::Business => "business",
            ListingKind::Franchise => "franchise",
            ListingKind::Investor => "investor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Active,
    Pending,
    Sold,
    Inactive,
}

impl ListingStatus {
    fn from_keyword(k: &str) -> Self {
        match k {
            "active" | "approved" | "published" | "live" | "1" => ListingStatus::Active,
            "sold" | "closed" => ListingStatus::Sold,
            "inactive" | "disabled" | "rejected" | "deleted" | "archived" | "0" => {
                ListingStatus::Inactive
            }
            _ => ListingStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Financials {
    pub asking_price: Option<f64>,
    pub revenue: Option<f64>,
    pub cash_flow: Option<f64>,
    pub investment_min: Option<f64>,
    pub investment_max: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingDoc {
    pub id: Uuid,
    pub legacy_id: ScalarValue,
    pub kind: ListingKind,
    pub source_table: String,
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub industry_id: Option<Uuid>,
    pub industry: Option<String>,
    pub sub_industry_id: Option<Uuid>,
    pub sub_industry: Option<String>,
    pub location: Option<Location>,
    pub financials: Financials,
    pub status: ListingStatus,
    pub is_featured: bool,
    pub view_count: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Build one listing from a row of the variant table `table`.
pub fn build_listing(
    table: &str,
    kind: ListingKind,
    row: &Row,
    ctx: &TransformContext<'_>,
) -> Option<ListingDoc> {
    let (sid, id) = ctx.own_id(table, row)?;
    let lookups = &ctx.lookups;

    let industry_sid = row.value("industry_id");
    let sub_industry_sid = row.value("sub_industry_id");

    let mut financials = Financials {
        asking_price: money(row, &["asking_price", "price", "franchise_fee"]),
        revenue: money(row, &["revenue", "gross_revenue", "annual_revenue"]),
        cash_flow: money(row, &["cash_flow", "cashflow", "net_profit"]),
        investment_min: money(row, &["min_investment", "investment_min", "minimum_investment"]),
        investment_max: money(row, &["max_investment", "investment_max", "maximum_investment"]),
    };
    if let (Some(lo), Some(hi)) = (financials.investment_min, financials.investment_max) {
        if lo > hi {
            financials.investment_min = Some(hi);
            financials.investment_max = Some(lo);
        }
    }

    Some(ListingDoc {
        id,
        legacy_id: legacy(&sid),
        kind,
        source_table: table.to_string(),
        owner_id: ctx.reference(COLLECTION, "users", row, &["user_id", "owner_id"]),
        title: text(row, &["title", "name", "business_name", "company_name"])
            .unwrap_or_else(|| format!("Untitled {} #{}", kind.label(), sid)),
        description: text(row, &["description", "details", "about"]),
        industry_id: ctx.reference(COLLECTION, "industries", row, &["industry_id"]),
        industry: lookup_name(&lookups.industries, industry_sid),
        sub_industry_id: ctx.reference(COLLECTION, "sub_industries", row, &["sub_industry_id"]),
        sub_industry: lookup_name(&lookups.sub_industries, sub_industry_sid),
        location: ctx.location(COLLECTION, row),
        financials,
        status: keyword(row, &["status", "listing_status"])
            .map(|k| ListingStatus::from_keyword(&k))
            .unwrap_or(ListingStatus::Pending),
        is_featured: flag(row, &["is_featured", "featured"]).unwrap_or(false),
        view_count: int(row, &["views", "view_count"])
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or(0),
        created_at: timestamp(row, &["created_at"]),
        updated_at: timestamp(row, &["updated_at"]),
    })
}

fn lookup_name(index: &AHashMap<SourceId, String>, value: &ScalarValue) -> Option<String> {
    value.into_source_id().and_then(|sid| index.get(&sid).cloned())
}

/// Build the listings of every variant table concurrently, one scoped thread
/// per variant, against the shared mapper. Results are concatenated in
/// variant order so output is stable regardless of scheduling.
pub fn build_all_listings(ctx: &TransformContext<'_>) -> Built<ListingDoc> {
    let variants: Vec<(&str, ListingKind)> = ctx
        .listing_variants()
        .iter()
        .filter_map(|t| ListingKind::from_name(t).map(|k| (t.as_str(), k)))
        .collect();

    let parts: Vec<(Vec<ListingDoc>, usize)> = std::thread::scope(|s| {
        let handles: Vec<_> = variants
            .iter()
            .map(|&(table, kind)| {
                s.spawn(move || {
                    let rows = ctx.dump.rows(table);
                    let docs: Vec<ListingDoc> = rows
                        .iter()
                        .filter_map(|r| build_listing(table, kind, r, ctx))
                        .collect();
                    debug!(table, docs = docs.len(), "listing variant built");
                    let skipped = rows.len() - docs.len();
                    (docs, skipped)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    let mut built = Built {
        collection: COLLECTION,
        docs: Vec::new(),
        skipped: 0,
    };
    for (docs, skipped) in parts {
        built.docs.extend(docs);
        built.skipped += skipped;
    }
    built
}
