//! End-to-end migration: read, parse, map ids, transform, write.

use crate::config::MigrationConfig;
use crate::diagnostics::DiagnosticsReport;
use crate::dump::input::{read_dump, read_dump_with_progress, DumpSource};
use crate::dump::{DumpParser, ParsedDump};
use crate::error;
use crate::idmap::{IdMapStats, IdMapper};
use crate::progress::{byte_progress_bar, phase_spinner};
use crate::sink::{write_collection, CountingSink, DocumentSink, JsonlSink};
use crate::transform::listings::build_all_listings;
use crate::transform::{billing, lookups, messaging, users, Built, TransformContext};
use anyhow::Context;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome for one output collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct CollectionSummary {
    pub written: usize,
    /// Rows without a usable source id
    pub skipped: usize,
    /// References to source ids with no row in the referenced table
    pub dangling_references: usize,
}

/// What a migration run did.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct MigrationSummary {
    pub dump: String,
    pub dump_sha256: String,
    pub dry_run: bool,
    pub tables_parsed: usize,
    pub rows_parsed: usize,
    pub parse_issues: usize,
    /// Requested tables that yielded no rows
    pub empty_tables: Vec<String>,
    pub collections: BTreeMap<String, CollectionSummary>,
    /// Mappings merged in from an existing identifier map
    pub mappings_loaded: usize,
    pub id_map: IdMapStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_map_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    pub diagnostics_path: String,
    pub elapsed_secs: f64,
}

impl MigrationSummary {
    pub fn total_written(&self) -> usize {
        self.collections.values().map(|c| c.written).sum()
    }

    pub fn total_dangling(&self) -> usize {
        self.collections.values().map(|c| c.dangling_references).sum()
    }
}

/// Run a full migration as described by `config`.
///
/// The diagnostics report is appended on every path that gets as far as
/// reading the dump, including a failed read.
pub fn run(config: &MigrationConfig) -> anyhow::Result<MigrationSummary> {
    config.validate()?;
    let start = Instant::now();
    let diagnostics_path = config.diagnostics_path();

    let source = match read_source(&config.dump, config.progress) {
        Ok(source) => source,
        Err(e) => {
            let mut report = DiagnosticsReport::new();
            report.dump_path = Some(config.dump.display().to_string());
            report.fatal = Some(e.to_string());
            if let Err(io) = report.append_to(&diagnostics_path) {
                warn!(path = %diagnostics_path.display(), error = %io, "could not write diagnostics");
            }
            return Err(e.into());
        }
    };

    let (dump, report) = parse_source(&source, config);
    for empty in report.empty_tables() {
        warn!(table = %empty.table, schema_found = empty.schema_found, "no rows extracted");
    }

    let outcome = migrate_parsed(config, &dump);

    report
        .append_to(&diagnostics_path)
        .with_context(|| format!("writing diagnostics to {}", diagnostics_path.display()))?;
    let (collections, mappings_loaded, id_map) = outcome?;

    let summary = MigrationSummary {
        dump: source.path.display().to_string(),
        dump_sha256: source.sha256,
        dry_run: config.dry_run,
        tables_parsed: dump.len(),
        rows_parsed: dump.total_rows(),
        parse_issues: report.total_issues(),
        empty_tables: report.empty_tables().map(|t| t.table.clone()).collect(),
        collections,
        mappings_loaded,
        id_map,
        id_map_path: (!config.dry_run).then(|| config.id_map_path().display().to_string()),
        output_dir: (!config.dry_run).then(|| config.output_dir.display().to_string()),
        diagnostics_path: diagnostics_path.display().to_string(),
        elapsed_secs: start.elapsed().as_secs_f64(),
    };
    info!(
        written = summary.total_written(),
        dangling = summary.total_dangling(),
        elapsed_secs = summary.elapsed_secs,
        "migration finished"
    );
    Ok(summary)
}

/// Read the dump, with a byte progress bar when `progress` is set.
pub fn read_source(path: &Path, progress: bool) -> error::Result<DumpSource> {
    if !progress {
        return read_dump(path);
    }
    let total = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let pb = byte_progress_bar(total);
    let bar = pb.clone();
    let result = read_dump_with_progress(path, move |n| bar.set_position(n));
    pb.finish_and_clear();
    result
}

fn parse_source(source: &DumpSource, config: &MigrationConfig) -> (ParsedDump, DiagnosticsReport) {
    let spinner = config.progress.then(|| phase_spinner("Parsing tables..."));
    let parser = DumpParser::new().with_options(config.parse_options());
    let (dump, mut report) = parser.parse(&source.text, &config.tables);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    report.dump_path = Some(source.path.display().to_string());
    report.dump_bytes = source.file_bytes;
    report.dump_sha256 = Some(source.sha256.clone());
    (dump, report)
}

type Outcome = (BTreeMap<String, CollectionSummary>, usize, IdMapStats);

fn migrate_parsed(config: &MigrationConfig, dump: &ParsedDump) -> anyhow::Result<Outcome> {
    let ids = IdMapper::new(config.mapper_config());
    let id_map_path = config.id_map_path();
    let mappings_loaded = ids.load_if_exists(&id_map_path)?;

    let mut sink: Box<dyn DocumentSink> = if config.dry_run {
        Box::new(CountingSink::new())
    } else {
        Box::new(JsonlSink::new(&config.output_dir)?)
    };

    let collections = transform_all(dump, &ids, &config.listing_aliases, sink.as_mut(), config.batch_size)?;
    sink.finish()?;

    if config.dry_run {
        debug!("dry run, identifier map not persisted");
    } else {
        ids.persist(&id_map_path)?;
        info!(path = %id_map_path.display(), mappings = ids.len(), "identifier map saved");
    }

    Ok((collections, mappings_loaded, ids.stats()))
}

/// Build every collection whose source tables were parsed and write it to
/// `sink`. Reference tables go first, then users, listings and the
/// collections that point at them.
pub fn transform_all(
    dump: &ParsedDump,
    ids: &IdMapper,
    listing_variants: &[String],
    sink: &mut dyn DocumentSink,
    batch_size: usize,
) -> anyhow::Result<BTreeMap<String, CollectionSummary>> {
    let ctx = TransformContext::new(dump, ids, listing_variants);
    let mut out = BTreeMap::new();

    macro_rules! collection {
        ($collection:expr, $table:expr, $build:expr) => {
            if dump.table($table).is_some() {
                let built = ctx.build_collection($collection, $table, $build);
                record(sink, built, batch_size, &mut out)?;
            }
        };
    }

    collection!(lookups::STATES, lookups::STATES, lookups::build_state);
    collection!(lookups::CITIES, lookups::CITIES, lookups::build_city);
    collection!(lookups::INDUSTRIES, lookups::INDUSTRIES, lookups::build_industry);
    collection!(lookups::SUB_INDUSTRIES, lookups::SUB_INDUSTRIES, lookups::build_sub_industry);
    collection!(users::COLLECTION, "users", users::build_user);

    if listing_variants.iter().any(|v| dump.table(v).is_some()) {
        let built = build_all_listings(&ctx);
        record(sink, built, batch_size, &mut out)?;
    }

    collection!(billing::PLANS, billing::PLANS, billing::build_plan);
    collection!(billing::SUBSCRIPTIONS, billing::SUBSCRIPTIONS, billing::build_subscription);
    collection!(billing::TRANSACTIONS, billing::TRANSACTIONS, billing::build_transaction);
    collection!(messaging::CHATROOMS, messaging::CHATROOMS, messaging::build_chatroom);
    collection!(messaging::MESSAGES, messaging::MESSAGES, messaging::build_message);

    for (collection, dangling) in ctx.dangling_counts() {
        if dangling > 0 {
            warn!(collection = %collection, dangling, "references to missing rows");
        }
        out.entry(collection).or_default().dangling_references = dangling;
    }
    Ok(out)
}

fn record<T: Serialize>(
    sink: &mut dyn DocumentSink,
    built: Built<T>,
    batch_size: usize,
    out: &mut BTreeMap<String, CollectionSummary>,
) -> anyhow::Result<()> {
    let Built {
        collection,
        docs,
        skipped,
    } = built;
    if skipped > 0 {
        warn!(collection, skipped, "rows without a usable id skipped");
    }
    let written = write_collection(sink, collection, docs, batch_size)?;

    let entry = out.entry(collection.to_string()).or_default();
    entry.written = written;
    entry.skipped = skipped;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::transform::test_support::{parsed, variants};

    #[test]
    fn test_transform_all_writes_every_collection() {
        let dump = parsed();
        let ids = IdMapper::default();
        let mut sink = MemorySink::new();
        let out = transform_all(&dump, &ids, &variants(), &mut sink, 2).unwrap();

        let names: Vec<&str> = out.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "chatrooms",
                "cities",
                "industries",
                "listings",
                "messages",
                "plans",
                "states",
                "sub_industries",
                "subscriptions",
                "transactions",
                "users"
            ]
        );
        assert_eq!(out["users"].written, 2);
        assert_eq!(out["users"].skipped, 1);
        assert_eq!(out["listings"].written, 4);
        assert_eq!(out["listings"].dangling_references, 1);
        assert_eq!(sink.docs("listings").len(), 4);
        assert_eq!(sink.docs("messages").len(), 3);
    }

    #[test]
    fn test_transform_all_skips_unparsed_tables() {
        let (dump, _) = crate::dump::parse_dump(crate::transform::test_support::DUMP, &["states"]);
        let ids = IdMapper::default();
        let mut sink = MemorySink::new();
        let out = transform_all(&dump, &ids, &variants(), &mut sink, 10).unwrap();
        assert_eq!(out.keys().map(String::as_str).collect::<Vec<_>>(), vec!["states"]);
        assert_eq!(out["states"].written, 2);
    }
}
