//! Dump parsing: from raw dump text to rows keyed by column name.
//!
//! For each requested table the parser extracts the schema, then tries the
//! INSERT strategies in order, keeping the first that yields rows. When all
//! of them come up empty, a per-statement recovery pass runs. Problems with
//! one table, statement or row never abort the others; they are recorded in
//! the returned [`DiagnosticsReport`].

pub mod input;
pub mod strategy;

pub use input::{read_dump, read_dump_with_progress, Compression, DumpSource};
pub use strategy::{default_strategies, Extraction, InsertStrategy, PatternStrategy, StatementRecovery};

use crate::diagnostics::{excerpt, DiagnosticsReport, ParseIssue, TableDiagnostics, EXCERPT_LEN};
use crate::parser::{parse_value_with, split_row_into_fields, split_rows, LexOptions, ScalarValue};
use crate::schema::{extract_schema, parse_column_list, TableSchema};
use ahash::AHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// One parsed row: column name to typed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    values: BTreeMap<String, ScalarValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: ScalarValue) {
        self.values.insert(column.into(), value);
    }

    /// Value of `column`; `None` when the row has no such key.
    pub fn get(&self, column: &str) -> Option<&ScalarValue> {
        self.values.get(column)
    }

    /// Value of `column`, treating a missing key like SQL NULL.
    pub fn value(&self, column: &str) -> &ScalarValue {
        static NULL: ScalarValue = ScalarValue::Null;
        self.values.get(column).unwrap_or(&NULL)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, ScalarValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, ScalarValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// All rows parsed for one table, in dump order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableDataset {
    pub name: String,
    pub rows: Vec<Row>,
}

impl TableDataset {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }
}

/// Parsed rows for every requested table. Tables that yielded nothing are
/// present with no rows.
#[derive(Debug, Clone, Default)]
pub struct ParsedDump {
    tables: Vec<TableDataset>,
    index: AHashMap<String, usize>,
}

impl ParsedDump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: TableDataset) {
        match self.index.get(&dataset.name) {
            Some(&i) => self.tables[i] = dataset,
            None => {
                self.index.insert(dataset.name.clone(), self.tables.len());
                self.tables.push(dataset);
            }
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableDataset> {
        self.index.get(name).map(|&i| &self.tables[i])
    }

    /// Rows of `name`; empty when the table was not requested or had no data.
    pub fn rows(&self, name: &str) -> &[Row] {
        self.table(name).map(|t| t.rows.as_slice()).unwrap_or(&[])
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableDataset> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows.len()).sum()
    }
}

/// Options shared by every strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub lex: LexOptions,
}

/// Column each positional value of an INSERT row lands in.
///
/// Built from the schema, or from an explicit INSERT column list resolved
/// against the schema. Explicit names the schema does not know map to
/// `None` and their values are dropped.
pub struct ValueTarget<'s> {
    columns: Vec<Option<&'s str>>,
}

impl<'s> ValueTarget<'s> {
    pub fn new(schema: &'s TableSchema, explicit: Option<&str>) -> Self {
        let columns = match explicit {
            Some(list) => parse_column_list(list)
                .iter()
                .map(|name| schema.resolve_column(name))
                .collect(),
            None => schema.columns.iter().map(|c| Some(c.as_str())).collect(),
        };
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Turn the text after `VALUES` into rows, appending them to `ex`.
///
/// Fields are zipped positionally against the target and truncated to the
/// shorter side: extra fields are dropped, missing trailing columns are
/// absent from the row.
pub fn rows_from_values(
    values_text: &str,
    statement_offset: usize,
    target: &ValueTarget<'_>,
    opts: &ParseOptions,
    ex: &mut Extraction,
) {
    for (row_index, row_text) in split_rows(values_text).into_iter().enumerate() {
        let fields = split_row_into_fields(row_text);
        if fields.iter().all(|f| f.is_empty()) {
            ex.diagnostics.add_issue(ParseIssue::RowUnparsable {
                statement_offset,
                row_index,
                reason: "row has no fields".into(),
                excerpt: excerpt(row_text, EXCERPT_LEN),
            });
            continue;
        }

        ex.diagnostics.record_width(fields.len(), target.len());

        let row: Row = target
            .columns
            .iter()
            .zip(fields)
            .filter_map(|(col, token)| col.map(|c| (c, parse_value_with(token, opts.lex))))
            .collect();

        if row.is_empty() {
            ex.diagnostics.add_issue(ParseIssue::RowUnparsable {
                statement_offset,
                row_index,
                reason: "no field maps to a known column".into(),
                excerpt: excerpt(row_text, EXCERPT_LEN),
            });
            continue;
        }

        ex.rows.push(row);
    }
}

/// Parses selected tables out of a dump.
pub struct DumpParser {
    options: ParseOptions,
    strategies: Vec<Box<dyn InsertStrategy>>,
    recovery: StatementRecovery,
}

impl Default for DumpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DumpParser {
    pub fn new() -> Self {
        Self {
            options: ParseOptions::default(),
            strategies: default_strategies(),
            recovery: StatementRecovery,
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the strategies tried before recovery.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn InsertStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Parse every table in `tables`. Never fails: a table that cannot be
    /// parsed is present with no rows and explained in the report.
    pub fn parse<S: AsRef<str>>(&self, dump: &str, tables: &[S]) -> (ParsedDump, DiagnosticsReport) {
        let mut parsed = ParsedDump::new();
        let mut report = DiagnosticsReport::new();
        report.dump_bytes = dump.len() as u64;

        for table in tables {
            let (dataset, diag) = self.parse_table(dump, table.as_ref());
            parsed.insert(dataset);
            report.push(diag);
        }

        info!(
            tables = parsed.len(),
            rows = parsed.total_rows(),
            issues = report.total_issues(),
            "dump parsed"
        );
        (parsed, report)
    }

    /// Parse a single table.
    pub fn parse_table(&self, dump: &str, table: &str) -> (TableDataset, TableDiagnostics) {
        let mut diag = TableDiagnostics::new(table);

        let Some(schema) = extract_schema(dump, table) else {
            warn!(table, "no CREATE TABLE found; table skipped");
            diag.add_issue(ParseIssue::SchemaNotFound);
            return (TableDataset::empty(table), diag);
        };
        diag.schema_found = true;
        diag.columns = schema.columns.clone();
        if schema.is_empty() {
            warn!(table, "CREATE TABLE has no recognisable columns");
        }

        for strategy in &self.strategies {
            if let Some(ex) = strategy.try_extract(dump, table, &schema, &self.options) {
                debug!(table, strategy = strategy.name(), rows = ex.rows.len(), "rows extracted");
                return Self::finish(diag, ex, strategy.name());
            }
            debug!(table, strategy = strategy.name(), "no rows");
        }

        let ex = self.recovery.extract(dump, table, &schema, &self.options);
        if ex.rows.is_empty() {
            warn!(table, statements = ex.statements, "no rows extracted");
        } else {
            info!(table, rows = ex.rows.len(), "rows recovered statement by statement");
        }
        Self::finish(diag, ex, StatementRecovery::NAME)
    }

    fn finish(
        mut diag: TableDiagnostics,
        ex: Extraction,
        strategy: &str,
    ) -> (TableDataset, TableDiagnostics) {
        diag.statement_count = ex.statements;
        diag.rows_extracted = ex.rows.len();
        if !ex.rows.is_empty() {
            diag.strategy = Some(strategy.to_string());
        }
        diag.short_rows = ex.diagnostics.short_rows;
        diag.long_rows = ex.diagnostics.long_rows;
        for issue in ex.diagnostics.issues {
            diag.add_issue(issue);
        }
        diag.issues_dropped += ex.diagnostics.issues_dropped;

        let dataset = TableDataset {
            name: diag.table.clone(),
            rows: ex.rows,
        };
        (dataset, diag)
    }
}

/// Parse `tables` out of `dump` with the default strategies.
pub fn parse_dump<S: AsRef<str>>(dump: &str, tables: &[S]) -> (ParsedDump, DiagnosticsReport) {
    DumpParser::new().parse(dump, tables)
}
