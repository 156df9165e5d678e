//! Parse diagnostics.
//!
//! Collects a per-table summary of what the dump parser found and every
//! statement or row it had to skip. Diagnostics never influence parsed data;
//! they exist so a run can be audited afterwards.

use schemars::JsonSchema;
use serde::Serialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Maximum number of issues kept per table; further issues are only counted.
pub const MAX_ISSUES_PER_TABLE: usize = 25;

/// Maximum length of a statement or row excerpt, in characters.
pub const EXCERPT_LEN: usize = 120;

/// Something the parser could not use.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseIssue {
    /// No CREATE TABLE for the table was found
    SchemaNotFound,
    /// An INSERT statement whose value list could not be isolated
    StatementUnparsable {
        offset: usize,
        reason: String,
        excerpt: String,
    },
    /// A row text that produced no usable fields
    RowUnparsable {
        statement_offset: usize,
        row_index: usize,
        reason: String,
        excerpt: String,
    },
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseIssue::SchemaNotFound => write!(f, "schema not found"),
            ParseIssue::StatementUnparsable {
                offset,
                reason,
                excerpt,
            } => write!(f, "statement at byte {}: {} ({})", offset, reason, excerpt),
            ParseIssue::RowUnparsable {
                statement_offset,
                row_index,
                reason,
                excerpt,
            } => write!(
                f,
                "row {} of statement at byte {}: {} ({})",
                row_index, statement_offset, reason, excerpt
            ),
        }
    }
}

/// Summary of parsing one table.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct TableDiagnostics {
    pub table: String,
    pub schema_found: bool,
    pub columns: Vec<String>,
    /// INSERT statements attributed to the table by the winning strategy
    pub statement_count: usize,
    pub rows_extracted: usize,
    /// Name of the INSERT strategy that produced the rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Rows with fewer fields than target columns (left partially filled)
    pub short_rows: usize,
    /// Rows with more fields than target columns (excess dropped)
    pub long_rows: usize,
    pub issues: Vec<ParseIssue>,
    /// Issues beyond [`MAX_ISSUES_PER_TABLE`] that were counted but not kept
    pub issues_dropped: usize,
}

impl TableDiagnostics {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn add_issue(&mut self, issue: ParseIssue) {
        if self.issues.len() < MAX_ISSUES_PER_TABLE {
            self.issues.push(issue);
        } else {
            self.issues_dropped += 1;
        }
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len() + self.issues_dropped
    }

    /// Record how a row's field count compared to its target column count.
    pub fn record_width(&mut self, fields: usize, columns: usize) {
        if fields < columns {
            self.short_rows += 1;
        } else if fields > columns {
            self.long_rows += 1;
        }
    }
}

/// Diagnostics for a whole parse run.
#[derive(Debug, Clone, Default, Serialize, JsonSchema)]
pub struct DiagnosticsReport {
    /// RFC 3339 timestamp of report creation
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump_path: Option<String>,
    pub dump_bytes: u64,
    /// SHA-256 of the decompressed dump text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump_sha256: Option<String>,
    pub tables: Vec<TableDiagnostics>,
    /// Set when the run aborted before parsing completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<String>,
}

impl DiagnosticsReport {
    pub fn new() -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            ..Default::default()
        }
    }

    pub fn push(&mut self, table: TableDiagnostics) {
        self.tables.push(table);
    }

    pub fn table(&self, name: &str) -> Option<&TableDiagnostics> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows_extracted).sum()
    }

    pub fn total_issues(&self) -> usize {
        self.tables.iter().map(|t| t.issue_count()).sum()
    }

    /// Tables that yielded no rows, with or without a schema.
    pub fn empty_tables(&self) -> impl Iterator<Item = &TableDiagnostics> {
        self.tables.iter().filter(|t| t.rows_extracted == 0)
    }

    /// Append the human-readable report to `path`, creating it if needed.
    pub fn append_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", self)?;
        file.flush()
    }
}

impl fmt::Display for DiagnosticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== dump parse diagnostics ({}) ===", self.generated_at)?;
        if let Some(path) = &self.dump_path {
            writeln!(f, "dump: {} ({} bytes)", path, self.dump_bytes)?;
        }
        if let Some(sha) = &self.dump_sha256 {
            writeln!(f, "sha256: {}", sha)?;
        }
        if let Some(fatal) = &self.fatal {
            writeln!(f, "FATAL: {}", fatal)?;
        }

        for t in &self.tables {
            writeln!(f)?;
            writeln!(f, "[{}]", t.table)?;
            if !t.schema_found {
                writeln!(f, "  schema: not found")?;
            } else {
                writeln!(
                    f,
                    "  schema: {} columns ({})",
                    t.columns.len(),
                    t.columns.join(", ")
                )?;
            }
            writeln!(f, "  statements: {}", t.statement_count)?;
            write!(f, "  rows: {}", t.rows_extracted)?;
            if let Some(strategy) = &t.strategy {
                write!(f, " via {}", strategy)?;
            }
            writeln!(f)?;
            if t.short_rows > 0 || t.long_rows > 0 {
                writeln!(
                    f,
                    "  width mismatches: {} short, {} long",
                    t.short_rows, t.long_rows
                )?;
            }
            for issue in &t.issues {
                writeln!(f, "  ! {}", issue)?;
            }
            if t.issues_dropped > 0 {
                writeln!(f, "  ... {} more issues not shown", t.issues_dropped)?;
            }
        }

        writeln!(f)?;
        write!(
            f,
            "total: {} tables, {} rows, {} issues",
            self.tables.len(),
            self.total_rows(),
            self.total_issues()
        )
    }
}

/// Cut `text` to at most `max` characters on a char boundary, marking the cut.
pub fn excerpt(text: &str, max: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}
