use super::split_tables;
use dump_migrate::diagnostics::TableDiagnostics;
use dump_migrate::dump::{DumpParser, ParseOptions, StatementRecovery};
use dump_migrate::migrate::read_source;
use dump_migrate::parser::{count_statement_types, LexOptions};
use dump_migrate::schema::list_tables;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

/// JSON output for the inspect command
#[derive(Serialize, JsonSchema)]
pub struct InspectJsonOutput {
    pub dump: String,
    pub dump_bytes: u64,
    pub compression: String,
    pub sha256: String,
    /// Invalid UTF-8 was replaced while reading
    pub lossy: bool,
    /// Statements in the whole dump by type (insert, create_table, ...)
    pub statement_types: BTreeMap<String, usize>,
    /// INSERT strategies in the order they were tried
    pub strategies: Vec<String>,
    pub tables: Vec<TableDiagnostics>,
    pub total_rows: usize,
    pub total_issues: usize,
    pub elapsed_secs: f64,
}

pub fn run(
    file: PathBuf,
    tables: Option<String>,
    detect_booleans: bool,
    progress: bool,
    json: bool,
) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let source = read_source(&file, progress && !json)?;

    let tables = match tables {
        Some(list) => split_tables(&list),
        None => list_tables(&source.text),
    };
    if tables.is_empty() {
        anyhow::bail!("no tables found in {}", file.display());
    }

    let parser = DumpParser::new().with_options(ParseOptions {
        lex: LexOptions { detect_booleans },
    });
    let (_, mut report) = parser.parse(&source.text, &tables);
    let statement_types = count_statement_types(&source.text);
    report.dump_path = Some(source.path.display().to_string());
    report.dump_bytes = source.file_bytes;
    report.dump_sha256 = Some(source.sha256.clone());

    if json {
        let output = InspectJsonOutput {
            dump: source.path.display().to_string(),
            dump_bytes: source.file_bytes,
            compression: source.compression.to_string(),
            sha256: source.sha256,
            lossy: source.lossy,
            statement_types: statement_types
                .into_iter()
                .map(|(label, n)| (label.to_string(), n))
                .collect(),
            strategies: parser
                .strategy_names()
                .into_iter()
                .chain([StatementRecovery::NAME])
                .map(str::to_string)
                .collect(),
            total_rows: report.total_rows(),
            total_issues: report.total_issues(),
            tables: report.tables,
            elapsed_secs: start_time.elapsed().as_secs_f64(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", report);
        let summary: Vec<String> = statement_types
            .iter()
            .map(|(label, n)| format!("{} {}", n, label))
            .collect();
        println!("Statements: {}", summary.join(", "));
        println!("Time: {:.3?}", start_time.elapsed());
    }
    Ok(())
}
