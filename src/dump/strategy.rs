//! INSERT matcher strategies.
//!
//! Dumps produced by different tools spell INSERT statements differently.
//! Each strategy recognises one family of spellings; the dump parser tries
//! them in order and keeps the first that yields at least one row.

use super::{rows_from_values, ParseOptions, Row, ValueTarget};
use crate::diagnostics::{excerpt, ParseIssue, TableDiagnostics, EXCERPT_LEN};
use crate::parser::{parse_insert_head, Statements};
use crate::schema::TableSchema;
use once_cell::sync::Lazy;
use regex::Regex;

/// Rows found by one strategy, with the bookkeeping gathered on the way.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub rows: Vec<Row>,
    /// INSERT statements attributed to the table
    pub statements: usize,
    /// Scratch diagnostics (issues and width mismatches) for this attempt
    pub diagnostics: TableDiagnostics,
}

impl Extraction {
    pub fn new(table: &str) -> Self {
        Self {
            rows: Vec::new(),
            statements: 0,
            diagnostics: TableDiagnostics::new(table),
        }
    }
}

/// One way of locating a table's INSERT statements in a dump.
pub trait InsertStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extract rows for `table`, or `None` when this strategy finds no rows.
    fn try_extract(
        &self,
        dump: &str,
        table: &str,
        schema: &TableSchema,
        opts: &ParseOptions,
    ) -> Option<Extraction>;
}

/// A strategy driven by a per-table regex matching the statement head up to
/// and including `VALUES`. Capture group 1, when present, is an explicit
/// column list.
pub struct PatternStrategy {
    name: &'static str,
    pattern: fn(&str) -> String,
}

impl PatternStrategy {
    /// mysqldump's own spelling: ``INSERT INTO `t` VALUES (...),(...);``
    pub fn standard() -> Self {
        Self {
            name: "standard",
            pattern: |t| format!(r"INSERT INTO `{t}` VALUES\s*"),
        }
    }

    /// `mysqldump --complete-insert`: ``INSERT INTO `t` (`a`,`b`) VALUES ...``
    pub fn column_list() -> Self {
        Self {
            name: "column-list",
            pattern: |t| format!(r"INSERT INTO `{t}` \(([^)]*)\) VALUES\s*"),
        }
    }

    /// Hand-written and third-party dumps: any keyword case, optional
    /// quoting and schema prefix, IGNORE/REPLACE, newlines anywhere in the
    /// head, optional column list.
    pub fn relaxed() -> Self {
        Self {
            name: "relaxed",
            pattern: |t| {
                format!(
                    r#"(?i:\b(?:INSERT(?:\s+(?:LOW_PRIORITY|DELAYED|HIGH_PRIORITY))?(?:\s+IGNORE)?|REPLACE(?:\s+(?:LOW_PRIORITY|DELAYED))?)\s+INTO)\s+(?:[`"]?\w+[`"]?\s*\.\s*)?(?:`{t}`|"{t}"|{t})\s*(?:\(([^)]*)\)\s*)?(?i:VALUES)\s*"#
                )
            },
        }
    }
}

impl InsertStrategy for PatternStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_extract(
        &self,
        dump: &str,
        table: &str,
        schema: &TableSchema,
        opts: &ParseOptions,
    ) -> Option<Extraction> {
        let pattern = (self.pattern)(&regex::escape(table));
        let re = Regex::new(&pattern).ok()?;
        if !re.is_match(dump) {
            return None;
        }
        // Heads only count at the start of a real statement, never inside
        // another statement's string literals
        let head_re = Regex::new(&format!("^(?:{})", pattern)).ok()?;
        let mut ex = Extraction::new(table);

        for stmt in Statements::new(dump) {
            let body = stmt.body();
            let Some(caps) = head_re.captures(body) else {
                continue;
            };
            let Some(head) = caps.get(0) else { continue };

            let offset = stmt.offset + (stmt.text.len() - body.len());
            ex.statements += 1;

            let values_text = &body[head.end()..];
            if !values_text.starts_with('(') {
                ex.diagnostics.add_issue(ParseIssue::StatementUnparsable {
                    offset,
                    reason: "VALUES is not followed by a row".into(),
                    excerpt: excerpt(body, EXCERPT_LEN),
                });
                continue;
            }

            let target = ValueTarget::new(schema, caps.get(1).map(|c| c.as_str()));
            rows_from_values(values_text, offset, &target, opts, &mut ex);
        }

        if ex.rows.is_empty() {
            None
        } else {
            Some(ex)
        }
    }
}

static VALUES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bVALUES\s*\(").unwrap());

/// Last-resort pass: split the dump into real statements and isolate each
/// INSERT for the table on its own, so one malformed statement cannot hide
/// the others.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatementRecovery;

impl StatementRecovery {
    pub const NAME: &'static str = "statement-recovery";

    /// Run the pass. Unlike [`InsertStrategy::try_extract`] this always
    /// returns its bookkeeping, even when no row was recovered.
    pub fn extract(
        &self,
        dump: &str,
        table: &str,
        schema: &TableSchema,
        opts: &ParseOptions,
    ) -> Extraction {
        let mut ex = Extraction::new(table);

        for stmt in Statements::new(dump) {
            let body = stmt.body();
            let Some((name, name_end)) = parse_insert_head(body) else {
                continue;
            };
            if name != table {
                continue;
            }

            let offset = stmt.offset + (stmt.text.len() - body.len());
            ex.statements += 1;

            let rest = &body[name_end..];
            let Some(values) = VALUES_RE.find(rest) else {
                ex.diagnostics.add_issue(ParseIssue::StatementUnparsable {
                    offset,
                    reason: "no VALUES list".into(),
                    excerpt: excerpt(body, EXCERPT_LEN),
                });
                continue;
            };

            let head = rest[..values.start()].trim();
            let explicit = head
                .strip_prefix('(')
                .and_then(|h| h.strip_suffix(')'));

            // Keep the opening paren of the first row
            let values_text = &rest[values.end() - 1..];
            let before = ex.rows.len();
            let target = ValueTarget::new(schema, explicit);
            rows_from_values(values_text, offset, &target, opts, &mut ex);

            if ex.rows.len() == before {
                ex.diagnostics.add_issue(ParseIssue::StatementUnparsable {
                    offset,
                    reason: "value list produced no rows".into(),
                    excerpt: excerpt(body, EXCERPT_LEN),
                });
            }
        }

        ex
    }
}

impl InsertStrategy for StatementRecovery {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn try_extract(
        &self,
        dump: &str,
        table: &str,
        schema: &TableSchema,
        opts: &ParseOptions,
    ) -> Option<Extraction> {
        let ex = self.extract(dump, table, schema, opts);
        if ex.rows.is_empty() {
            None
        } else {
            Some(ex)
        }
    }
}

/// The strategies tried before recovery, in order.
pub fn default_strategies() -> Vec<Box<dyn InsertStrategy>> {
    vec![
        Box::new(PatternStrategy::standard()),
        Box::new(PatternStrategy::column_list()),
        Box::new(PatternStrategy::relaxed()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ScalarValue;

    fn schema() -> TableSchema {
        TableSchema::new("users", vec!["id".into(), "name".into()])
    }

    fn run(strategy: &dyn InsertStrategy, dump: &str) -> Option<Extraction> {
        strategy.try_extract(dump, "users", &schema(), &ParseOptions::default())
    }

    #[test]
    fn test_standard_multi_row() {
        let dump = "INSERT INTO `users` VALUES (1,'a'),(2,'b');\nINSERT INTO `users` VALUES (3,'c');";
        let ex = run(&PatternStrategy::standard(), dump).unwrap();
        assert_eq!(ex.statements, 2);
        assert_eq!(ex.rows.len(), 3);
        assert_eq!(ex.rows[2].get("name"), Some(&ScalarValue::Str("c".into())));
    }

    #[test]
    fn test_standard_ignores_other_tables() {
        let dump = "INSERT INTO `users_meta` VALUES (1,'a');";
        assert!(run(&PatternStrategy::standard(), dump).is_none());
    }

    #[test]
    fn test_standard_skips_head_inside_consumed_statement() {
        let dump = "INSERT INTO `users` VALUES (1,'INSERT INTO `users` VALUES (9,''x'')');";
        let ex = run(&PatternStrategy::standard(), dump).unwrap();
        assert_eq!(ex.statements, 1);
        assert_eq!(ex.rows.len(), 1);
    }

    #[test]
    fn test_insert_text_in_other_tables_strings_is_ignored() {
        let dump = "INSERT INTO `messages` VALUES (1,'try: INSERT INTO `users` VALUES (666,\\'Mallory\\'); lol');\n\
                    INSERT INTO `users` VALUES (1,'Ann');";
        for strategy in [PatternStrategy::standard(), PatternStrategy::relaxed()] {
            let ex = run(&strategy, dump).unwrap();
            assert_eq!(ex.statements, 1, "{}", strategy.name());
            assert_eq!(ex.rows.len(), 1, "{}", strategy.name());
            assert_eq!(ex.rows[0].get("id"), Some(&ScalarValue::Int(1)));
        }
    }

    #[test]
    fn test_head_only_inside_a_string_yields_nothing() {
        let dump = "INSERT INTO `messages` VALUES (1,'INSERT INTO `users` VALUES (666,''x'');');";
        assert!(run(&PatternStrategy::standard(), dump).is_none());
        assert!(run(&PatternStrategy::relaxed(), dump).is_none());
    }

    #[test]
    fn test_column_list_uses_explicit_order() {
        let dump = "INSERT INTO `users` (`name`, `id`) VALUES ('z', 5);";
        assert!(run(&PatternStrategy::standard(), dump).is_none());
        let ex = run(&PatternStrategy::column_list(), dump).unwrap();
        assert_eq!(ex.rows[0].get("id"), Some(&ScalarValue::Int(5)));
        assert_eq!(ex.rows[0].get("name"), Some(&ScalarValue::Str("z".into())));
    }

    #[test]
    fn test_relaxed_newlines_and_case() {
        let dump = "insert ignore into\n  users\nvalues\n  (1,'a'),\n  (2,'b');";
        let ex = run(&PatternStrategy::relaxed(), dump).unwrap();
        assert_eq!(ex.rows.len(), 2);
    }

    #[test]
    fn test_relaxed_requires_exact_name() {
        let dump = "INSERT INTO users_archive VALUES (1,'a');";
        assert!(run(&PatternStrategy::relaxed(), dump).is_none());
    }

    #[test]
    fn test_recovery_reports_unparsable_and_keeps_going() {
        let dump = "INSERT INTO `users` SELECT * FROM old_users;\n\
                    -- comment with a quote: don't\n\
                    INSERT INTO `users` VALUES (7,'kept');";
        let ex = StatementRecovery.extract(dump, "users", &schema(), &ParseOptions::default());
        assert_eq!(ex.statements, 2);
        assert_eq!(ex.rows.len(), 1);
        assert_eq!(ex.diagnostics.issues.len(), 1);
        assert!(matches!(
            ex.diagnostics.issues[0],
            ParseIssue::StatementUnparsable { offset: 0, .. }
        ));
    }

    #[test]
    fn test_recovery_truncates_long_rows() {
        let dump = "INSERT INTO `users` VALUES (1,'a','extra','more');";
        let ex = StatementRecovery.extract(dump, "users", &schema(), &ParseOptions::default());
        assert_eq!(ex.rows[0].len(), 2);
        assert_eq!(ex.diagnostics.long_rows, 1);
    }

    #[test]
    fn test_default_strategy_order() {
        let names: Vec<_> = default_strategies().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["standard", "column-list", "relaxed"]);
    }
}
