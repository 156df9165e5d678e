//! CREATE TABLE body scanning.

use once_cell::sync::Lazy;
use regex::Regex;

/// Regex to list table names from CREATE TABLE statements
/// Supports: `table`, "table", table, db.table
static CREATE_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?im)^\s*CREATE\s+(?:TEMPORARY\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:[`"]?\w+[`"]?\s*\.\s*)?[`"]?([^`"\s(]+)[`"]?"#)
        .unwrap()
});

/// All table names declared by CREATE TABLE statements, in dump order.
pub fn list_create_table_names(dump: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in CREATE_TABLE_NAME_RE.captures_iter(dump) {
        if let Some(m) = caps.get(1) {
            let name = m.as_str().to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Locate the start of the CREATE TABLE statement for `table`.
///
/// The name must match exactly (case-sensitive). Backtick, double-quote and
/// bare spellings are accepted; the first declaration wins.
pub fn find_create_table(dump: &str, table: &str) -> Option<usize> {
    let escaped = regex::escape(table);
    let pattern = format!(
        r#"(?m)^\s*(?i:CREATE\s+(?:TEMPORARY\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?)(?:[`"]?\w+[`"]?\s*\.\s*)?(?:`{0}`|"{0}"|{0}\b)\s*\("#,
        escaped
    );
    let re = Regex::new(&pattern).ok()?;
    re.find(dump).map(|m| m.start())
}

/// Extract the body of a CREATE TABLE statement (between first ( and matching )),
/// starting the scan at `from`. Trailing table options are not included.
pub fn extract_table_body(stmt: &str, from: usize) -> Option<&str> {
    let bytes = stmt.as_bytes();
    let mut depth = 0usize;
    let mut start = None;
    let mut quote: Option<u8> = None;
    let mut escape_next = false;

    for (i, &b) in bytes.iter().enumerate().skip(from) {
        if let Some(q) = quote {
            if escape_next {
                escape_next = false;
            } else if b == b'\\' && q != b'`' {
                escape_next = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }

        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' => {
                if depth == 0 {
                    start = Some(i + 1);
                }
                depth += 1;
            }
            b')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &stmt[s..i]);
                }
            }
            // Statement ended before the body closed
            b';' if depth > 0 => return None,
            _ => {}
        }
    }

    None
}

/// Split table body by commas, respecting nested parentheses and literals
pub fn split_table_body(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escape_next = false;
    let mut part_start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if escape_next {
                escape_next = false;
            } else if b == b'\\' && q != b'`' {
                escape_next = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }

        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(body[part_start..i].trim());
                part_start = i + 1;
            }
            _ => {}
        }
    }

    let last = body[part_start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }

    parts
}

/// The quoted identifier a column definition begins with, if any.
///
/// Key and constraint lines (`PRIMARY KEY`, `KEY`, `CONSTRAINT`, ...) start
/// with a keyword rather than a quoted identifier and yield `None`.
pub fn leading_quoted_identifier(def: &str) -> Option<&str> {
    let def = def.trim_start();
    let q = def.chars().next()?;
    if q != '`' && q != '"' {
        return None;
    }
    let rest = &def[1..];
    let close = rest.find(q)?;
    let name = &rest[..close];
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Parse a comma-separated column list, stripping quotes (backticks, double quotes, brackets)
pub fn parse_column_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|c| {
            c.trim()
                .trim_matches('`')
                .trim_matches('"')
                .trim_matches('[')
                .trim_matches(']')
                .to_string()
        })
        .filter(|c| !c.is_empty())
        .collect()
}
