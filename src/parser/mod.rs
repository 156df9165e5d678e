//! Lexical layer for MySQL dumps.
//!
//! - [`value`]: literal tokens to typed scalars
//! - [`rows`]: INSERT value lists to row texts and field tokens
//! - this module: splitting a whole dump into statements and classifying them

pub mod rows;
pub mod value;

pub use rows::{split_row_into_fields, split_rows};
pub use value::{parse_value, parse_value_with, LexOptions, ScalarValue};

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Unknown,
    CreateTable,
    /// `INSERT [LOW_PRIORITY|DELAYED|HIGH_PRIORITY] [IGNORE] INTO` or `REPLACE INTO`
    Insert,
    AlterTable,
    DropTable,
    LockTables,
}

impl StatementType {
    pub fn label(&self) -> &'static str {
        match self {
            StatementType::Unknown => "other",
            StatementType::CreateTable => "create_table",
            StatementType::Insert => "insert",
            StatementType::AlterTable => "alter_table",
            StatementType::DropTable => "drop_table",
            StatementType::LockTables => "lock_tables",
        }
    }
}

static INSERT_HEAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:INSERT(?:\s+(?:LOW_PRIORITY|DELAYED|HIGH_PRIORITY))?(?:\s+IGNORE)?|REPLACE(?:\s+(?:LOW_PRIORITY|DELAYED))?)\s+INTO\s+",
    )
    .unwrap()
});

static CREATE_TABLE_HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^CREATE\s+(?:TEMPORARY\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?").unwrap());

static ALTER_TABLE_HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^ALTER\s+TABLE\s+").unwrap());

static DROP_TABLE_HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^DROP\s+TABLE\s+(?:IF\s+EXISTS\s+)?").unwrap());

static LOCK_TABLES_HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^LOCK\s+TABLES\s+").unwrap());

/// One statement of a dump, borrowed from the dump text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement<'a> {
    /// Statement text including its terminating `;` when present.
    pub text: &'a str,
    /// Byte offset of `text` within the dump.
    pub offset: usize,
}

impl<'a> Statement<'a> {
    /// The statement with leading whitespace and comments removed.
    pub fn body(&self) -> &'a str {
        strip_leading_comments(self.text)
    }

    pub fn classify(&self) -> (StatementType, String) {
        parse_statement(self.text)
    }
}

/// Iterator over the `;`-terminated statements of an in-memory dump.
///
/// Semicolons inside quoted strings, backtick identifiers, `--`/`#` line
/// comments and `/* */` block comments do not end a statement. Statements
/// consisting only of whitespace and comments are skipped.
pub struct Statements<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Statements<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for Statements<'a> {
    type Item = Statement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.text.len() {
            let start = self.pos;
            let end = find_statement_end(self.text, start);
            self.pos = end;

            let stmt = Statement {
                text: &self.text[start..end],
                offset: start,
            };
            if !stmt.body().trim_start_matches(';').trim().is_empty() {
                return Some(stmt);
            }
        }
        None
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    Quoted(u8),
    LineComment,
    BlockComment,
}

/// Return the byte index just past the first `;` at or after `from` that sits
/// outside literals and comments, or the text length if there is none.
pub fn find_statement_end(text: &str, from: usize) -> usize {
    let bytes = text.as_bytes();
    let mut state = ScanState::Code;
    let mut escaped = false;
    let mut i = from;

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            ScanState::Quoted(q) => {
                if escaped {
                    escaped = false;
                } else if b == b'\\' && q != b'`' {
                    escaped = true;
                } else if b == q {
                    state = ScanState::Code;
                }
            }
            ScanState::LineComment => match memchr::memchr(b'\n', &bytes[i..]) {
                Some(nl) => {
                    i += nl;
                    state = ScanState::Code;
                }
                None => return bytes.len(),
            },
            ScanState::BlockComment => match memchr::memmem::find(&bytes[i..], b"*/") {
                Some(end) => {
                    i += end + 1;
                    state = ScanState::Code;
                }
                None => return bytes.len(),
            },
            ScanState::Code => match b {
                b'\'' | b'"' | b'`' => state = ScanState::Quoted(b),
                b'-' if bytes.get(i + 1) == Some(&b'-')
                    && bytes.get(i + 2).map_or(true, |c| c.is_ascii_whitespace()) =>
                {
                    state = ScanState::LineComment;
                }
                b'#' if at_line_start(bytes, i) => state = ScanState::LineComment,
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    state = ScanState::BlockComment;
                    i += 1;
                }
                b';' => return i + 1,
                _ => {}
            },
        }
        i += 1;
    }

    bytes.len()
}

fn at_line_start(bytes: &[u8], i: usize) -> bool {
    bytes[..i]
        .iter()
        .rev()
        .take_while(|&&c| c != b'\n')
        .all(|c| c.is_ascii_whitespace())
}

/// Skip leading whitespace, `--`/`#` line comments and non-executable
/// `/* */` comments. MySQL versioned comments (`/*!40101 ... */`) are code
/// and are kept.
pub fn strip_leading_comments(stmt: &str) -> &str {
    let mut s = stmt.trim_start();
    loop {
        if s.starts_with("--") || s.starts_with('#') {
            match s.find('\n') {
                Some(nl) => s = s[nl + 1..].trim_start(),
                None => return "",
            }
        } else if s.starts_with("/*") && !s.starts_with("/*!") {
            match s.find("*/") {
                Some(end) => s = s[end + 2..].trim_start(),
                None => return "",
            }
        } else {
            return s;
        }
    }
}

/// Classify a statement and extract the table it targets.
pub fn parse_statement(stmt: &str) -> (StatementType, String) {
    let body = strip_leading_comments(stmt);

    let heads: [(&Lazy<Regex>, StatementType); 5] = [
        (&INSERT_HEAD_RE, StatementType::Insert),
        (&CREATE_TABLE_HEAD_RE, StatementType::CreateTable),
        (&ALTER_TABLE_HEAD_RE, StatementType::AlterTable),
        (&DROP_TABLE_HEAD_RE, StatementType::DropTable),
        (&LOCK_TABLES_HEAD_RE, StatementType::LockTables),
    ];

    for (re, typ) in heads {
        if let Some(m) = re.find(body) {
            if let Some((name, _)) = extract_table_name(body, m.end()) {
                return (typ, name);
            }
        }
    }

    (StatementType::Unknown, String::new())
}

/// Count the statements of a dump by type, keyed by [`StatementType::label`].
pub fn count_statement_types(text: &str) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for stmt in Statements::new(text) {
        *counts.entry(stmt.classify().0.label()).or_insert(0) += 1;
    }
    counts
}

/// Parse the head of an INSERT/REPLACE statement body.
///
/// Returns the target table and the byte index just past its name, so the
/// caller can continue with the optional column list and `VALUES`.
pub fn parse_insert_head(body: &str) -> Option<(String, usize)> {
    let m = INSERT_HEAD_RE.find(body)?;
    extract_table_name(body, m.end())
}

/// Read a possibly quoted, possibly schema-qualified table name starting at
/// `offset`. Returns the bare table name and the byte index just past it.
pub fn extract_table_name(stmt: &str, offset: usize) -> Option<(String, usize)> {
    let bytes = stmt.as_bytes();
    let mut i = offset;

    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }

    let (mut name, mut end) = read_identifier(stmt, i)?;

    // `db`.`table`: keep the last segment
    let mut j = end;
    while j < bytes.len() && bytes[j] == b'.' {
        let (next, next_end) = read_identifier(stmt, j + 1)?;
        name = next;
        end = next_end;
        j = end;
    }

    Some((name, end))
}

fn read_identifier(stmt: &str, start: usize) -> Option<(String, usize)> {
    let bytes = stmt.as_bytes();
    if start >= bytes.len() {
        return None;
    }

    if bytes[start] == b'`' || bytes[start] == b'"' {
        let q = bytes[start];
        let close = bytes[start + 1..].iter().position(|&b| b == q)? + start + 1;
        return Some((stmt[start + 1..close].to_string(), close + 1));
    }

    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() || matches!(b, b'(' | b';' | b',' | b'.') {
            break;
        }
        i += 1;
    }

    if i > start {
        Some((stmt[start..i].to_string(), i))
    } else {
        None
    }
}
