//! Row and field splitting for INSERT value lists.
//!
//! Both splitters are single left-to-right scans over the bytes of the input
//! with the same string state machine: a quote byte opens a literal, the same
//! quote byte closes it, and a backslash inside a literal escapes exactly one
//! following byte. Parenthesis depth is tracked only outside literals.
//!
//! All delimiters are ASCII, so every returned slice starts and ends on a
//! UTF-8 character boundary of the input.

/// String-literal tracking shared by the splitters.
#[derive(Debug, Default, Clone, Copy)]
struct QuoteState {
    quote: Option<u8>,
    escaped: bool,
}

impl QuoteState {
    /// Feed one byte. Returns `true` when the byte is part of a literal
    /// (including its opening and closing quotes) and must not be treated
    /// as structure.
    #[inline]
    fn advance(&mut self, b: u8) -> bool {
        if let Some(q) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if b == b'\\' {
                self.escaped = true;
            } else if b == q {
                self.quote = None;
            }
            return true;
        }

        if b == b'\'' || b == b'"' {
            self.quote = Some(b);
            return true;
        }

        false
    }
}

/// Split the value list of one INSERT statement into row texts.
///
/// Accepts the list with or without its outermost parentheses:
/// `(1,'a'),(2,'b')` and `1,'a'),(2,'b'` both yield `["1,'a'", "2,'b'"]`.
/// A row boundary is a `)` `,` `(` sequence at depth zero outside any
/// literal; whitespace between the three characters is tolerated.
///
/// Never fails. Text without any boundary comes back as a single row.
pub fn split_rows(values_text: &str) -> Vec<&str> {
    let text = strip_outer_parens(values_text);
    if text.is_empty() {
        return Vec::new();
    }

    let bytes = text.as_bytes();
    let mut rows = Vec::new();
    let mut state = QuoteState::default();
    let mut depth: usize = 0;
    let mut row_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if state.advance(b) {
            i += 1;
            continue;
        }

        match b {
            b'(' => depth += 1,
            b')' if depth > 0 => depth -= 1,
            b')' => {
                if let Some(next_row) = row_boundary_end(bytes, i) {
                    rows.push(text[row_start..i].trim());
                    row_start = next_row;
                    i = next_row;
                    continue;
                }
            }
            _ => {}
        }

        i += 1;
    }

    let last = text[row_start..].trim();
    if !last.is_empty() || rows.is_empty() {
        rows.push(last);
    }

    rows
}

/// Split one row text into raw field tokens on top-level commas.
///
/// Tokens are trimmed but still carry their quotes; hand them to
/// [`super::value::parse_value`] to get typed values.
pub fn split_row_into_fields(row_text: &str) -> Vec<&str> {
    if row_text.trim().is_empty() {
        return Vec::new();
    }

    let bytes = row_text.as_bytes();
    let mut fields = Vec::new();
    let mut state = QuoteState::default();
    let mut depth: usize = 0;
    let mut field_start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        if state.advance(b) {
            continue;
        }

        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                fields.push(row_text[field_start..i].trim());
                field_start = i + 1;
            }
            _ => {}
        }
    }

    fields.push(row_text[field_start..].trim());
    fields
}

/// If a row boundary starts at `close` (a `)` byte), return the index just
/// past its `(`.
fn row_boundary_end(bytes: &[u8], close: usize) -> Option<usize> {
    let mut j = skip_ws(bytes, close + 1);
    if bytes.get(j) != Some(&b',') {
        return None;
    }
    j = skip_ws(bytes, j + 1);
    if bytes.get(j) != Some(&b'(') {
        return None;
    }
    Some(j + 1)
}

#[inline]
fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Drop surrounding whitespace, a trailing `;`, and one pair of outer parens.
///
/// The trailing `)` is only removed when a leading `(` was, so an already
/// stripped list ending in a function call like `NOW()` keeps its paren.
fn strip_outer_parens(text: &str) -> &str {
    let mut t = text.trim();
    if let Some(rest) = t.strip_suffix(';') {
        t = rest.trim_end();
    }
    if let Some(rest) = t.strip_prefix('(') {
        t = rest.strip_suffix(')').unwrap_or(rest);
    }
    t.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_rows_multi() {
        let rows = split_rows("(1,'a,b',NULL),(2,'c''d',3)");
        assert_eq!(rows, vec!["1,'a,b',NULL", "2,'c''d',3"]);
    }

    #[test]
    fn test_split_rows_single() {
        assert_eq!(split_rows("(1,2,3)"), vec!["1,2,3"]);
    }

    #[test]
    fn test_split_rows_already_stripped() {
        assert_eq!(split_rows("1,'a'),(2,'b'"), vec!["1,'a'", "2,'b'"]);
    }

    #[test]
    fn test_split_rows_keeps_function_paren_when_stripped() {
        assert_eq!(split_rows("1,NOW()"), vec!["1,NOW()"]);
    }

    #[test]
    fn test_split_rows_boundary_inside_string() {
        let rows = split_rows("(1,'x),(y'),(2,'z')");
        assert_eq!(rows, vec!["1,'x),(y'", "2,'z'"]);
    }

    #[test]
    fn test_split_rows_escaped_quote() {
        let rows = split_rows(r"(1,'it\'s),(fine'),(2,'ok')");
        assert_eq!(rows, vec![r"1,'it\'s),(fine'", "2,'ok'"]);
    }

    #[test]
    fn test_split_rows_nested_parens() {
        let rows = split_rows("(1,POINT(1,2)),(2,POINT(3,4))");
        assert_eq!(rows, vec!["1,POINT(1,2)", "2,POINT(3,4)"]);
    }

    #[test]
    fn test_split_rows_whitespace_between_rows() {
        let rows = split_rows("(1,'a'),\n(2,'b'), (3,'c');");
        assert_eq!(rows, vec!["1,'a'", "2,'b'", "3,'c'"]);
    }

    #[test]
    fn test_split_rows_empty() {
        assert!(split_rows("").is_empty());
        assert!(split_rows("   ").is_empty());
    }

    #[test]
    fn test_split_rows_unterminated_string_degrades() {
        let rows = split_rows("(1,'abc),(2,'d')");
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_split_fields_basic() {
        assert_eq!(
            split_row_into_fields("1,'a,b',NULL"),
            vec!["1", "'a,b'", "NULL"]
        );
    }

    #[test]
    fn test_split_fields_trims() {
        assert_eq!(split_row_into_fields(" 1 , 'x' "), vec!["1", "'x'"]);
    }

    #[test]
    fn test_split_fields_nested_call() {
        assert_eq!(
            split_row_into_fields("1,CONCAT('a','b'),3"),
            vec!["1", "CONCAT('a','b')", "3"]
        );
    }

    #[test]
    fn test_split_fields_double_quotes() {
        assert_eq!(
            split_row_into_fields(r#""a,\"b",2"#),
            vec![r#""a,\"b""#, "2"]
        );
    }

    #[test]
    fn test_split_fields_empty() {
        assert!(split_row_into_fields("").is_empty());
    }
}
