use dump_migrate::parser::{
    parse_statement, parse_value, parse_value_with, split_row_into_fields, split_rows, LexOptions,
    ScalarValue, StatementType, Statements,
};

mod value_tests {
    use super::*;

    #[test]
    fn test_null_any_case() {
        assert_eq!(parse_value("NULL"), ScalarValue::Null);
        assert_eq!(parse_value("null"), ScalarValue::Null);
        assert_eq!(parse_value("'NULL'"), ScalarValue::Str("NULL".into()));
    }

    #[test]
    fn test_escaped_quote() {
        assert_eq!(parse_value(r"'O\'Brien'"), ScalarValue::Str("O'Brien".into()));
        assert_eq!(parse_value(r#""say \"hi\"""#), ScalarValue::Str("say \"hi\"".into()));
        assert_eq!(parse_value(r"'back\\slash'"), ScalarValue::Str(r"back\slash".into()));
    }

    #[test]
    fn test_numerals() {
        assert_eq!(parse_value("42"), ScalarValue::Int(42));
        assert_eq!(parse_value("-7"), ScalarValue::Int(-7));
        assert_eq!(parse_value("3.25"), ScalarValue::Float(3.25));
        assert_eq!(parse_value("'42'"), ScalarValue::Str("42".into()));
    }

    #[test]
    fn test_fallback_keeps_raw_token() {
        assert_eq!(parse_value("CURRENT_TIMESTAMP"), ScalarValue::Str("CURRENT_TIMESTAMP".into()));
        assert_eq!(parse_value("1e5"), ScalarValue::Str("1e5".into()));
        assert_eq!(parse_value("'unterminated"), ScalarValue::Str("'unterminated".into()));
    }

    #[test]
    fn test_booleans_only_when_enabled() {
        let on = LexOptions {
            detect_booleans: true,
        };
        assert_eq!(parse_value("TRUE"), ScalarValue::Str("TRUE".into()));
        assert_eq!(parse_value_with("TRUE", on), ScalarValue::Bool(true));
        assert_eq!(parse_value_with("false", on), ScalarValue::Bool(false));
        assert_eq!(parse_value_with("'true'", on), ScalarValue::Str("true".into()));
    }
}

mod row_tests {
    use super::*;

    #[test]
    fn test_split_rows_quoted_comma_and_doubled_quote() {
        let rows = split_rows("(1,'a,b',NULL),(2,'c''d',3)");
        assert_eq!(rows, vec!["1,'a,b',NULL", "2,'c''d',3"]);
    }

    #[test]
    fn test_split_rows_single_row() {
        assert_eq!(split_rows("(1,'x')"), vec!["1,'x'"]);
    }

    #[test]
    fn test_split_rows_boundary_inside_string() {
        let rows = split_rows(r"(1,'a),(b'),(2,'it\'s')");
        assert_eq!(rows, vec!["1,'a),(b'", r"2,'it\'s'"]);
    }

    #[test]
    fn test_split_rows_whitespace_between_rows() {
        let rows = split_rows("(1,'a'),\n  (2,'b')");
        assert_eq!(rows, vec!["1,'a'", "2,'b'"]);
    }

    #[test]
    fn test_split_rows_nested_parens() {
        let rows = split_rows("(1,POINT(1,2)),(2,NULL)");
        assert_eq!(rows, vec!["1,POINT(1,2)", "2,NULL"]);
    }

    #[test]
    fn test_split_rows_malformed_is_one_row() {
        assert_eq!(split_rows("garbage without rows"), vec!["garbage without rows"]);
        assert!(split_rows("").is_empty());
    }

    #[test]
    fn test_split_fields() {
        let fields = split_row_into_fields(r"1, 'a,b' ,NULL,'x\'y',POINT(1,2)");
        assert_eq!(fields, vec!["1", "'a,b'", "NULL", r"'x\'y'", "POINT(1,2)"]);
        assert!(split_row_into_fields("   ").is_empty());
    }

    #[test]
    fn test_split_is_deterministic() {
        let text = "(1,'a'),(2,'b'),(3,'c')";
        assert_eq!(split_rows(text), split_rows(text));
    }
}

mod statement_tests {
    use super::*;

    #[test]
    fn test_parse_insert_variants() {
        assert_eq!(
            parse_statement("INSERT INTO `users` VALUES (1);"),
            (StatementType::Insert, "users".to_string())
        );
        assert_eq!(
            parse_statement("insert ignore into shop.`orders` (id) values (1);"),
            (StatementType::Insert, "orders".to_string())
        );
        assert_eq!(
            parse_statement("REPLACE INTO plans VALUES (1);"),
            (StatementType::Insert, "plans".to_string())
        );
    }

    #[test]
    fn test_parse_ddl() {
        assert_eq!(
            parse_statement("CREATE TABLE IF NOT EXISTS `users` (id INT);"),
            (StatementType::CreateTable, "users".to_string())
        );
        assert_eq!(
            parse_statement("/* dump */ DROP TABLE IF EXISTS `users`;"),
            (StatementType::DropTable, "users".to_string())
        );
        assert_eq!(parse_statement("SET NAMES utf8mb4;").0, StatementType::Unknown);
    }

    #[test]
    fn test_statements_skip_semicolons_in_literals_and_comments() {
        let dump = "-- header; not a statement\nINSERT INTO `a` VALUES ('x;y');\n/* ; */INSERT INTO `b` VALUES (1);\n";
        let stmts: Vec<_> = Statements::new(dump).collect();
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].classify().1, "a");
        assert!(stmts[0].text.ends_with("('x;y');"));
        assert_eq!(stmts[1].classify().1, "b");
        assert_eq!(&dump[stmts[1].offset..stmts[1].offset + stmts[1].text.len()], stmts[1].text);
    }
}
