//! Schema extraction from CREATE TABLE statements.
//!
//! Only the ordered column names are recovered; types, keys and constraints
//! are not needed to zip INSERT values into rows.

mod ddl;

pub use ddl::{
    extract_table_body, find_create_table, leading_quoted_identifier, list_create_table_names,
    parse_column_list, split_table_body,
};

use serde::Serialize;

/// Ordered column names of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    /// Table name
    pub name: String,
    /// Column names in declaration order
    pub columns: Vec<String>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Resolve a column name case-insensitively to the schema's spelling.
    pub fn resolve_column(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.as_str() == name)
            .or_else(|| self.columns.iter().find(|c| c.eq_ignore_ascii_case(name)))
            .map(|c| c.as_str())
    }
}

/// Extract the column list of `table` from the dump.
///
/// Returns `None` when the dump has no CREATE TABLE for the table, and a
/// schema with no columns when the table exists but no column definition
/// could be recognised.
pub fn extract_schema(dump: &str, table: &str) -> Option<TableSchema> {
    let start = find_create_table(dump, table)?;
    let body = extract_table_body(dump, start).unwrap_or("");

    let columns = split_table_body(body)
        .into_iter()
        .filter_map(leading_quoted_identifier)
        .map(str::to_string)
        .collect();

    Some(TableSchema::new(table, columns))
}

/// Names of all tables declared in the dump, in declaration order.
pub fn list_tables(dump: &str) -> Vec<String> {
    list_create_table_names(dump)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"
DROP TABLE IF EXISTS `users`;
/*!40101 SET @saved_cs_client     = @@character_set_client */;
CREATE TABLE `users` (
  `id` bigint(20) unsigned NOT NULL AUTO_INCREMENT,
  `name` varchar(255) COLLATE utf8mb4_unicode_ci NOT NULL COMMENT 'full name, display',
  `status` enum('active','banned') NOT NULL DEFAULT 'active',
  `created_at` timestamp NULL DEFAULT NULL,
  PRIMARY KEY (`id`),
  UNIQUE KEY `users_email_unique` (`name`),
  CONSTRAINT `fk` FOREIGN KEY (`id`) REFERENCES `other` (`id`)
) ENGINE=InnoDB AUTO_INCREMENT=5 DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci;
"#;

    #[test]
    fn test_extract_schema_columns_in_order() {
        let schema = extract_schema(DUMP, "users").unwrap();
        assert_eq!(schema.columns, vec!["id", "name", "status", "created_at"]);
    }

    #[test]
    fn test_extract_schema_not_found() {
        assert!(extract_schema(DUMP, "posts").is_none());
    }

    #[test]
    fn test_extract_schema_found_but_empty() {
        let dump = "CREATE TABLE `odd` (\n  id int,\n  name text\n);";
        let schema = extract_schema(dump, "odd").unwrap();
        assert!(schema.is_empty());
    }

    #[test]
    fn test_resolve_column() {
        let schema = TableSchema::new("t", vec!["Id".into(), "name".into()]);
        assert_eq!(schema.resolve_column("Id"), Some("Id"));
        assert_eq!(schema.resolve_column("id"), Some("Id"));
        assert_eq!(schema.resolve_column("missing"), None);
    }

    #[test]
    fn test_list_tables() {
        assert_eq!(list_tables(DUMP), vec!["users"]);
    }
}
