//! Database schema types for SQLFlow.
//!
//! The introspected schema is only ever consumed as prompt text, so the model
//! here is deliberately small: tables, columns, primary and foreign keys.

use serde::{Deserialize, Serialize};

/// Represents the tables of one database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: Vec<Table>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Formats the schema as `CREATE TABLE` statements for the SQL prompt.
    ///
    /// Foreign keys are rendered inside the owning table's definition so the
    /// model sees join paths next to the columns they use.
    pub fn format_for_llm(&self) -> String {
        if self.tables.is_empty() {
            return "(no tables)".to_string();
        }

        self.tables
            .iter()
            .map(|table| self.format_table(table))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn format_table(&self, table: &Table) -> String {
        let mut lines: Vec<String> = table.columns.iter().map(format_column).collect();

        if !table.primary_key.is_empty() {
            lines.push(format!("PRIMARY KEY ({})", table.primary_key.join(", ")));
        }

        lines.extend(
            self.foreign_keys
                .iter()
                .filter(|fk| fk.from_table == table.name)
                .map(|fk| {
                    format!(
                        "FOREIGN KEY ({}) REFERENCES {}({})",
                        fk.from_columns.join(", "),
                        fk.to_table,
                        fk.to_columns.join(", ")
                    )
                }),
        );

        let body = lines
            .iter()
            .map(|line| format!("\t{line}"))
            .collect::<Vec<_>>()
            .join(",\n");

        format!("CREATE TABLE {} (\n{}\n)", table.name, body)
    }
}

fn format_column(column: &Column) -> String {
    let mut line = format!("{} {}", column.name, column.data_type);
    if !column.is_nullable {
        line.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        line.push_str(" DEFAULT ");
        line.push_str(default);
    }
    line
}

/// Represents a database table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    /// Column names that form the primary key.
    pub primary_key: Vec<String>,
}

impl Table {
    /// Creates a new table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,

    /// Data type as reported by the server (e.g., "int", "varchar(255)").
    pub data_type: String,

    pub is_nullable: bool,

    /// Default value expression, if any.
    pub default: Option<String>,
}

impl Column {
    /// Creates a new nullable column with the given name and data type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default: None,
        }
    }

    /// Sets whether the column is nullable.
    pub fn nullable(self, nullable: bool) -> Self {
        Self {
            is_nullable: nullable,
            ..self
        }
    }

    /// Sets the default value.
    pub fn with_default(self, default: impl Into<String>) -> Self {
        Self {
            default: Some(default.into()),
            ..self
        }
    }
}

/// Represents a foreign key relationship between tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub from_table: String,
    pub from_columns: Vec<String>,
    pub to_table: String,
    pub to_columns: Vec<String>,
}

impl ForeignKey {
    /// Creates a new foreign key relationship.
    pub fn new(
        from_table: impl Into<String>,
        from_columns: Vec<String>,
        to_table: impl Into<String>,
        to_columns: Vec<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_columns,
            to_table: to_table.into(),
            to_columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_schema() -> Schema {
        Schema {
            tables: vec![
                Table {
                    name: "customers".to_string(),
                    columns: vec![
                        Column::new("id", "int").nullable(false),
                        Column::new("email", "varchar(255)").nullable(false),
                        Column::new("name", "varchar(100)"),
                    ],
                    primary_key: vec!["id".to_string()],
                },
                Table {
                    name: "orders".to_string(),
                    columns: vec![
                        Column::new("id", "int").nullable(false),
                        Column::new("customer_id", "int").nullable(false),
                        Column::new("status", "varchar(20)")
                            .nullable(false)
                            .with_default("'pending'"),
                    ],
                    primary_key: vec!["id".to_string()],
                },
            ],
            foreign_keys: vec![ForeignKey::new(
                "orders",
                vec!["customer_id".to_string()],
                "customers",
                vec!["id".to_string()],
            )],
        }
    }

    #[test]
    fn test_format_single_table() {
        let schema = Schema {
            tables: vec![Table {
                name: "t".to_string(),
                columns: vec![Column::new("a", "int")],
                primary_key: vec![],
            }],
            foreign_keys: vec![],
        };

        assert_eq!(schema.format_for_llm(), "CREATE TABLE t (\n\ta int\n)");
    }

    #[test]
    fn test_format_includes_keys_and_defaults() {
        let formatted = sample_schema().format_for_llm();

        assert!(formatted.contains("CREATE TABLE customers ("));
        assert!(formatted.contains("\temail varchar(255) NOT NULL,"));
        assert!(formatted.contains("\tPRIMARY KEY (id)"));
        assert!(formatted.contains("\tstatus varchar(20) NOT NULL DEFAULT 'pending'"));
        assert!(formatted.contains("\tFOREIGN KEY (customer_id) REFERENCES customers(id)"));
    }

    #[test]
    fn test_foreign_key_only_on_owning_table() {
        let formatted = sample_schema().format_for_llm();
        let customers = formatted.split("\n\n").next().unwrap();
        assert!(!customers.contains("FOREIGN KEY"));
    }

    #[test]
    fn test_empty_schema() {
        assert_eq!(Schema::new().format_for_llm(), "(no tables)");
    }

    #[test]
    fn test_column_builder() {
        let col = Column::new("email", "varchar(255)")
            .nullable(false)
            .with_default("''");

        assert_eq!(col.name, "email");
        assert!(!col.is_nullable);
        assert_eq!(col.default, Some("''".to_string()));
    }
}
