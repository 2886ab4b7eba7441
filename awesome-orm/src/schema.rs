//! Table schema registration.
//!
//! [`SchemaBuilder`] turns a record-type definition (table name plus named
//! [`Field`] descriptors) into an immutable [`TableSchema`] carrying the
//! SQL templates every record of that type uses. Templates quote
//! identifiers with backticks and use `?` as the placeholder marker; the
//! query layer translates both for the configured backend.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::error::{OrmError, Result};
use crate::field::Field;

/// Driver-agnostic placeholder marker used in every template
pub const PLACEHOLDER: char = '?';

/// Quote an identifier for a template
pub fn quote(ident: &str) -> String {
    format!("`{}`", ident)
}

/// `?, ?, ?` with `count` markers
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Immutable table metadata and generated statements
#[derive(Debug)]
pub struct TableSchema {
    model: String,
    table: String,
    primary_key: String,
    fields: Vec<String>,
    mappings: HashMap<String, Field>,
    columns: HashMap<String, String>,
    select_sql: String,
    insert_sql: String,
    update_sql: String,
    delete_sql: String,
}

impl TableSchema {
    /// Start declaring a record type. The table name defaults to `model`.
    pub fn builder(model: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            model: model.into(),
            table: None,
            fields: Vec::new(),
        }
    }

    /// Name of the record type this schema was registered for
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Attribute name of the primary key
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Non-key attribute names in declaration order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// All attribute names, primary key first
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_key.as_str()).chain(self.fields.iter().map(String::as_str))
    }

    pub fn field(&self, attr: &str) -> Option<&Field> {
        self.mappings.get(attr)
    }

    pub fn has_field(&self, attr: &str) -> bool {
        self.mappings.contains_key(attr)
    }

    /// Column name for an attribute (the attribute name unless overridden)
    pub fn column<'a>(&'a self, attr: &'a str) -> &'a str {
        self.columns.get(attr).map(String::as_str).unwrap_or(attr)
    }

    /// Attribute bound to a result column
    pub fn attribute_for_column(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(_, col)| col.as_str() == column)
            .map(|(attr, _)| attr.as_str())
    }

    /// `select `pk`, `col`... from `table``
    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }

    /// `insert into `table` (`col`..., `pk`) values (?...)`
    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    /// `update `table` set `col`=?... where `pk` = ?`
    pub fn update_sql(&self) -> &str {
        &self.update_sql
    }

    /// `delete from `table` where `pk`=?`
    pub fn delete_sql(&self) -> &str {
        &self.delete_sql
    }

    /// `create table if not exists` statement built from the column types.
    /// Uses the same quoting as the templates.
    pub fn create_table_sql(&self) -> String {
        let mut defs: Vec<String> = Vec::with_capacity(self.fields.len() + 2);
        for attr in self.attributes() {
            let field = &self.mappings[attr];
            let mut def = format!("{} {}", quote(self.column(attr)), field.column_type());
            if field.is_primary_key() {
                def.push_str(" not null");
            }
            defs.push(def);
        }
        defs.push(format!("primary key ({})", quote(self.column(&self.primary_key))));

        format!(
            "create table if not exists {} ({})",
            quote(&self.table),
            defs.join(", ")
        )
    }
}

/// Collects a record-type definition and validates it into a [`TableSchema`]
#[derive(Debug)]
pub struct SchemaBuilder {
    model: String,
    table: Option<String>,
    fields: Vec<(String, Field)>,
}

impl SchemaBuilder {
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Declare a field; declaration order is preserved
    pub fn field(mut self, attr: impl Into<String>, field: Field) -> Self {
        self.fields.push((attr.into(), field));
        self
    }

    pub fn build(self) -> Result<TableSchema> {
        let table = self.table.unwrap_or_else(|| self.model.clone());
        info!("found model: {} (table: {})", self.model, table);

        let mut mappings = HashMap::with_capacity(self.fields.len());
        let mut columns = HashMap::with_capacity(self.fields.len());
        let mut seen_columns = HashSet::with_capacity(self.fields.len());
        let mut primary_key: Option<String> = None;
        let mut fields = Vec::with_capacity(self.fields.len());

        for (attr, field) in self.fields {
            debug!("found mapping: {} ==> {}", attr, field);

            if mappings.contains_key(&attr) {
                return Err(OrmError::schema(&table, format!("duplicate field '{}'", attr)));
            }

            let column = field.name().unwrap_or(&attr).to_owned();
            if !seen_columns.insert(column.clone()) {
                return Err(OrmError::schema(
                    &table,
                    format!("duplicate column '{}' for field '{}'", column, attr),
                ));
            }

            if field.is_primary_key() {
                if primary_key.is_some() {
                    return Err(OrmError::schema(
                        &table,
                        format!("duplicate primary key for field '{}'", attr),
                    ));
                }
                primary_key = Some(attr.clone());
            } else {
                fields.push(attr.clone());
            }

            columns.insert(attr.clone(), column);
            mappings.insert(attr, field);
        }

        let primary_key =
            primary_key.ok_or_else(|| OrmError::schema(&table, "primary key not found"))?;

        let column_of = |attr: &str| columns.get(attr).cloned().unwrap_or_else(|| attr.to_owned());
        let pk_column = quote(&column_of(&primary_key));
        let escaped_fields: Vec<String> = fields.iter().map(|f| quote(&column_of(f))).collect();
        let quoted_table = quote(&table);

        let select_sql = if escaped_fields.is_empty() {
            format!("select {} from {}", pk_column, quoted_table)
        } else {
            format!(
                "select {}, {} from {}",
                pk_column,
                escaped_fields.join(", "),
                quoted_table
            )
        };

        let insert_columns: Vec<&str> = escaped_fields
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(pk_column.as_str()))
            .collect();
        let insert_sql = format!(
            "insert into {} ({}) values ({})",
            quoted_table,
            insert_columns.join(", "),
            placeholders(insert_columns.len())
        );

        // With no other columns the set clause is a no-op so the statement
        // still takes a single key argument.
        let set_clause = if escaped_fields.is_empty() {
            format!("{}={}", pk_column, pk_column)
        } else {
            escaped_fields
                .iter()
                .map(|col| format!("{}=?", col))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let update_sql = format!(
            "update {} set {} where {} = ?",
            quoted_table, set_clause, pk_column
        );

        let delete_sql = format!("delete from {} where {}=?", quoted_table, pk_column);

        Ok(TableSchema {
            model: self.model,
            table,
            primary_key,
            fields,
            mappings,
            columns,
            select_sql,
            insert_sql,
            update_sql,
            delete_sql,
        })
    }
}
