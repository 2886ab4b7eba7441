//! Records and their CRUD operations.
//!
//! A record type is a plain struct whose fields are `Option<T>` (unset is
//! `None`) plus a [`Model`] impl exposing the fields by attribute name.
//! The [`model!`](crate::model!) macro writes both and registers the
//! table schema. Class-level finders (`find`, `find_all`, `find_number`)
//! and instance writes (`save`, `update`, `remove`) are provided methods
//! that turn the schema's templates into `select`/`execute` calls.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Backend;
use crate::error::{OrmError, Result};
use crate::pool::Database;
use crate::query::{Param, Row};
use crate::schema::{quote, TableSchema};
use crate::value::Value;

/// Alias of the scalar selected by `find_number`
pub const NUMBER_ALIAS: &str = "_num_";

/// Row window for `find_all`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most `n` rows
    Count(u64),
    /// Skip `offset` rows, then at most `count`
    Range { offset: u64, count: u64 },
}

impl Limit {
    pub fn count(count: u64) -> Self {
        Limit::Count(count)
    }

    pub fn range(offset: u64, count: u64) -> Self {
        Limit::Range { offset, count }
    }

    /// Parse a loosely-typed limit: one non-negative integer, or an
    /// offset/count pair.
    pub fn from_values(values: &[Value]) -> Result<Self> {
        let as_count = |value: &Value| -> Result<u64> {
            value
                .as_i64()
                .filter(|_| !matches!(value, Value::Bool(_)))
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| {
                    OrmError::invalid_argument(format!("invalid limit value: {:?}", value))
                })
        };

        match values {
            [count] => Ok(Limit::Count(as_count(count)?)),
            [offset, count] => Ok(Limit::Range {
                offset: as_count(offset)?,
                count: as_count(count)?,
            }),
            _ => Err(OrmError::invalid_argument(format!(
                "limit takes a count or an (offset, count) pair, got {} values",
                values.len()
            ))),
        }
    }

    fn clause(self, backend: Backend) -> &'static str {
        match (self, backend) {
            (Limit::Count(_), _) => "limit ?",
            (Limit::Range { .. }, Backend::Postgres) => "offset ? rows fetch first ? rows only",
            (Limit::Range { .. }, _) => "limit ?, ?",
        }
    }

    fn args(self) -> Vec<Value> {
        let int = |n: u64| Value::Int(i64::try_from(n).unwrap_or(i64::MAX));
        match self {
            Limit::Count(count) => vec![int(count)],
            Limit::Range { offset, count } => vec![int(offset), int(count)],
        }
    }
}

impl TryFrom<Value> for Limit {
    type Error = OrmError;

    fn try_from(value: Value) -> Result<Self> {
        Limit::from_values(std::slice::from_ref(&value))
    }
}

/// Options for `find_all`: where clause with its arguments, ordering and
/// row window. Clauses are raw SQL fragments using `?` markers.
#[derive(Debug, Clone, Default)]
pub struct FindAll {
    filter: Option<String>,
    args: Vec<Value>,
    order_by: Option<String>,
    limit: Option<Limit>,
}

impl FindAll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter<I, V>(mut self, clause: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filter = Some(clause.into());
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Compose the statement and its positional arguments
    pub fn to_sql(&self, schema: &TableSchema, backend: Backend) -> (String, Vec<Value>) {
        let mut sql = schema.select_sql().to_owned();
        let mut args = self.args.clone();

        if let Some(filter) = &self.filter {
            sql.push_str(" where ");
            sql.push_str(filter);
        }
        if let Some(order_by) = &self.order_by {
            sql.push_str(" order by ");
            sql.push_str(order_by);
        }
        if let Some(limit) = self.limit {
            sql.push(' ');
            sql.push_str(limit.clause(backend));
            args.extend(limit.args());
        }

        (sql, args)
    }
}

/// A record type backed by a registered [`TableSchema`]
#[async_trait]
pub trait Model: Default + Send + Sync + 'static {
    /// The schema, registered on first use
    fn schema() -> &'static TableSchema;

    /// Current value of an attribute; `None` when unset or unknown
    fn get_field(&self, attr: &str) -> Option<Value>;

    /// Assign an attribute. `Value::Null` unsets it.
    fn set_field(&mut self, attr: &str, value: Value) -> Result<()>;

    /// Force schema registration, e.g. during startup
    fn register() -> &'static TableSchema {
        Self::schema()
    }

    fn get_value(&self, attr: &str) -> Value {
        self.get_field(attr).unwrap_or_default()
    }

    /// Current value, or the field's default assigned back onto the record
    /// when unset. Factories therefore run at most once per record.
    fn get_value_or_default(&mut self, attr: &str) -> Result<Value> {
        if let Some(value) = self.get_field(attr) {
            return Ok(value);
        }

        let schema = Self::schema();
        let field = schema
            .field(attr)
            .ok_or_else(|| OrmError::unknown_field(schema.table(), attr))?;

        match field.default() {
            Some(default) => {
                let value = default.resolve();
                debug!("using default value for {}: {}", attr, value);
                self.set_field(attr, value.clone())?;
                Ok(value)
            }
            None => Ok(Value::Null),
        }
    }

    /// Materialize a record from a result row. NULL columns stay unset;
    /// columns outside the schema are ignored.
    fn from_row(row: Row) -> Result<Self> {
        let schema = Self::schema();
        let mut record = Self::default();

        for (column, value) in row {
            let attr = schema.attribute_for_column(&column).unwrap_or(column.as_str());
            if schema.has_field(attr) && !value.is_null() {
                record.set_field(attr, value)?;
            }
        }

        Ok(record)
    }

    /// Arguments for the insert template, defaults applied
    fn insert_params(&mut self) -> Result<Vec<Param>> {
        let schema = Self::schema();
        let mut params = Vec::with_capacity(schema.fields().len() + 1);
        for attr in schema.fields().iter().map(String::as_str).chain([schema.primary_key()]) {
            let value = self.get_value_or_default(attr)?;
            params.push(typed_param(schema, attr, value));
        }
        Ok(params)
    }

    /// Arguments for the update template: current values, unset as NULL
    fn update_params(&self) -> Vec<Param> {
        let schema = Self::schema();
        schema
            .fields()
            .iter()
            .map(String::as_str)
            .chain([schema.primary_key()])
            .map(|attr| typed_param(schema, attr, self.get_value(attr)))
            .collect()
    }

    /// JSON object of every attribute, unset ones as null
    fn to_json(&self) -> serde_json::Value {
        let object = Self::schema()
            .attributes()
            .map(|attr| {
                let value = serde_json::to_value(self.get_value(attr)).unwrap_or_default();
                (attr.to_owned(), value)
            })
            .collect();
        serde_json::Value::Object(object)
    }

    /// Look a record up by primary key
    async fn find<K>(db: &Database, pk: K) -> Result<Option<Self>>
    where
        K: Into<Value> + Send,
    {
        let schema = Self::schema();
        let sql = format!(
            "{} where {}=?",
            schema.select_sql(),
            quote(schema.column(schema.primary_key()))
        );

        let rows = db.select(&sql, vec![pk.into()], Some(1)).await?;
        rows.into_iter().next().map(Self::from_row).transpose()
    }

    /// Records matching `query`, in the order the database returns them
    async fn find_all(db: &Database, query: FindAll) -> Result<Vec<Self>> {
        let (sql, args) = query.to_sql(Self::schema(), db.backend()?);
        let rows = db.select(&sql, args, None).await?;
        rows.into_iter().map(Self::from_row).collect()
    }

    /// Single scalar such as `count(id)`; `None` when no row comes back
    async fn find_number(
        db: &Database,
        select: &str,
        filter: Option<&str>,
        args: Vec<Value>,
    ) -> Result<Option<Value>> {
        let schema = Self::schema();
        let mut sql = format!(
            "select {} as {} from {}",
            select,
            NUMBER_ALIAS,
            quote(schema.table())
        );
        if let Some(filter) = filter {
            sql.push_str(" where ");
            sql.push_str(filter);
        }

        let rows = db.select(&sql, args, Some(1)).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.get(NUMBER_ALIAS).cloned()))
    }

    /// Insert the record, filling unset fields from their defaults.
    /// A row count other than 1 is logged, not returned as an error.
    async fn save(&mut self, db: &Database) -> Result<()> {
        let schema = Self::schema();
        let params = self.insert_params()?;

        let rows = db.execute_params(schema.insert_sql(), params, db.autocommit()?).await?;
        if rows != 1 {
            warn!("failed to insert record into {}: affected rows {}", schema.table(), rows);
        }
        Ok(())
    }

    /// Write the current values by primary key. No defaults are applied.
    async fn update(&self, db: &Database) -> Result<()> {
        let schema = Self::schema();
        let params = self.update_params();

        let rows = db.execute_params(schema.update_sql(), params, db.autocommit()?).await?;
        if rows != 1 {
            warn!("failed to update by primary key in {}: affected rows {}", schema.table(), rows);
        }
        Ok(())
    }

    /// Delete by primary key
    async fn remove(&self, db: &Database) -> Result<()> {
        let schema = Self::schema();
        let key = schema.primary_key();
        let params = vec![typed_param(schema, key, self.get_value(key))];

        let rows = db.execute_params(schema.delete_sql(), params, db.autocommit()?).await?;
        if rows != 1 {
            warn!("failed to remove by primary key from {}: affected rows {}", schema.table(), rows);
        }
        Ok(())
    }
}

fn typed_param(schema: &TableSchema, attr: &str, value: Value) -> Param {
    match schema.field(attr) {
        Some(field) => Param::typed(value, field.kind()),
        None => Param::from(value),
    }
}

/// Declare a record type and register its table schema.
///
/// Every field becomes `pub Option<T>`. The table name follows `=>`, or
/// defaults to the struct name. Registration runs once, on first use of
/// `Model::schema`; an invalid declaration panics there with the schema
/// error, which aborts startup.
///
/// ```ignore
/// awesome_orm::model! {
///     pub struct User => "users" {
///         id: String = Field::string().primary_key().default_with(next_id),
///         email: String = Field::string().ddl("varchar(50)"),
///         admin: bool = Field::boolean(),
///     }
/// }
/// ```
#[macro_export]
macro_rules! model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => $table:literal {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty = $desc:expr ),+ $(,)?
        }
    ) => {
        $crate::model!(@define [$(#[$meta])*] $vis $name ($table) { $( [$(#[$fmeta])*] $field : $ty = $desc ),+ });
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty = $desc:expr ),+ $(,)?
        }
    ) => {
        $crate::model!(@define [$(#[$meta])*] $vis $name (stringify!($name)) { $( [$(#[$fmeta])*] $field : $ty = $desc ),+ });
    };
    (
        @define [$(#[$meta:meta])*] $vis:vis $name:ident ($table:expr) {
            $( [$(#[$fmeta:meta])*] $field:ident : $ty:ty = $desc:expr ),+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $( $(#[$fmeta])* pub $field: ::std::option::Option<$ty>, )+
        }

        impl $crate::Model for $name {
            fn schema() -> &'static $crate::TableSchema {
                static SCHEMA: $crate::__private::Lazy<$crate::TableSchema> =
                    $crate::__private::Lazy::new(|| {
                        let builder = $crate::TableSchema::builder(stringify!($name)).table($table);
                        $( let builder = builder.field(stringify!($field), $desc); )+
                        match builder.build() {
                            Ok(schema) => schema,
                            Err(err) => panic!("cannot register model {}: {}", stringify!($name), err),
                        }
                    });
                &SCHEMA
            }

            fn get_field(&self, attr: &str) -> ::std::option::Option<$crate::Value> {
                match attr {
                    $( stringify!($field) => self.$field.clone().map($crate::FieldValue::into_value), )+
                    _ => None,
                }
            }

            fn set_field(&mut self, attr: &str, value: $crate::Value) -> $crate::Result<()> {
                match attr {
                    $(
                        stringify!($field) => {
                            self.$field = if value.is_null() {
                                None
                            } else {
                                Some(<$ty as $crate::FieldValue>::from_value(attr, value)?)
                            };
                            Ok(())
                        }
                    )+
                    _ => Err($crate::OrmError::unknown_field(
                        <Self as $crate::Model>::schema().table(),
                        attr,
                    )),
                }
            }
        }
    };
}
