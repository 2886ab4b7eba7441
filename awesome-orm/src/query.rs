//! Query execution: `select` and `execute`.
//!
//! Both primitives translate the template's `?` markers and backtick
//! quotes for the configured backend, check a connection out of the pool
//! for the duration of the call and bind arguments positionally. The
//! connection goes back to the pool when the call returns, fails or is
//! cancelled.

use std::borrow::Cow;

use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use sqlx::{Column, Connection, Row as _, TypeInfo, ValueRef};
use tracing::{debug, info, warn};

use crate::config::Backend;
use crate::error::Result;
use crate::field::FieldKind;
use crate::pool::{Database, DbConnection};
use crate::schema::PLACEHOLDER;
use crate::value::Value;

/// Rewrite a template for `backend`.
///
/// MySQL and SQLite accept templates as written. PostgreSQL gets numbered
/// `$n` markers and double-quoted identifiers. Text inside single-quoted
/// literals is left alone.
pub fn translate(backend: Backend, sql: &str) -> Cow<'_, str> {
    if !backend.numbered_placeholders() {
        return Cow::Borrowed(sql);
    }

    let quote = backend.identifier_quote();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut in_literal = false;
    let mut index = 0;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            _ if in_literal => out.push(ch),
            PLACEHOLDER => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
            }
            '`' => out.push(quote),
            _ => out.push(ch),
        }
    }

    Cow::Owned(out)
}

/// A positional argument. Arguments written to a known column carry its
/// kind so a NULL is sent with the column's type rather than as text.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    value: Value,
    kind: Option<FieldKind>,
}

impl Param {
    pub fn typed(value: Value, kind: FieldKind) -> Self {
        Self {
            value,
            kind: Some(kind),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn kind(&self) -> Option<FieldKind> {
        self.kind
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Self { value, kind: None }
    }
}

/// One result row: column names with their values, in select order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

/// Run `$body` with `$c` bound to the native connection inside `$conn`
/// and `$db` naming its driver
macro_rules! with_conn {
    ($conn:expr, $c:ident: $db:ident => $body:expr) => {
        match $conn {
            DbConnection::Mysql($c) => {
                type $db = sqlx::MySql;
                $body
            }
            DbConnection::Postgres($c) => {
                type $db = sqlx::Postgres;
                $body
            }
            DbConnection::Sqlite($c) => {
                type $db = sqlx::Sqlite;
                $body
            }
        }
    };
}

macro_rules! bind_params {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for Param { value, kind } in $params {
            query = match (value, kind) {
                (Value::Null, Some(FieldKind::Boolean)) => query.bind(None::<bool>),
                (Value::Null, Some(FieldKind::Integer)) => query.bind(None::<i64>),
                (Value::Null, Some(FieldKind::Float)) => query.bind(None::<f64>),
                (Value::Null, _) => query.bind(None::<String>),
                (Value::Bool(b), _) => query.bind(b),
                (Value::Int(n), _) => query.bind(n),
                (Value::Float(f), _) => query.bind(f),
                (Value::Text(s), _) => query.bind(s),
            };
        }
        query
    }};
}

// Booleans are recognised by the column's declared type (BOOLEAN on
// SQLite, tinyint(1) on MySQL, BOOL on PostgreSQL); the other scalars
// are tried from integer to text.
macro_rules! decode_row {
    ($row:expr) => {{
        let row = $row;
        row.columns()
            .iter()
            .map(|column| -> Result<(String, Value)> {
                let index = column.ordinal();
                let value = if row.try_get_raw(index)?.is_null() {
                    Value::Null
                } else if column.type_info().name().to_ascii_uppercase().contains("BOOL") {
                    Value::Bool(row.try_get::<bool, _>(index)?)
                } else if let Ok(n) = row.try_get::<i64, _>(index) {
                    Value::Int(n)
                } else if let Ok(n) = row.try_get::<i32, _>(index) {
                    Value::Int(i64::from(n))
                } else if let Ok(n) = row.try_get::<i16, _>(index) {
                    Value::Int(i64::from(n))
                } else if let Ok(f) = row.try_get::<f64, _>(index) {
                    Value::Float(f)
                } else if let Ok(f) = row.try_get::<f32, _>(index) {
                    Value::Float(f64::from(f))
                } else if let Ok(s) = row.try_get::<String, _>(index) {
                    Value::Text(s)
                } else {
                    let bytes = row.try_get::<Vec<u8>, _>(index)?;
                    Value::Text(String::from_utf8_lossy(&bytes).into_owned())
                };
                Ok((column.name().to_owned(), value))
            })
            .collect::<Result<Vec<_>>>()
            .map(Row::new)
    }};
}

impl Database {
    /// Run a read statement and return up to `limit` rows (all rows when
    /// `limit` is `None`).
    pub async fn select(&self, sql: &str, args: Vec<Value>, limit: Option<usize>) -> Result<Vec<Row>> {
        let sql = translate(self.backend()?, sql);
        info!("SQL: {}", sql);
        debug!("args: {:?}", args);

        let params = args.into_iter().map(Param::from);
        let mut conn = self.acquire().await?;
        let rows = with_conn!(&mut conn, c: Driver => {
            let query = bind_params!(sqlx::query::<Driver>(&sql), params);
            let raw: Vec<_> = match limit {
                Some(size) => query.fetch(&mut **c).take(size).try_collect().await?,
                None => query.fetch_all(&mut **c).await?,
            };
            raw.iter().map(|row| decode_row!(row)).collect::<Result<Vec<_>>>()?
        });

        info!("rows returned: {}", rows.len());
        Ok(rows)
    }

    /// Run a write statement and return the affected row count.
    ///
    /// With `autocommit == false` the statement runs inside an explicit
    /// transaction: committed on success, rolled back once on failure. The
    /// statement's own error is returned either way.
    pub async fn execute(&self, sql: &str, args: Vec<Value>, autocommit: bool) -> Result<u64> {
        let params = args.into_iter().map(Param::from).collect();
        self.execute_params(sql, params, autocommit).await
    }

    /// [`Database::execute`] with column-typed arguments
    pub async fn execute_params(&self, sql: &str, params: Vec<Param>, autocommit: bool) -> Result<u64> {
        let sql = translate(self.backend()?, sql);
        info!("SQL: {}", sql);
        debug!("args: {:?}", params);

        let mut conn = self.acquire().await?;
        with_conn!(&mut conn, c: Driver => {
            let query = bind_params!(sqlx::query::<Driver>(&sql), params);
            if autocommit {
                let done = query.execute(&mut **c).await?;
                Ok(done.rows_affected())
            } else {
                let mut tx = c.begin().await?;
                match query.execute(&mut *tx).await {
                    Ok(done) => {
                        tx.commit().await?;
                        Ok(done.rows_affected())
                    }
                    Err(err) => {
                        if let Err(rollback_err) = tx.rollback().await {
                            warn!("rollback failed after statement error: {}", rollback_err);
                        }
                        Err(err.into())
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_and_sqlite_keep_template() {
        let sql = "select `id` from `users` where `id`=?";
        assert!(matches!(translate(Backend::Mysql, sql), Cow::Borrowed(s) if s == sql));
        assert!(matches!(translate(Backend::Sqlite, sql), Cow::Borrowed(s) if s == sql));
    }

    #[test]
    fn test_postgres_numbers_placeholders() {
        let sql = "update `users` set `email`=?, `name`=? where `id` = ?";
        assert_eq!(
            translate(Backend::Postgres, sql),
            r#"update "users" set "email"=$1, "name"=$2 where "id" = $3"#
        );
    }

    #[test]
    fn test_postgres_skips_literals() {
        let sql = "select `id` from `t` where `note` = 'why? `x`' and `id` = ?";
        assert_eq!(
            translate(Backend::Postgres, sql),
            r#"select "id" from "t" where "note" = 'why? `x`' and "id" = $1"#
        );
    }

    #[test]
    fn test_row_lookup() {
        let row = Row::new(vec![
            ("id".into(), Value::Text("a".into())),
            ("admin".into(), Value::Int(0)),
        ]);
        assert_eq!(row.get("admin"), Some(&Value::Int(0)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_untyped_param() {
        let param = Param::from(Value::Null);
        assert_eq!(param.kind(), None);
        assert!(param.value().is_null());
        assert_eq!(
            Param::typed(Value::Null, FieldKind::Boolean).kind(),
            Some(FieldKind::Boolean)
        );
    }
}
