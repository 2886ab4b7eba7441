//! Column descriptors.
//!
//! A [`Field`] describes one column: its optional explicit name, SQL
//! column type, primary-key flag and default. The set of kinds is closed;
//! each [`FieldKind`] supplies its own column type and default policy.

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Default column definition for string fields
pub const DEFAULT_STRING_DDL: &str = "varchar(100)";

/// The closed set of field kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Boolean,
    Integer,
    Float,
    Text,
}

impl FieldKind {
    /// Column type used when the declaration does not override it
    pub fn column_type(self) -> &'static str {
        match self {
            FieldKind::String => DEFAULT_STRING_DDL,
            FieldKind::Boolean => "boolean",
            FieldKind::Integer => "bigint",
            FieldKind::Float => "real",
            FieldKind::Text => "text",
        }
    }

    /// Default applied to unset fields when nothing else is declared
    pub fn default_value(self) -> Option<DefaultValue> {
        match self {
            FieldKind::Boolean => Some(DefaultValue::Literal(Value::Bool(false))),
            FieldKind::Integer => Some(DefaultValue::Literal(Value::Int(0))),
            FieldKind::Float => Some(DefaultValue::Literal(Value::Float(0.0))),
            FieldKind::String | FieldKind::Text => None,
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            FieldKind::String => "StringField",
            FieldKind::Boolean => "BooleanField",
            FieldKind::Integer => "IntegerField",
            FieldKind::Float => "FloatField",
            FieldKind::Text => "TextField",
        }
    }
}

/// Default for an unset field: a literal, or a factory evaluated lazily
#[derive(Clone)]
pub enum DefaultValue {
    Literal(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Produce the default. Factories run on every call; callers store the
    /// result so a record evaluates each factory at most once.
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Immutable column descriptor
#[derive(Debug, Clone)]
pub struct Field {
    kind: FieldKind,
    name: Option<String>,
    column_type: String,
    primary_key: bool,
    default: Option<DefaultValue>,
}

impl Field {
    fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            name: None,
            column_type: kind.column_type().to_owned(),
            primary_key: false,
            default: kind.default_value(),
        }
    }

    pub fn string() -> Self {
        Self::of(FieldKind::String)
    }

    pub fn boolean() -> Self {
        Self::of(FieldKind::Boolean)
    }

    pub fn integer() -> Self {
        Self::of(FieldKind::Integer)
    }

    pub fn float() -> Self {
        Self::of(FieldKind::Float)
    }

    pub fn text() -> Self {
        Self::of(FieldKind::Text)
    }

    /// Explicit column name (defaults to the record attribute name)
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Explicit column definition, e.g. `varchar(50)`. Only string fields
    /// take a custom definition; other kinds keep their fixed column type.
    pub fn ddl(mut self, ddl: impl Into<String>) -> Self {
        if self.kind == FieldKind::String {
            self.column_type = ddl.into();
        }
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Zero-argument factory evaluated the first time an unset field is read
    pub fn default_with<F, T>(mut self, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<Value>,
    {
        self.default = Some(DefaultValue::Factory(Arc::new(move || factory().into())));
        self
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn column_type(&self) -> &str {
        &self.column_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{},{}:{}>",
            self.kind.type_name(),
            self.column_type,
            self.name.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_kind_defaults() {
        assert_eq!(Field::string().column_type(), "varchar(100)");
        assert!(Field::string().default().is_none());
        assert_eq!(Field::boolean().default().unwrap().resolve(), Value::Bool(false));
        assert_eq!(Field::integer().column_type(), "bigint");
        assert_eq!(Field::integer().default().unwrap().resolve(), Value::Int(0));
        assert_eq!(Field::float().column_type(), "real");
        assert_eq!(Field::float().default().unwrap().resolve(), Value::Float(0.0));
        assert_eq!(Field::text().column_type(), "text");
        assert!(Field::text().default().is_none());
    }

    #[test]
    fn test_ddl_only_applies_to_strings() {
        assert_eq!(Field::string().ddl("varchar(50)").column_type(), "varchar(50)");
        assert_eq!(Field::boolean().ddl("varchar(50)").column_type(), "boolean");
    }

    #[test]
    fn test_factory_runs_per_resolve() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let field = Field::float().default_with(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            1.5
        });

        let default = field.default().unwrap();
        assert_eq!(default.resolve(), Value::Float(1.5));
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_display() {
        let field = Field::string().named("email").ddl("varchar(50)");
        assert_eq!(field.to_string(), "<StringField,varchar(50):email>");
    }
}
