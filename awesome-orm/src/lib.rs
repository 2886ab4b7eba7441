//! awesome-orm: declare record types once, get table schema, SQL templates,
//! pooled async access and CRUD operations.
//!
//! ```ignore
//! use awesome_orm::{model, Database, Field, Model, PoolConfig};
//!
//! model! {
//!     pub struct User => "users" {
//!         id: String = Field::string().primary_key().default_with(awesome_orm::next_id),
//!         name: String = Field::string(),
//!     }
//! }
//!
//! let db = Database::connect(&PoolConfig::load("awesome.toml")?).await?;
//! let mut user = User { name: Some("A".into()), ..Default::default() };
//! user.save(&db).await?;
//! let found = User::find(&db, user.id.clone()).await?;
//! ```

pub mod config;
pub mod defaults;
pub mod error;
pub mod field;
pub mod model;
pub mod pool;
pub mod query;
pub mod schema;
pub mod value;

pub use config::{Backend, PoolConfig};
pub use defaults::{next_id, now_timestamp};
pub use error::{OrmError, Result};
pub use field::{DefaultValue, Field, FieldKind};
pub use model::{FindAll, Limit, Model, NUMBER_ALIAS};
pub use pool::{Database, DbConnection};
pub use query::{translate, Param, Row};
pub use schema::{SchemaBuilder, TableSchema};
pub use value::{FieldValue, Value};

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}
