//! Shared fixtures: a SQLite-backed pool in a temp dir, the `users` record
//! type and a tracing layer that collects WARN messages.

#![allow(dead_code)]

use std::fmt;
use std::sync::{Arc, Mutex};

use awesome_orm::{model, next_id, now_timestamp, Database, Field, Model, PoolConfig};
use tempfile::TempDir;
use tracing::field::{Field as TracingField, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

model! {
    pub struct User => "users" {
        id: String = Field::string().primary_key().default_with(next_id).ddl("varchar(50)"),
        email: String = Field::string().ddl("varchar(50)"),
        passwd: String = Field::string().ddl("varchar(50)"),
        admin: bool = Field::boolean(),
        name: String = Field::string().ddl("varchar(50)"),
        image: String = Field::string().ddl("varchar(500)"),
        created_at: f64 = Field::float().default_with(now_timestamp),
    }
}

pub struct TestDb {
    pub db: Database,
    // keeps the database file alive for the test
    _dir: TempDir,
}

pub async fn setup(maxsize: u32) -> TestDb {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = PoolConfig::sqlite(dir.path().join("awesome.db"));
    config.maxsize = maxsize;
    config.acquire_timeout_secs = 5;

    let db = Database::connect(&config).await.expect("pool creation failed");
    db.execute(&User::schema().create_table_sql(), vec![], true)
        .await
        .expect("create table failed");

    TestDb { db, _dir: dir }
}

pub fn new_user(name: &str) -> User {
    User {
        email: Some(format!("{}@b.com", name.to_lowercase())),
        passwd: Some("x".into()),
        name: Some(name.into()),
        image: Some("about:blank".into()),
        ..Default::default()
    }
}

/// Collects the message of every WARN event
#[derive(Clone, Default)]
pub struct WarnCollector {
    messages: Arc<Mutex<Vec<String>>>,
}

impl WarnCollector {
    /// Install for the current thread; events stop being collected when
    /// the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::set_default(subscriber)
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for WarnCollector {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.messages.lock().unwrap().push(visitor.0);
        }
    }
}
