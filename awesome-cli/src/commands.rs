//! Subcommand implementations. Each takes the connected pool handle.

use anyhow::{Context, Result};
use awesome_orm::{Database, FindAll, Limit, Model, Value};
use clap::Args;
use tracing::info;

use crate::models::{register_all, User};

#[derive(Args, Debug)]
pub struct AddUserArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Login email
    #[arg(long)]
    pub email: String,

    /// Password hash
    #[arg(long)]
    pub passwd: String,

    /// Avatar URL
    #[arg(long, default_value = "about:blank")]
    pub image: String,

    /// Grant administrator rights
    #[arg(long)]
    pub admin: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// User id (primary key)
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// SQL where clause using `?` markers, e.g. "`admin`=?"
    #[arg(long = "where")]
    pub filter: Option<String>,

    /// Arguments for the where clause, in order
    #[arg(long = "arg")]
    pub args: Vec<String>,

    /// SQL order by clause
    #[arg(long, default_value = "`created_at` desc")]
    pub order_by: String,

    /// Maximum number of users
    #[arg(long)]
    pub limit: Option<i64>,

    /// Rows to skip (requires --limit)
    #[arg(long, requires = "limit")]
    pub offset: Option<i64>,
}

#[derive(Args, Debug)]
pub struct CountArgs {
    /// SQL where clause using `?` markers
    #[arg(long = "where")]
    pub filter: Option<String>,

    /// Arguments for the where clause, in order
    #[arg(long = "arg")]
    pub args: Vec<String>,
}

/// Create every table that does not exist yet
pub async fn run_init(db: &Database) -> Result<()> {
    for schema in register_all() {
        db.execute(&schema.create_table_sql(), vec![], true)
            .await
            .with_context(|| format!("Failed to create table {}", schema.table()))?;
        info!("table ready: {}", schema.table());
    }
    Ok(())
}

pub async fn run_add_user(db: &Database, args: AddUserArgs) -> Result<()> {
    let mut user = User {
        name: Some(args.name),
        email: Some(args.email),
        passwd: Some(args.passwd),
        image: Some(args.image),
        admin: args.admin.then_some(true),
        ..Default::default()
    };
    user.save(db).await.context("Failed to save user")?;
    println!("{}", serde_json::to_string_pretty(&user.to_json())?);
    Ok(())
}

pub async fn run_show(db: &Database, args: ShowArgs) -> Result<()> {
    match User::find(db, args.id.as_str()).await? {
        Some(user) => println!("{}", serde_json::to_string_pretty(&user.to_json())?),
        None => anyhow::bail!("No user with id {}", args.id),
    }
    Ok(())
}

pub async fn run_list(db: &Database, args: ListArgs) -> Result<()> {
    let mut query = FindAll::new().order_by(args.order_by);
    if let Some(filter) = args.filter {
        query = query.filter(filter, args.args);
    }

    let window: Vec<Value> = args.offset.into_iter().chain(args.limit).map(Value::from).collect();
    if !window.is_empty() {
        query = query.limit(Limit::from_values(&window)?);
    }

    let users = User::find_all(db, query).await?;
    let rendered: Vec<_> = users.iter().map(Model::to_json).collect();
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}

pub async fn run_count(db: &Database, args: CountArgs) -> Result<()> {
    let values = args.args.into_iter().map(Value::from).collect();
    let count = User::find_number(db, "count(id)", args.filter.as_deref(), values).await?;
    println!("{}", count.unwrap_or(Value::Int(0)));
    Ok(())
}
