#![allow(dead_code)]

use std::path::PathBuf;

use chrono::NaiveDate;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{ClaimSheet, Engine, ExpenseItem, ExpenseNew, Money};
use migration::MigratorTrait;
use uuid::Uuid;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    engine_with_url("sqlite::memory:").await
}

/// Engine over `url` with users alice and bob.
pub async fn engine_with_url(url: &str) -> (Engine, DatabaseConnection) {
    let db = connect(url).await;
    migration::Migrator::up(&db, None).await.unwrap();
    for username in ["alice", "bob"] {
        add_user(&db, username).await;
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub async fn connect(url: &str) -> DatabaseConnection {
    let mut options = ConnectOptions::new(url);
    options.max_connections(1).sqlx_logging(false);
    Database::connect(options).await.unwrap()
}

/// SQLite file in the temp directory, removed on drop.
pub struct TempDb {
    path: PathBuf,
}

impl TempDb {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("claimsheets-{}.db", Uuid::new_v4()));
        Self { path }
    }

    pub fn url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path.display())
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

pub async fn add_user(db: &DatabaseConnection, username: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password) VALUES (?, ?)",
        vec![username.into(), "password".into()],
    ))
    .await
    .unwrap();
}

pub async fn sheet(engine: &Engine, claim_number: &str, user: &str) -> ClaimSheet {
    engine
        .create_claim_sheet("Conference trip", claim_number, "Travel", user)
        .await
        .unwrap()
}

pub fn expense_new(bill_no: &str, amount_minor: i64) -> ExpenseNew {
    ExpenseNew {
        bill_no: bill_no.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
        issued_by: "Blue Cabs".to_string(),
        details: format!("Ride for bill {bill_no}"),
        amount: Money::new(amount_minor),
    }
}

/// Create one expense per bill number, returning them in creation order.
pub async fn expenses(
    engine: &Engine,
    claim_sheet_id: Uuid,
    bills: &[&str],
    user: &str,
) -> Vec<ExpenseItem> {
    let mut out = Vec::new();
    for (index, bill) in bills.iter().enumerate() {
        let amount = 100 * (index as i64 + 1);
        out.push(
            engine
                .create_expense(claim_sheet_id, expense_new(bill, amount), user)
                .await
                .unwrap(),
        );
    }
    out
}

pub fn ids(expenses: &[ExpenseItem]) -> Vec<Uuid> {
    expenses.iter().map(|expense| expense.id).collect()
}

pub fn serials(expenses: &[ExpenseItem]) -> Vec<i32> {
    expenses.iter().map(|expense| expense.serial_no).collect()
}
