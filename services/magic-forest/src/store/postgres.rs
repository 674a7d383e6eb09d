//! Postgres-backed store
//!
//! Amounts are kept as `NUMERIC` and travel through sqlx as `BigDecimal`;
//! the rest of the service works in `rust_decimal::Decimal`.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use super::{LedgerStore, TreeStore};
use crate::types::{Donation, DonationType, ForestError, PaymentMethod, Plan, Result, Tree};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply embedded migrations
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("✓ Migrations applied");

        Ok(Self { pool })
    }
}

fn store_error(e: sqlx::Error) -> ForestError {
    ForestError::Store(e.to_string())
}

fn decode_error(e: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(e))
}

fn to_big_decimal(amount: Decimal) -> Result<BigDecimal> {
    BigDecimal::from_str(&amount.to_string())
        .map_err(|e| ForestError::Store(format!("Unrepresentable amount {}: {}", amount, e)))
}

fn to_decimal(value: &BigDecimal) -> std::result::Result<Decimal, sqlx::Error> {
    let text = value.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(decode_error)
}

fn donation_from_row(row: &PgRow) -> std::result::Result<Donation, sqlx::Error> {
    let donation_type: String = row.try_get("donation_type")?;
    let plan: Option<String> = row.try_get("plan")?;
    let payment_method: String = row.try_get("payment_method")?;
    let amount: BigDecimal = row.try_get("amount")?;

    Ok(Donation {
        id: row.try_get("id")?,
        donation_type: DonationType::from_str(&donation_type).map_err(decode_error)?,
        amount: to_decimal(&amount)?,
        plan: plan
            .as_deref()
            .map(Plan::from_str)
            .transpose()
            .map_err(decode_error)?,
        email: row.try_get("email")?,
        payment_status: row.try_get("payment_status")?,
        session_id: row.try_get("session_id")?,
        payment_method: PaymentMethod::from_str(&payment_method).map_err(decode_error)?,
        timestamp: row.try_get("created_at")?,
    })
}

fn tree_from_row(row: &PgRow) -> std::result::Result<Tree, sqlx::Error> {
    Ok(Tree {
        id: row.try_get("id")?,
        donation_id: row.try_get("donation_id")?,
        donor: row.try_get("donor")?,
        message: row.try_get("message")?,
        species: row.try_get("species")?,
        x: row.try_get("x")?,
        y: row.try_get("y")?,
        size: row.try_get("size")?,
        timestamp: row.try_get("created_at")?,
    })
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn insert_donation(&self, donation: &Donation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO donations (
                id, donation_type, amount, plan, email, payment_status,
                session_id, payment_method, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&donation.id)
        .bind(donation.donation_type.as_str())
        .bind(to_big_decimal(donation.amount)?)
        .bind(donation.plan.map(|p| p.as_str()))
        .bind(&donation.email)
        .bind(&donation.payment_status)
        .bind(&donation.session_id)
        .bind(donation.payment_method.as_str())
        .bind(donation.timestamp)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn find_donation(&self, id: &str) -> Result<Option<Donation>> {
        let row = sqlx::query("SELECT * FROM donations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.as_ref()
            .map(donation_from_row)
            .transpose()
            .map_err(store_error)
    }

    async fn sum_amounts(&self) -> Result<Decimal> {
        let total: BigDecimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM donations")
                .fetch_one(&self.pool)
                .await
                .map_err(store_error)?;

        to_decimal(&total).map_err(store_error)
    }
}

#[async_trait]
impl TreeStore for PgStore {
    async fn insert_tree(&self, tree: &Tree) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO trees (
                id, donation_id, donor, message, species, x, y, size, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&tree.id)
        .bind(&tree.donation_id)
        .bind(&tree.donor)
        .bind(&tree.message)
        .bind(&tree.species)
        .bind(tree.x)
        .bind(tree.y)
        .bind(tree.size)
        .bind(tree.timestamp)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn list_trees(&self, limit: usize) -> Result<Vec<Tree>> {
        let rows = sqlx::query("SELECT * FROM trees ORDER BY created_at DESC LIMIT $1")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        rows.iter()
            .map(tree_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_error)
    }
}
