//! Persistence for donations and trees

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{Donation, Result, Tree};

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Donation records keyed by id
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_donation(&self, donation: &Donation) -> Result<()>;

    async fn find_donation(&self, id: &str) -> Result<Option<Donation>>;

    /// Sum of `amount` across all donations, zero when empty
    async fn sum_amounts(&self) -> Result<Decimal>;
}

/// Tree records keyed by id
#[async_trait]
pub trait TreeStore: Send + Sync {
    async fn insert_tree(&self, tree: &Tree) -> Result<()>;

    /// Most recent trees first, at most `limit`
    async fn list_trees(&self, limit: usize) -> Result<Vec<Tree>>;
}
