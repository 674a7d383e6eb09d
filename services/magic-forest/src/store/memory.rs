// In-memory store (per-process, not durable)
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{LedgerStore, TreeStore};
use crate::types::{Donation, ForestError, Result, Tree};

#[derive(Default)]
pub struct InMemoryStore {
    donations: RwLock<HashMap<String, Donation>>,
    trees: RwLock<Vec<Tree>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn insert_donation(&self, donation: &Donation) -> Result<()> {
        let mut donations = self.donations.write().await;
        if donations.contains_key(&donation.id) {
            return Err(ForestError::Store(format!(
                "Duplicate donation id: {}",
                donation.id
            )));
        }
        donations.insert(donation.id.clone(), donation.clone());
        Ok(())
    }

    async fn find_donation(&self, id: &str) -> Result<Option<Donation>> {
        Ok(self.donations.read().await.get(id).cloned())
    }

    async fn sum_amounts(&self) -> Result<Decimal> {
        Ok(self
            .donations
            .read()
            .await
            .values()
            .map(|d| d.amount)
            .sum())
    }
}

#[async_trait]
impl TreeStore for InMemoryStore {
    async fn insert_tree(&self, tree: &Tree) -> Result<()> {
        self.trees.write().await.push(tree.clone());
        Ok(())
    }

    async fn list_trees(&self, limit: usize) -> Result<Vec<Tree>> {
        let trees = self.trees.read().await;
        Ok(trees.iter().rev().take(limit).cloned().collect())
    }
}
