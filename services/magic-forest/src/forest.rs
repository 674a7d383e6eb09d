//! Tree eligibility gate and forest map placement

use chrono::Utc;
use rand::{Rng, RngCore};
use rust_decimal::Decimal;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

use crate::ledger::DonationLedger;
use crate::observability::{metrics, MetricsCollector};
use crate::store::TreeStore;
use crate::types::{Donation, DonationType, ForestError, NewTree, Placement, Result, Tree};

/// Map bounds in forest-map pixels
pub const MAP_X: RangeInclusive<f64> = 50.0..=950.0;
pub const MAP_Y: RangeInclusive<f64> = 50.0..=550.0;
pub const TREE_SIZE: RangeInclusive<f64> = 0.7..=1.2;

/// Maximum number of trees returned by a listing
pub const TREE_LIST_LIMIT: usize = 100;

/// Recurring donations always qualify; one-time donations need `threshold`
pub fn is_eligible(donation: &Donation, threshold: Decimal) -> bool {
    match donation.donation_type {
        DonationType::Recurring => true,
        DonationType::OneTime => donation.amount >= threshold,
    }
}

/// Draw a placement: x, then y, then size
pub fn draw_placement<R: Rng + ?Sized>(rng: &mut R) -> Placement {
    Placement {
        x: rng.gen_range(MAP_X),
        y: rng.gen_range(MAP_Y),
        size: rng.gen_range(TREE_SIZE),
    }
}

pub struct TreeGate {
    ledger: Arc<DonationLedger>,
    trees: Arc<dyn TreeStore>,
    threshold: Decimal,
    rng: Mutex<Box<dyn RngCore + Send>>,
    metrics: MetricsCollector,
}

impl TreeGate {
    pub fn new(
        ledger: Arc<DonationLedger>,
        trees: Arc<dyn TreeStore>,
        threshold: Decimal,
        rng: Box<dyn RngCore + Send>,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            ledger,
            trees,
            threshold,
            rng: Mutex::new(rng),
            metrics,
        }
    }

    /// Plant a tree for `request.donation_id` if the donation qualifies
    pub async fn create_tree(&self, request: NewTree) -> Result<Tree> {
        let donation = self.ledger.get(&request.donation_id).await?;

        if !is_eligible(&donation, self.threshold) {
            self.metrics.increment(metrics::TREES_INELIGIBLE, 1).await;
            info!(
                donation_id = %donation.id,
                amount = %donation.amount,
                "tree_ineligible"
            );
            return Err(ForestError::Ineligible(format!(
                "Donation amount must be at least ${} to plant a tree",
                self.threshold
            )));
        }

        let placement = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            draw_placement(&mut *rng)
        };

        let tree = Tree {
            id: Uuid::new_v4().to_string(),
            donation_id: donation.id,
            donor: request.donor,
            message: request.message,
            species: request.species,
            x: placement.x,
            y: placement.y,
            size: placement.size,
            timestamp: Utc::now(),
        };

        self.trees.insert_tree(&tree).await?;
        self.metrics.increment(metrics::TREES_PLANTED, 1).await;

        info!(
            tree_id = %tree.id,
            donation_id = %tree.donation_id,
            species = %tree.species,
            "tree_planted"
        );

        Ok(tree)
    }

    /// Most recent trees, capped at [`TREE_LIST_LIMIT`]
    pub async fn list_trees(&self) -> Result<Vec<Tree>> {
        self.trees.list_trees(TREE_LIST_LIMIT).await
    }
}
