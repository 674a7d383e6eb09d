use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::gateway::ProviderError;

/// One-time gift or monthly subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DonationType {
    OneTime,
    Recurring,
}

impl DonationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationType::OneTime => "one-time",
            DonationType::Recurring => "recurring",
        }
    }
}

impl FromStr for DonationType {
    type Err = ForestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "one-time" => Ok(DonationType::OneTime),
            "recurring" => Ok(DonationType::Recurring),
            other => Err(ForestError::InvalidInput(format!(
                "Invalid donation type: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for DonationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recurring donation tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Seedling,
    Guardian,
    Ranger,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Seedling => "seedling",
            Plan::Guardian => "guardian",
            Plan::Ranger => "ranger",
        }
    }

    /// Monthly price in USD major units
    pub fn monthly_amount(&self) -> Decimal {
        match self {
            Plan::Seedling => Decimal::from(5),
            Plan::Guardian => Decimal::from(15),
            Plan::Ranger => Decimal::from(30),
        }
    }

    /// "Guardian" for product names shown on the checkout page
    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Seedling => "Seedling",
            Plan::Guardian => "Guardian",
            Plan::Ranger => "Ranger",
        }
    }
}

impl FromStr for Plan {
    type Err = ForestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "seedling" => Ok(Plan::Seedling),
            "guardian" => Ok(Plan::Guardian),
            "ranger" => Ok(Plan::Ranger),
            _ => Err(ForestError::InvalidInput("Invalid plan".to_string())),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    ApplePay,
    GooglePay,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::ApplePay => "apple_pay",
            PaymentMethod::GooglePay => "google_pay",
            PaymentMethod::Wallet => "wallet",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ForestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "card" => Ok(PaymentMethod::Card),
            "apple_pay" => Ok(PaymentMethod::ApplePay),
            "google_pay" => Ok(PaymentMethod::GooglePay),
            "wallet" => Ok(PaymentMethod::Wallet),
            other => Err(ForestError::InvalidInput(format!(
                "Invalid payment method: {}",
                other
            ))),
        }
    }
}

/// Donation fields supplied by a client or derived from a checkout session
///
/// Validation covers only the amount's sign. A `plan` on a one-time
/// donation is stored as given: plan legality is checked where
/// subscription checkouts are created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewDonation {
    #[serde(rename = "type")]
    pub donation_type: DonationType,
    #[serde(with = "rust_decimal::serde::float")]
    #[validate(custom = "crate::amount::validate_non_negative")]
    pub amount: Decimal,
    #[serde(default)]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl NewDonation {
    pub fn new(donation_type: DonationType, amount: Decimal) -> Self {
        Self {
            donation_type,
            amount,
            plan: None,
            email: None,
            payment_status: None,
            session_id: None,
            payment_method: PaymentMethod::Card,
        }
    }
}

/// Stored donation record. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donation {
    pub id: String,
    #[serde(rename = "type")]
    pub donation_type: DonationType,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub plan: Option<Plan>,
    pub email: Option<String>,
    pub payment_status: Option<String>,
    pub session_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub timestamp: DateTime<Utc>,
}

impl Donation {
    pub fn from_new(id: String, input: NewDonation, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            donation_type: input.donation_type,
            amount: input.amount,
            plan: input.plan,
            email: input.email,
            payment_status: input.payment_status,
            session_id: input.session_id,
            payment_method: input.payment_method,
            timestamp,
        }
    }
}

/// Tree planting request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTree {
    pub donation_id: String,
    pub donor: String,
    pub message: String,
    #[serde(rename = "type")]
    pub species: String,
}

/// Position and scale on the forest map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub id: String,
    pub donation_id: String,
    pub donor: String,
    pub message: String,
    #[serde(rename = "type")]
    pub species: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub timestamp: DateTime<Utc>,
}

/// Error types for donation and tree operations
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Ineligible(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Store(String),
}

/// Result type for donation and tree operations
pub type Result<T> = std::result::Result<T, ForestError>;

/// Treats a missing, null or blank string as absent
pub fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}
