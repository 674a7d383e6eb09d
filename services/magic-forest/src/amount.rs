//! Amount handling between USD major units and provider minor units

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use validator::ValidationError;

use crate::types::{ForestError, Result};

/// Cents per dollar
const MINOR_PER_MAJOR: i64 = 100;

/// Convert a major-unit amount (dollars) to minor units (cents)
///
/// Fractions of a cent are truncated, never rounded.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    if amount < Decimal::ZERO {
        return Err(ForestError::InvalidInput(format!(
            "Amount cannot be negative: {}",
            amount
        )));
    }

    amount
        .checked_mul(Decimal::from(MINOR_PER_MAJOR))
        .and_then(|minor| minor.trunc().to_i64())
        .ok_or_else(|| ForestError::InvalidInput(format!("Amount {} is too large", amount)))
}

/// Validator rule for stored donation amounts
pub fn validate_non_negative(amount: &Decimal) -> std::result::Result<(), ValidationError> {
    if *amount >= Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("amount_must_not_be_negative"))
    }
}

/// Validator rule for amounts sent to the payment provider
pub fn validate_positive(amount: &Decimal) -> std::result::Result<(), ValidationError> {
    if *amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("amount_must_be_positive"))
    }
}
