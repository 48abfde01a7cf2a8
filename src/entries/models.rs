use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, Type};
use std::fmt;
use uuid::Uuid;

/// Vehicle type for a visitor entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "vehicle_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Car,
    Motorcycle,
    Bicycle,
    Other,
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "car",
            VehicleType::Motorcycle => "motorcycle",
            VehicleType::Bicycle => "bicycle",
            VehicleType::Other => "other",
        }
    }
}

/// Vehicle entry entity - one visitor parking charge. This IS the fee
/// record: `amount` with the paid/free flags, where at most one flag is
/// ever set.
///
/// Eligible matcher input is the subset with both flags false, ordered by
/// `entered_at` ascending.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VehicleEntry {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub plate: String,
    pub vehicle_type: VehicleType,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
    pub is_paid: bool,
    pub is_free: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub freed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VehicleEntry {
    /// An entry is pending while it has neither been paid nor compensated.
    pub fn is_pending(&self) -> bool {
        !self.is_paid && !self.is_free
    }
}

/// Pending totals for one co-owner (count and sum of eligible fees).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PendingSummary {
    pub owner_id: Uuid,
    pub pending_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub pending_total: Decimal,
}

/// Per-owner totals across the fee lifecycle, for the report endpoint.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OwnerReport {
    pub owner_id: Uuid,
    pub entry_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub collected_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub compensated_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub pending_total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(is_paid: bool, is_free: bool) -> VehicleEntry {
        VehicleEntry {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            plate: "ABC123".to_string(),
            vehicle_type: VehicleType::Car,
            amount: dec!(2.50),
            entered_at: Utc::now(),
            exited_at: None,
            is_paid,
            is_free,
            paid_at: None,
            freed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pending_requires_both_flags_clear() {
        assert!(entry(false, false).is_pending());
        assert!(!entry(true, false).is_pending());
        assert!(!entry(false, true).is_pending());
    }

    #[test]
    fn test_vehicle_type_as_str() {
        assert_eq!(VehicleType::Car.as_str(), "car");
        assert_eq!(VehicleType::Motorcycle.as_str(), "motorcycle");
    }
}
