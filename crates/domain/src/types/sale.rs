//! Financed sales and their payment history.
//!
//! Sales are owned by the sales subsystem; the lockout core only reads them
//! (plus their payments) and never mutates them directly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How often an installment payment is expected on a financed sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    Daily,
    Weekly,
    Fortnightly,
    Monthly,
}

impl PaymentFrequency {
    /// Parse a stored frequency value.
    ///
    /// Unrecognized values fall back to [`PaymentFrequency::Weekly`]. This
    /// leniency is a documented business policy rather than an error: legacy
    /// rows carry free-text frequencies and the collections flow must keep
    /// working for them.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "fortnightly" | "biweekly" => Self::Fortnightly,
            "monthly" => Self::Monthly,
            _ => Self::Weekly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Fortnightly => "fortnightly",
            Self::Monthly => "monthly",
        }
    }
}

/// Lifecycle status of a financed sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    PendingCredit,
    Active,
    PaidOff,
}

impl SaleStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending_credit" => Some(Self::PendingCredit),
            "active" => Some(Self::Active),
            "paid_off" => Some(Self::PaidOff),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingCredit => "pending_credit",
            Self::Active => "active",
            Self::PaidOff => "paid_off",
        }
    }
}

/// An installment/credit sale with a remaining balance.
///
/// Invariants: `balance_due <= total_amount`; the sale is paid off iff
/// `balance_due <= 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancedSale {
    pub id: i64,
    pub client_id: i64,
    /// Denormalized for audit detail lines; the client record itself lives
    /// in the clients subsystem.
    pub client_name: String,
    pub total_amount: f64,
    pub balance_due: f64,
    pub frequency: PaymentFrequency,
    pub sale_date: NaiveDate,
    pub status: SaleStatus,
    pub is_credit: bool,
    pub tenant_id: String,
}

impl FinancedSale {
    /// A sale counts as paid off when its status says so or its balance has
    /// reached zero; both make the linked device unconditionally
    /// unlock-eligible.
    pub fn is_paid_off(&self) -> bool {
        self.status == SaleStatus::PaidOff || self.balance_due <= 0.0
    }
}

/// A single installment payment. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub sale_id: i64,
    pub amount: f64,
    pub paid_at: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_frequencies() {
        assert_eq!(PaymentFrequency::parse("daily"), PaymentFrequency::Daily);
        assert_eq!(PaymentFrequency::parse("Weekly"), PaymentFrequency::Weekly);
        assert_eq!(PaymentFrequency::parse("fortnightly"), PaymentFrequency::Fortnightly);
        assert_eq!(PaymentFrequency::parse(" monthly "), PaymentFrequency::Monthly);
    }

    #[test]
    fn unrecognized_frequency_falls_back_to_weekly() {
        assert_eq!(PaymentFrequency::parse("quarterly"), PaymentFrequency::Weekly);
        assert_eq!(PaymentFrequency::parse(""), PaymentFrequency::Weekly);
    }

    #[test]
    fn paid_off_by_status_or_balance() {
        let mut sale = FinancedSale {
            id: 1,
            client_id: 1,
            client_name: "Ana Reyes".into(),
            total_amount: 4500.0,
            balance_due: 1200.0,
            frequency: PaymentFrequency::Weekly,
            sale_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            status: SaleStatus::Active,
            is_credit: true,
            tenant_id: "t1".into(),
        };
        assert!(!sale.is_paid_off());

        sale.balance_due = 0.0;
        assert!(sale.is_paid_off());

        sale.balance_due = 300.0;
        sale.status = SaleStatus::PaidOff;
        assert!(sale.is_paid_off());
    }
}
