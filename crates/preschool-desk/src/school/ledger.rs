//! Fee schedule lookup and the paid/remaining ledger derived from payments.

use serde::Serialize;

use super::domain::{Money, Payment};
use super::lifecycle::PaymentStatus;

/// Static class to annual fee table applied when a form does not carry a fee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSchedule {
    entries: Vec<(String, Money)>,
    fallback: Money,
}

impl FeeSchedule {
    pub const DEFAULT_FALLBACK: Money = Money::from_major(20_000);

    pub fn standard() -> Self {
        let entries = [
            ("Nursery", 25_000),
            ("L.K.G.", 30_000),
            ("U.K.G.", 32_000),
            ("Class 1", 35_000),
        ]
        .into_iter()
        .map(|(class, fee)| (normalize_class(class), Money::from_major(fee)))
        .collect();

        Self {
            entries,
            fallback: Self::DEFAULT_FALLBACK,
        }
    }

    pub fn with_fallback(mut self, fallback: Money) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_class(mut self, class: &str, fee: Money) -> Self {
        let key = normalize_class(class);
        self.entries.retain(|(existing, _)| *existing != key);
        self.entries.push((key, fee));
        self
    }

    pub fn fallback(&self) -> Money {
        self.fallback
    }

    pub fn lookup(&self, class: &str) -> Option<Money> {
        let key = normalize_class(class);
        self.entries
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, fee)| *fee)
    }

    pub fn fee_for(&self, class: &str) -> Money {
        self.lookup(class).unwrap_or(self.fallback)
    }

    /// A caller supplied fee wins unless it is absent or zero.
    pub fn resolve(&self, requested: Option<Money>, class: &str) -> Money {
        match requested {
            Some(fee) if fee != Money::ZERO => fee,
            _ => self.fee_for(class),
        }
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::standard()
    }
}

// "L.K.G.", "lkg" and "LKG " all name the same class.
fn normalize_class(class: &str) -> String {
    class
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Paid and outstanding amounts for one admission or a group of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeLedger {
    pub total_fee: Money,
    pub paid_amount: Money,
    /// Not clamped: overpayment shows up as a negative balance.
    pub remaining_balance: Money,
    pub payment_percent: i64,
}

impl FeeLedger {
    pub fn compute<'a, I>(total_fee: Money, payments: I) -> Self
    where
        I: IntoIterator<Item = &'a Payment>,
    {
        Self::from_totals(total_fee, approved_total(payments))
    }

    pub fn from_totals(total_fee: Money, paid_amount: Money) -> Self {
        Self {
            total_fee,
            paid_amount,
            remaining_balance: total_fee - paid_amount,
            payment_percent: payment_percent(paid_amount, total_fee),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.remaining_balance <= Money::ZERO
    }
}

/// Sum of approved payment amounts; every other status is ignored.
pub fn approved_total<'a, I>(payments: I) -> Money
where
    I: IntoIterator<Item = &'a Payment>,
{
    payments
        .into_iter()
        .filter(|payment| payment.status == PaymentStatus::Approved)
        .map(|payment| payment.amount)
        .sum()
}

/// `round(100 * paid / total)`, or zero when there is no fee to pay against.
pub fn payment_percent(paid: Money, total: Money) -> i64 {
    if total.minor_units() <= 0 {
        return 0;
    }

    let ratio = paid.minor_units() as f64 * 100.0 / total.minor_units() as f64;
    ratio.round() as i64
}
