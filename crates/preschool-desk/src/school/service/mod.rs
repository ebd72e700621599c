//! Service facade over the record store and object storage.
//!
//! Every operation takes the authenticated [`Caller`] explicitly; nothing here
//! reads ambient session state.

mod admissions;
mod content;
mod dashboard;
mod payments;
mod profiles;
mod queries;

pub use dashboard::{AdminDashboard, ParentDashboard};

use std::cmp::Reverse;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::access::{AccessError, Caller};
use super::domain::Money;
use super::ledger::FeeSchedule;
use super::lifecycle::TransitionError;
use super::repository::{RecordStore, RepositoryError};
use super::storage::{ObjectStore, StorageError};

/// Number of upcoming events shown on the parent dashboard.
pub const UPCOMING_EVENT_LIMIT: usize = 5;
/// Number of announcements shown on the parent dashboard.
pub const DASHBOARD_ANNOUNCEMENT_LIMIT: usize = 3;
/// Length of the "recent" preview lists on the admin dashboard.
pub const RECENT_PREVIEW_LIMIT: usize = 5;

pub struct SchoolService<S, O> {
    store: Arc<S>,
    objects: Arc<O>,
    fees: FeeSchedule,
    last_upload_millis: AtomicI64,
}

static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_record_id(prefix: &str) -> String {
    let id = RECORD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

impl<S, O> SchoolService<S, O>
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    pub fn new(store: Arc<S>, objects: Arc<O>, fees: FeeSchedule) -> Self {
        Self {
            store,
            objects,
            fees,
            last_upload_millis: AtomicI64::new(0),
        }
    }

    pub fn fee_schedule(&self) -> &FeeSchedule {
        &self.fees
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Millisecond stamp for object paths, strictly increasing so two uploads
    /// in the same millisecond never share a path.
    fn upload_stamp(&self) -> i64 {
        let now = self.now().timestamp_millis();
        let previous = self
            .last_upload_millis
            .fetch_max(now, Ordering::SeqCst);
        if previous < now {
            now
        } else {
            self.last_upload_millis.fetch_add(1, Ordering::SeqCst) + 1
        }
    }
}

/// Fees may be zero; payments must be positive. Both stay under [`Money::MAX_AMOUNT`].
pub(crate) fn check_fee(fee: Money) -> Result<(), SchoolServiceError> {
    if fee < Money::ZERO {
        return Err(SchoolServiceError::Invalid(
            "total fee cannot be negative".to_string(),
        ));
    }
    if fee.exceeds_limit() {
        return Err(SchoolServiceError::Invalid(format!(
            "total fee cannot exceed {}",
            Money::MAX_AMOUNT
        )));
    }
    Ok(())
}

pub(crate) fn check_payment_amount(amount: Money) -> Result<(), SchoolServiceError> {
    if !amount.is_positive() {
        return Err(SchoolServiceError::Invalid(
            "payment amount must be positive".to_string(),
        ));
    }
    if amount.exceeds_limit() {
        return Err(SchoolServiceError::Invalid(format!(
            "payment amount cannot exceed {}",
            Money::MAX_AMOUNT
        )));
    }
    Ok(())
}

/// Newest first, with the id as a tiebreaker for rows created in the same instant.
pub(crate) fn newest_first<T, K>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, K))
where
    K: Ord,
{
    rows.sort_by_key(|row| Reverse(key(row)));
}

/// Error raised by the school service.
#[derive(Debug, thiserror::Error)]
pub enum SchoolServiceError {
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl SchoolServiceError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
