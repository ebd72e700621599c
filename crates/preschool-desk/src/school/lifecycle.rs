//! Status machines for admissions, payments, and help queries.
//!
//! The record store accepts any status write, so every status change in the
//! service goes through one of the transition functions below first.

use serde::{Deserialize, Serialize};

/// Raised when a requested status change is not an edge of the machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} cannot move from {from} via {action}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub from: &'static str,
    pub action: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionStatus {
    Submitted,
    Approved,
    Rejected,
}

impl AdmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AdmissionStatus::Submitted => "submitted",
            AdmissionStatus::Approved => "approved",
            AdmissionStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, AdmissionStatus::Approved | AdmissionStatus::Rejected)
    }

    /// `submitted -> approved | rejected`; nothing else, including self loops.
    pub fn transition_to(self, next: AdmissionStatus) -> Result<AdmissionStatus, TransitionError> {
        match (self, next) {
            (AdmissionStatus::Submitted, AdmissionStatus::Approved)
            | (AdmissionStatus::Submitted, AdmissionStatus::Rejected) => Ok(next),
            _ => Err(TransitionError {
                entity: "admission",
                from: self.label(),
                action: next.label(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    PendingUpload,
    UnderVerification,
    Approved,
    Rejected,
}

/// Outcome an admin records after checking a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTransition {
    AttachReceipt,
    Verify(VerificationOutcome),
}

impl PaymentTransition {
    const fn label(self) -> &'static str {
        match self {
            PaymentTransition::AttachReceipt => "attach_receipt",
            PaymentTransition::Verify(VerificationOutcome::Approved) => "approve",
            PaymentTransition::Verify(VerificationOutcome::Rejected) => "reject",
        }
    }
}

impl PaymentStatus {
    /// Payments created with a receipt skip straight to verification.
    pub const fn initial(has_receipt: bool) -> Self {
        if has_receipt {
            PaymentStatus::UnderVerification
        } else {
            PaymentStatus::PendingUpload
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::PendingUpload => "pending_upload",
            PaymentStatus::UnderVerification => "under_verification",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Approved | PaymentStatus::Rejected)
    }

    pub fn apply(self, transition: PaymentTransition) -> Result<PaymentStatus, TransitionError> {
        use PaymentStatus::*;

        match (self, transition) {
            // A second upload replaces the receipt under review.
            (PendingUpload | UnderVerification, PaymentTransition::AttachReceipt) => {
                Ok(UnderVerification)
            }
            (UnderVerification, PaymentTransition::Verify(VerificationOutcome::Approved)) => {
                Ok(Approved)
            }
            (UnderVerification, PaymentTransition::Verify(VerificationOutcome::Rejected)) => {
                Ok(Rejected)
            }
            _ => Err(TransitionError {
                entity: "payment",
                from: self.label(),
                action: transition.label(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Open,
    Replied,
    Closed,
}

impl QueryStatus {
    pub const fn label(self) -> &'static str {
        match self {
            QueryStatus::Open => "open",
            QueryStatus::Replied => "replied",
            QueryStatus::Closed => "closed",
        }
    }

    pub fn reply(self) -> Result<QueryStatus, TransitionError> {
        match self {
            QueryStatus::Open | QueryStatus::Replied => Ok(QueryStatus::Replied),
            QueryStatus::Closed => Err(TransitionError {
                entity: "query",
                from: self.label(),
                action: "reply",
            }),
        }
    }

    pub fn close(self) -> Result<QueryStatus, TransitionError> {
        match self {
            QueryStatus::Open | QueryStatus::Replied => Ok(QueryStatus::Closed),
            QueryStatus::Closed => Err(TransitionError {
                entity: "query",
                from: self.label(),
                action: "close",
            }),
        }
    }
}
