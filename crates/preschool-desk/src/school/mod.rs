//! Preschool front office: admissions, fee payments, and school notices.
//!
//! The hosted record store and bucket service sit behind [`RecordStore`] and
//! [`ObjectStore`]; [`SchoolService`] holds every rule and is driven either
//! directly or through [`school_router`].

pub mod access;
pub mod domain;
pub mod ledger;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
pub mod storage;
pub mod views;

#[cfg(test)]
mod tests;

pub use access::{AccessError, Caller};
pub use domain::{
    Admission, AdmissionForm, AdmissionId, AdmissionUpdate, Announcement, AnnouncementForm,
    AnnouncementId, AnnouncementUpdate, AuthIdentity, EmergencyContact, Event, EventForm, EventId,
    EventUpdate, HelpQuery, Money, Payment, PaymentForm, PaymentId, PaymentType, Priority, Profile,
    ProfileUpdate, QueryForm, QueryId, Role, Student, StudentId, StudentUpdate, UserId,
    Verification,
};
pub use ledger::{approved_total, payment_percent, FeeLedger, FeeSchedule};
pub use lifecycle::{
    AdmissionStatus, PaymentStatus, PaymentTransition, QueryStatus, TransitionError,
    VerificationOutcome,
};
pub use memory::{MemoryObjectStore, MemoryStore};
pub use repository::{
    AdmissionRepository, AnnouncementRepository, EventRepository, PaymentRepository,
    ProfileRepository, QueryRepository, RecordStore, RepositoryError, StudentRepository,
};
pub use router::{school_router, status_for, USER_HEADER};
pub use service::{AdminDashboard, ParentDashboard, SchoolService, SchoolServiceError};
pub use storage::{Bucket, ObjectStore, StorageError, StoredObject, Upload};
pub use views::{
    AdmissionDetail, AdmissionWithStudent, DocumentLink, PaymentWithAdmission, QueryWithParent,
    StudentWithAdmission,
};
