use super::domain::{
    Admission, AdmissionId, Announcement, AnnouncementId, Event, EventId, HelpQuery, Payment,
    PaymentId, Profile, QueryId, Student, StudentId, UserId,
};
use super::lifecycle::{AdmissionStatus, PaymentStatus, QueryStatus};

/// Error enumeration for record store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

pub trait ProfileRepository: Send + Sync {
    fn insert_profile(&self, profile: Profile) -> Result<Profile, RepositoryError>;
    fn update_profile(&self, profile: Profile) -> Result<(), RepositoryError>;
    fn fetch_profile(&self, id: &UserId) -> Result<Option<Profile>, RepositoryError>;
    fn all_profiles(&self) -> Result<Vec<Profile>, RepositoryError>;
    fn delete_profile(&self, id: &UserId) -> Result<(), RepositoryError>;
}

pub trait StudentRepository: Send + Sync {
    fn insert_student(&self, student: Student) -> Result<Student, RepositoryError>;
    fn update_student(&self, student: Student) -> Result<(), RepositoryError>;
    fn fetch_student(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError>;
    fn delete_student(&self, id: &StudentId) -> Result<(), RepositoryError>;
    fn students_for_parent(&self, parent: &UserId) -> Result<Vec<Student>, RepositoryError>;
    fn all_students(&self) -> Result<Vec<Student>, RepositoryError>;
}

pub trait AdmissionRepository: Send + Sync {
    fn insert_admission(&self, admission: Admission) -> Result<Admission, RepositoryError>;
    fn update_admission(&self, admission: Admission) -> Result<(), RepositoryError>;
    fn fetch_admission(&self, id: &AdmissionId) -> Result<Option<Admission>, RepositoryError>;
    fn admissions_for_parent(&self, parent: &UserId) -> Result<Vec<Admission>, RepositoryError>;
    fn admissions_with_status(
        &self,
        status: AdmissionStatus,
    ) -> Result<Vec<Admission>, RepositoryError>;
    fn all_admissions(&self) -> Result<Vec<Admission>, RepositoryError>;
}

pub trait PaymentRepository: Send + Sync {
    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError>;
    fn update_payment(&self, payment: Payment) -> Result<(), RepositoryError>;
    fn fetch_payment(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError>;
    fn payments_for_parent(&self, parent: &UserId) -> Result<Vec<Payment>, RepositoryError>;
    fn payments_for_admission(
        &self,
        admission: &AdmissionId,
    ) -> Result<Vec<Payment>, RepositoryError>;
    fn payments_with_status(&self, status: PaymentStatus)
        -> Result<Vec<Payment>, RepositoryError>;
    fn all_payments(&self) -> Result<Vec<Payment>, RepositoryError>;
}

pub trait EventRepository: Send + Sync {
    fn insert_event(&self, event: Event) -> Result<Event, RepositoryError>;
    fn update_event(&self, event: Event) -> Result<(), RepositoryError>;
    fn fetch_event(&self, id: &EventId) -> Result<Option<Event>, RepositoryError>;
    fn delete_event(&self, id: &EventId) -> Result<(), RepositoryError>;
    fn all_events(&self) -> Result<Vec<Event>, RepositoryError>;
}

pub trait AnnouncementRepository: Send + Sync {
    fn insert_announcement(
        &self,
        announcement: Announcement,
    ) -> Result<Announcement, RepositoryError>;
    fn update_announcement(&self, announcement: Announcement) -> Result<(), RepositoryError>;
    fn fetch_announcement(
        &self,
        id: &AnnouncementId,
    ) -> Result<Option<Announcement>, RepositoryError>;
    fn delete_announcement(&self, id: &AnnouncementId) -> Result<(), RepositoryError>;
    fn all_announcements(&self) -> Result<Vec<Announcement>, RepositoryError>;
}

pub trait QueryRepository: Send + Sync {
    fn insert_query(&self, query: HelpQuery) -> Result<HelpQuery, RepositoryError>;
    fn update_query(&self, query: HelpQuery) -> Result<(), RepositoryError>;
    fn fetch_query(&self, id: &QueryId) -> Result<Option<HelpQuery>, RepositoryError>;
    fn queries_for_parent(&self, parent: &UserId) -> Result<Vec<HelpQuery>, RepositoryError>;
    fn queries_with_status(&self, status: QueryStatus) -> Result<Vec<HelpQuery>, RepositoryError>;
    fn all_queries(&self) -> Result<Vec<HelpQuery>, RepositoryError>;
}

/// The full set of tables the school service reads and writes.
pub trait RecordStore:
    ProfileRepository
    + StudentRepository
    + AdmissionRepository
    + PaymentRepository
    + EventRepository
    + AnnouncementRepository
    + QueryRepository
{
}

impl<T> RecordStore for T where
    T: ProfileRepository
        + StudentRepository
        + AdmissionRepository
        + PaymentRepository
        + EventRepository
        + AnnouncementRepository
        + QueryRepository
{
}
