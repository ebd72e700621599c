use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::lifecycle::{AdmissionStatus, PaymentStatus, QueryStatus};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

record_id!(
    /// Identity issued by the auth provider; shared by the profile row.
    UserId
);
record_id!(StudentId);
record_id!(AdmissionId);
record_id!(PaymentId);
record_id!(EventId);
record_id!(AnnouncementId);
record_id!(QueryId);

/// Amount of money in minor units (paise). Signed so balances can show overpayment.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
    pub const ZERO: Money = Money(0);
    /// Ceiling for any single fee or payment: ten crore rupees.
    pub const MAX_AMOUNT: Money = Money::from_major(100_000_000);

    pub const fn from_major(units: i64) -> Self {
        Money(units.saturating_mul(100))
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn exceeds_limit(self) -> bool {
        self.0 > Self::MAX_AMOUNT.0
    }
}

impl Add for Money {
    type Output = Money;

    // Saturates: totals over stored rows must never panic.
    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Parent,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Parent => "parent",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Claims handed over by the auth provider the first time a user shows up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub parent_id: UserId,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub class: String,
    pub academic_year: String,
    pub assigned_teacher: Option<String>,
    pub emergency_contact: EmergencyContact,
    pub medical_conditions: Option<String>,
    pub allergies: Option<String>,
    pub residential_address: Option<String>,
    pub previous_school: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial edit applied by the owning parent or an admin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub assigned_teacher: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default)]
    pub medical_conditions: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
}

impl StudentUpdate {
    pub(crate) fn apply(self, student: &mut Student) {
        if let Some(full_name) = self.full_name {
            student.full_name = full_name;
        }
        if let Some(date_of_birth) = self.date_of_birth {
            student.date_of_birth = date_of_birth;
        }
        if let Some(gender) = self.gender {
            student.gender = gender;
        }
        if let Some(class) = self.class {
            student.class = class;
        }
        if let Some(academic_year) = self.academic_year {
            student.academic_year = academic_year;
        }
        if self.assigned_teacher.is_some() {
            student.assigned_teacher = self.assigned_teacher;
        }
        if let Some(contact) = self.emergency_contact {
            student.emergency_contact = contact;
        }
        if self.medical_conditions.is_some() {
            student.medical_conditions = self.medical_conditions;
        }
        if self.allergies.is_some() {
            student.allergies = self.allergies;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub id: AdmissionId,
    pub student_id: StudentId,
    pub parent_id: UserId,
    pub admission_date: NaiveDate,
    pub status: AdmissionStatus,
    pub total_fee: Money,
    /// Document key (e.g. `birth_certificate`) to object storage path.
    pub uploaded_files: BTreeMap<String, String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything a parent fills in on the admission form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionForm {
    pub student_full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub class: String,
    pub academic_year: String,
    #[serde(default)]
    pub medical_conditions: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    pub emergency_contact: EmergencyContact,
    #[serde(default)]
    pub residential_address: Option<String>,
    #[serde(default)]
    pub previous_school: Option<String>,
    #[serde(default)]
    pub parent_full_name: Option<String>,
    #[serde(default)]
    pub parent_phone: Option<String>,
    /// Zero or absent means "use the class fee schedule".
    #[serde(default)]
    pub total_fee: Option<Money>,
    #[serde(default)]
    pub uploaded_files: BTreeMap<String, String>,
}

/// Admin edit of the fee and office notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionUpdate {
    #[serde(default)]
    pub total_fee: Option<Money>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Initial,
    Installment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub verified_by: UserId,
    pub verified_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub admission_id: AdmissionId,
    pub parent_id: UserId,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub receipt_url: Option<String>,
    pub verification: Option<Verification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentForm {
    pub admission_id: AdmissionId,
    pub amount: Money,
    pub payment_date: NaiveDate,
    pub payment_type: PaymentType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub event_date: NaiveDate,
    pub photos: Vec<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Events dated today still count as upcoming.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.event_date >= today
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventForm {
    pub title: String,
    pub description: String,
    pub event_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub photos: Option<Vec<String>>,
}

/// Declaration order is display order: `High` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Normal,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub announcement_date: NaiveDate,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementForm {
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub announcement_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub announcement_date: Option<NaiveDate>,
}

/// Support question raised by a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpQuery {
    pub id: QueryId,
    pub parent_id: UserId,
    pub subject: String,
    pub message: String,
    pub attachment_url: Option<String>,
    pub status: QueryStatus,
    pub reply: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryForm {
    pub subject: String,
    pub message: String,
}
