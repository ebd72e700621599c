use std::collections::BTreeMap;
use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::school::domain::{
    AdmissionForm, AnnouncementForm, AuthIdentity, EmergencyContact, EventForm, Money,
    PaymentForm, PaymentType, Priority, Role, UserId,
};
use crate::school::ledger::FeeSchedule;
use crate::school::memory::{MemoryObjectStore, MemoryStore};
use crate::school::storage::Upload;
use crate::school::views::AdmissionWithStudent;
use crate::school::{school_router, Caller, SchoolService};

pub(super) type MemoryService = SchoolService<MemoryStore, MemoryObjectStore>;

pub(super) const PARENT: &str = "parent-asha";
pub(super) const OTHER_PARENT: &str = "parent-ravi";
pub(super) const ADMIN: &str = "admin-meera";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn build_service() -> (MemoryService, MemoryStore, MemoryObjectStore) {
    let store = MemoryStore::default();
    let objects = MemoryObjectStore::new("https://files.example.test", 600, "test-signing-key");
    let service = SchoolService::new(
        Arc::new(store.clone()),
        Arc::new(objects.clone()),
        FeeSchedule::standard(),
    );
    (service, store, objects)
}

/// Service with parent, second parent, and admin profiles already signed in.
pub(super) fn seeded_service() -> (MemoryService, MemoryStore, MemoryObjectStore) {
    let (service, store, objects) = build_service();
    for (id, role) in [
        (PARENT, Role::Parent),
        (OTHER_PARENT, Role::Parent),
        (ADMIN, Role::Admin),
    ] {
        service
            .current_profile(
                &UserId(id.to_string()),
                &AuthIdentity {
                    email: Some(format!("{id}@example.test")),
                    full_name: None,
                    username: None,
                    role: Some(role),
                },
            )
            .expect("profile created");
    }
    (service, store, objects)
}

pub(super) fn parent() -> Caller {
    Caller::parent(PARENT)
}

pub(super) fn other_parent() -> Caller {
    Caller::parent(OTHER_PARENT)
}

pub(super) fn admin() -> Caller {
    Caller::admin(ADMIN)
}

pub(super) fn admission_form(class: &str) -> AdmissionForm {
    AdmissionForm {
        student_full_name: "Anaya Rao".to_string(),
        date_of_birth: date(2021, 6, 14),
        gender: "female".to_string(),
        class: class.to_string(),
        academic_year: "2025-26".to_string(),
        medical_conditions: None,
        allergies: Some("peanuts".to_string()),
        emergency_contact: EmergencyContact {
            name: "Kiran Rao".to_string(),
            phone: "+91 98450 00000".to_string(),
            relationship: "uncle".to_string(),
        },
        residential_address: Some("12 Lake View Road".to_string()),
        previous_school: None,
        parent_full_name: Some("Asha Rao".to_string()),
        parent_phone: Some("+91 98450 11111".to_string()),
        total_fee: None,
        uploaded_files: BTreeMap::new(),
    }
}

pub(super) fn submit_admission(
    service: &MemoryService,
    caller: &Caller,
    class: &str,
) -> AdmissionWithStudent {
    service
        .create_admission(caller, admission_form(class))
        .expect("admission created")
}

pub(super) fn payment_form(joined: &AdmissionWithStudent, major: i64) -> PaymentForm {
    PaymentForm {
        admission_id: joined.admission.id.clone(),
        amount: Money::from_major(major),
        payment_date: date(2025, 6, 1),
        payment_type: PaymentType::Installment,
    }
}

pub(super) fn receipt(name: &str) -> Upload {
    Upload {
        file_name: name.to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
    }
}

pub(super) fn event_form(title: &str, event_date: NaiveDate) -> EventForm {
    EventForm {
        title: title.to_string(),
        description: format!("{title} for all classes"),
        event_date,
    }
}

pub(super) fn announcement_form(title: &str, priority: Priority, day: u32) -> AnnouncementForm {
    AnnouncementForm {
        title: title.to_string(),
        content: format!("{title} details"),
        priority,
        announcement_date: date(2025, 6, day),
    }
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    school_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
