//! End-to-end admission and fee collection through the public facade and router.

mod common {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use chrono::NaiveDate;

    use preschool_desk::school::{
        AdmissionForm, AuthIdentity, EmergencyContact, FeeSchedule, MemoryObjectStore,
        MemoryStore, Role, SchoolService, UserId,
    };

    pub(super) type Service = SchoolService<MemoryStore, MemoryObjectStore>;

    pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    pub(super) fn service_with_users(users: &[(&str, Role)]) -> (Arc<Service>, MemoryObjectStore) {
        let objects =
            MemoryObjectStore::new("https://cdn.sunflower.test/storage", 900, "sunflower-key");
        let service = Arc::new(SchoolService::new(
            Arc::new(MemoryStore::default()),
            Arc::new(objects.clone()),
            FeeSchedule::standard(),
        ));
        for (id, role) in users {
            service
                .current_profile(
                    &UserId(id.to_string()),
                    &AuthIdentity {
                        email: Some(format!("{id}@sunflower.test")),
                        role: Some(*role),
                        ..AuthIdentity::default()
                    },
                )
                .expect("profile created");
        }
        (service, objects)
    }

    pub(super) fn form(class: &str) -> AdmissionForm {
        AdmissionForm {
            student_full_name: "Ira Menon".to_string(),
            date_of_birth: date(2020, 11, 2),
            gender: "female".to_string(),
            class: class.to_string(),
            academic_year: "2025-26".to_string(),
            medical_conditions: None,
            allergies: None,
            emergency_contact: EmergencyContact {
                name: "Deepa Menon".to_string(),
                phone: "+91 90080 55555".to_string(),
                relationship: "grandmother".to_string(),
            },
            residential_address: None,
            previous_school: Some("Little Steps".to_string()),
            parent_full_name: None,
            parent_phone: None,
            total_fee: None,
            uploaded_files: BTreeMap::new(),
        }
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::*;
use preschool_desk::school::{
    school_router, AdmissionStatus, Bucket, Caller, Money, PaymentForm, PaymentStatus,
    PaymentType, Role, SchoolServiceError, Upload, VerificationOutcome, USER_HEADER,
};

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json payload")
}

#[test]
fn installments_settle_the_admission_fee() {
    let (service, objects) = service_with_users(&[("p-ira", Role::Parent), ("a-office", Role::Admin)]);
    let parent = Caller::parent("p-ira");
    let admin = Caller::admin("a-office");

    let joined = service
        .create_admission(&parent, form("U.K.G."))
        .expect("admission created");
    assert_eq!(joined.admission.total_fee, Money::from_major(32_000));
    service
        .decide_admission(&admin, &joined.admission.id, AdmissionStatus::Approved, None)
        .expect("approved");

    let mut approved = Vec::new();
    for (index, major) in [16_000, 10_000, 6_000].into_iter().enumerate() {
        let payment = service
            .create_payment(
                &parent,
                PaymentForm {
                    admission_id: joined.admission.id.clone(),
                    amount: Money::from_major(major),
                    payment_date: date(2025, 6 + index as u32, 5),
                    payment_type: if index == 0 {
                        PaymentType::Initial
                    } else {
                        PaymentType::Installment
                    },
                },
                Some(Upload {
                    file_name: format!("receipt-{index}.pdf"),
                    content_type: "application/pdf".to_string(),
                    bytes: b"%PDF-1.4".to_vec(),
                }),
            )
            .expect("payment recorded");
        assert_eq!(payment.status, PaymentStatus::UnderVerification);
        approved.push(
            service
                .verify_payment(&admin, &payment.id, VerificationOutcome::Approved, None)
                .expect("verified"),
        );
    }

    let detail = service
        .admission_detail(&parent, &joined.admission.id)
        .expect("detail loads");
    assert_eq!(detail.payments.len(), 3);
    assert_eq!(detail.ledger.remaining_balance, Money::ZERO);
    assert_eq!(detail.ledger.payment_percent, 100);
    assert!(detail.ledger.is_settled());
    assert_eq!(objects.objects(Bucket::Receipts).len(), 3);

    let dashboard = service.admin_dashboard(&admin).expect("dashboard");
    assert_eq!(dashboard.total_revenue, Money::from_major(32_000));
    assert_eq!(dashboard.pending_payments, 0);
}

#[test]
fn strangers_cannot_see_other_families() {
    let (service, _) = service_with_users(&[("p-ira", Role::Parent), ("p-zoe", Role::Parent)]);
    let joined = service
        .create_admission(&Caller::parent("p-ira"), form("Nursery"))
        .expect("admission created");

    match service.admission_detail(&Caller::parent("p-zoe"), &joined.admission.id) {
        Err(SchoolServiceError::Access(_)) => {}
        other => panic!("expected access error, got {other:?}"),
    }
}

#[tokio::test]
async fn parent_journey_over_http() {
    let (service, _) = service_with_users(&[("p-ira", Role::Parent), ("a-office", Role::Admin)]);
    let router = school_router(service);

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/documents/birth_certificate?file_name=birth.pdf")
                .header(USER_HEADER, "p-ira")
                .header(header::CONTENT_TYPE, "application/pdf")
                .body(Body::from(b"%PDF-1.7".to_vec()))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let document = body_json(response).await;
    let document_path = document["path"].as_str().expect("path").to_string();

    let mut payload = serde_json::to_value(form("Class 1")).expect("form serializes");
    payload["uploaded_files"] = json!({ "birth_certificate": document_path });
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/admissions")
                .header(USER_HEADER, "p-ira")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let admission = body_json(response).await;
    let admission_id = admission["id"].as_str().expect("id").to_string();
    assert_eq!(admission["total_fee"], 3_500_000);

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/payments")
                .header(USER_HEADER, "p-ira")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({
                        "admission_id": admission_id,
                        "amount": 1_750_000,
                        "payment_date": "2025-06-10",
                        "payment_type": "initial"
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payment = body_json(response).await;
    assert_eq!(payment["status"], "pending_upload");

    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/api/v1/admissions/{admission_id}"))
                .header(USER_HEADER, "p-ira")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    assert_eq!(detail["ledger"]["paid_amount"], 0);
    assert_eq!(detail["documents"][0]["key"], "birth_certificate");
    assert!(detail["documents"][0]["url"]
        .as_str()
        .is_some_and(|url| url.contains("/documents/p-ira/")));

    let response = router
        .oneshot(
            Request::get("/api/v1/admissions?status=submitted")
                .header(USER_HEADER, "a-office")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let pending = body_json(response).await;
    assert_eq!(pending.as_array().map(Vec::len), Some(1));
}
