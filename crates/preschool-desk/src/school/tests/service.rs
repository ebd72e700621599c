use std::sync::Arc;

use super::common::*;
use crate::school::access::{AccessError, Caller};
use crate::school::domain::{
    AdmissionId, AdmissionUpdate, AnnouncementUpdate, AuthIdentity, EventUpdate, Money, Payment,
    PaymentId, PaymentType, Priority, ProfileUpdate, QueryForm, Role, StudentUpdate, UserId,
};
use crate::school::lifecycle::{AdmissionStatus, PaymentStatus, QueryStatus, VerificationOutcome};
use crate::school::memory::{MemoryObjectStore, MemoryStore};
use crate::school::repository::{
    PaymentRepository, ProfileRepository, RepositoryError, StudentRepository,
};
use crate::school::storage::{Bucket, StorageError, Upload};
use crate::school::{FeeSchedule, SchoolService, SchoolServiceError};

#[test]
fn first_sign_in_creates_a_parent_profile() {
    let (service, _, _) = build_service();
    let user = UserId("new-parent".to_string());

    let profile = service
        .current_profile(
            &user,
            &AuthIdentity {
                email: Some("lakshmi.n@example.test".to_string()),
                ..AuthIdentity::default()
            },
        )
        .expect("profile created");

    assert_eq!(profile.role, Role::Parent);
    assert_eq!(profile.full_name.as_deref(), Some("lakshmi.n"));

    let again = service
        .current_profile(&user, &AuthIdentity::default())
        .expect("profile fetched");
    assert_eq!(again, profile);
}

#[test]
fn profile_without_any_name_source_is_called_user() {
    let (service, _, _) = build_service();
    let profile = service
        .current_profile(&UserId("anon".to_string()), &AuthIdentity::default())
        .expect("profile created");

    assert_eq!(profile.full_name.as_deref(), Some("User"));
}

#[test]
fn resolve_caller_rejects_unknown_users() {
    let (service, _, _) = seeded_service();

    let caller = service
        .resolve_caller(&UserId(ADMIN.to_string()))
        .expect("known admin");
    assert!(caller.is_admin());

    match service.resolve_caller(&UserId("ghost".to_string())) {
        Err(SchoolServiceError::Access(AccessError::Unauthenticated)) => {}
        other => panic!("expected unauthenticated, got {other:?}"),
    }
}

#[test]
fn create_admission_uses_class_fee_and_updates_parent() {
    let (service, store, _) = seeded_service();

    let joined = submit_admission(&service, &parent(), "nursery");

    assert_eq!(joined.admission.status, AdmissionStatus::Submitted);
    assert_eq!(joined.admission.total_fee, Money::from_major(25_000));
    let student = joined.student.expect("student joined");
    assert_eq!(student.parent_id, UserId(PARENT.to_string()));
    assert_eq!(joined.admission.student_id, student.id);

    let profile = store
        .fetch_profile(&UserId(PARENT.to_string()))
        .expect("fetch succeeds")
        .expect("profile present");
    assert_eq!(profile.full_name.as_deref(), Some("Asha Rao"));
    assert_eq!(profile.phone.as_deref(), Some("+91 98450 11111"));
}

#[test]
fn create_admission_falls_back_for_unknown_class() {
    let (service, _, _) = seeded_service();
    let joined = submit_admission(&service, &parent(), "Playgroup");
    assert_eq!(joined.admission.total_fee, FeeSchedule::DEFAULT_FALLBACK);

    let mut form = admission_form("Nursery");
    form.total_fee = Some(Money::from_major(22_000));
    let joined = service
        .create_admission(&parent(), form)
        .expect("explicit fee accepted");
    assert_eq!(joined.admission.total_fee, Money::from_major(22_000));
}

#[test]
fn create_admission_rejects_documents_of_other_parents() {
    let (service, _, _) = seeded_service();
    let mut form = admission_form("Nursery");
    form.uploaded_files.insert(
        "birth_certificate".to_string(),
        format!("{OTHER_PARENT}/birth_certificate_1.pdf"),
    );

    match service.create_admission(&parent(), form) {
        Err(SchoolServiceError::Invalid(message)) => assert!(message.contains("birth_certificate")),
        other => panic!("expected invalid form, got {other:?}"),
    }
}

#[test]
fn uploaded_documents_resolve_to_signed_urls() {
    let (service, _, objects) = seeded_service();
    let stored = service
        .upload_admission_document(&parent(), "Birth Certificate", receipt("cert.PDF"))
        .expect("document stored");
    assert!(stored.path.starts_with(&format!("{PARENT}/birth_certificate_")));
    assert!(stored.path.ends_with(".pdf"));
    assert_eq!(objects.objects(Bucket::Documents).len(), 1);

    let mut form = admission_form("LKG");
    form.uploaded_files
        .insert("birth_certificate".to_string(), stored.path.clone());
    let joined = service
        .create_admission(&parent(), form)
        .expect("admission created");

    let detail = service
        .admission_detail(&parent(), &joined.admission.id)
        .expect("detail loads");
    assert_eq!(detail.documents.len(), 1);
    assert!(detail.documents[0].url.contains("?expires="));
    assert_eq!(detail.ledger.total_fee, Money::from_major(30_000));
}

#[test]
fn only_admins_decide_admissions_and_only_once() {
    let (service, _, _) = seeded_service();
    let joined = submit_admission(&service, &parent(), "UKG");
    let id = joined.admission.id.clone();

    match service.decide_admission(&parent(), &id, AdmissionStatus::Approved, None) {
        Err(SchoolServiceError::Access(AccessError::AdminOnly { .. })) => {}
        other => panic!("expected admin only, got {other:?}"),
    }

    let approved = service
        .decide_admission(
            &admin(),
            &id,
            AdmissionStatus::Approved,
            Some("Documents verified".to_string()),
        )
        .expect("approval succeeds");
    assert_eq!(approved.status, AdmissionStatus::Approved);
    assert_eq!(approved.notes.as_deref(), Some("Documents verified"));

    match service.decide_admission(&admin(), &id, AdmissionStatus::Rejected, None) {
        Err(SchoolServiceError::Transition(err)) => assert_eq!(err.from, "approved"),
        other => panic!("expected transition error, got {other:?}"),
    }
}

#[test]
fn pending_admissions_only_lists_submitted() {
    let (service, _, _) = seeded_service();
    let first = submit_admission(&service, &parent(), "Nursery");
    submit_admission(&service, &other_parent(), "LKG");
    service
        .decide_admission(&admin(), &first.admission.id, AdmissionStatus::Rejected, None)
        .expect("rejection succeeds");

    let pending = service.pending_admissions(&admin()).expect("admin can list");
    assert_eq!(pending.len(), 1);
    assert_eq!(
        pending[0].student.as_ref().map(|student| student.parent_id.clone()),
        Some(UserId(OTHER_PARENT.to_string()))
    );
    assert_eq!(service.all_admissions(&admin()).expect("listed").len(), 2);
    assert_eq!(service.my_admissions(&parent()).expect("listed").len(), 1);
}

#[test]
fn admins_can_adjust_fee_and_notes() {
    let (service, _, _) = seeded_service();
    let joined = submit_admission(&service, &parent(), "Nursery");

    let updated = service
        .update_admission_details(
            &admin(),
            &joined.admission.id,
            AdmissionUpdate {
                total_fee: Some(Money::from_major(24_000)),
                notes: Some("Sibling discount".to_string()),
            },
        )
        .expect("update succeeds");

    assert_eq!(updated.total_fee, Money::from_major(24_000));
    assert_eq!(updated.status, AdmissionStatus::Submitted);
}

#[test]
fn parents_edit_only_their_own_students() {
    let (service, _, _) = seeded_service();
    let joined = submit_admission(&service, &parent(), "Nursery");
    let student_id = joined.student.expect("student").id;

    let update = StudentUpdate {
        allergies: Some("none".to_string()),
        ..StudentUpdate::default()
    };
    match service.update_student(&other_parent(), &student_id, update.clone()) {
        Err(SchoolServiceError::Access(AccessError::NotOwner { .. })) => {}
        other => panic!("expected not owner, got {other:?}"),
    }

    let student = service
        .update_student(&parent(), &student_id, update)
        .expect("owner can edit");
    assert_eq!(student.allergies.as_deref(), Some("none"));

    let mine = service.my_students(&parent()).expect("listed");
    assert_eq!(mine.len(), 1);
    assert!(mine[0].admission.is_some());
}

#[test]
fn payment_flow_from_upload_to_approval() {
    let (service, _, objects) = seeded_service();
    let joined = submit_admission(&service, &parent(), "LKG");

    let payment = service
        .create_payment(&parent(), payment_form(&joined, 15_000), None)
        .expect("payment recorded");
    assert_eq!(payment.status, PaymentStatus::PendingUpload);

    match service.verify_payment(&admin(), &payment.id, VerificationOutcome::Approved, None) {
        Err(SchoolServiceError::Transition(_)) => {}
        other => panic!("expected transition error, got {other:?}"),
    }

    let with_receipt = service
        .attach_receipt(&parent(), &payment.id, receipt("upi.jpg"))
        .expect("receipt attached");
    assert_eq!(with_receipt.status, PaymentStatus::UnderVerification);
    let url = with_receipt.receipt_url.expect("receipt url");
    assert!(url.starts_with("https://files.example.test/receipts/parent-asha/"));
    assert_eq!(objects.objects(Bucket::Receipts).len(), 1);

    let verified = service
        .verify_payment(
            &admin(),
            &payment.id,
            VerificationOutcome::Approved,
            Some("UTR matched".to_string()),
        )
        .expect("verification succeeds");
    assert_eq!(verified.status, PaymentStatus::Approved);
    let verification = verified.verification.expect("verification recorded");
    assert_eq!(verification.verified_by, UserId(ADMIN.to_string()));
    assert_eq!(verification.notes.as_deref(), Some("UTR matched"));

    let ledger = service
        .admission_ledger(&parent(), &joined.admission.id)
        .expect("ledger loads");
    assert_eq!(ledger.paid_amount, Money::from_major(15_000));
    assert_eq!(ledger.remaining_balance, Money::from_major(15_000));
    assert_eq!(ledger.payment_percent, 50);
}

#[test]
fn payment_with_receipt_starts_under_verification() {
    let (service, _, _) = seeded_service();
    let joined = submit_admission(&service, &parent(), "Nursery");

    let payment = service
        .create_payment(
            &parent(),
            payment_form(&joined, 5_000),
            Some(receipt("bank-slip.png")),
        )
        .expect("payment recorded");

    assert_eq!(payment.status, PaymentStatus::UnderVerification);
    assert_eq!(
        service.pending_payments(&admin()).expect("listed").len(),
        1
    );
}

#[test]
fn payments_require_positive_amounts_and_ownership() {
    let (service, _, _) = seeded_service();
    let joined = submit_admission(&service, &parent(), "Nursery");

    match service.create_payment(&parent(), payment_form(&joined, 0), None) {
        Err(SchoolServiceError::Invalid(_)) => {}
        other => panic!("expected invalid amount, got {other:?}"),
    }
    match service.create_payment(&other_parent(), payment_form(&joined, 1_000), None) {
        Err(SchoolServiceError::Access(AccessError::NotOwner { .. })) => {}
        other => panic!("expected not owner, got {other:?}"),
    }

    let recorded = service
        .create_payment(&admin(), payment_form(&joined, 1_000), None)
        .expect("admin records on behalf of the parent");
    assert_eq!(recorded.parent_id, UserId(PARENT.to_string()));
}

#[test]
fn rejected_payments_accept_no_more_receipts() {
    let (service, _, _) = seeded_service();
    let joined = submit_admission(&service, &parent(), "Nursery");
    let payment = service
        .create_payment(&parent(), payment_form(&joined, 2_000), Some(receipt("a.jpg")))
        .expect("payment recorded");
    service
        .verify_payment(&admin(), &payment.id, VerificationOutcome::Rejected, None)
        .expect("rejection succeeds");

    match service.record_receipt(&parent(), &payment.id, "https://elsewhere/r.jpg".to_string()) {
        Err(SchoolServiceError::Transition(err)) => assert_eq!(err.from, "rejected"),
        other => panic!("expected transition error, got {other:?}"),
    }
}

#[test]
fn my_payments_join_admission_and_student() {
    let (service, _, _) = seeded_service();
    let joined = submit_admission(&service, &parent(), "Nursery");
    service
        .create_payment(&parent(), payment_form(&joined, 2_000), None)
        .expect("payment recorded");

    let payments = service.my_payments(&parent()).expect("listed");
    assert_eq!(payments.len(), 1);
    let admission = payments[0].admission.as_ref().expect("admission joined");
    assert_eq!(admission.admission.id, joined.admission.id);
    assert!(admission.student.is_some());
    assert!(service.my_payments(&other_parent()).expect("listed").is_empty());
}

#[test]
fn events_split_on_today() {
    let (service, _, _) = seeded_service();
    let today = date(2025, 6, 15);
    for (title, day) in [("Sports Day", 20), ("Art Fair", 15), ("Picnic", 10), ("Yoga", 1)] {
        service
            .create_event(&admin(), event_form(title, date(2025, 6, day)), Vec::new())
            .expect("event created");
    }

    let upcoming = service.upcoming_events(today, 5).expect("listed");
    let titles: Vec<&str> = upcoming.iter().map(|event| event.title.as_str()).collect();
    assert_eq!(titles, vec!["Art Fair", "Sports Day"]);

    let past = service.past_events(today).expect("listed");
    let titles: Vec<&str> = past.iter().map(|event| event.title.as_str()).collect();
    assert_eq!(titles, vec!["Picnic", "Yoga"]);

    assert_eq!(service.upcoming_events(today, 1).expect("listed").len(), 1);
}

#[test]
fn event_photos_are_uploaded_before_the_event_is_saved() {
    let (service, _, objects) = seeded_service();
    let event = service
        .create_event(
            &admin(),
            event_form("Annual Day", date(2025, 12, 20)),
            vec![receipt("stage.jpg"), receipt("choir.jpg")],
        )
        .expect("event created");

    assert_eq!(event.photos.len(), 2);
    assert!(event.photos[0].contains("/event-photos/admin-meera/"));
    assert_eq!(objects.objects(Bucket::EventPhotos).len(), 2);

    let empty = Upload {
        bytes: Vec::new(),
        ..receipt("blank.jpg")
    };
    match service.create_event(&admin(), event_form("Broken", date(2025, 12, 21)), vec![empty]) {
        Err(SchoolServiceError::Storage(StorageError::EmptyUpload)) => {}
        other => panic!("expected empty upload, got {other:?}"),
    }
    assert_eq!(service.list_events().expect("listed").len(), 1);

    let updated = service
        .update_event(
            &admin(),
            &event.id,
            EventUpdate {
                title: Some("Annual Day 2025".to_string()),
                ..EventUpdate::default()
            },
        )
        .expect("update succeeds");
    assert_eq!(updated.photos.len(), 2);

    service.delete_event(&admin(), &event.id).expect("deleted");
    match service.delete_event(&admin(), &event.id) {
        Err(SchoolServiceError::NotFound { entity, .. }) => assert_eq!(entity, "event"),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn announcements_sort_by_priority_then_date() {
    let (service, _, _) = seeded_service();
    for (title, priority, day) in [
        ("Uniform reminder", Priority::Low, 20),
        ("Fee deadline", Priority::High, 2),
        ("Holiday", Priority::Normal, 18),
        ("Closure", Priority::High, 9),
    ] {
        service
            .create_announcement(&admin(), announcement_form(title, priority, day))
            .expect("announcement created");
    }

    let titles: Vec<String> = service
        .list_announcements()
        .expect("listed")
        .into_iter()
        .map(|announcement| announcement.title)
        .collect();
    assert_eq!(
        titles,
        vec!["Closure", "Fee deadline", "Holiday", "Uniform reminder"]
    );
    assert_eq!(service.recent_announcements(3).expect("listed").len(), 3);

    match service.create_announcement(&parent(), announcement_form("x", Priority::Low, 1)) {
        Err(SchoolServiceError::Access(AccessError::AdminOnly { .. })) => {}
        other => panic!("expected admin only, got {other:?}"),
    }
}

#[test]
fn help_queries_follow_reply_and_close() {
    let (service, _, _) = seeded_service();
    let query = service
        .submit_query(
            &parent(),
            QueryForm {
                subject: "Bus route".to_string(),
                message: "Does the van cover Lake View Road?".to_string(),
            },
            Some(receipt("map.png")),
        )
        .expect("query submitted");
    assert_eq!(query.status, QueryStatus::Open);
    assert!(query
        .attachment_url
        .as_deref()
        .is_some_and(|url| url.contains("/attachments/")));

    let replied = service
        .reply_query(&admin(), &query.id, "Yes, route 4.".to_string())
        .expect("reply succeeds");
    assert_eq!(replied.status, QueryStatus::Replied);

    match service.close_query(&other_parent(), &query.id) {
        Err(SchoolServiceError::Access(AccessError::NotOwner { .. })) => {}
        other => panic!("expected not owner, got {other:?}"),
    }
    let closed = service.close_query(&parent(), &query.id).expect("closed");
    assert_eq!(closed.status, QueryStatus::Closed);

    match service.reply_query(&admin(), &query.id, "More".to_string()) {
        Err(SchoolServiceError::Transition(_)) => {}
        other => panic!("expected transition error, got {other:?}"),
    }

    let all = service.all_queries(&admin()).expect("listed");
    assert_eq!(all.len(), 1);
    assert_eq!(
        all[0].parent.as_ref().map(|profile| profile.id.clone()),
        Some(UserId(PARENT.to_string()))
    );
}

#[test]
fn admins_manage_roles_but_never_delete_themselves() {
    let (service, _, _) = seeded_service();
    let target = UserId(OTHER_PARENT.to_string());

    let promoted = service
        .change_role(&admin(), &target, Role::Admin)
        .expect("role changed");
    assert_eq!(promoted.role, Role::Admin);

    match service.delete_profile(&admin(), &UserId(ADMIN.to_string())) {
        Err(SchoolServiceError::Invalid(_)) => {}
        other => panic!("expected invalid, got {other:?}"),
    }

    service.delete_profile(&admin(), &target).expect("deleted");
    assert_eq!(service.list_profiles(&admin()).expect("listed").len(), 2);
}

#[test]
fn parents_update_only_their_own_profile() {
    let (service, _, _) = seeded_service();
    let update = ProfileUpdate {
        phone: Some("+91 90000 22222".to_string()),
        ..ProfileUpdate::default()
    };

    assert!(service
        .update_profile(&parent(), &UserId(OTHER_PARENT.to_string()), update.clone())
        .is_err());
    let profile = service
        .update_profile(&parent(), &UserId(PARENT.to_string()), update)
        .expect("own profile");
    assert_eq!(profile.phone.as_deref(), Some("+91 90000 22222"));
}

#[test]
fn parent_dashboard_aggregates_ledger_and_content() {
    let (service, _, _) = seeded_service();
    let today = date(2025, 6, 15);
    let first = submit_admission(&service, &parent(), "Nursery");
    let second = submit_admission(&service, &parent(), "LKG");
    for joined in [&first, &second] {
        let payment = service
            .create_payment(&parent(), payment_form(joined, 10_000), Some(receipt("r.jpg")))
            .expect("payment recorded");
        service
            .verify_payment(&admin(), &payment.id, VerificationOutcome::Approved, None)
            .expect("approved");
    }
    for day in 10..=20 {
        service
            .create_event(&admin(), event_form(&format!("Day {day}"), date(2025, 6, day)), Vec::new())
            .expect("event created");
    }
    for (index, priority) in [Priority::Low, Priority::High, Priority::Normal, Priority::High]
        .into_iter()
        .enumerate()
    {
        service
            .create_announcement(
                &admin(),
                announcement_form(&format!("Notice {index}"), priority, 1 + index as u32),
            )
            .expect("announcement created");
    }

    let dashboard = service
        .parent_dashboard(&parent(), today)
        .expect("dashboard builds");

    assert_eq!(dashboard.students.len(), 2);
    assert_eq!(dashboard.payments.len(), 2);
    assert_eq!(dashboard.ledger.total_fee, Money::from_major(55_000));
    assert_eq!(dashboard.ledger.paid_amount, Money::from_major(20_000));
    assert_eq!(dashboard.ledger.payment_percent, 36);
    assert_eq!(dashboard.upcoming_events.len(), 5);
    assert_eq!(dashboard.upcoming_events[0].event_date, today);
    assert_eq!(dashboard.recent_announcements.len(), 3);
    assert_eq!(dashboard.recent_announcements[0].title, "Notice 3");
    assert_eq!(dashboard.recent_announcements[2].title, "Notice 2");
}

#[test]
fn admin_dashboard_counts_queues_and_revenue() {
    let (service, _, _) = seeded_service();
    let first = submit_admission(&service, &parent(), "Nursery");
    let second = submit_admission(&service, &other_parent(), "UKG");
    service
        .decide_admission(&admin(), &first.admission.id, AdmissionStatus::Approved, None)
        .expect("approved");

    let approved = service
        .create_payment(&parent(), payment_form(&first, 12_000), Some(receipt("a.jpg")))
        .expect("payment recorded");
    service
        .verify_payment(&admin(), &approved.id, VerificationOutcome::Approved, None)
        .expect("approved");
    service
        .create_payment(&other_parent(), payment_form(&second, 8_000), Some(receipt("b.jpg")))
        .expect("payment recorded");
    service
        .submit_query(
            &other_parent(),
            QueryForm {
                subject: "Timings".to_string(),
                message: "When does pickup start?".to_string(),
            },
            None,
        )
        .expect("query submitted");

    let dashboard = service.admin_dashboard(&admin()).expect("dashboard builds");

    assert_eq!(dashboard.total_students, 2);
    assert_eq!(dashboard.pending_admissions, 1);
    assert_eq!(dashboard.pending_payments, 1);
    assert_eq!(dashboard.open_queries, 1);
    assert_eq!(dashboard.total_revenue, Money::from_major(12_000));
    assert_eq!(dashboard.recent_admissions.len(), 2);
    assert_eq!(dashboard.recent_payments.len(), 2);

    assert!(service.admin_dashboard(&parent()).is_err());
}

#[test]
fn store_outage_surfaces_as_repository_error() {
    let store = MemoryStore::default();
    let service = SchoolService::new(
        Arc::new(store.clone()),
        Arc::new(MemoryObjectStore::default()),
        FeeSchedule::standard(),
    );
    store.set_outage(true);

    match service.my_admissions(&Caller::parent(PARENT)) {
        Err(SchoolServiceError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected unavailable, got {other:?}"),
    }
}

#[test]
fn detail_of_unknown_admission_is_not_found() {
    let (service, _, _) = seeded_service();
    match service.admission_detail(&admin(), &AdmissionId("adm-missing".to_string())) {
        Err(SchoolServiceError::NotFound { entity, id }) => {
            assert_eq!(entity, "admission");
            assert_eq!(id, "adm-missing");
        }
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn document_paths_cannot_climb_out_of_the_parent_folder() {
    let (service, _, _) = seeded_service();
    let mut form = admission_form("Nursery");
    form.uploaded_files.insert(
        "birth_certificate".to_string(),
        format!("{PARENT}/../{OTHER_PARENT}/birth_certificate_1.pdf"),
    );

    match service.create_admission(&parent(), form) {
        Err(SchoolServiceError::Invalid(message)) => assert!(message.contains("birth_certificate")),
        other => panic!("expected invalid form, got {other:?}"),
    }
    assert!(service.my_students(&parent()).expect("listed").is_empty());
}

#[test]
fn fees_and_payments_above_the_ceiling_are_refused() {
    let (service, _, _) = seeded_service();
    let mut form = admission_form("Nursery");
    form.total_fee = Some(Money(Money::MAX_AMOUNT.minor_units() + 1));
    match service.create_admission(&parent(), form) {
        Err(SchoolServiceError::Invalid(message)) => assert!(message.contains("exceed")),
        other => panic!("expected invalid fee, got {other:?}"),
    }

    let joined = submit_admission(&service, &parent(), "Nursery");
    match service.update_admission_details(
        &admin(),
        &joined.admission.id,
        AdmissionUpdate {
            total_fee: Some(Money(i64::MAX)),
            notes: None,
        },
    ) {
        Err(SchoolServiceError::Invalid(_)) => {}
        other => panic!("expected invalid fee, got {other:?}"),
    }

    let mut oversized = payment_form(&joined, 0);
    oversized.amount = Money(Money::MAX_AMOUNT.minor_units() + 1);
    match service.create_payment(&parent(), oversized, None) {
        Err(SchoolServiceError::Invalid(message)) => assert!(message.contains("exceed")),
        other => panic!("expected invalid amount, got {other:?}"),
    }

    let mut ceiling = payment_form(&joined, 0);
    ceiling.amount = Money::MAX_AMOUNT;
    service
        .create_payment(&parent(), ceiling, None)
        .expect("the ceiling itself is accepted");
}

#[test]
fn huge_stored_amounts_saturate_instead_of_panicking() {
    let (service, store, _) = seeded_service();
    let joined = submit_admission(&service, &parent(), "Nursery");
    let now = chrono::Utc::now();
    for n in 0..2 {
        store
            .insert_payment(Payment {
                id: PaymentId(format!("pay-imported-{n}")),
                admission_id: joined.admission.id.clone(),
                parent_id: UserId(PARENT.to_string()),
                amount: Money(i64::MAX / 2 + 1),
                payment_date: date(2025, 6, 1),
                payment_type: PaymentType::Installment,
                status: PaymentStatus::Approved,
                receipt_url: None,
                verification: None,
                created_at: now,
                updated_at: now,
            })
            .expect("payment stored");
    }

    let ledger = service.my_ledger(&parent()).expect("ledger computes");
    assert_eq!(ledger.paid_amount, Money(i64::MAX));
    assert!(ledger.remaining_balance < Money::ZERO);

    let dashboard = service.admin_dashboard(&admin()).expect("dashboard builds");
    assert_eq!(dashboard.total_revenue, Money(i64::MAX));
    service
        .parent_dashboard(&parent(), date(2025, 6, 1))
        .expect("parent dashboard builds");
}

#[test]
fn failed_admission_insert_leaves_no_student_behind() {
    let (service, store, _) = seeded_service();
    store.set_admissions_outage(true);

    match service.create_admission(&parent(), admission_form("Nursery")) {
        Err(SchoolServiceError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected unavailable, got {other:?}"),
    }
    assert!(store.all_students().expect("listed").is_empty());
    assert!(service.my_students(&parent()).expect("listed").is_empty());

    store.set_admissions_outage(false);
    submit_admission(&service, &parent(), "Nursery");
    assert_eq!(store.all_students().expect("listed").len(), 1);
}

#[test]
fn admins_add_photos_to_existing_events() {
    let (service, _, objects) = seeded_service();
    let event = service
        .create_event(&admin(), event_form("Science Fair", date(2025, 11, 5)), Vec::new())
        .expect("event created");

    let updated = service
        .add_event_photo(&admin(), &event.id, receipt("volcano.jpg"))
        .expect("photo added");
    assert_eq!(updated.photos.len(), 1);
    assert!(updated.photos[0].contains("/event-photos/admin-meera/"));
    assert!(!updated.photos[0].contains("?expires="));
    assert_eq!(objects.objects(Bucket::EventPhotos).len(), 1);

    let again = service
        .add_event_photo(&admin(), &event.id, receipt("robots.jpg"))
        .expect("second photo added");
    assert_eq!(again.photos.len(), 2);
    assert_ne!(again.photos[0], again.photos[1]);

    match service.add_event_photo(&parent(), &event.id, receipt("selfie.jpg")) {
        Err(SchoolServiceError::Access(AccessError::AdminOnly { .. })) => {}
        other => panic!("expected admin only, got {other:?}"),
    }
    assert_eq!(objects.objects(Bucket::EventPhotos).len(), 2);
}

#[test]
fn admins_edit_events_and_announcements() {
    let (service, _, _) = seeded_service();
    let event = service
        .create_event(&admin(), event_form("Picnic", date(2025, 8, 2)), Vec::new())
        .expect("event created");

    let moved = service
        .update_event(
            &admin(),
            &event.id,
            EventUpdate {
                description: Some("Moved indoors".to_string()),
                event_date: Some(date(2025, 8, 9)),
                ..EventUpdate::default()
            },
        )
        .expect("event updated");
    assert_eq!(moved.title, "Picnic");
    assert_eq!(moved.description, "Moved indoors");
    assert_eq!(moved.event_date, date(2025, 8, 9));

    match service.update_event(&parent(), &event.id, EventUpdate::default()) {
        Err(SchoolServiceError::Access(AccessError::AdminOnly { .. })) => {}
        other => panic!("expected admin only, got {other:?}"),
    }

    let announcement = service
        .create_announcement(&admin(), announcement_form("Holiday", Priority::Normal, 10))
        .expect("announcement created");
    let raised = service
        .update_announcement(
            &admin(),
            &announcement.id,
            AnnouncementUpdate {
                priority: Some(Priority::High),
                content: Some("School closed all week".to_string()),
                ..AnnouncementUpdate::default()
            },
        )
        .expect("announcement updated");
    assert_eq!(raised.priority, Priority::High);
    assert_eq!(raised.content, "School closed all week");
    assert_eq!(raised.title, "Holiday");

    match service.update_announcement(&parent(), &announcement.id, AnnouncementUpdate::default()) {
        Err(SchoolServiceError::Access(AccessError::AdminOnly { .. })) => {}
        other => panic!("expected admin only, got {other:?}"),
    }
    let stored = service.list_announcements().expect("listed");
    assert_eq!(stored[0].priority, Priority::High);
}

#[test]
fn recorded_receipts_need_a_url() {
    let (service, _, _) = seeded_service();
    let joined = submit_admission(&service, &parent(), "Nursery");
    let payment = service
        .create_payment(&parent(), payment_form(&joined, 2_000), None)
        .expect("payment recorded");

    match service.record_receipt(&parent(), &payment.id, "   ".to_string()) {
        Err(SchoolServiceError::Invalid(message)) => assert!(message.contains("receipt")),
        other => panic!("expected invalid receipt, got {other:?}"),
    }

    let recorded = service
        .record_receipt(&parent(), &payment.id, "https://files.example.test/r.jpg".to_string())
        .expect("receipt recorded");
    assert_eq!(recorded.status, PaymentStatus::UnderVerification);
}
