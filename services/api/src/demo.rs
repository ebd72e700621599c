use chrono::{Datelike, Duration, Local, NaiveDate};
use clap::Args;
use preschool_desk::error::AppError;
use preschool_desk::school::{
    AdmissionForm, AdmissionStatus, AnnouncementForm, AuthIdentity, Caller, EmergencyContact,
    EventForm, FeeLedger, FeeSchedule, MemoryObjectStore, MemoryStore, Money, PaymentForm,
    PaymentType, Priority, QueryForm, Role, SchoolService, Upload, UserId, VerificationOutcome,
};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct LedgerArgs {
    /// Annual fee in rupees. Defaults to the class fee when omitted or zero.
    #[arg(long, value_parser = crate::infra::parse_money)]
    pub(crate) total_fee: Option<Money>,
    /// Class used to look the fee up in the standard schedule
    #[arg(long)]
    pub(crate) class: Option<String>,
    /// Approved payment amount in rupees (repeatable)
    #[arg(long, value_parser = crate::infra::parse_money)]
    pub(crate) approved: Vec<Money>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reporting date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Class the demo child applies for
    #[arg(long, default_value = "L.K.G.")]
    pub(crate) class: String,
    /// Skip the events, announcements and help desk portion of the demo.
    #[arg(long)]
    pub(crate) skip_notices: bool,
}

pub(crate) fn run_ledger(args: LedgerArgs) -> Result<(), AppError> {
    let LedgerArgs {
        total_fee,
        class,
        approved,
    } = args;

    let schedule = FeeSchedule::standard();
    let total_fee = schedule.resolve(total_fee, class.as_deref().unwrap_or_default());
    let ledger = FeeLedger::from_totals(total_fee, approved.iter().sum());

    println!("Fee ledger");
    if let Some(class) = class {
        println!("  Class:             {class}");
    }
    render_ledger(&ledger);
    Ok(())
}

type DemoService = SchoolService<MemoryStore, MemoryObjectStore>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        class,
        skip_notices,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let service: DemoService = SchoolService::new(
        Arc::new(MemoryStore::default()),
        Arc::new(MemoryObjectStore::default()),
        FeeSchedule::standard(),
    );

    let parent = sign_in(&service, "demo-parent", "parent@example.test", Role::Parent)?;
    let admin = sign_in(&service, "demo-admin", "office@example.test", Role::Admin)?;

    println!("Preschool desk demo ({today})");

    let document = service.upload_admission_document(
        &parent,
        "birth_certificate",
        demo_upload("birth-certificate.pdf", "application/pdf"),
    )?;
    let mut uploaded_files = BTreeMap::new();
    uploaded_files.insert("birth_certificate".to_string(), document.path.clone());

    let submitted = service.create_admission(
        &parent,
        AdmissionForm {
            student_full_name: "Anaya Sharma".to_string(),
            date_of_birth: today - Duration::days(4 * 365),
            gender: "female".to_string(),
            class: class.clone(),
            academic_year: academic_year(today),
            medical_conditions: None,
            allergies: Some("peanuts".to_string()),
            emergency_contact: EmergencyContact {
                name: "Rohan Sharma".to_string(),
                phone: "+91 98765 43210".to_string(),
                relationship: "father".to_string(),
            },
            residential_address: Some("12 Lake View Road".to_string()),
            previous_school: None,
            parent_full_name: Some("Priya Sharma".to_string()),
            parent_phone: Some("+91 91234 56789".to_string()),
            total_fee: None,
            uploaded_files,
        },
    )?;
    let admission_id = submitted.admission.id.clone();
    println!(
        "\nAdmission {} submitted for {} (fee {})",
        admission_id, class, submitted.admission.total_fee
    );

    let decided = service.decide_admission(
        &admin,
        &admission_id,
        AdmissionStatus::Approved,
        Some("Documents verified at the front desk".to_string()),
    )?;
    println!("  Status after review: {}", decided.status.label());

    let half = Money(submitted.admission.total_fee.minor_units() / 2);
    let initial = service.create_payment(
        &parent,
        PaymentForm {
            admission_id: admission_id.clone(),
            amount: half,
            payment_date: today,
            payment_type: PaymentType::Initial,
        },
        Some(demo_upload("receipt-1.png", "image/png")),
    )?;
    let installment = service.create_payment(
        &parent,
        PaymentForm {
            admission_id: admission_id.clone(),
            amount: Money(half.minor_units() / 2),
            payment_date: today,
            payment_type: PaymentType::Installment,
        },
        None,
    )?;
    println!("\nPayments recorded");
    println!("  {} {} -> {}", initial.id, initial.amount, initial.status.label());
    println!(
        "  {} {} -> {}",
        installment.id,
        installment.amount,
        installment.status.label()
    );

    let installment =
        service.attach_receipt(&parent, &installment.id, demo_upload("receipt-2.jpg", "image/jpeg"))?;
    println!(
        "  {} receipt attached -> {}",
        installment.id,
        installment.status.label()
    );

    service.verify_payment(&admin, &initial.id, VerificationOutcome::Approved, None)?;
    service.verify_payment(
        &admin,
        &installment.id,
        VerificationOutcome::Rejected,
        Some("Receipt is unreadable".to_string()),
    )?;

    let detail = service.admission_detail(&parent, &admission_id)?;
    println!("\nAdmission ledger");
    render_ledger(&detail.ledger);
    for document in &detail.documents {
        println!("  Document {}: {}", document.key, document.url);
    }

    if !skip_notices {
        run_notices(&service, &parent, &admin, today)?;
    }

    let overview = service.admin_dashboard(&admin)?;
    println!("\nOffice overview");
    println!("  Students:            {}", overview.total_students);
    println!("  Pending admissions:  {}", overview.pending_admissions);
    println!("  Pending payments:    {}", overview.pending_payments);
    println!("  Open queries:        {}", overview.open_queries);
    println!("  Revenue collected:   {}", overview.total_revenue);

    Ok(())
}

fn run_notices(
    service: &DemoService,
    parent: &Caller,
    admin: &Caller,
    today: NaiveDate,
) -> Result<(), AppError> {
    service.create_event(
        admin,
        EventForm {
            title: "Annual Day".to_string(),
            description: "Songs and skits by every class".to_string(),
            event_date: today + Duration::days(10),
        },
        vec![demo_upload("stage.jpg", "image/jpeg")],
    )?;
    service.create_event(
        admin,
        EventForm {
            title: "Sports Morning".to_string(),
            description: "Relay races on the lawn".to_string(),
            event_date: today - Duration::days(20),
        },
        Vec::new(),
    )?;
    service.create_announcement(
        admin,
        AnnouncementForm {
            title: "School closed on Friday".to_string(),
            content: "The school stays closed for the local holiday.".to_string(),
            priority: Priority::High,
            announcement_date: today,
        },
    )?;

    let query = service.submit_query(
        parent,
        QueryForm {
            subject: "Bus route".to_string(),
            message: "Is there a pickup near Lake View Road?".to_string(),
        },
        None,
    )?;
    let replied = service.reply_query(
        admin,
        &query.id,
        "Yes, route 3 stops at the corner.".to_string(),
    )?;
    println!("\nHelp desk");
    println!("  {} \"{}\" -> {}", replied.id, replied.subject, replied.status.label());

    let dashboard = service.parent_dashboard(parent, today)?;
    println!("\nParent dashboard");
    for event in &dashboard.upcoming_events {
        println!(
            "  Upcoming: {} on {} ({} photos)",
            event.title,
            event.event_date,
            event.photos.len()
        );
    }
    for announcement in &dashboard.recent_announcements {
        println!(
            "  Notice [{:?}]: {}",
            announcement.priority, announcement.title
        );
    }
    let past = service.past_events(today)?;
    println!("  Past events: {}", past.len());
    Ok(())
}

fn sign_in(
    service: &DemoService,
    user_id: &str,
    email: &str,
    role: Role,
) -> Result<Caller, AppError> {
    let profile = service.current_profile(
        &UserId(user_id.to_string()),
        &AuthIdentity {
            email: Some(email.to_string()),
            full_name: None,
            username: None,
            role: Some(role),
        },
    )?;
    Ok(Caller::new(profile.id, profile.role))
}

fn demo_upload(file_name: &str, content_type: &str) -> Upload {
    Upload {
        file_name: file_name.to_string(),
        content_type: content_type.to_string(),
        bytes: file_name.as_bytes().to_vec(),
    }
}

// Academic years run June to May.
fn academic_year(today: NaiveDate) -> String {
    let start = if today.month() >= 6 {
        today.year()
    } else {
        today.year() - 1
    };
    format!("{start}-{:02}", (start + 1) % 100)
}

fn render_ledger(ledger: &FeeLedger) {
    println!("  Total fee:         {}", ledger.total_fee);
    println!("  Paid (approved):   {}", ledger.paid_amount);
    println!("  Remaining balance: {}", ledger.remaining_balance);
    println!("  Paid so far:       {}%", ledger.payment_percent);
    if ledger.remaining_balance < Money::ZERO {
        println!("  Note: payments exceed the fee");
    } else if ledger.is_settled() {
        println!("  Fully paid");
    }
}
