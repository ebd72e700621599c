use chrono::NaiveDate;
use serde::Serialize;

use super::{
    SchoolService, SchoolServiceError, DASHBOARD_ANNOUNCEMENT_LIMIT, RECENT_PREVIEW_LIMIT,
    UPCOMING_EVENT_LIMIT,
};
use crate::school::access::Caller;
use crate::school::domain::{Announcement, Event, Money};
use crate::school::ledger::{approved_total, FeeLedger};
use crate::school::lifecycle::{AdmissionStatus, PaymentStatus, QueryStatus};
use crate::school::storage::ObjectStore;
use crate::school::views::{AdmissionWithStudent, PaymentWithAdmission, StudentWithAdmission};
use crate::school::RecordStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParentDashboard {
    pub students: Vec<StudentWithAdmission>,
    pub payments: Vec<PaymentWithAdmission>,
    pub upcoming_events: Vec<Event>,
    pub recent_announcements: Vec<Announcement>,
    pub ledger: FeeLedger,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminDashboard {
    pub total_students: usize,
    pub pending_admissions: usize,
    pub pending_payments: usize,
    pub open_queries: usize,
    pub total_revenue: Money,
    pub recent_admissions: Vec<AdmissionWithStudent>,
    pub recent_payments: Vec<PaymentWithAdmission>,
}

impl<S, O> SchoolService<S, O>
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    pub fn parent_dashboard(
        &self,
        caller: &Caller,
        today: NaiveDate,
    ) -> Result<ParentDashboard, SchoolServiceError> {
        Ok(ParentDashboard {
            students: self.my_students(caller)?,
            payments: self.my_payments(caller)?,
            upcoming_events: self.upcoming_events(today, UPCOMING_EVENT_LIMIT)?,
            recent_announcements: self.recent_announcements(DASHBOARD_ANNOUNCEMENT_LIMIT)?,
            ledger: self.my_ledger(caller)?,
        })
    }

    pub fn admin_dashboard(&self, caller: &Caller) -> Result<AdminDashboard, SchoolServiceError> {
        caller.require_admin("viewing the admin dashboard")?;

        let all_payments = self.store.all_payments()?;
        let total_revenue = approved_total(&all_payments);

        let mut recent_admissions = self.joined_admissions(self.store.all_admissions()?)?;
        recent_admissions.truncate(RECENT_PREVIEW_LIMIT);
        let mut recent_payments = self.joined_payments(all_payments)?;
        recent_payments.truncate(RECENT_PREVIEW_LIMIT);

        Ok(AdminDashboard {
            total_students: self.store.all_students()?.len(),
            pending_admissions: self
                .store
                .admissions_with_status(AdmissionStatus::Submitted)?
                .len(),
            pending_payments: self
                .store
                .payments_with_status(PaymentStatus::UnderVerification)?
                .len(),
            open_queries: self.store.queries_with_status(QueryStatus::Open)?.len(),
            total_revenue,
            recent_admissions,
            recent_payments,
        })
    }
}
