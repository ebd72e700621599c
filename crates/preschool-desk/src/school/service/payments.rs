use tracing::{info, warn};

use super::{
    check_payment_amount, newest_first, next_record_id, SchoolService, SchoolServiceError,
};
use crate::school::access::Caller;
use crate::school::domain::{AdmissionId, Money, Payment, PaymentForm, PaymentId, Verification};
use crate::school::ledger::FeeLedger;
use crate::school::lifecycle::{PaymentStatus, PaymentTransition, VerificationOutcome};
use crate::school::storage::{receipt_path, Bucket, ObjectStore, Upload};
use crate::school::views::{join_payments, PaymentWithAdmission};
use crate::school::RecordStore;

impl<S, O> SchoolService<S, O>
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    /// Record a payment against an admission, optionally with its receipt.
    pub fn create_payment(
        &self,
        caller: &Caller,
        form: PaymentForm,
        receipt: Option<Upload>,
    ) -> Result<Payment, SchoolServiceError> {
        check_payment_amount(form.amount)?;
        let admission = self.fetch_admission(&form.admission_id)?;
        caller.require_owner_or_admin(&admission.parent_id, "recording a payment")?;

        let now = self.now();
        let id = PaymentId(next_record_id("pay"));
        let receipt_url = match receipt {
            Some(upload) => Some(self.store_receipt(caller, &id, upload)?),
            None => None,
        };

        let payment = self.store.insert_payment(Payment {
            id,
            admission_id: admission.id,
            parent_id: admission.parent_id,
            amount: form.amount,
            payment_date: form.payment_date,
            payment_type: form.payment_type,
            status: PaymentStatus::initial(receipt_url.is_some()),
            receipt_url,
            verification: None,
            created_at: now,
            updated_at: now,
        })?;

        info!(
            payment = %payment.id,
            admission = %payment.admission_id,
            amount = %payment.amount,
            status = payment.status.label(),
            "payment recorded"
        );
        Ok(payment)
    }

    /// Upload a receipt for an existing payment and move it under verification.
    pub fn attach_receipt(
        &self,
        caller: &Caller,
        payment_id: &PaymentId,
        upload: Upload,
    ) -> Result<Payment, SchoolServiceError> {
        let payment = self.fetch_payment(payment_id)?;
        caller.require_owner(&payment.parent_id, "attaching a receipt")?;
        payment.status.apply(PaymentTransition::AttachReceipt)?;

        let url = self.store_receipt(caller, payment_id, upload)?;
        self.record_receipt(caller, payment_id, url)
    }

    /// Point a payment at an already uploaded receipt.
    pub fn record_receipt(
        &self,
        caller: &Caller,
        payment_id: &PaymentId,
        receipt_url: String,
    ) -> Result<Payment, SchoolServiceError> {
        if receipt_url.trim().is_empty() {
            return Err(SchoolServiceError::Invalid(
                "receipt url is required".to_string(),
            ));
        }
        let mut payment = self.fetch_payment(payment_id)?;
        caller.require_owner(&payment.parent_id, "attaching a receipt")?;

        payment.status = payment
            .status
            .apply(PaymentTransition::AttachReceipt)
            .map_err(|err| {
                warn!(payment = %payment_id, error = %err, "receipt refused");
                err
            })?;
        payment.receipt_url = Some(receipt_url);
        payment.updated_at = self.now();
        self.store.update_payment(payment.clone())?;

        info!(payment = %payment.id, "receipt attached");
        Ok(payment)
    }

    pub fn verify_payment(
        &self,
        caller: &Caller,
        payment_id: &PaymentId,
        outcome: VerificationOutcome,
        notes: Option<String>,
    ) -> Result<Payment, SchoolServiceError> {
        caller.require_admin("verifying a payment")?;
        let mut payment = self.fetch_payment(payment_id)?;

        payment.status = payment
            .status
            .apply(PaymentTransition::Verify(outcome))
            .map_err(|err| {
                warn!(payment = %payment_id, error = %err, "verification refused");
                err
            })?;
        let now = self.now();
        payment.verification = Some(Verification {
            verified_by: caller.user_id.clone(),
            verified_at: now,
            notes: notes.filter(|text| !text.trim().is_empty()),
        });
        payment.updated_at = now;
        self.store.update_payment(payment.clone())?;

        info!(
            payment = %payment.id,
            status = payment.status.label(),
            by = %caller.user_id,
            "payment verified"
        );
        Ok(payment)
    }

    pub fn my_payments(
        &self,
        caller: &Caller,
    ) -> Result<Vec<PaymentWithAdmission>, SchoolServiceError> {
        let payments = self.store.payments_for_parent(&caller.user_id)?;
        let admissions = self.my_admissions(caller)?;
        Ok(sorted_payments(join_payments(payments, &admissions)))
    }

    pub fn payments_for_admission(
        &self,
        caller: &Caller,
        admission_id: &AdmissionId,
    ) -> Result<Vec<Payment>, SchoolServiceError> {
        let admission = self.fetch_admission(admission_id)?;
        caller.require_owner_or_admin(&admission.parent_id, "viewing payments")?;
        let mut payments = self.store.payments_for_admission(admission_id)?;
        newest_first(&mut payments, |payment| {
            (payment.created_at, payment.id.clone())
        });
        Ok(payments)
    }

    pub fn all_payments(
        &self,
        caller: &Caller,
    ) -> Result<Vec<PaymentWithAdmission>, SchoolServiceError> {
        caller.require_admin("listing all payments")?;
        self.joined_payments(self.store.all_payments()?)
    }

    /// Payments with a receipt waiting for an admin decision.
    pub fn pending_payments(
        &self,
        caller: &Caller,
    ) -> Result<Vec<PaymentWithAdmission>, SchoolServiceError> {
        caller.require_admin("listing pending payments")?;
        self.joined_payments(
            self.store
                .payments_with_status(PaymentStatus::UnderVerification)?,
        )
    }

    /// Ledger across every admission of the calling parent.
    pub fn my_ledger(&self, caller: &Caller) -> Result<FeeLedger, SchoolServiceError> {
        let admissions = self.store.admissions_for_parent(&caller.user_id)?;
        let payments = self.store.payments_for_parent(&caller.user_id)?;
        let total_fee: Money = admissions.iter().map(|admission| admission.total_fee).sum();
        Ok(FeeLedger::compute(total_fee, &payments))
    }

    pub fn admission_ledger(
        &self,
        caller: &Caller,
        admission_id: &AdmissionId,
    ) -> Result<FeeLedger, SchoolServiceError> {
        let admission = self.fetch_admission(admission_id)?;
        caller.require_owner_or_admin(&admission.parent_id, "viewing a ledger")?;
        let payments = self.store.payments_for_admission(admission_id)?;
        Ok(FeeLedger::compute(admission.total_fee, &payments))
    }

    pub(super) fn joined_payments(
        &self,
        payments: Vec<Payment>,
    ) -> Result<Vec<PaymentWithAdmission>, SchoolServiceError> {
        let admissions = self.joined_admissions(self.store.all_admissions()?)?;
        Ok(sorted_payments(join_payments(payments, &admissions)))
    }

    fn fetch_payment(&self, payment_id: &PaymentId) -> Result<Payment, SchoolServiceError> {
        self.store
            .fetch_payment(payment_id)?
            .ok_or_else(|| SchoolServiceError::not_found("payment", payment_id))
    }

    fn store_receipt(
        &self,
        caller: &Caller,
        payment_id: &PaymentId,
        upload: Upload,
    ) -> Result<String, SchoolServiceError> {
        let path = receipt_path(
            &caller.user_id,
            payment_id,
            self.upload_stamp(),
            &upload.file_name,
        );
        let stored = self.objects.upload(Bucket::Receipts, &path, upload)?;
        Ok(self.objects.url(stored.bucket, &stored.path)?)
    }
}

fn sorted_payments(mut rows: Vec<PaymentWithAdmission>) -> Vec<PaymentWithAdmission> {
    newest_first(&mut rows, |row| (row.payment.created_at, row.payment.id.clone()));
    rows
}
