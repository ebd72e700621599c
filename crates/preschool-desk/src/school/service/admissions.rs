use tracing::{info, warn};

use super::{check_fee, newest_first, next_record_id, SchoolService, SchoolServiceError};
use crate::school::access::Caller;
use crate::school::domain::{
    Admission, AdmissionForm, AdmissionId, AdmissionUpdate, Student, StudentId, StudentUpdate,
};
use crate::school::ledger::FeeLedger;
use crate::school::lifecycle::AdmissionStatus;
use crate::school::storage::{document_path, Bucket, ObjectStore, StoredObject, Upload};
use crate::school::views::{
    join_admissions, join_students, AdmissionDetail, AdmissionWithStudent, DocumentLink,
    StudentWithAdmission,
};
use crate::school::RecordStore;

impl<S, O> SchoolService<S, O>
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    /// Create the student and its admission in one logical step.
    pub fn create_admission(
        &self,
        caller: &Caller,
        form: AdmissionForm,
    ) -> Result<AdmissionWithStudent, SchoolServiceError> {
        validate_admission_form(caller, &form)?;
        let now = self.now();

        if form.parent_full_name.is_some() || form.parent_phone.is_some() {
            if let Some(mut profile) = self.store.fetch_profile(&caller.user_id)? {
                if form.parent_full_name.is_some() {
                    profile.full_name = form.parent_full_name.clone();
                }
                if form.parent_phone.is_some() {
                    profile.phone = form.parent_phone.clone();
                }
                profile.updated_at = now;
                self.store.update_profile(profile)?;
            }
        }

        let total_fee = self.fees.resolve(form.total_fee, &form.class);

        let student = self.store.insert_student(Student {
            id: StudentId(next_record_id("stu")),
            parent_id: caller.user_id.clone(),
            full_name: form.student_full_name.trim().to_string(),
            date_of_birth: form.date_of_birth,
            gender: form.gender,
            class: form.class,
            academic_year: form.academic_year,
            assigned_teacher: None,
            emergency_contact: form.emergency_contact,
            medical_conditions: non_blank(form.medical_conditions),
            allergies: non_blank(form.allergies),
            residential_address: non_blank(form.residential_address),
            previous_school: non_blank(form.previous_school),
            created_at: now,
            updated_at: now,
        })?;

        let inserted = self.store.insert_admission(Admission {
            id: AdmissionId(next_record_id("adm")),
            student_id: student.id.clone(),
            parent_id: caller.user_id.clone(),
            admission_date: now.date_naive(),
            status: AdmissionStatus::Submitted,
            total_fee,
            uploaded_files: form.uploaded_files,
            notes: None,
            created_at: now,
            updated_at: now,
        });
        let admission = match inserted {
            Ok(admission) => admission,
            Err(err) => {
                // Undo the student so a failed submission leaves nothing behind.
                if let Err(cleanup) = self.store.delete_student(&student.id) {
                    warn!(student = %student.id, error = %cleanup, "orphaned student left behind");
                }
                warn!(student = %student.id, error = %err, "admission insert failed");
                return Err(err.into());
            }
        };

        info!(
            admission = %admission.id,
            student = %student.id,
            parent = %caller.user_id,
            total_fee = %admission.total_fee,
            "admission submitted"
        );

        Ok(AdmissionWithStudent {
            admission,
            student: Some(student),
        })
    }

    pub fn my_admissions(
        &self,
        caller: &Caller,
    ) -> Result<Vec<AdmissionWithStudent>, SchoolServiceError> {
        let admissions = self.store.admissions_for_parent(&caller.user_id)?;
        let students = self.store.students_for_parent(&caller.user_id)?;
        Ok(sorted_admissions(join_admissions(admissions, &students)))
    }

    pub fn all_admissions(
        &self,
        caller: &Caller,
    ) -> Result<Vec<AdmissionWithStudent>, SchoolServiceError> {
        caller.require_admin("listing all admissions")?;
        self.joined_admissions(self.store.all_admissions()?)
    }

    /// Admissions still waiting for a decision.
    pub fn pending_admissions(
        &self,
        caller: &Caller,
    ) -> Result<Vec<AdmissionWithStudent>, SchoolServiceError> {
        caller.require_admin("listing pending admissions")?;
        self.joined_admissions(
            self.store
                .admissions_with_status(AdmissionStatus::Submitted)?,
        )
    }

    pub(super) fn joined_admissions(
        &self,
        admissions: Vec<Admission>,
    ) -> Result<Vec<AdmissionWithStudent>, SchoolServiceError> {
        let students = self.store.all_students()?;
        Ok(sorted_admissions(join_admissions(admissions, &students)))
    }

    /// Approve or reject a submitted admission, recording the office note.
    pub fn decide_admission(
        &self,
        caller: &Caller,
        admission_id: &AdmissionId,
        decision: AdmissionStatus,
        notes: Option<String>,
    ) -> Result<Admission, SchoolServiceError> {
        caller.require_admin("deciding an admission")?;
        let mut admission = self.fetch_admission(admission_id)?;

        admission.status = admission.status.transition_to(decision).map_err(|err| {
            warn!(admission = %admission_id, error = %err, "admission transition refused");
            err
        })?;
        admission.notes = non_blank(notes);
        admission.updated_at = self.now();
        self.store.update_admission(admission.clone())?;

        info!(
            admission = %admission.id,
            status = admission.status.label(),
            by = %caller.user_id,
            "admission decided"
        );
        Ok(admission)
    }

    /// Office edit of the fee and notes; does not touch the status.
    pub fn update_admission_details(
        &self,
        caller: &Caller,
        admission_id: &AdmissionId,
        update: AdmissionUpdate,
    ) -> Result<Admission, SchoolServiceError> {
        caller.require_admin("editing an admission")?;
        let mut admission = self.fetch_admission(admission_id)?;

        if let Some(total_fee) = update.total_fee {
            check_fee(total_fee)?;
            admission.total_fee = total_fee;
        }
        if update.notes.is_some() {
            admission.notes = non_blank(update.notes);
        }
        admission.updated_at = self.now();
        self.store.update_admission(admission.clone())?;
        Ok(admission)
    }

    /// Admission with its student, payments, ledger, and resolved document URLs.
    pub fn admission_detail(
        &self,
        caller: &Caller,
        admission_id: &AdmissionId,
    ) -> Result<AdmissionDetail, SchoolServiceError> {
        let admission = self.fetch_admission(admission_id)?;
        caller.require_owner_or_admin(&admission.parent_id, "viewing an admission")?;

        let mut payments = self.store.payments_for_admission(admission_id)?;
        newest_first(&mut payments, |payment| {
            (payment.created_at, payment.id.clone())
        });
        let ledger = FeeLedger::compute(admission.total_fee, &payments);

        let documents = admission
            .uploaded_files
            .iter()
            .map(|(key, path)| {
                let url = if path.starts_with("http://") || path.starts_with("https://") {
                    path.clone()
                } else {
                    self.objects.url(Bucket::Documents, path)?
                };
                Ok(DocumentLink {
                    key: key.clone(),
                    path: path.clone(),
                    url,
                })
            })
            .collect::<Result<Vec<_>, SchoolServiceError>>()?;

        let student = self.store.fetch_student(&admission.student_id)?;

        Ok(AdmissionDetail {
            admission: AdmissionWithStudent { admission, student },
            payments,
            ledger,
            documents,
        })
    }

    /// Store an admission document; the returned path goes into the form's `uploaded_files`.
    pub fn upload_admission_document(
        &self,
        caller: &Caller,
        doc_key: &str,
        upload: Upload,
    ) -> Result<StoredObject, SchoolServiceError> {
        if doc_key.trim().is_empty() {
            return Err(SchoolServiceError::Invalid(
                "document key is required".to_string(),
            ));
        }
        let path = document_path(
            &caller.user_id,
            doc_key,
            self.upload_stamp(),
            &upload.file_name,
        );
        Ok(self.objects.upload(Bucket::Documents, &path, upload)?)
    }

    pub fn my_students(
        &self,
        caller: &Caller,
    ) -> Result<Vec<StudentWithAdmission>, SchoolServiceError> {
        let students = self.store.students_for_parent(&caller.user_id)?;
        let admissions = self.store.admissions_for_parent(&caller.user_id)?;
        Ok(sorted_students(join_students(students, &admissions)))
    }

    pub fn all_students(
        &self,
        caller: &Caller,
    ) -> Result<Vec<StudentWithAdmission>, SchoolServiceError> {
        caller.require_admin("listing all students")?;
        let students = self.store.all_students()?;
        let admissions = self.store.all_admissions()?;
        Ok(sorted_students(join_students(students, &admissions)))
    }

    pub fn update_student(
        &self,
        caller: &Caller,
        student_id: &StudentId,
        update: StudentUpdate,
    ) -> Result<Student, SchoolServiceError> {
        let mut student = self
            .store
            .fetch_student(student_id)?
            .ok_or_else(|| SchoolServiceError::not_found("student", student_id))?;
        caller.require_owner_or_admin(&student.parent_id, "editing a student")?;

        update.apply(&mut student);
        student.updated_at = self.now();
        self.store.update_student(student.clone())?;
        Ok(student)
    }

    pub(super) fn fetch_admission(
        &self,
        admission_id: &AdmissionId,
    ) -> Result<Admission, SchoolServiceError> {
        self.store
            .fetch_admission(admission_id)?
            .ok_or_else(|| SchoolServiceError::not_found("admission", admission_id))
    }
}

fn validate_admission_form(caller: &Caller, form: &AdmissionForm) -> Result<(), SchoolServiceError> {
    if form.student_full_name.trim().is_empty() {
        return Err(SchoolServiceError::Invalid(
            "student name is required".to_string(),
        ));
    }
    if form.class.trim().is_empty() {
        return Err(SchoolServiceError::Invalid("class is required".to_string()));
    }
    if let Some(fee) = form.total_fee {
        check_fee(fee)?;
    }
    // Parents may only reference documents they uploaded themselves.
    if !caller.is_admin() {
        let prefix = format!("{}/", caller.user_id);
        if let Some((key, _)) = form
            .uploaded_files
            .iter()
            .find(|(_, path)| !is_owned_path(path, &prefix))
        {
            return Err(SchoolServiceError::Invalid(format!(
                "document '{key}' does not belong to the submitting parent"
            )));
        }
    }
    Ok(())
}

fn is_owned_path(path: &str, prefix: &str) -> bool {
    path.starts_with(prefix) && !path.contains("..")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn sorted_admissions(mut rows: Vec<AdmissionWithStudent>) -> Vec<AdmissionWithStudent> {
    newest_first(&mut rows, |row| {
        (row.admission.created_at, row.admission.id.clone())
    });
    rows
}

fn sorted_students(mut rows: Vec<StudentWithAdmission>) -> Vec<StudentWithAdmission> {
    newest_first(&mut rows, |row| (row.student.created_at, row.student.id.clone()));
    rows
}
