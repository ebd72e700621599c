//! Joined read models. Each entity pair has exactly one mapping function here;
//! callers never stitch related rows together themselves.

use std::collections::HashMap;

use serde::Serialize;

use super::domain::{
    Admission, AdmissionId, HelpQuery, Payment, Profile, Student, StudentId, UserId,
};
use super::ledger::FeeLedger;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentWithAdmission {
    #[serde(flatten)]
    pub student: Student,
    pub admission: Option<Admission>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissionWithStudent {
    #[serde(flatten)]
    pub admission: Admission,
    pub student: Option<Student>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentWithAdmission {
    #[serde(flatten)]
    pub payment: Payment,
    pub admission: Option<AdmissionWithStudent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryWithParent {
    #[serde(flatten)]
    pub query: HelpQuery,
    pub parent: Option<Profile>,
}

/// Admission page payload: the record, its child, payments, ledger, and document links.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissionDetail {
    #[serde(flatten)]
    pub admission: AdmissionWithStudent,
    pub payments: Vec<Payment>,
    pub ledger: FeeLedger,
    pub documents: Vec<DocumentLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLink {
    pub key: String,
    pub path: String,
    pub url: String,
}

pub fn join_students(
    students: Vec<Student>,
    admissions: &[Admission],
) -> Vec<StudentWithAdmission> {
    let by_student: HashMap<&StudentId, &Admission> = admissions
        .iter()
        .map(|admission| (&admission.student_id, admission))
        .collect();

    students
        .into_iter()
        .map(|student| {
            let admission = by_student.get(&student.id).map(|found| (*found).clone());
            StudentWithAdmission { student, admission }
        })
        .collect()
}

pub fn join_admissions(
    admissions: Vec<Admission>,
    students: &[Student],
) -> Vec<AdmissionWithStudent> {
    let by_id: HashMap<&StudentId, &Student> =
        students.iter().map(|student| (&student.id, student)).collect();

    admissions
        .into_iter()
        .map(|admission| {
            let student = by_id.get(&admission.student_id).map(|found| (*found).clone());
            AdmissionWithStudent { admission, student }
        })
        .collect()
}

pub fn join_payments(
    payments: Vec<Payment>,
    admissions: &[AdmissionWithStudent],
) -> Vec<PaymentWithAdmission> {
    let by_id: HashMap<&AdmissionId, &AdmissionWithStudent> = admissions
        .iter()
        .map(|joined| (&joined.admission.id, joined))
        .collect();

    payments
        .into_iter()
        .map(|payment| {
            let admission = by_id.get(&payment.admission_id).map(|found| (*found).clone());
            PaymentWithAdmission { payment, admission }
        })
        .collect()
}

pub fn join_queries(queries: Vec<HelpQuery>, profiles: &[Profile]) -> Vec<QueryWithParent> {
    let by_id: HashMap<&UserId, &Profile> =
        profiles.iter().map(|profile| (&profile.id, profile)).collect();

    queries
        .into_iter()
        .map(|query| {
            let parent = by_id.get(&query.parent_id).map(|found| (*found).clone());
            QueryWithParent { query, parent }
        })
        .collect()
}
