//! Process-local stand-ins for the hosted record store and bucket service.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::domain::{
    Admission, AdmissionId, Announcement, AnnouncementId, Event, EventId, HelpQuery, Payment,
    PaymentId, Profile, QueryId, Student, StudentId, UserId,
};
use super::lifecycle::{AdmissionStatus, PaymentStatus, QueryStatus};
use super::repository::{
    AdmissionRepository, AnnouncementRepository, EventRepository, PaymentRepository,
    ProfileRepository, QueryRepository, RepositoryError, StudentRepository,
};
use super::storage::{Bucket, ObjectStore, StorageError, StoredObject, Upload};

struct Table<K, V> {
    rows: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn with_rows<T>(
        &self,
        f: impl FnOnce(&mut HashMap<K, V>) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut guard = self
            .rows
            .lock()
            .map_err(|_| RepositoryError::Unavailable("table lock poisoned".to_string()))?;
        f(&mut guard)
    }

    fn insert(&self, key: K, value: V) -> Result<V, RepositoryError> {
        self.with_rows(|rows| {
            if rows.contains_key(&key) {
                return Err(RepositoryError::Conflict);
            }
            rows.insert(key, value.clone());
            Ok(value)
        })
    }

    fn update(&self, key: K, value: V) -> Result<(), RepositoryError> {
        self.with_rows(|rows| match rows.get_mut(&key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        })
    }

    fn fetch(&self, key: &K) -> Result<Option<V>, RepositoryError> {
        self.with_rows(|rows| Ok(rows.get(key).cloned()))
    }

    fn delete(&self, key: &K) -> Result<(), RepositoryError> {
        self.with_rows(|rows| {
            rows.remove(key)
                .map(|_| ())
                .ok_or(RepositoryError::NotFound)
        })
    }

    fn select(&self, predicate: impl Fn(&V) -> bool) -> Result<Vec<V>, RepositoryError> {
        self.with_rows(|rows| Ok(rows.values().filter(|row| predicate(row)).cloned().collect()))
    }
}

/// All school tables behind per-table mutexes. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Tables>,
}

#[derive(Default)]
struct Tables {
    outage: AtomicBool,
    admissions_outage: AtomicBool,
    profiles: Table<UserId, Profile>,
    students: Table<StudentId, Student>,
    admissions: Table<AdmissionId, Admission>,
    payments: Table<PaymentId, Payment>,
    events: Table<EventId, Event>,
    announcements: Table<AnnouncementId, Announcement>,
    queries: Table<QueryId, HelpQuery>,
}

impl MemoryStore {
    /// Simulate the hosted backend going away; every call fails until cleared.
    pub fn set_outage(&self, down: bool) {
        self.inner.outage.store(down, Ordering::SeqCst);
    }

    /// Fail only admission inserts, leaving every other table reachable.
    pub fn set_admissions_outage(&self, down: bool) {
        self.inner.admissions_outage.store(down, Ordering::SeqCst);
    }

    fn tables(&self) -> Result<&Tables, RepositoryError> {
        if self.inner.outage.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable(
                "record store offline".to_string(),
            ))
        } else {
            Ok(&self.inner)
        }
    }
}

impl ProfileRepository for MemoryStore {
    fn insert_profile(&self, profile: Profile) -> Result<Profile, RepositoryError> {
        self.tables()?.profiles.insert(profile.id.clone(), profile)
    }

    fn update_profile(&self, profile: Profile) -> Result<(), RepositoryError> {
        self.tables()?.profiles.update(profile.id.clone(), profile)
    }

    fn fetch_profile(&self, id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        self.tables()?.profiles.fetch(id)
    }

    fn all_profiles(&self) -> Result<Vec<Profile>, RepositoryError> {
        self.tables()?.profiles.select(|_| true)
    }

    fn delete_profile(&self, id: &UserId) -> Result<(), RepositoryError> {
        self.tables()?.profiles.delete(id)
    }
}

impl StudentRepository for MemoryStore {
    fn insert_student(&self, student: Student) -> Result<Student, RepositoryError> {
        self.tables()?.students.insert(student.id.clone(), student)
    }

    fn update_student(&self, student: Student) -> Result<(), RepositoryError> {
        self.tables()?.students.update(student.id.clone(), student)
    }

    fn fetch_student(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError> {
        self.tables()?.students.fetch(id)
    }

    fn delete_student(&self, id: &StudentId) -> Result<(), RepositoryError> {
        self.tables()?.students.delete(id)
    }

    fn students_for_parent(&self, parent: &UserId) -> Result<Vec<Student>, RepositoryError> {
        self.tables()?
            .students
            .select(|student| &student.parent_id == parent)
    }

    fn all_students(&self) -> Result<Vec<Student>, RepositoryError> {
        self.tables()?.students.select(|_| true)
    }
}

impl AdmissionRepository for MemoryStore {
    fn insert_admission(&self, admission: Admission) -> Result<Admission, RepositoryError> {
        let tables = self.tables()?;
        if tables.admissions_outage.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "admissions table offline".to_string(),
            ));
        }
        // One admission per student, checked under the same lock as the insert.
        tables.admissions.with_rows(|rows| {
            let duplicate = rows.contains_key(&admission.id)
                || rows
                    .values()
                    .any(|existing| existing.student_id == admission.student_id);
            if duplicate {
                return Err(RepositoryError::Conflict);
            }
            rows.insert(admission.id.clone(), admission.clone());
            Ok(admission)
        })
    }

    fn update_admission(&self, admission: Admission) -> Result<(), RepositoryError> {
        self.tables()?
            .admissions
            .update(admission.id.clone(), admission)
    }

    fn fetch_admission(&self, id: &AdmissionId) -> Result<Option<Admission>, RepositoryError> {
        self.tables()?.admissions.fetch(id)
    }

    fn admissions_for_parent(&self, parent: &UserId) -> Result<Vec<Admission>, RepositoryError> {
        self.tables()?
            .admissions
            .select(|admission| &admission.parent_id == parent)
    }

    fn admissions_with_status(
        &self,
        status: AdmissionStatus,
    ) -> Result<Vec<Admission>, RepositoryError> {
        self.tables()?
            .admissions
            .select(|admission| admission.status == status)
    }

    fn all_admissions(&self) -> Result<Vec<Admission>, RepositoryError> {
        self.tables()?.admissions.select(|_| true)
    }
}

impl PaymentRepository for MemoryStore {
    fn insert_payment(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        self.tables()?.payments.insert(payment.id.clone(), payment)
    }

    fn update_payment(&self, payment: Payment) -> Result<(), RepositoryError> {
        self.tables()?.payments.update(payment.id.clone(), payment)
    }

    fn fetch_payment(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        self.tables()?.payments.fetch(id)
    }

    fn payments_for_parent(&self, parent: &UserId) -> Result<Vec<Payment>, RepositoryError> {
        self.tables()?
            .payments
            .select(|payment| &payment.parent_id == parent)
    }

    fn payments_for_admission(
        &self,
        admission: &AdmissionId,
    ) -> Result<Vec<Payment>, RepositoryError> {
        self.tables()?
            .payments
            .select(|payment| &payment.admission_id == admission)
    }

    fn payments_with_status(
        &self,
        status: PaymentStatus,
    ) -> Result<Vec<Payment>, RepositoryError> {
        self.tables()?
            .payments
            .select(|payment| payment.status == status)
    }

    fn all_payments(&self) -> Result<Vec<Payment>, RepositoryError> {
        self.tables()?.payments.select(|_| true)
    }
}

impl EventRepository for MemoryStore {
    fn insert_event(&self, event: Event) -> Result<Event, RepositoryError> {
        self.tables()?.events.insert(event.id.clone(), event)
    }

    fn update_event(&self, event: Event) -> Result<(), RepositoryError> {
        self.tables()?.events.update(event.id.clone(), event)
    }

    fn fetch_event(&self, id: &EventId) -> Result<Option<Event>, RepositoryError> {
        self.tables()?.events.fetch(id)
    }

    fn delete_event(&self, id: &EventId) -> Result<(), RepositoryError> {
        self.tables()?.events.delete(id)
    }

    fn all_events(&self) -> Result<Vec<Event>, RepositoryError> {
        self.tables()?.events.select(|_| true)
    }
}

impl AnnouncementRepository for MemoryStore {
    fn insert_announcement(
        &self,
        announcement: Announcement,
    ) -> Result<Announcement, RepositoryError> {
        self.tables()?
            .announcements
            .insert(announcement.id.clone(), announcement)
    }

    fn update_announcement(&self, announcement: Announcement) -> Result<(), RepositoryError> {
        self.tables()?
            .announcements
            .update(announcement.id.clone(), announcement)
    }

    fn fetch_announcement(
        &self,
        id: &AnnouncementId,
    ) -> Result<Option<Announcement>, RepositoryError> {
        self.tables()?.announcements.fetch(id)
    }

    fn delete_announcement(&self, id: &AnnouncementId) -> Result<(), RepositoryError> {
        self.tables()?.announcements.delete(id)
    }

    fn all_announcements(&self) -> Result<Vec<Announcement>, RepositoryError> {
        self.tables()?.announcements.select(|_| true)
    }
}

impl QueryRepository for MemoryStore {
    fn insert_query(&self, query: HelpQuery) -> Result<HelpQuery, RepositoryError> {
        self.tables()?.queries.insert(query.id.clone(), query)
    }

    fn update_query(&self, query: HelpQuery) -> Result<(), RepositoryError> {
        self.tables()?.queries.update(query.id.clone(), query)
    }

    fn fetch_query(&self, id: &QueryId) -> Result<Option<HelpQuery>, RepositoryError> {
        self.tables()?.queries.fetch(id)
    }

    fn queries_for_parent(&self, parent: &UserId) -> Result<Vec<HelpQuery>, RepositoryError> {
        self.tables()?
            .queries
            .select(|query| &query.parent_id == parent)
    }

    fn queries_with_status(&self, status: QueryStatus) -> Result<Vec<HelpQuery>, RepositoryError> {
        self.tables()?.queries.select(|query| query.status == status)
    }

    fn all_queries(&self) -> Result<Vec<HelpQuery>, RepositoryError> {
        self.tables()?.queries.select(|_| true)
    }
}

struct Blob {
    object: StoredObject,
    bytes: Vec<u8>,
}

// Signed links never outlive a week.
const MAX_SIGNED_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

type HmacSha256 = Hmac<Sha256>;

/// Bucket service kept in memory; URLs point at `base_url`.
#[derive(Clone)]
pub struct MemoryObjectStore {
    base_url: String,
    signed_url_ttl: Duration,
    signing_key: Arc<[u8]>,
    objects: Arc<Mutex<HashMap<(Bucket, String), Blob>>>,
}

impl MemoryObjectStore {
    pub fn new(
        base_url: impl Into<String>,
        signed_url_ttl_secs: u64,
        signing_key: impl AsRef<[u8]>,
    ) -> Self {
        let ttl = signed_url_ttl_secs.min(MAX_SIGNED_URL_TTL_SECS) as i64;
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signed_url_ttl: Duration::seconds(ttl),
            signing_key: Arc::from(signing_key.as_ref()),
            objects: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn objects(&self, bucket: Bucket) -> Vec<StoredObject> {
        match self.objects.lock() {
            Ok(guard) => {
                let mut objects: Vec<StoredObject> = guard
                    .iter()
                    .filter(|((stored_bucket, _), _)| *stored_bucket == bucket)
                    .map(|(_, blob)| blob.object.clone())
                    .collect();
                objects.sort_by(|a, b| a.path.cmp(&b.path));
                objects
            }
            Err(_) => Vec::new(),
        }
    }

    pub fn read(&self, bucket: Bucket, path: &str) -> Option<Vec<u8>> {
        let guard = self.objects.lock().ok()?;
        guard
            .get(&(bucket, path.to_string()))
            .map(|blob| blob.bytes.clone())
    }

    /// Check a signed link produced by [`ObjectStore::url`] for a private bucket.
    /// Expired links and expiries beyond the configured lifetime are refused.
    pub fn verify_signature(&self, bucket: Bucket, path: &str, expires: i64, token: &str) -> bool {
        let now = Utc::now().timestamp();
        if expires < now || expires > now + self.signed_url_ttl.num_seconds() {
            return false;
        }
        let Ok(tag) = hex::decode(token) else {
            return false;
        };
        match self.mac(bucket, path, expires) {
            Ok(mac) => mac.verify_slice(&tag).is_ok(),
            Err(_) => false,
        }
    }

    fn sign(&self, bucket: Bucket, path: &str) -> Result<String, StorageError> {
        let expires = (Utc::now() + self.signed_url_ttl).timestamp();
        Ok(format!(
            "{}/{}/{}?expires={}&token={}",
            self.base_url,
            bucket.name(),
            path,
            expires,
            self.token(bucket, path, expires)?
        ))
    }

    fn token(&self, bucket: Bucket, path: &str, expires: i64) -> Result<String, StorageError> {
        let mac = self.mac(bucket, path, expires)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn mac(&self, bucket: Bucket, path: &str, expires: i64) -> Result<HmacSha256, StorageError> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|_| StorageError::Unavailable("invalid signing key".to_string()))?;
        mac.update(bucket.name().as_bytes());
        mac.update(b"\n");
        mac.update(path.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new(
            "http://127.0.0.1:3000/storage",
            3600,
            crate::config::DEV_SIGNING_KEY,
        )
    }
}

impl ObjectStore for MemoryObjectStore {
    fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        upload: Upload,
    ) -> Result<StoredObject, StorageError> {
        if upload.bytes.is_empty() {
            return Err(StorageError::EmptyUpload);
        }

        let mut guard = self
            .objects
            .lock()
            .map_err(|_| StorageError::Unavailable("bucket lock poisoned".to_string()))?;
        let key = (bucket, path.to_string());
        if guard.contains_key(&key) {
            return Err(StorageError::AlreadyExists {
                bucket,
                path: path.to_string(),
            });
        }

        let object = StoredObject {
            bucket,
            path: path.to_string(),
            size: upload.bytes.len(),
            content_type: upload.content_type,
        };
        guard.insert(
            key,
            Blob {
                object: object.clone(),
                bytes: upload.bytes,
            },
        );
        Ok(object)
    }

    fn url(&self, bucket: Bucket, path: &str) -> Result<String, StorageError> {
        let guard = self
            .objects
            .lock()
            .map_err(|_| StorageError::Unavailable("bucket lock poisoned".to_string()))?;
        if !guard.contains_key(&(bucket, path.to_string())) {
            return Err(StorageError::NotFound {
                bucket,
                path: path.to_string(),
            });
        }
        drop(guard);

        if bucket.is_public() {
            Ok(format!("{}/{}/{}", self.base_url, bucket.name(), path))
        } else {
            self.sign(bucket, path)
        }
    }
}
