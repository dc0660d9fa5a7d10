use crate::domain::connection::{ConnectionRequest, RequestStatus};
use crate::domain::ids::{JobId, PaymentId, RequestId, UserId};
use crate::domain::job::Job;
use crate::domain::payment::Payment;
use crate::domain::ports::{ConnectionStore, Guard, JobStore, Mutation, PaymentStore, UserStore};
use crate::domain::user::User;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for user records, keyed by user id.
pub const CF_USERS: &str = "users";
/// Column Family mapping an email to the owning user id.
pub const CF_USER_EMAILS: &str = "user_emails";
/// Column Family for connection requests, keyed by request id.
pub const CF_REQUESTS: &str = "connection_requests";
/// Column Family enforcing one request per ordered (from, to) pair.
pub const CF_REQUEST_PAIRS: &str = "connection_request_pairs";
/// Column Family for jobs, keyed by job id.
pub const CF_JOBS: &str = "jobs";
/// Column Family for payments, keyed by payment id.
pub const CF_PAYMENTS: &str = "payments";

const COLUMN_FAMILIES: [&str; 6] = [
    CF_USERS,
    CF_USER_EMAILS,
    CF_REQUESTS,
    CF_REQUEST_PAIRS,
    CF_JOBS,
    CF_PAYMENTS,
];

/// A persistent store implementation using RocksDB.
///
/// Each relation lives in its own Column Family, values are JSON. Every
/// read-modify-write runs under `write_lock`, and multi-key writes go through
/// a single `WriteBatch`, so uniqueness checks and the job cascade are atomic.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that every required column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LedgerError::Internal(format!("{name} column family not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf: &'static str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, cf: &'static str, key: &[u8], value: &T) -> Result<()> {
        self.db.put_cf(self.cf(cf)?, key, serde_json::to_vec(value)?)?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(&self, cf: &'static str) -> Result<Vec<T>> {
        let mut records = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_key, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }

    fn pair_key(from: UserId, to: UserId) -> [u8; 32] {
        let mut key = [0u8; 32];
        key[..16].copy_from_slice(from.as_bytes());
        key[16..].copy_from_slice(to.as_bytes());
        key
    }
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let emails = self.cf(CF_USER_EMAILS)?;
        if self.db.get_pinned_cf(emails, user.email.as_bytes())?.is_some() {
            return Err(LedgerError::Duplicate(format!(
                "User with email {} already exists",
                user.email
            )));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(emails, user.email.as_bytes(), user.id.as_bytes());
        batch.put_cf(self.cf(CF_USERS)?, user.id.as_bytes(), serde_json::to_vec(&user)?);
        self.db.write(batch)?;
        Ok(())
    }

    async fn user(&self, id: UserId) -> Result<Option<User>> {
        self.read(CF_USERS, id.as_bytes())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(id) = self.db.get_cf(self.cf(CF_USER_EMAILS)?, email.as_bytes())? else {
            return Ok(None);
        };
        self.read(CF_USERS, &id)
    }
}

#[async_trait]
impl ConnectionStore for RocksDBStore {
    async fn insert_request(&self, request: ConnectionRequest) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let pairs = self.cf(CF_REQUEST_PAIRS)?;
        let pair = Self::pair_key(request.from_user_id, request.to_user_id);
        if self.db.get_pinned_cf(pairs, pair)?.is_some() {
            return Err(LedgerError::Duplicate(
                "A request to this user already exists".to_string(),
            ));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(pairs, pair, request.id.as_bytes());
        batch.put_cf(
            self.cf(CF_REQUESTS)?,
            request.id.as_bytes(),
            serde_json::to_vec(&request)?,
        );
        self.db.write(batch)?;
        Ok(())
    }

    async fn request(&self, id: RequestId) -> Result<Option<ConnectionRequest>> {
        self.read(CF_REQUESTS, id.as_bytes())
    }

    async fn update_request(
        &self,
        id: RequestId,
        mutation: Mutation<ConnectionRequest>,
    ) -> Result<ConnectionRequest> {
        let _guard = self.write_lock.lock().await;
        let mut request: ConnectionRequest = self
            .read(CF_REQUESTS, id.as_bytes())?
            .ok_or_else(|| LedgerError::not_found("connection request", id))?;
        mutation(&mut request)?;
        self.write(CF_REQUESTS, id.as_bytes(), &request)?;
        Ok(request)
    }

    async fn requests_for_user(&self, user: UserId) -> Result<Vec<ConnectionRequest>> {
        let requests: Vec<ConnectionRequest> = self.scan(CF_REQUESTS)?;
        Ok(requests
            .into_iter()
            .filter(|r| r.from_user_id == user || r.to_user_id == user)
            .collect())
    }

    async fn requests_between(
        &self,
        a: UserId,
        b: UserId,
        status: RequestStatus,
    ) -> Result<Vec<ConnectionRequest>> {
        let mut found = Vec::new();
        for (from, to) in [(a, b), (b, a)] {
            let Some(id) = self
                .db
                .get_cf(self.cf(CF_REQUEST_PAIRS)?, Self::pair_key(from, to))?
            else {
                continue;
            };
            if let Some(request) = self.read::<ConnectionRequest>(CF_REQUESTS, &id)?
                && request.status == status
            {
                found.push(request);
            }
            if a == b {
                break;
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl JobStore for RocksDBStore {
    async fn insert_job(&self, job: Job) -> Result<()> {
        self.write(CF_JOBS, job.id.as_bytes(), &job)
    }

    async fn job(&self, id: JobId) -> Result<Option<Job>> {
        self.read(CF_JOBS, id.as_bytes())
    }

    async fn update_job(&self, id: JobId, mutation: Mutation<Job>) -> Result<Job> {
        let _guard = self.write_lock.lock().await;
        let mut job: Job = self
            .read(CF_JOBS, id.as_bytes())?
            .ok_or_else(|| LedgerError::not_found("job", id))?;
        mutation(&mut job)?;
        self.write(CF_JOBS, id.as_bytes(), &job)?;
        Ok(job)
    }

    async fn delete_job_cascade(&self, id: JobId, guard: Guard<Job>) -> Result<(Job, Vec<Payment>)> {
        let _guard = self.write_lock.lock().await;
        let job: Job = self
            .read(CF_JOBS, id.as_bytes())?
            .ok_or_else(|| LedgerError::not_found("job", id))?;
        guard(&job)?;

        let payments: Vec<Payment> = self
            .scan::<Payment>(CF_PAYMENTS)?
            .into_iter()
            .filter(|p| p.job_id == id)
            .collect();

        let payments_cf = self.cf(CF_PAYMENTS)?;
        let mut batch = WriteBatch::default();
        for payment in &payments {
            batch.delete_cf(payments_cf, payment.id.as_bytes());
        }
        batch.delete_cf(self.cf(CF_JOBS)?, id.as_bytes());
        self.db.write(batch)?;

        Ok((job, payments))
    }

    async fn jobs_for_user(&self, user: UserId) -> Result<Vec<Job>> {
        let jobs: Vec<Job> = self.scan(CF_JOBS)?;
        Ok(jobs
            .into_iter()
            .filter(|j| j.company_id == user || j.assigned_to_id == user)
            .collect())
    }

    async fn jobs_between(&self, company: UserId, worker: UserId) -> Result<Vec<Job>> {
        let jobs: Vec<Job> = self.scan(CF_JOBS)?;
        Ok(jobs
            .into_iter()
            .filter(|j| j.company_id == company && j.assigned_to_id == worker)
            .collect())
    }

    async fn all_jobs(&self) -> Result<Vec<Job>> {
        self.scan(CF_JOBS)
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn insert_payment(&self, payment: Payment, guard: Guard<Vec<Payment>>) -> Result<()> {
        // Held so a concurrent cascade cannot remove the job in between.
        let _guard = self.write_lock.lock().await;
        let jobs = self.cf(CF_JOBS)?;
        if self
            .db
            .get_pinned_cf(jobs, payment.job_id.as_bytes())?
            .is_none()
        {
            return Err(LedgerError::not_found("job", payment.job_id));
        }
        let existing: Vec<Payment> = self
            .scan::<Payment>(CF_PAYMENTS)?
            .into_iter()
            .filter(|p| p.job_id == payment.job_id)
            .collect();
        guard(&existing)?;
        self.write(CF_PAYMENTS, payment.id.as_bytes(), &payment)
    }

    async fn payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        self.read(CF_PAYMENTS, id.as_bytes())
    }

    async fn payments_for_job(&self, job: JobId) -> Result<Vec<Payment>> {
        let payments: Vec<Payment> = self.scan(CF_PAYMENTS)?;
        Ok(payments.into_iter().filter(|p| p.job_id == job).collect())
    }

    async fn update_payment(&self, id: PaymentId, mutation: Mutation<Payment>) -> Result<Payment> {
        let _guard = self.write_lock.lock().await;
        let mut payment: Payment = self
            .read(CF_PAYMENTS, id.as_bytes())?
            .ok_or_else(|| LedgerError::not_found("payment", id))?;
        mutation(&mut payment)?;
        self.write(CF_PAYMENTS, id.as_bytes(), &payment)?;
        Ok(payment)
    }

    async fn delete_payment(&self, id: PaymentId, guard: Guard<Payment>) -> Result<Payment> {
        let _guard = self.write_lock.lock().await;
        let payment: Payment = self
            .read(CF_PAYMENTS, id.as_bytes())?
            .ok_or_else(|| LedgerError::not_found("payment", id))?;
        guard(&payment)?;
        self.db.delete_cf(self.cf(CF_PAYMENTS)?, id.as_bytes())?;
        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::NewJob;
    use crate::domain::money::Amount;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        for name in COLUMN_FAMILIES {
            assert!(store.db.cf_handle(name).is_some(), "missing {name}");
        }
    }

    #[tokio::test]
    async fn test_rocksdb_user_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let user = User::new("Grace", "grace@example.com", None).unwrap();
        store.insert_user(user.clone()).await.unwrap();

        assert_eq!(store.user(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(
            store.user_by_email("grace@example.com").await.unwrap(),
            Some(user)
        );
        let twin = User::new("Grace II", "grace@example.com", None).unwrap();
        assert!(matches!(
            store.insert_user(twin).await,
            Err(LedgerError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_rocksdb_request_pairs() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let (a, b) = (UserId::new(), UserId::new());

        let request = ConnectionRequest::new(a, b, Utc::now());
        store.insert_request(request.clone()).await.unwrap();
        assert!(matches!(
            store.insert_request(ConnectionRequest::new(a, b, Utc::now())).await,
            Err(LedgerError::Duplicate(_))
        ));

        store
            .update_request(
                request.id,
                Box::new(|r: &mut ConnectionRequest| r.resolve(RequestStatus::Approved)),
            )
            .await
            .unwrap();
        let approved = store
            .requests_between(b, a, RequestStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
    }

    #[tokio::test]
    async fn test_rocksdb_update_unknown_request() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let result = store
            .update_request(
                RequestId::new(),
                Box::new(|r: &mut ConnectionRequest| r.resolve(RequestStatus::Approved)),
            )
            .await;
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_rocksdb_cascade() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let job = Job::create(UserId::new(), NewJob::new("Deck", UserId::new()), Utc::now())
            .unwrap();
        store.insert_job(job.clone()).await.unwrap();
        let amount = Amount::new(dec!(12.5)).unwrap();
        let payment = Payment::record(&job, job.company_id, amount, None, Utc::now()).unwrap();
        store
            .insert_payment(payment.clone(), Box::new(|_: &Vec<Payment>| Ok(())))
            .await
            .unwrap();

        let (_, removed) = store
            .delete_job_cascade(job.id, Box::new(|_: &Job| Ok(())))
            .await
            .unwrap();
        assert_eq!(removed, vec![payment.clone()]);
        assert!(store.job(job.id).await.unwrap().is_none());
        assert!(store.payment(payment.id).await.unwrap().is_none());
    }
}
