use crate::domain::connection::{ConnectionRequest, RequestStatus};
use crate::domain::ids::{JobId, PaymentId, RequestId, UserId};
use crate::domain::job::Job;
use crate::domain::payment::Payment;
use crate::domain::ports::{ConnectionStore, Guard, JobStore, Mutation, PaymentStore, UserStore};
use crate::domain::user::User;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    requests: HashMap<RequestId, ConnectionRequest>,
    request_pairs: HashSet<(UserId, UserId)>,
    jobs: HashMap<JobId, Job>,
    payments: HashMap<PaymentId, Payment>,
}

/// A thread-safe in-memory store for every ledger relation.
///
/// All relations sit behind one `RwLock`, so each write (including the job
/// cascade) is atomic with respect to every other operation.
/// Ideal for testing or small datasets where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: User) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(LedgerError::Duplicate(format!(
                "User with email {} already exists",
                user.email
            )));
        }
        tables.users.insert(user.id, user);
        Ok(())
    }

    async fn user(&self, id: UserId) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl ConnectionStore for InMemoryStore {
    async fn insert_request(&self, request: ConnectionRequest) -> Result<()> {
        let mut tables = self.tables.write().await;
        let pair = (request.from_user_id, request.to_user_id);
        if !tables.request_pairs.insert(pair) {
            return Err(LedgerError::Duplicate(
                "A request to this user already exists".to_string(),
            ));
        }
        tables.requests.insert(request.id, request);
        Ok(())
    }

    async fn request(&self, id: RequestId) -> Result<Option<ConnectionRequest>> {
        let tables = self.tables.read().await;
        Ok(tables.requests.get(&id).cloned())
    }

    async fn update_request(
        &self,
        id: RequestId,
        mutation: Mutation<ConnectionRequest>,
    ) -> Result<ConnectionRequest> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .requests
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("connection request", id))?;
        let mut next = stored.clone();
        mutation(&mut next)?;
        *stored = next.clone();
        Ok(next)
    }

    async fn requests_for_user(&self, user: UserId) -> Result<Vec<ConnectionRequest>> {
        let tables = self.tables.read().await;
        Ok(tables
            .requests
            .values()
            .filter(|r| r.from_user_id == user || r.to_user_id == user)
            .cloned()
            .collect())
    }

    async fn requests_between(
        &self,
        a: UserId,
        b: UserId,
        status: RequestStatus,
    ) -> Result<Vec<ConnectionRequest>> {
        let tables = self.tables.read().await;
        Ok(tables
            .requests
            .values()
            .filter(|r| r.status == status)
            .filter(|r| {
                (r.from_user_id == a && r.to_user_id == b)
                    || (r.from_user_id == b && r.to_user_id == a)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn insert_job(&self, job: Job) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.jobs.insert(job.id, job);
        Ok(())
    }

    async fn job(&self, id: JobId) -> Result<Option<Job>> {
        let tables = self.tables.read().await;
        Ok(tables.jobs.get(&id).cloned())
    }

    async fn update_job(&self, id: JobId, mutation: Mutation<Job>) -> Result<Job> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .jobs
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("job", id))?;
        let mut next = stored.clone();
        mutation(&mut next)?;
        *stored = next.clone();
        Ok(next)
    }

    async fn delete_job_cascade(&self, id: JobId, guard: Guard<Job>) -> Result<(Job, Vec<Payment>)> {
        let mut tables = self.tables.write().await;
        let job = tables
            .jobs
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("job", id))?;
        guard(job)?;

        let mut removed = Vec::new();
        tables.payments.retain(|_, payment| {
            if payment.job_id == id {
                removed.push(payment.clone());
                false
            } else {
                true
            }
        });
        let job = tables
            .jobs
            .remove(&id)
            .ok_or_else(|| LedgerError::not_found("job", id))?;
        Ok((job, removed))
    }

    async fn jobs_for_user(&self, user: UserId) -> Result<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .values()
            .filter(|j| j.company_id == user || j.assigned_to_id == user)
            .cloned()
            .collect())
    }

    async fn jobs_between(&self, company: UserId, worker: UserId) -> Result<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .values()
            .filter(|j| j.company_id == company && j.assigned_to_id == worker)
            .cloned()
            .collect())
    }

    async fn all_jobs(&self) -> Result<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(tables.jobs.values().cloned().collect())
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn insert_payment(&self, payment: Payment, guard: Guard<Vec<Payment>>) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.jobs.contains_key(&payment.job_id) {
            return Err(LedgerError::not_found("job", payment.job_id));
        }
        let existing: Vec<Payment> = tables
            .payments
            .values()
            .filter(|p| p.job_id == payment.job_id)
            .cloned()
            .collect();
        guard(&existing)?;
        tables.payments.insert(payment.id, payment);
        Ok(())
    }

    async fn payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables.payments.get(&id).cloned())
    }

    async fn payments_for_job(&self, job: JobId) -> Result<Vec<Payment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .values()
            .filter(|p| p.job_id == job)
            .cloned()
            .collect())
    }

    async fn update_payment(&self, id: PaymentId, mutation: Mutation<Payment>) -> Result<Payment> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .payments
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("payment", id))?;
        let mut next = stored.clone();
        mutation(&mut next)?;
        *stored = next.clone();
        Ok(next)
    }

    async fn delete_payment(&self, id: PaymentId, guard: Guard<Payment>) -> Result<Payment> {
        let mut tables = self.tables.write().await;
        let payment = tables
            .payments
            .get(&id)
            .ok_or_else(|| LedgerError::not_found("payment", id))?;
        guard(payment)?;
        tables
            .payments
            .remove(&id)
            .ok_or_else(|| LedgerError::not_found("payment", id))
    }
}
