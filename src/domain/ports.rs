use super::connection::{ConnectionRequest, RequestStatus};
use super::ids::{JobId, PaymentId, RequestId, UserId};
use super::job::Job;
use super::payment::Payment;
use super::user::User;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A check-and-modify step run by a store while it holds the record
/// exclusively. Returning an error aborts the write.
pub type Mutation<T> = Box<dyn FnOnce(&mut T) -> Result<()> + Send>;

/// A check run against a record before it is removed, under the same
/// exclusive hold as the removal.
pub type Guard<T> = Box<dyn FnOnce(&T) -> Result<()> + Send>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Duplicate` if the email is already registered.
    async fn insert_user(&self, user: User) -> Result<()>;
    async fn user(&self, id: UserId) -> Result<Option<User>>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Fails with `Duplicate` if any request exists for the same ordered
    /// (from, to) pair, whatever its status.
    async fn insert_request(&self, request: ConnectionRequest) -> Result<()>;
    async fn request(&self, id: RequestId) -> Result<Option<ConnectionRequest>>;
    /// Fails with `NotFound` if the request does not exist.
    async fn update_request(
        &self,
        id: RequestId,
        mutation: Mutation<ConnectionRequest>,
    ) -> Result<ConnectionRequest>;
    /// Requests where `user` is either party.
    async fn requests_for_user(&self, user: UserId) -> Result<Vec<ConnectionRequest>>;
    /// Requests between `a` and `b` in either direction with the given status.
    async fn requests_between(
        &self,
        a: UserId,
        b: UserId,
        status: RequestStatus,
    ) -> Result<Vec<ConnectionRequest>>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: Job) -> Result<()>;
    async fn job(&self, id: JobId) -> Result<Option<Job>>;
    /// Fails with `NotFound` if the job does not exist.
    async fn update_job(&self, id: JobId, mutation: Mutation<Job>) -> Result<Job>;
    /// Removes the job and every payment attached to it as one unit.
    async fn delete_job_cascade(&self, id: JobId, guard: Guard<Job>) -> Result<(Job, Vec<Payment>)>;
    /// Jobs where `user` is the company or the assigned worker.
    async fn jobs_for_user(&self, user: UserId) -> Result<Vec<Job>>;
    async fn jobs_between(&self, company: UserId, worker: UserId) -> Result<Vec<Job>>;
    async fn all_jobs(&self) -> Result<Vec<Job>>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Fails with `NotFound` if the referenced job no longer exists. `guard`
    /// sees the job's current payments under the same exclusive hold as the
    /// insert and may veto it.
    async fn insert_payment(&self, payment: Payment, guard: Guard<Vec<Payment>>) -> Result<()>;
    async fn payment(&self, id: PaymentId) -> Result<Option<Payment>>;
    async fn payments_for_job(&self, job: JobId) -> Result<Vec<Payment>>;
    /// Fails with `NotFound` if the payment does not exist.
    async fn update_payment(&self, id: PaymentId, mutation: Mutation<Payment>) -> Result<Payment>;
    /// Fails with `NotFound` if the payment does not exist.
    async fn delete_payment(&self, id: PaymentId, guard: Guard<Payment>) -> Result<Payment>;
}

/// Everything the ledger persists. Implemented by every storage adapter.
pub trait Store: UserStore + ConnectionStore + JobStore + PaymentStore {}

impl<T> Store for T where T: UserStore + ConnectionStore + JobStore + PaymentStore {}

pub type StoreHandle = Arc<dyn Store>;

/// Source of wall-clock time for timestamps and time-window checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type ClockHandle = Arc<dyn Clock>;
