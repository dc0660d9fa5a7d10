use crate::domain::ids::UserId;
use crate::domain::job::Job;
use crate::domain::payment::{Payment, PaymentSummary};
use crate::domain::ports::{ClockHandle, StoreHandle};
use crate::domain::user::{Actor, User};
use crate::error::{LedgerError, Result};
use crate::infrastructure::clock::SystemClock;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Tunables for ledger policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// How long after creation the payer may still delete a payment.
    pub payment_delete_window: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            payment_delete_window: Duration::hours(2),
        }
    }
}

/// One line of the operator report: a job, its parties and its totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobReport {
    pub job: Job,
    pub company_email: String,
    pub worker_email: String,
    pub summary: PaymentSummary,
}

/// The entry point for every ledger operation.
///
/// `WorkLedger` owns the storage backend and the clock. Every operation takes
/// the calling [`Actor`] explicitly and is a single request/response
/// transaction; state changes are delegated to the store's atomic
/// read-modify-write methods, with the authorization check running inside
/// them. Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct WorkLedger {
    pub(crate) store: StoreHandle,
    pub(crate) clock: ClockHandle,
    pub(crate) config: LedgerConfig,
}

impl WorkLedger {
    /// Creates a ledger over `store` using the system clock and default policy.
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config: LedgerConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: ClockHandle) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Turns an identity resolved by the external authenticator into an
    /// [`Actor`]. Fails with `Unauthenticated` when there is none, or when it
    /// names a user this ledger does not know.
    pub async fn authenticate(&self, caller: Option<UserId>) -> Result<Actor> {
        let Some(id) = caller else {
            return Err(LedgerError::Unauthenticated);
        };
        match self.store.user(id).await? {
            Some(user) => Ok(Actor::resolved(user.id)),
            None => {
                debug!(user_id = %id, "caller does not resolve to a user");
                Err(LedgerError::Unauthenticated)
            }
        }
    }

    /// Like [`Self::authenticate`], for authenticators that identify callers
    /// by email.
    pub async fn authenticate_email(&self, email: Option<&str>) -> Result<Actor> {
        let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
            return Err(LedgerError::Unauthenticated);
        };
        match self.store.user_by_email(email).await? {
            Some(user) => Ok(Actor::resolved(user.id)),
            None => Err(LedgerError::Unauthenticated),
        }
    }

    pub async fn register_user(
        &self,
        name: &str,
        email: &str,
        image: Option<String>,
    ) -> Result<User> {
        let user = User::new(name, email, image)?;
        self.store.insert_user(user.clone()).await?;
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Looks up another user's public profile, e.g. before inviting them.
    pub async fn find_user_by_email(&self, _actor: &Actor, email: &str) -> Result<User> {
        let email = email.trim();
        if email.is_empty() {
            return Err(LedgerError::InvalidArgument("Email is required".to_string()));
        }
        self.store
            .user_by_email(email)
            .await?
            .ok_or_else(|| LedgerError::not_found("user", email))
    }

    /// Loads a profile referenced by a stored record. A dangling reference is
    /// a storage fault, not a caller error.
    pub(crate) async fn profile(&self, id: UserId) -> Result<User> {
        self.store
            .user(id)
            .await?
            .ok_or_else(|| LedgerError::Internal(format!("dangling reference to user {id}")))
    }

    pub(crate) async fn payments_newest_first(&self, job: &Job) -> Result<Vec<Payment>> {
        let mut payments = self.store.payments_for_job(job.id).await?;
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }

    /// Every job with its parties' emails and payment totals, ordered by title.
    /// For operators only; it bypasses caller authorization.
    pub async fn ledger_report(&self) -> Result<Vec<JobReport>> {
        let mut jobs = self.store.all_jobs().await?;
        jobs.sort_by(|a, b| a.title.cmp(&b.title).then(a.created_at.cmp(&b.created_at)));

        let mut report = Vec::with_capacity(jobs.len());
        for job in jobs {
            let payments = self.store.payments_for_job(job.id).await?;
            let company = self.profile(job.company_id).await?;
            let worker = self.profile(job.assigned_to_id).await?;
            report.push(JobReport {
                summary: PaymentSummary::compute(job.agreed_price, &payments)?,
                company_email: company.email,
                worker_email: worker.email,
                job,
            });
        }
        Ok(report)
    }
}
