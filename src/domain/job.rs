use super::ids::{JobId, RequestId, UserId};
use super::money::Balance;
use super::payment::{Payment, PaymentSummary};
use super::user::User;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Paid,
}

impl JobStatus {
    /// Jobs still being worked on, as opposed to finished history.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Paid => "PAID",
        })
    }
}

impl FromStr for JobStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "PAID" => Ok(Self::Paid),
            other => Err(LedgerError::InvalidArgument(format!(
                "Invalid job status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: Option<String>,
    pub agreed_price: Balance,
    pub due_date: Option<NaiveDate>,
    pub status: JobStatus,
    pub company_id: UserId,
    pub assigned_to_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller input for creating a job. The company is always the caller.
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub title: String,
    pub assigned_to_id: Option<UserId>,
    pub description: Option<String>,
    pub agreed_price: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
}

impl NewJob {
    pub fn new(title: impl Into<String>, assigned_to_id: UserId) -> Self {
        Self {
            title: title.into(),
            assigned_to_id: Some(assigned_to_id),
            ..Default::default()
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.agreed_price = Some(price);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }
}

impl Job {
    /// Validates `input` and builds a PENDING job owned by `company_id`.
    pub fn create(company_id: UserId, input: NewJob, now: DateTime<Utc>) -> Result<Self> {
        let title = input.title.trim();
        let Some(assigned_to_id) = input.assigned_to_id.filter(|_| !title.is_empty()) else {
            return Err(LedgerError::InvalidArgument(
                "Missing title or assignedToId".to_string(),
            ));
        };
        let agreed_price = Balance::non_negative(input.agreed_price.unwrap_or_default())?;

        Ok(Self {
            id: JobId::new(),
            title: title.to_string(),
            description: input.description,
            agreed_price,
            due_date: input.due_date,
            status: JobStatus::Pending,
            company_id,
            assigned_to_id,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_status(&mut self, status: JobStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    /// The other party of the job, seen from `user`.
    pub fn counterparty_of(&self, user: UserId) -> UserId {
        if user == self.company_id {
            self.assigned_to_id
        } else {
            self.company_id
        }
    }
}

/// A job with both party profiles, its payments (newest first) and the
/// derived payment summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDetail {
    pub job: Job,
    pub company: User,
    pub assigned_to: User,
    pub payments: Vec<Payment>,
    pub summary: PaymentSummary,
}

/// A job as listed for one of its parties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub job: Job,
    pub counterparty: User,
    pub payments: Vec<Payment>,
    pub summary: PaymentSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobListing {
    pub as_company: Vec<JobView>,
    pub as_worker: Vec<JobView>,
}

/// An approved counterparty together with the active jobs between the pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionSummary {
    pub request_id: RequestId,
    pub counterparty: User,
    pub active_jobs: Vec<Job>,
}
