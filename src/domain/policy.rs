//! Authorization predicates shared by every ledger component.
//!
//! All of these are pure: they look only at the record and the caller id.
//! Components call them inside their atomic mutations so the check and the
//! write see the same state.

use super::connection::ConnectionRequest;
use super::ids::UserId;
use super::job::Job;
use super::payment::Payment;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Duration, Utc};

pub fn is_company(job: &Job, user: UserId) -> bool {
    job.company_id == user
}

pub fn is_worker(job: &Job, user: UserId) -> bool {
    job.assigned_to_id == user
}

pub fn is_participant(job: &Job, user: UserId) -> bool {
    is_company(job, user) || is_worker(job, user)
}

pub fn is_connection_recipient(request: &ConnectionRequest, user: UserId) -> bool {
    request.to_user_id == user
}

pub fn is_payer(payment: &Payment, user: UserId) -> bool {
    payment.payer_id == user
}

pub fn is_payee(payment: &Payment, user: UserId) -> bool {
    payment.payee_id == user
}

/// Whether a payment created at `created_at` may still be deleted at `now`.
/// The window is inclusive.
pub fn within_delete_window(created_at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now - created_at <= window
}

pub fn require_participant(job: &Job, user: UserId) -> Result<()> {
    if is_participant(job, user) {
        Ok(())
    } else {
        Err(LedgerError::Forbidden(format!(
            "User {user} is not part of job {}",
            job.id
        )))
    }
}

pub fn require_company(job: &Job, user: UserId) -> Result<()> {
    if is_company(job, user) {
        Ok(())
    } else {
        Err(LedgerError::Forbidden(format!(
            "Only the company can delete job {}",
            job.id
        )))
    }
}

pub fn require_recipient(request: &ConnectionRequest, user: UserId) -> Result<()> {
    if is_connection_recipient(request, user) {
        Ok(())
    } else {
        Err(LedgerError::Forbidden(format!(
            "Only the recipient can resolve request {}",
            request.id
        )))
    }
}

pub fn require_payee(payment: &Payment, user: UserId) -> Result<()> {
    if is_payee(payment, user) {
        Ok(())
    } else {
        Err(LedgerError::Forbidden(
            "Only the payee can confirm a payment".to_string(),
        ))
    }
}

pub fn require_payer(payment: &Payment, user: UserId) -> Result<()> {
    if is_payer(payment, user) {
        Ok(())
    } else {
        Err(LedgerError::Forbidden(
            "Only the payer can delete a payment".to_string(),
        ))
    }
}
