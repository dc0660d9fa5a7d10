use super::ids::{JobId, PaymentId, UserId};
use super::job::Job;
use super::money::{Amount, Balance};
use super::policy;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A ledger entry recording money that moved from `payer_id` to `payee_id`
/// for a job. Nothing is actually transferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub amount: Amount,
    pub description: Option<String>,
    pub job_id: JobId,
    pub payer_id: UserId,
    pub payee_id: UserId,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Records a payment on `job` made by one of its parties.
    ///
    /// The company always pays and the worker always receives. A payment the
    /// worker records is a receipt and starts confirmed; one the company
    /// records waits for the worker's confirmation.
    pub fn record(
        job: &Job,
        recorded_by: UserId,
        amount: Amount,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let confirmed = if policy::is_company(job, recorded_by) {
            false
        } else if policy::is_worker(job, recorded_by) {
            true
        } else {
            return Err(LedgerError::Forbidden(
                "You are not part of this job".to_string(),
            ));
        };

        Ok(Self {
            id: PaymentId::new(),
            amount,
            description,
            job_id: job.id,
            payer_id: job.company_id,
            payee_id: job.assigned_to_id,
            confirmed,
            created_at: now,
        })
    }

    pub fn confirm(&mut self) -> Result<()> {
        if self.confirmed {
            return Err(LedgerError::InvalidTransition(format!(
                "Payment {} is already confirmed",
                self.id
            )));
        }
        self.confirmed = true;
        Ok(())
    }
}

/// Totals derived from a job's payments. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    pub agreed_price: Balance,
    pub total_confirmed: Balance,
    pub total_unconfirmed: Balance,
    pub total_recorded: Balance,
    /// `agreed_price - total_confirmed`; zero or negative once paid off.
    pub remaining: Balance,
    /// `total_confirmed - agreed_price`; only meaningful when positive.
    pub advance: Balance,
    pub fully_paid: bool,
}

impl PaymentSummary {
    /// Fails with `InvalidArgument` if a total leaves the decimal range.
    pub fn compute(agreed_price: Balance, payments: &[Payment]) -> Result<Self> {
        let total_confirmed = Balance::try_sum(
            payments
                .iter()
                .filter(|p| p.confirmed)
                .map(|p| Balance::from(p.amount)),
        )?;
        let total_unconfirmed = Balance::try_sum(
            payments
                .iter()
                .filter(|p| !p.confirmed)
                .map(|p| Balance::from(p.amount)),
        )?;
        let remaining = agreed_price.checked_sub(total_confirmed)?;

        Ok(Self {
            agreed_price,
            total_confirmed,
            total_unconfirmed,
            total_recorded: total_confirmed.checked_add(total_unconfirmed)?,
            remaining,
            advance: total_confirmed.checked_sub(agreed_price)?,
            fully_paid: !remaining.is_positive(),
        })
    }

    /// Checks that recording `next` on a job that already has `existing`
    /// keeps every total in range. Prices and amounts are never negative, so
    /// only the recorded total can overflow.
    pub fn admits(existing: &[Payment], next: &Payment) -> Result<()> {
        Balance::try_sum(
            existing
                .iter()
                .chain([next])
                .map(|p| Balance::from(p.amount)),
        )?;
        Ok(())
    }

    /// The overpayment, if the confirmed total exceeds the agreed price.
    pub fn advance_paid(&self) -> Option<Balance> {
        self.advance.is_positive().then_some(self.advance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::NewJob;
    use rust_decimal_macros::dec;

    fn job_with_price(price: rust_decimal::Decimal) -> Job {
        Job::create(
            UserId::new(),
            NewJob::new("Roof", UserId::new()).with_price(price),
            Utc::now(),
        )
        .unwrap()
    }

    fn amount(value: rust_decimal::Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    #[test]
    fn test_company_recorded_payment_awaits_confirmation() {
        let job = job_with_price(dec!(100));
        let payment = Payment::record(&job, job.company_id, amount(dec!(10)), None, Utc::now())
            .unwrap();
        assert_eq!(payment.payer_id, job.company_id);
        assert_eq!(payment.payee_id, job.assigned_to_id);
        assert!(!payment.confirmed);
    }

    #[test]
    fn test_worker_recorded_payment_is_confirmed() {
        let job = job_with_price(dec!(100));
        let payment =
            Payment::record(&job, job.assigned_to_id, amount(dec!(10)), None, Utc::now())
                .unwrap();
        assert_eq!(payment.payer_id, job.company_id);
        assert_eq!(payment.payee_id, job.assigned_to_id);
        assert!(payment.confirmed);
    }

    #[test]
    fn test_outsider_cannot_record() {
        let job = job_with_price(dec!(100));
        let result = Payment::record(&job, UserId::new(), amount(dec!(10)), None, Utc::now());
        assert!(matches!(result, Err(LedgerError::Forbidden(_))));
    }

    #[test]
    fn test_confirm_once() {
        let job = job_with_price(dec!(100));
        let mut payment =
            Payment::record(&job, job.company_id, amount(dec!(10)), None, Utc::now()).unwrap();
        payment.confirm().unwrap();
        assert!(payment.confirmed);
        assert!(matches!(
            payment.confirm(),
            Err(LedgerError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_summary_partial_payment() {
        let job = job_with_price(dec!(1000));
        let mut confirmed =
            Payment::record(&job, job.company_id, amount(dec!(400)), None, Utc::now()).unwrap();
        confirmed.confirm().unwrap();
        let pending =
            Payment::record(&job, job.company_id, amount(dec!(200)), None, Utc::now()).unwrap();

        let summary = PaymentSummary::compute(job.agreed_price, &[confirmed, pending]).unwrap();
        assert_eq!(summary.total_confirmed, Balance::new(dec!(400)));
        assert_eq!(summary.total_unconfirmed, Balance::new(dec!(200)));
        assert_eq!(summary.total_recorded, Balance::new(dec!(600)));
        assert_eq!(summary.remaining, Balance::new(dec!(600)));
        assert!(summary.advance < Balance::ZERO);
        assert_eq!(summary.advance_paid(), None);
        assert!(!summary.fully_paid);
    }

    #[test]
    fn test_summary_overpayment() {
        let job = job_with_price(dec!(100));
        let receipt =
            Payment::record(&job, job.assigned_to_id, amount(dec!(150)), None, Utc::now())
                .unwrap();

        let summary = PaymentSummary::compute(job.agreed_price, &[receipt]).unwrap();
        assert!(summary.fully_paid);
        assert_eq!(summary.remaining, Balance::new(dec!(-50)));
        assert_eq!(summary.advance_paid(), Some(Balance::new(dec!(50))));
    }

    #[test]
    fn test_summary_without_payments() {
        let summary = PaymentSummary::compute(Balance::ZERO, &[]).unwrap();
        assert_eq!(summary.total_recorded, Balance::ZERO);
        assert!(summary.fully_paid);
    }

    #[test]
    fn test_totals_out_of_range() {
        let job = job_with_price(dec!(0));
        let max = amount(rust_decimal::Decimal::MAX);
        let first = Payment::record(&job, job.assigned_to_id, max, None, Utc::now()).unwrap();
        let second = Payment::record(&job, job.assigned_to_id, max, None, Utc::now()).unwrap();

        assert!(PaymentSummary::admits(&[], &first).is_ok());
        assert!(matches!(
            PaymentSummary::admits(&[first.clone()], &second),
            Err(LedgerError::InvalidArgument(_))
        ));
        assert!(matches!(
            PaymentSummary::compute(job.agreed_price, &[first, second]),
            Err(LedgerError::InvalidArgument(_))
        ));
    }
}
