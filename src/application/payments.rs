use super::engine::WorkLedger;
use crate::domain::ids::{JobId, PaymentId};
use crate::domain::money::Amount;
use crate::domain::payment::{Payment, PaymentSummary};
use crate::domain::policy;
use crate::domain::user::Actor;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use tracing::{info, instrument};

impl WorkLedger {
    /// Records a payment on a job the caller is part of.
    ///
    /// The company is always the payer. When the worker records it, it counts
    /// as a receipt and is confirmed immediately.
    #[instrument(level = "debug", skip_all, fields(actor = %actor.id(), job_id = %job_id))]
    pub async fn create_payment(
        &self,
        actor: &Actor,
        job_id: JobId,
        amount: Option<Decimal>,
        description: Option<String>,
    ) -> Result<Payment> {
        let amount = amount
            .ok_or_else(|| LedgerError::InvalidArgument("Missing amount".to_string()))
            .and_then(Amount::new)?;
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let job = self
            .store
            .job(job_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("job", job_id))?;
        let payment = Payment::record(&job, actor.id(), amount, description, self.now())?;

        let next = payment.clone();
        self.store
            .insert_payment(
                payment.clone(),
                Box::new(move |existing: &Vec<Payment>| PaymentSummary::admits(existing, &next)),
            )
            .await?;
        info!(
            payment_id = %payment.id,
            job_id = %job.id,
            amount = %payment.amount.value(),
            confirmed = payment.confirmed,
            "payment recorded"
        );
        Ok(payment)
    }

    /// Marks a payment as received. Only the payee may confirm, and only once.
    #[instrument(level = "debug", skip_all, fields(actor = %actor.id(), payment_id = %payment_id))]
    pub async fn confirm_payment(&self, actor: &Actor, payment_id: PaymentId) -> Result<Payment> {
        let actor_id = actor.id();
        let payment = self
            .store
            .update_payment(
                payment_id,
                Box::new(move |payment: &mut Payment| {
                    policy::require_payee(payment, actor_id)?;
                    payment.confirm()
                }),
            )
            .await?;
        info!(payment_id = %payment.id, "payment confirmed");
        Ok(payment)
    }

    /// Removes a payment. Only the payer may, and only within the configured
    /// window after it was recorded.
    #[instrument(level = "debug", skip_all, fields(actor = %actor.id(), payment_id = %payment_id))]
    pub async fn delete_payment(&self, actor: &Actor, payment_id: PaymentId) -> Result<()> {
        let actor_id = actor.id();
        let now = self.now();
        let window = self.config.payment_delete_window;
        let payment = self
            .store
            .delete_payment(
                payment_id,
                Box::new(move |payment: &Payment| {
                    policy::require_payer(payment, actor_id)?;
                    if !policy::within_delete_window(payment.created_at, now, window) {
                        return Err(LedgerError::Expired(format!(
                            "Payment can only be deleted within {} minutes of creation",
                            window.num_minutes()
                        )));
                    }
                    Ok(())
                }),
            )
            .await?;
        info!(payment_id = %payment.id, job_id = %payment.job_id, "payment deleted");
        Ok(())
    }
}
