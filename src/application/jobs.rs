use super::engine::WorkLedger;
use crate::domain::ids::{JobId, UserId};
use crate::domain::job::{Job, JobDetail, JobListing, JobStatus, JobView, NewJob};
use crate::domain::payment::PaymentSummary;
use crate::domain::policy;
use crate::domain::user::Actor;
use crate::error::{LedgerError, Result};
use tracing::{info, instrument};

impl WorkLedger {
    /// Creates a job for the caller, as company, assigned to a worker the
    /// caller has an active connection with.
    ///
    /// The connection is checked only here; later changes to it do not
    /// affect existing jobs.
    #[instrument(level = "debug", skip_all, fields(actor = %actor.id()))]
    pub async fn create_job(&self, actor: &Actor, input: NewJob) -> Result<Job> {
        let job = Job::create(actor.id(), input, self.now())?;

        if !self
            .is_active_connection(job.company_id, job.assigned_to_id)
            .await?
        {
            return Err(LedgerError::Forbidden(
                "The assigned user is not an approved worker for you".to_string(),
            ));
        }

        self.store.insert_job(job.clone()).await?;
        info!(job_id = %job.id, company = %job.company_id, worker = %job.assigned_to_id, "job created");
        Ok(job)
    }

    pub async fn get_job(&self, actor: &Actor, job_id: JobId) -> Result<JobDetail> {
        let job = self
            .store
            .job(job_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("job", job_id))?;
        policy::require_participant(&job, actor.id())?;

        let payments = self.payments_newest_first(&job).await?;
        Ok(JobDetail {
            company: self.profile(job.company_id).await?,
            assigned_to: self.profile(job.assigned_to_id).await?,
            summary: PaymentSummary::compute(job.agreed_price, &payments)?,
            payments,
            job,
        })
    }

    /// Sets any status. Either party may do so at any time; no ordering of
    /// statuses is enforced.
    #[instrument(level = "debug", skip_all, fields(actor = %actor.id(), job_id = %job_id))]
    pub async fn update_job_status(&self, actor: &Actor, job_id: JobId, status: JobStatus) -> Result<Job> {
        let actor_id = actor.id();
        let now = self.now();
        let job = self
            .store
            .update_job(
                job_id,
                Box::new(move |job: &mut Job| {
                    policy::require_participant(job, actor_id)?;
                    job.set_status(status, now);
                    Ok(())
                }),
            )
            .await?;
        info!(job_id = %job.id, status = %job.status, "job status updated");
        Ok(job)
    }

    /// Deletes a job and its payments. Only the company may do this.
    #[instrument(level = "debug", skip_all, fields(actor = %actor.id(), job_id = %job_id))]
    pub async fn delete_job(&self, actor: &Actor, job_id: JobId) -> Result<()> {
        let actor_id = actor.id();
        let (job, payments) = self
            .store
            .delete_job_cascade(
                job_id,
                Box::new(move |job: &Job| policy::require_company(job, actor_id)),
            )
            .await?;
        info!(job_id = %job.id, payments_removed = payments.len(), "job deleted");
        Ok(())
    }

    /// The caller's jobs, newest first, split by the caller's role.
    pub async fn list_jobs(&self, actor: &Actor) -> Result<JobListing> {
        let me = actor.id();
        let mut jobs = self.store.jobs_for_user(me).await?;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut listing = JobListing::default();
        for job in jobs {
            let as_company = policy::is_company(&job, me);
            let view = self.job_view(job, me).await?;
            if as_company {
                listing.as_company.push(view);
            } else {
                listing.as_worker.push(view);
            }
        }
        Ok(listing)
    }

    /// Pending and in-progress jobs between a company and a worker. The
    /// caller must be one of the two.
    pub async fn active_jobs_between(
        &self,
        actor: &Actor,
        company: UserId,
        worker: UserId,
    ) -> Result<Vec<Job>> {
        if actor.id() != company && actor.id() != worker {
            return Err(LedgerError::Forbidden(
                "You are not part of this connection".to_string(),
            ));
        }
        self.active_jobs_for_pair(company, worker).await
    }

    pub(crate) async fn active_jobs_for_pair(&self, company: UserId, worker: UserId) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .store
            .jobs_between(company, worker)
            .await?
            .into_iter()
            .filter(|j| j.status.is_active())
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn job_view(&self, job: Job, viewer: UserId) -> Result<JobView> {
        let payments = self.payments_newest_first(&job).await?;
        Ok(JobView {
            counterparty: self.profile(job.counterparty_of(viewer)).await?,
            summary: PaymentSummary::compute(job.agreed_price, &payments)?,
            payments,
            job,
        })
    }
}
