use super::engine::WorkLedger;
use crate::domain::connection::{ConnectionRequest, RequestListing, RequestStatus, RequestView};
use crate::domain::ids::{RequestId, UserId};
use crate::domain::job::ConnectionSummary;
use crate::domain::policy;
use crate::domain::user::Actor;
use crate::error::{LedgerError, Result};
use tracing::{info, instrument};

impl WorkLedger {
    /// Invites `to_user_id` to work with the caller.
    ///
    /// Fails with `Duplicate` if the caller already sent a request to that
    /// user, whatever became of it. Self-requests are not rejected here.
    #[instrument(level = "debug", skip_all, fields(actor = %actor.id(), to = %to_user_id))]
    pub async fn create_request(&self, actor: &Actor, to_user_id: UserId) -> Result<ConnectionRequest> {
        if self.store.user(to_user_id).await?.is_none() {
            return Err(LedgerError::not_found("user", to_user_id));
        }

        let request = ConnectionRequest::new(actor.id(), to_user_id, self.now());
        self.store.insert_request(request.clone()).await?;
        info!(request_id = %request.id, from = %actor.id(), to = %to_user_id, "connection request created");
        Ok(request)
    }

    /// Approves or rejects a pending request addressed to the caller.
    #[instrument(level = "debug", skip_all, fields(actor = %actor.id(), request_id = %request_id))]
    pub async fn resolve_request(
        &self,
        actor: &Actor,
        request_id: RequestId,
        decision: RequestStatus,
    ) -> Result<ConnectionRequest> {
        if decision == RequestStatus::Pending {
            return Err(LedgerError::InvalidArgument(
                "Decision must be APPROVED or REJECTED".to_string(),
            ));
        }

        let actor_id = actor.id();
        let request = self
            .store
            .update_request(
                request_id,
                Box::new(move |request: &mut ConnectionRequest| {
                    policy::require_recipient(request, actor_id)?;
                    request.resolve(decision)
                }),
            )
            .await?;
        info!(request_id = %request.id, status = %request.status, "connection request resolved");
        Ok(request)
    }

    /// True iff an approved request links `a` and `b`, in either direction.
    pub async fn is_active_connection(&self, a: UserId, b: UserId) -> Result<bool> {
        let approved = self
            .store
            .requests_between(a, b, RequestStatus::Approved)
            .await?;
        Ok(!approved.is_empty())
    }

    /// The caller's requests, newest first, split into received and sent.
    pub async fn list_requests(&self, actor: &Actor) -> Result<RequestListing> {
        let me = actor.id();
        let mut requests = self.store.requests_for_user(me).await?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut listing = RequestListing::default();
        for request in requests {
            if request.to_user_id == me {
                listing.received.push(RequestView {
                    counterparty: self.profile(request.from_user_id).await?,
                    request: request.clone(),
                });
            }
            if request.from_user_id == me {
                listing.sent.push(RequestView {
                    counterparty: self.profile(request.to_user_id).await?,
                    request,
                });
            }
        }
        Ok(listing)
    }

    /// Workers who approved the caller's requests, each with the jobs the
    /// caller has open with them.
    pub async fn list_workers(&self, actor: &Actor) -> Result<Vec<ConnectionSummary>> {
        self.approved_counterparts(actor, Side::Sent).await
    }

    /// Companies whose requests the caller approved, each with the jobs they
    /// have open with the caller.
    pub async fn list_companies(&self, actor: &Actor) -> Result<Vec<ConnectionSummary>> {
        self.approved_counterparts(actor, Side::Received).await
    }

    async fn approved_counterparts(&self, actor: &Actor, side: Side) -> Result<Vec<ConnectionSummary>> {
        let me = actor.id();
        let mut requests: Vec<ConnectionRequest> = self
            .store
            .requests_for_user(me)
            .await?
            .into_iter()
            .filter(|r| r.status == RequestStatus::Approved)
            .filter(|r| match side {
                Side::Sent => r.from_user_id == me,
                Side::Received => r.to_user_id == me,
            })
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut summaries = Vec::with_capacity(requests.len());
        for request in requests {
            let (company, worker) = match side {
                Side::Sent => (me, request.to_user_id),
                Side::Received => (request.from_user_id, me),
            };
            let counterparty = match side {
                Side::Sent => worker,
                Side::Received => company,
            };
            summaries.push(ConnectionSummary {
                request_id: request.id,
                counterparty: self.profile(counterparty).await?,
                active_jobs: self.active_jobs_for_pair(company, worker).await?,
            });
        }
        Ok(summaries)
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Sent,
    Received,
}
