use chrono::Duration;
use rust_decimal_macros::dec;
use workledger::domain::connection::RequestStatus;
use workledger::domain::ids::JobId;
use workledger::domain::job::{JobStatus, NewJob};
use workledger::error::LedgerError;

mod common;

#[tokio::test]
async fn test_job_requires_active_connection() {
    let (ledger, _) = common::ledger();
    let acme = common::register(&ledger, "Acme").await;
    let wes = common::register(&ledger, "Wes").await;

    assert!(matches!(
        ledger.create_job(&acme, NewJob::new("Fence", wes.id())).await,
        Err(LedgerError::Forbidden(_))
    ));

    let request = ledger.create_request(&acme, wes.id()).await.unwrap();
    ledger
        .resolve_request(&wes, request.id, RequestStatus::Rejected)
        .await
        .unwrap();
    assert!(matches!(
        ledger.create_job(&acme, NewJob::new("Fence", wes.id())).await,
        Err(LedgerError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_approval_in_either_direction_allows_jobs() {
    let (ledger, _) = common::ledger();
    let acme = common::register(&ledger, "Acme").await;
    let wes = common::register(&ledger, "Wes").await;

    // The worker asked, the company approved.
    let request = ledger.create_request(&wes, acme.id()).await.unwrap();
    ledger
        .resolve_request(&acme, request.id, RequestStatus::Approved)
        .await
        .unwrap();

    let job = ledger
        .create_job(&acme, NewJob::new("Fence", wes.id()).with_price(dec!(250)))
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Pending);
    assert_eq!(job.company_id, acme.id());
}

#[tokio::test]
async fn test_validation_comes_before_authorization() {
    let (ledger, _) = common::ledger();
    let acme = common::register(&ledger, "Acme").await;
    let stranger = common::register(&ledger, "Stranger").await;

    assert!(matches!(
        ledger.create_job(&acme, NewJob::new("  ", stranger.id())).await,
        Err(LedgerError::InvalidArgument(_))
    ));
    assert!(matches!(
        ledger
            .create_job(&acme, NewJob::new("Fence", stranger.id()).with_price(dec!(-1)))
            .await,
        Err(LedgerError::InvalidArgument(_))
    ));
    let unassigned = NewJob {
        title: "Fence".into(),
        ..Default::default()
    };
    assert!(matches!(
        ledger.create_job(&acme, unassigned).await,
        Err(LedgerError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_outsiders_cannot_touch_a_job() {
    let (ledger, _) = common::ledger();
    let (acme, wes) = common::connected_pair(&ledger).await;
    let eve = common::register(&ledger, "Eve").await;
    let job = ledger
        .create_job(&acme, NewJob::new("Fence", wes.id()))
        .await
        .unwrap();

    assert!(matches!(ledger.get_job(&eve, job.id).await, Err(LedgerError::Forbidden(_))));
    assert!(matches!(
        ledger.update_job_status(&eve, job.id, JobStatus::Paid).await,
        Err(LedgerError::Forbidden(_))
    ));
    assert!(matches!(ledger.delete_job(&eve, job.id).await, Err(LedgerError::Forbidden(_))));
    assert!(matches!(
        ledger.active_jobs_between(&eve, acme.id(), wes.id()).await,
        Err(LedgerError::Forbidden(_))
    ));

    // The worker may read and update, but not delete.
    assert!(ledger.get_job(&wes, job.id).await.is_ok());
    assert!(matches!(ledger.delete_job(&wes, job.id).await, Err(LedgerError::Forbidden(_))));
    assert_eq!(ledger.get_job(&acme, job.id).await.unwrap().job.status, JobStatus::Pending);
}

#[tokio::test]
async fn test_missing_job_is_not_found() {
    let (ledger, _) = common::ledger();
    let acme = common::register(&ledger, "Acme").await;
    let missing = JobId::new();

    assert!(matches!(ledger.get_job(&acme, missing).await, Err(LedgerError::NotFound { .. })));
    assert!(matches!(
        ledger.update_job_status(&acme, missing, JobStatus::Completed).await,
        Err(LedgerError::NotFound { .. })
    ));
    assert!(matches!(ledger.delete_job(&acme, missing).await, Err(LedgerError::NotFound { .. })));
}

#[tokio::test]
async fn test_status_moves_freely_and_filters_active_jobs() {
    let (ledger, clock) = common::ledger();
    let (acme, wes) = common::connected_pair(&ledger).await;
    let job = ledger
        .create_job(&acme, NewJob::new("Fence", wes.id()))
        .await
        .unwrap();

    clock.advance(Duration::minutes(5));
    let paid = ledger
        .update_job_status(&wes, job.id, JobStatus::Paid)
        .await
        .unwrap();
    assert_eq!(paid.status, JobStatus::Paid);
    assert!(paid.updated_at > job.updated_at);
    assert!(ledger.active_jobs_between(&acme, acme.id(), wes.id()).await.unwrap().is_empty());

    let reopened = ledger
        .update_job_status(&acme, job.id, JobStatus::Pending)
        .await
        .unwrap();
    assert_eq!(reopened.status, JobStatus::Pending);
    let active = ledger.active_jobs_between(&wes, acme.id(), wes.id()).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, job.id);
}

#[tokio::test]
async fn test_delete_job_cascades_payments() {
    let (ledger, _) = common::ledger();
    let (acme, wes) = common::connected_pair(&ledger).await;
    let job = ledger
        .create_job(&acme, NewJob::new("Fence", wes.id()).with_price(dec!(1000)))
        .await
        .unwrap();
    let payment = ledger
        .create_payment(&acme, job.id, Some(dec!(100)), None)
        .await
        .unwrap();

    ledger.delete_job(&acme, job.id).await.unwrap();

    assert!(matches!(ledger.get_job(&acme, job.id).await, Err(LedgerError::NotFound { .. })));
    assert!(matches!(
        ledger.confirm_payment(&wes, payment.id).await,
        Err(LedgerError::NotFound { .. })
    ));
    let listing = ledger.list_jobs(&acme).await.unwrap();
    assert!(listing.as_company.is_empty());
}

#[tokio::test]
async fn test_list_jobs_splits_by_role() {
    let (ledger, clock) = common::ledger();
    let (acme, wes) = common::connected_pair(&ledger).await;
    let first = ledger
        .create_job(&acme, NewJob::new("Fence", wes.id()))
        .await
        .unwrap();
    clock.advance(Duration::minutes(1));
    let second = ledger
        .create_job(&acme, NewJob::new("Roof", wes.id()))
        .await
        .unwrap();

    let company_view = ledger.list_jobs(&acme).await.unwrap();
    assert!(company_view.as_worker.is_empty());
    let ids: Vec<_> = company_view.as_company.iter().map(|v| v.job.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(company_view.as_company[0].counterparty.id, wes.id());

    let worker_view = ledger.list_jobs(&wes).await.unwrap();
    assert!(worker_view.as_company.is_empty());
    assert_eq!(worker_view.as_worker.len(), 2);
    assert_eq!(worker_view.as_worker[0].counterparty.id, acme.id());
}
