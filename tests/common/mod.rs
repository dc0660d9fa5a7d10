use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::Error;
use std::path::Path;
use std::sync::Arc;
use workledger::application::WorkLedger;
use workledger::domain::connection::RequestStatus;
use workledger::domain::user::Actor;
use workledger::infrastructure::clock::ManualClock;
use workledger::infrastructure::in_memory::InMemoryStore;

pub const HEADER: [&str; 7] = ["op", "actor", "target", "value", "amount", "label", "at"];

pub fn company_email(i: usize) -> String {
    format!("company{i}@example.com")
}

pub fn worker_email(i: usize) -> String {
    format!("worker{i}@example.com")
}

/// Writes a script that onboards `parties` companies and workers, connects
/// each company to a random worker and opens one job per pair with a few
/// payments against it. The same seed always yields the same script.
pub fn generate_script(path: &Path, parties: usize, payments_per_job: usize, seed: u64) -> Result<(), Error> {
    let mut rng = StdRng::seed_from_u64(seed);
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    row(&mut wtr, HEADER)?;

    for i in 1..=parties {
        row(&mut wtr, ["register", &company_email(i), "", &format!("Company {i}"), "", "", ""])?;
        row(&mut wtr, ["register", &worker_email(i), "", &format!("Worker {i}"), "", "", ""])?;
    }

    for i in 1..=parties {
        let company = company_email(i);
        let worker = worker_email(rng.gen_range(1..=parties));
        let request = format!("r{i}");
        let job = format!("j{i}");
        let price = rng.gen_range(100..=5000).to_string();

        row(&mut wtr, ["request", &company, &worker, "", "", &request, ""])?;
        row(&mut wtr, ["approve", &worker, &request, "", "", "", ""])?;
        row(&mut wtr, ["create_job", &company, &worker, &format!("Job {i:05}"), &price, &job, ""])?;

        for p in 1..=payments_per_job {
            let payment = format!("p{i}_{p}");
            let amount = rng.gen_range(1..=100).to_string();
            row(&mut wtr, ["pay", &company, &job, "", &amount, &payment, ""])?;
            if rng.gen_bool(0.5) {
                row(&mut wtr, ["confirm", &worker, &payment, "", "", "", ""])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

fn row<W: std::io::Write>(wtr: &mut csv::Writer<W>, fields: [&str; 7]) -> Result<(), Error> {
    wtr.write_record(fields)?;
    Ok(())
}

pub fn ledger() -> (WorkLedger, ManualClock) {
    let clock = ManualClock::default();
    let ledger = WorkLedger::new(Arc::new(InMemoryStore::new())).with_clock(Arc::new(clock.clone()));
    (ledger, clock)
}

pub async fn register(ledger: &WorkLedger, name: &str) -> Actor {
    let email = format!("{}@example.com", name.to_lowercase());
    let user = ledger.register_user(name, &email, None).await.unwrap();
    ledger.authenticate(Some(user.id)).await.unwrap()
}

/// Registers a company and a worker and approves a request from one to the other.
pub async fn connected_pair(ledger: &WorkLedger) -> (Actor, Actor) {
    let company = register(ledger, "Acme").await;
    let worker = register(ledger, "Wes").await;
    let request = ledger.create_request(&company, worker.id()).await.unwrap();
    ledger
        .resolve_request(&worker, request.id, RequestStatus::Approved)
        .await
        .unwrap();
    (company, worker)
}
