use crate::application::WorkLedger;
use crate::domain::connection::RequestStatus;
use crate::domain::ids::UserId;
use crate::domain::job::{JobStatus, NewJob};
use crate::domain::user::Actor;
use crate::error::{LedgerError, Result};
use crate::infrastructure::clock::ManualClock;
use crate::interfaces::csv::command_reader::{Command, Op};
use chrono::Utc;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Applies scripted commands to a ledger, acting as the external caller.
///
/// Callers are identified by email. Records created by a command can be
/// given a label and referenced by later commands. The ledger must run on
/// the same `ManualClock` passed here, so commands carrying an `at` timestamp
/// execute at that instant; the others run at the current wall-clock time.
pub struct CommandReplayer {
    ledger: WorkLedger,
    clock: ManualClock,
    labels: HashMap<String, Uuid>,
}

impl CommandReplayer {
    pub fn new(ledger: WorkLedger, clock: ManualClock) -> Self {
        Self {
            ledger,
            clock,
            labels: HashMap::new(),
        }
    }

    pub async fn apply(&mut self, command: Command) -> Result<()> {
        self.clock.set(command.at.unwrap_or_else(Utc::now));
        debug!(op = ?command.op, actor = ?command.actor, "applying command");

        match command.op {
            Op::Register => {
                let email = required(&command.actor, "actor")?;
                let name = command.value.as_deref().unwrap_or(email);
                let user = self.ledger.register_user(name, email, None).await?;
                self.remember(&command, user.id.0)
            }
            Op::Request => {
                let actor = self.caller(&command).await?;
                let to = self.user_target(&actor, &command).await?;
                let request = self.ledger.create_request(&actor, to).await?;
                self.remember(&command, request.id.0)
            }
            Op::Approve | Op::Reject => {
                let actor = self.caller(&command).await?;
                let decision = if command.op == Op::Approve {
                    RequestStatus::Approved
                } else {
                    RequestStatus::Rejected
                };
                let id = self.label_target(&command)?.into();
                self.ledger.resolve_request(&actor, id, decision).await?;
                Ok(())
            }
            Op::CreateJob => {
                let actor = self.caller(&command).await?;
                let worker = self.user_target(&actor, &command).await?;
                let input = NewJob {
                    title: command.value.clone().unwrap_or_default(),
                    assigned_to_id: Some(worker),
                    agreed_price: command.amount,
                    ..Default::default()
                };
                let job = self.ledger.create_job(&actor, input).await?;
                self.remember(&command, job.id.0)
            }
            Op::SetStatus => {
                let actor = self.caller(&command).await?;
                let status: JobStatus = required(&command.value, "value")?.parse()?;
                let id = self.label_target(&command)?.into();
                self.ledger.update_job_status(&actor, id, status).await?;
                Ok(())
            }
            Op::DeleteJob => {
                let actor = self.caller(&command).await?;
                let id = self.label_target(&command)?.into();
                self.ledger.delete_job(&actor, id).await
            }
            Op::Pay => {
                let actor = self.caller(&command).await?;
                let id = self.label_target(&command)?.into();
                let payment = self
                    .ledger
                    .create_payment(&actor, id, command.amount, command.value.clone())
                    .await?;
                self.remember(&command, payment.id.0)
            }
            Op::Confirm => {
                let actor = self.caller(&command).await?;
                let id = self.label_target(&command)?.into();
                self.ledger.confirm_payment(&actor, id).await?;
                Ok(())
            }
            Op::DeletePayment => {
                let actor = self.caller(&command).await?;
                let id = self.label_target(&command)?.into();
                self.ledger.delete_payment(&actor, id).await
            }
        }
    }

    /// Resolves the command's `actor` email to a registered caller.
    async fn caller(&self, command: &Command) -> Result<Actor> {
        self.ledger.authenticate_email(command.actor.as_deref()).await
    }

    async fn user_target(&self, actor: &Actor, command: &Command) -> Result<UserId> {
        let email = required(&command.target, "target")?;
        Ok(self.ledger.find_user_by_email(actor, email).await?.id)
    }

    fn label_target(&self, command: &Command) -> Result<Uuid> {
        let label = required(&command.target, "target")?;
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| LedgerError::InvalidArgument(format!("Unknown label '{label}'")))
    }

    fn remember(&mut self, command: &Command, id: Uuid) -> Result<()> {
        if let Some(label) = &command.label {
            self.labels.insert(label.clone(), id);
        }
        Ok(())
    }
}

fn required<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str> {
    field
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| LedgerError::InvalidArgument(format!("Missing {name}")))
}
