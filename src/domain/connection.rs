use super::ids::{RequestId, UserId};
use super::user::User;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        })
    }
}

impl FromStr for RequestStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(LedgerError::InvalidArgument(format!(
                "Unknown request status '{other}'"
            ))),
        }
    }
}

/// A request from a prospective company (`from_user_id`) to a prospective
/// worker (`to_user_id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub id: RequestId,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl ConnectionRequest {
    pub fn new(from_user_id: UserId, to_user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: RequestId::new(),
            from_user_id,
            to_user_id,
            status: RequestStatus::Pending,
            created_at: now,
        }
    }

    /// Applies the recipient's decision. A request transitions exactly once.
    pub fn resolve(&mut self, decision: RequestStatus) -> Result<()> {
        if decision == RequestStatus::Pending {
            return Err(LedgerError::InvalidArgument(
                "Decision must be APPROVED or REJECTED".to_string(),
            ));
        }
        if self.status != RequestStatus::Pending {
            return Err(LedgerError::InvalidTransition(format!(
                "Request {} is already {}",
                self.id, self.status
            )));
        }
        self.status = decision;
        Ok(())
    }

    /// True if this request approves a relationship between `a` and `b`,
    /// whichever of them initiated it.
    pub fn connects(&self, a: UserId, b: UserId) -> bool {
        self.status == RequestStatus::Approved
            && ((self.from_user_id == a && self.to_user_id == b)
                || (self.from_user_id == b && self.to_user_id == a))
    }
}

/// A request joined with the other party's public profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestView {
    pub request: ConnectionRequest,
    pub counterparty: User,
}

/// Requests touching one user, split by direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestListing {
    pub received: Vec<RequestView>,
    pub sent: Vec<RequestView>,
}
