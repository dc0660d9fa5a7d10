use super::ids::UserId;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// A registered user and its public profile.
///
/// Users are referenced by connection requests, jobs and payments but never
/// owned by them. Credentials live with the external authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

impl User {
    pub fn new(name: &str, email: &str, image: Option<String>) -> Result<Self> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(LedgerError::InvalidArgument(
                "Missing name or email".to_string(),
            ));
        }
        Ok(Self {
            id: UserId::new(),
            name: name.to_string(),
            email: email.to_string(),
            image,
        })
    }
}

/// A caller whose identity has been resolved against the identity store.
///
/// Only [`crate::application::WorkLedger::authenticate`] hands these out, so
/// holding one proves the caller exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    id: UserId,
}

impl Actor {
    pub(crate) fn resolved(id: UserId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> UserId {
        self.id
    }
}
