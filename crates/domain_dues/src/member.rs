//! Member roster entry
//!
//! Members are created on registration by the surrounding application and
//! only referenced here; the ledger never deletes them.

use chrono::{DateTime, Utc};
use core_kernel::MemberId;
use serde::{Deserialize, Serialize};

/// A dues-paying member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Unique identifier
    pub id: MemberId,
    /// Display name, used in reminder and confirmation messages
    pub name: String,
    /// Contact address for the notification collaborator
    pub email: Option<String>,
    /// Inactive members are skipped by the batch generators
    pub active: bool,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Creates an active member
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: MemberId::new_v7(),
            name: name.into(),
            email: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Sets the contact email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Marks the member inactive
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }
}
