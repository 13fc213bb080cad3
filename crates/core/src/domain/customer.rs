// Queue Customer - state machine for one join event

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// Customer ID (UUID v4)
pub type CustomerId = String;

/// Join token - the customer's only credential (6-8 chars, URL-safe)
pub type Token = String;

/// Maximum customer name length after trimming
pub const MAX_NAME_LEN: usize = 100;

/// Customer status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    Waiting,
    Called,
    Arrived,
    Served,
    NoShow,
    Left,
}

impl CustomerStatus {
    /// Terminal states never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CustomerStatus::Served | CustomerStatus::NoShow | CustomerStatus::Left
        )
    }
}

impl std::fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CustomerStatus::Waiting => write!(f, "WAITING"),
            CustomerStatus::Called => write!(f, "CALLED"),
            CustomerStatus::Arrived => write!(f, "ARRIVED"),
            CustomerStatus::Served => write!(f, "SERVED"),
            CustomerStatus::NoShow => write!(f, "NO_SHOW"),
            CustomerStatus::Left => write!(f, "LEFT"),
        }
    }
}

/// Validate and normalize a customer name (trimmed, 1-100 chars)
pub fn validate_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::InvalidName {
            reason: "name must not be empty".to_string(),
        });
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::InvalidName {
            reason: format!("name exceeds {} characters", MAX_NAME_LEN),
        });
    }
    Ok(name.to_string())
}

/// Queue Customer Entity
///
/// Position is NOT stored here - it is derived at read/notify time by the
/// position projector (see `domain::projection`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueCustomer {
    pub id: CustomerId,
    pub queue_id: String,
    pub token: Token,
    pub name: String,

    pub joined_at: i64, // epoch ms
    pub status: CustomerStatus,
    pub called_at: Option<i64>,
    pub grace_deadline: Option<i64>,
    pub left_at: Option<i64>,

    pub no_show_count: i32,
    pub near_front_notified_at: Option<i64>,

    /// Opaque push subscription blob, forwarded verbatim to the push sender
    pub push_subscription: Option<String>,
}

impl QueueCustomer {
    /// Create a new waiting customer with injected id, token and timestamp
    pub fn new(
        id: impl Into<String>,
        queue_id: impl Into<String>,
        token: impl Into<String>,
        name: impl Into<String>,
        joined_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            queue_id: queue_id.into(),
            token: token.into(),
            name: name.into(),
            joined_at,
            status: CustomerStatus::Waiting,
            called_at: None,
            grace_deadline: None,
            left_at: None,
            no_show_count: 0,
            near_front_notified_at: None,
            push_subscription: None,
        }
    }

    fn invalid_transition(&self, to: CustomerStatus) -> DomainError {
        DomainError::InvalidTransition {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }

    /// Waiting -> Called. Sets the grace deadline.
    pub fn call(&mut self, now_millis: i64, grace_deadline: i64) -> Result<()> {
        if self.status != CustomerStatus::Waiting {
            return Err(self.invalid_transition(CustomerStatus::Called));
        }
        self.status = CustomerStatus::Called;
        self.called_at = Some(now_millis);
        self.grace_deadline = Some(grace_deadline);
        Ok(())
    }

    /// Called -> Arrived
    pub fn arrive(&mut self, _now_millis: i64) -> Result<()> {
        if self.status != CustomerStatus::Called {
            return Err(self.invalid_transition(CustomerStatus::Arrived));
        }
        self.status = CustomerStatus::Arrived;
        self.grace_deadline = None;
        Ok(())
    }

    /// Arrived or Called -> Served (terminal)
    pub fn serve(&mut self, now_millis: i64) -> Result<()> {
        if self.status != CustomerStatus::Arrived && self.status != CustomerStatus::Called {
            return Err(self.invalid_transition(CustomerStatus::Served));
        }
        self.status = CustomerStatus::Served;
        self.grace_deadline = None;
        self.left_at = Some(now_millis);
        Ok(())
    }

    /// Called -> NoShow (terminal unless the caller rejoins immediately)
    pub fn no_show(&mut self, now_millis: i64) -> Result<()> {
        if self.status != CustomerStatus::Called {
            return Err(self.invalid_transition(CustomerStatus::NoShow));
        }
        self.status = CustomerStatus::NoShow;
        self.no_show_count += 1;
        self.grace_deadline = None;
        self.left_at = Some(now_millis);
        Ok(())
    }

    /// NoShow -> Waiting at the back of the line (fresh joined_at).
    /// Clears the near-front guard so the one-shot alert can fire again.
    pub fn rejoin(&mut self, now_millis: i64) -> Result<()> {
        if self.status != CustomerStatus::NoShow {
            return Err(self.invalid_transition(CustomerStatus::Waiting));
        }
        self.status = CustomerStatus::Waiting;
        self.joined_at = now_millis;
        self.called_at = None;
        self.left_at = None;
        self.near_front_notified_at = None;
        Ok(())
    }

    /// Any non-terminal state -> Left (staff- or self-initiated removal)
    pub fn leave(&mut self, now_millis: i64) -> Result<()> {
        if self.status.is_terminal() {
            return Err(self.invalid_transition(CustomerStatus::Left));
        }
        self.status = CustomerStatus::Left;
        self.grace_deadline = None;
        self.left_at = Some(now_millis);
        Ok(())
    }
}
