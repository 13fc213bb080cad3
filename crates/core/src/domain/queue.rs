// Queue Aggregate - the consistency boundary for one queue
//
// All customer ordering and status transitions go through the methods on
// this type; no caller splices the customer list directly. Every mutation
// validates first, then mutates, then reprojects positions and buffers the
// notification events for the application layer to dispatch after commit.

use crate::domain::customer::{validate_name, CustomerStatus, QueueCustomer, Token};
use crate::domain::error::{DomainError, Result};
use crate::domain::event::QueueEvent;
use crate::domain::projection;
use crate::domain::settings::{QueueSettings, SettingsPatch};

/// Queue ID (UUID v4)
pub type QueueId = String;

/// Maximum slug length
pub const MAX_SLUG_LEN: usize = 64;

/// Validate a URL-safe slug: lowercase alphanumeric plus hyphen
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() {
        return Err(DomainError::InvalidSlug {
            reason: "slug must not be empty".to_string(),
        });
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(DomainError::InvalidSlug {
            reason: format!("slug exceeds {} characters", MAX_SLUG_LEN),
        });
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(DomainError::InvalidSlug {
            reason: "slug must be lowercase alphanumeric or hyphen".to_string(),
        });
    }
    Ok(())
}

/// Queue Aggregate
#[derive(Debug, Clone)]
pub struct Queue {
    pub id: QueueId,
    pub business_id: String,
    /// Denormalized tenant display name, supplied at creation
    pub business_name: String,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub is_paused: bool,
    pub settings: QueueSettings,
    /// Optimistic concurrency token, bumped by the repository on commit
    pub version: i64,

    customers: Vec<QueueCustomer>,
    pending_events: Vec<QueueEvent>,
}

impl Queue {
    /// Create a new empty queue owned by a business
    pub fn new(
        id: impl Into<String>,
        business_id: impl Into<String>,
        business_name: impl Into<String>,
        name: &str,
        slug: impl Into<String>,
    ) -> Result<Self> {
        let name = validate_name(name)?;
        let slug = slug.into();
        validate_slug(&slug)?;
        Ok(Self {
            id: id.into(),
            business_id: business_id.into(),
            business_name: business_name.into(),
            name,
            slug,
            is_active: true,
            is_paused: false,
            settings: QueueSettings::default(),
            version: 0,
            customers: Vec::new(),
            pending_events: Vec::new(),
        })
    }

    /// Rehydrate an aggregate from storage. Customers must be in insertion
    /// order (the repository loads them ordered by joined_at, rowid).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: QueueId,
        business_id: String,
        business_name: String,
        name: String,
        slug: String,
        is_active: bool,
        is_paused: bool,
        settings: QueueSettings,
        version: i64,
        customers: Vec<QueueCustomer>,
    ) -> Self {
        Self {
            id,
            business_id,
            business_name,
            name,
            slug,
            is_active,
            is_paused,
            settings,
            version,
            customers,
            pending_events: Vec::new(),
        }
    }

    pub fn customers(&self) -> &[QueueCustomer] {
        &self.customers
    }

    pub fn find_customer(&self, token: &str) -> Option<&QueueCustomer> {
        self.customers.iter().find(|c| c.token == token)
    }

    fn customer_mut(&mut self, token: &str) -> Result<&mut QueueCustomer> {
        self.customers
            .iter_mut()
            .find(|c| c.token == token)
            .ok_or_else(|| DomainError::CustomerNotFound {
                token: token.to_string(),
            })
    }

    /// Events buffered by mutations since the last drain. The application
    /// layer drains them after a successful commit.
    pub fn take_events(&mut self) -> Vec<QueueEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn emit(&mut self, event: QueueEvent) {
        self.pending_events.push(event);
    }

    fn emit_snapshot(&mut self) {
        let snap = projection::snapshot(&self.customers);
        let queue_id = self.id.clone();
        self.emit(QueueEvent::QueueSnapshotChanged {
            queue_id,
            waiting_count: snap.waiting_count,
            called_count: snap.called_count,
        });
    }

    /// One-shot near-front alerts for waiting customers whose rank is at or
    /// under the threshold and who have not been notified for this join.
    fn scan_near_front(&mut self, now_millis: i64) {
        let Some(threshold) = self.settings.near_front_threshold else {
            return;
        };
        let order = projection::waiting_order(&self.customers);
        let mut events = Vec::new();
        for (pos, idx) in order.into_iter().enumerate() {
            let rank = pos as u32 + 1;
            if rank > threshold {
                break;
            }
            let customer = &mut self.customers[idx];
            if customer.near_front_notified_at.is_none() {
                customer.near_front_notified_at = Some(now_millis);
                events.push(QueueEvent::CustomerNearFront {
                    token: customer.token.clone(),
                    position: rank,
                });
            }
        }
        self.pending_events.extend(events);
    }

    /// Join: create a new Waiting customer at the back of the line
    pub fn add_customer(
        &mut self,
        id: impl Into<String>,
        token: impl Into<String>,
        name: &str,
        now_millis: i64,
    ) -> Result<QueueCustomer> {
        if !self.is_active {
            return Err(DomainError::QueueInactive);
        }
        if self.is_paused && !self.settings.allow_join_when_paused {
            return Err(DomainError::QueuePaused);
        }
        let name = validate_name(name)?;
        if let Some(max) = self.settings.max_queue_size {
            let waiting = projection::snapshot(&self.customers).waiting_count;
            if waiting >= max {
                return Err(DomainError::QueueFull { max });
            }
        }

        let customer = QueueCustomer::new(id, self.id.clone(), token, name, now_millis);
        self.customers.push(customer.clone());
        self.emit(QueueEvent::CustomerJoined {
            queue_id: self.id.clone(),
        });
        self.emit_snapshot();
        Ok(customer)
    }

    /// Call the oldest Waiting customer (strict FIFO, never skips)
    pub fn call_next(&mut self, now_millis: i64) -> Result<QueueCustomer> {
        let snap = projection::snapshot(&self.customers);
        if snap.called_count >= self.settings.max_called_at_once {
            return Err(DomainError::NoWaitingCustomers);
        }
        let order = projection::waiting_order(&self.customers);
        let idx = *order.first().ok_or(DomainError::NoWaitingCustomers)?;

        let grace_deadline = now_millis + self.settings.grace_period_millis();
        self.customers[idx].call(now_millis, grace_deadline)?;
        let called = self.customers[idx].clone();

        self.emit(QueueEvent::CustomerCalled {
            token: called.token.clone(),
            grace_deadline,
            queue_name: self.name.clone(),
            called_message: self.settings.called_message.clone(),
        });
        self.emit_snapshot();
        self.scan_near_front(now_millis);
        Ok(called)
    }

    /// Called -> Arrived
    pub fn mark_arrived(&mut self, token: &str, now_millis: i64) -> Result<()> {
        self.customer_mut(token)?.arrive(now_millis)?;
        self.emit(QueueEvent::CustomerStatusChanged {
            token: token.to_string(),
            status: CustomerStatus::Arrived,
            message: None,
        });
        self.emit_snapshot();
        Ok(())
    }

    /// Arrived or Called -> Served (terminal)
    pub fn mark_served(&mut self, token: &str, now_millis: i64) -> Result<()> {
        self.customer_mut(token)?.serve(now_millis)?;
        self.emit(QueueEvent::CustomerStatusChanged {
            token: token.to_string(),
            status: CustomerStatus::Served,
            message: None,
        });
        self.emit_snapshot();
        self.scan_near_front(now_millis);
        Ok(())
    }

    /// Called -> NoShow, or back to Waiting at the end of the line when
    /// rejoin is allowed
    pub fn mark_no_show(&mut self, token: &str, now_millis: i64) -> Result<()> {
        let allow_rejoin = self.settings.allow_rejoin;
        let customer = self.customer_mut(token)?;
        customer.no_show(now_millis)?;
        let status = if allow_rejoin {
            customer.rejoin(now_millis)?;
            CustomerStatus::Waiting
        } else {
            CustomerStatus::NoShow
        };
        self.emit(QueueEvent::CustomerStatusChanged {
            token: token.to_string(),
            status,
            message: None,
        });
        self.emit_snapshot();
        self.scan_near_front(now_millis);
        Ok(())
    }

    /// Any non-terminal state -> Left. Removing an already-terminal customer
    /// is a no-op success (deliberate leniency for staff UX).
    pub fn remove_customer(&mut self, token: &str, now_millis: i64) -> Result<()> {
        let customer = self.customer_mut(token)?;
        if customer.status.is_terminal() {
            return Ok(());
        }
        customer.leave(now_millis)?;
        self.emit(QueueEvent::CustomerStatusChanged {
            token: token.to_string(),
            status: CustomerStatus::Left,
            message: None,
        });
        self.emit_snapshot();
        self.scan_near_front(now_millis);
        Ok(())
    }

    /// Partial settings update; a rejected patch changes nothing
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<()> {
        self.settings.apply(patch)
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.is_paused = paused;
    }

    /// Attach an opaque push subscription to a customer
    pub fn register_push_subscription(&mut self, token: &str, subscription: String) -> Result<()> {
        self.customer_mut(token)?.push_subscription = Some(subscription);
        Ok(())
    }

    /// Tokens of Called customers whose grace deadline has passed.
    /// Used by the reconciliation sweeper's scan phase; the state-machine
    /// guard on the subsequent mutation remains the source of truth.
    pub fn expired_called(&self, now_millis: i64) -> Vec<Token> {
        self.customers
            .iter()
            .filter(|c| {
                c.status == CustomerStatus::Called
                    && c.grace_deadline.is_some_and(|d| d <= now_millis)
            })
            .map(|c| c.token.clone())
            .collect()
    }
}
