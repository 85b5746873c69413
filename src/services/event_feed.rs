use chrono::Utc;
use std::sync::Arc;

use crate::{
    db::{EventStore, UserStore},
    error::{AppError, AppResult},
    models::{Event, EventType, Operation, UserId},
};

/// Append-only activity log, one feed per user
#[derive(Clone)]
pub struct EventFeed {
    events: Arc<dyn EventStore>,
    users: Arc<dyn UserStore>,
}

impl EventFeed {
    pub fn new(events: Arc<dyn EventStore>, users: Arc<dyn UserStore>) -> Self {
        Self { events, users }
    }

    /// Stamps the current time and appends an entry to `user_id`'s feed
    pub async fn record_event(
        &self,
        user_id: UserId,
        event_type: EventType,
        operation: Operation,
        entity_id: i64,
    ) -> AppResult<Event> {
        let event = Event {
            event_id: 0,
            user_id,
            timestamp: Utc::now(),
            event_type,
            operation,
            entity_id,
        };

        let stored = self.events.append_event(event).await?;
        tracing::debug!(
            user_id,
            event_id = stored.event_id,
            event_type = %event_type,
            operation = %operation,
            entity_id,
            "Recorded feed event"
        );
        Ok(stored)
    }

    /// Every entry of the user's feed, in insertion order
    pub async fn view_recent_events(&self, user_id: UserId) -> AppResult<Vec<Event>> {
        if !self.users.user_exists(user_id).await? {
            return Err(AppError::not_found("User", user_id));
        }
        self.events.events_for_user(user_id).await
    }
}
