//! Process-wide notification feed. Lives in memory for the lifetime of the
//! server; nothing is persisted.

use std::{collections::VecDeque, sync::Arc};

use api_types::{
    ListNotificationsQuery, ListNotificationsResponse, Notification, NotificationCategory,
    NotificationType,
};
use chrono::Utc;
use tokio::sync::RwLock;

pub const DEFAULT_FEED_CAPACITY: usize = 200;

#[derive(Debug)]
struct FeedState {
    next_id: u64,
    // Newest first.
    items: VecDeque<Notification>,
}

#[derive(Debug, Clone)]
pub struct NotificationFeed {
    capacity: usize,
    state: Arc<RwLock<FeedState>>,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl NotificationFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Arc::new(RwLock::new(FeedState {
                next_id: 1,
                items: VecDeque::new(),
            })),
        }
    }

    /// Adds an unread notification, evicting the oldest once the feed is full.
    pub async fn push(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
        notification_type: NotificationType,
        category: NotificationCategory,
        project: Option<String>,
    ) -> Notification {
        let mut state = self.state.write().await;
        let notification = Notification {
            id: state.next_id,
            title: title.into(),
            message: message.into(),
            notification_type,
            category,
            project,
            unread: true,
            timestamp: Utc::now(),
        };
        state.next_id += 1;
        state.items.push_front(notification.clone());
        state.items.truncate(self.capacity);
        notification
    }

    pub async fn list(&self, query: &ListNotificationsQuery) -> ListNotificationsResponse {
        let state = self.state.read().await;
        let notifications = state
            .items
            .iter()
            .filter(|n| !query.unread_only || n.unread)
            .filter(|n| {
                query
                    .notification_type
                    .is_none_or(|t| t == n.notification_type)
            })
            .filter(|n| {
                query
                    .project
                    .as_deref()
                    .is_none_or(|p| n.project.as_deref() == Some(p))
            })
            .cloned()
            .collect();
        ListNotificationsResponse {
            notifications,
            unread_count: state.items.iter().filter(|n| n.unread).count(),
        }
    }

    pub async fn mark_read(&self, id: u64) -> Option<Notification> {
        let mut state = self.state.write().await;
        let notification = state.items.iter_mut().find(|n| n.id == id)?;
        notification.unread = false;
        Some(notification.clone())
    }

    pub async fn mark_all_read(&self) {
        let mut state = self.state.write().await;
        for notification in state.items.iter_mut() {
            notification.unread = false;
        }
    }

    pub async fn unread_count(&self) -> usize {
        self.state
            .read()
            .await
            .items
            .iter()
            .filter(|n| n.unread)
            .count()
    }
}
