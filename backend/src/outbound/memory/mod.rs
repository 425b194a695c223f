//! In-process adapters backed by a single shared table set.
//!
//! Every driven repository port is implemented on [`MemoryStore`], so one
//! clone can be handed to each service. Reads take the shared lock; any
//! check-then-write sequence (slot overlap, booking overlap, duplicate
//! reviews) runs under one write guard so concurrent requests observe the
//! same invariants the PostgreSQL constraints enforce.
//!
//! The server falls back to this store when no database URL is configured,
//! and handler tests use it directly.

mod accounts;
mod community;
mod scheduling;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    AiResponse, AuthSession, AvailabilityException, AvailabilitySettings, AvailabilitySlot,
    Booking, ChatMessage, ChatRoom, EarnedBadge, LoginChallenge, Notification, PageKey,
    PasswordHash, Review, Skill, TwoFactorSettings, User, UserId, WebhookEvent, WeeklyRule,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, (User, PasswordHash)>,
    sessions: HashMap<String, AuthSession>,
    two_factor: HashMap<UserId, TwoFactorSettings>,
    challenges: HashMap<String, LoginChallenge>,
    skills: HashMap<Uuid, Skill>,
    mentor_skills: HashMap<UserId, Vec<(Uuid, i16)>>,
    weekly_rules: HashMap<UserId, Vec<WeeklyRule>>,
    slots: HashMap<Uuid, AvailabilitySlot>,
    exceptions: HashMap<Uuid, AvailabilityException>,
    settings: HashMap<UserId, AvailabilitySettings>,
    bookings: HashMap<Uuid, Booking>,
    reviews: HashMap<Uuid, Review>,
    helpful_votes: HashSet<(Uuid, UserId)>,
    rooms: HashMap<Uuid, ChatRoom>,
    messages: HashMap<Uuid, ChatMessage>,
    notifications: HashMap<Uuid, Notification>,
    badges: Vec<EarnedBadge>,
    ai_log: Vec<AiResponse>,
    webhook_events: Vec<WebhookEvent>,
}

/// Shared in-memory implementation of every repository port.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use mentorship::domain::ports::UserRepository;
/// use mentorship::outbound::memory::MemoryStore;
///
/// let store = MemoryStore::new();
/// let users: Arc<dyn UserRepository> = Arc::new(store.clone());
/// # let _ = users;
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest-first keyset page over `items`.
fn newest_first<T>(
    items: impl Iterator<Item = T>,
    key_of: impl Fn(&T) -> PageKey,
    before: Option<PageKey>,
    limit: usize,
) -> Vec<T> {
    let mut page: Vec<T> = items
        .filter(|item| {
            let key = key_of(item);
            before.is_none_or(|cursor| cursor.precedes(key.created_at, key.id))
        })
        .collect();
    page.sort_by_key(|item| {
        let key = key_of(item);
        std::cmp::Reverse((key.created_at, key.id))
    });
    page.truncate(limit);
    page
}

#[cfg(test)]
mod tests;
