//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on the driving ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountService, AiService, AnalyticsService, AvailabilityService, BadgeService,
    BookingService, ChatService, DashboardService, NotificationService, ReviewService,
    SearchService, SkillService, TwoFactorService, WebhookService,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub two_factor: Arc<dyn TwoFactorService>,
    pub skills: Arc<dyn SkillService>,
    pub availability: Arc<dyn AvailabilityService>,
    pub bookings: Arc<dyn BookingService>,
    pub reviews: Arc<dyn ReviewService>,
    pub chat: Arc<dyn ChatService>,
    pub notifications: Arc<dyn NotificationService>,
    pub search: Arc<dyn SearchService>,
    pub dashboard: Arc<dyn DashboardService>,
    pub analytics: Arc<dyn AnalyticsService>,
    pub ai: Arc<dyn AiService>,
    pub webhooks: Arc<dyn WebhookService>,
    pub badges: Arc<dyn BadgeService>,
}
