//! Builders wiring driven adapters into the driving services.
//!
//! One [`Repositories`] bundle is built from either the Diesel pool or a
//! shared [`MemoryStore`]; the service graph on top is identical.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use mentorship::domain::ports::{
    AiResponseRepository, AuthSessionRepository, AvailabilityRepository, AvailabilityService,
    BadgeRepository, BookingRepository, ChatRepository, LanguageModel, NotificationRepository,
    ReviewRepository, SkillRepository, TwoFactorRepository, UserRepository,
    WebhookEventRepository,
};
use mentorship::domain::{
    Accounts, Analytics, Assistant, AvailabilityPlanner, BadgeAwards, BookingWorkflow,
    BookingWorkflowPorts, ChatRooms, Dashboards, MentorSearch, NotificationInbox, Notifier,
    Reviews, SkillCatalogue, TwoFactor, WebhookReceiver,
};
use mentorship::inbound::http::state::HttpState;
use mentorship::inbound::ws::{ChatHub, WsState};
use mentorship::outbound::ai::ChatCompletionsModel;
use mentorship::outbound::memory::MemoryStore;
use mentorship::outbound::persistence::{
    DbPool, DieselAiResponseRepository, DieselAuthSessionRepository, DieselAvailabilityRepository,
    DieselBadgeRepository, DieselBookingRepository, DieselChatRepository,
    DieselNotificationRepository, DieselReviewRepository, DieselSkillRepository,
    DieselTwoFactorRepository, DieselUserRepository, DieselWebhookEventRepository,
};

use super::ServerConfig;
use super::config::ServiceOptions;

/// Every driven repository port the services depend on.
#[derive(Clone)]
pub(crate) struct Repositories {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn AuthSessionRepository>,
    two_factor: Arc<dyn TwoFactorRepository>,
    skills: Arc<dyn SkillRepository>,
    availability: Arc<dyn AvailabilityRepository>,
    bookings: Arc<dyn BookingRepository>,
    reviews: Arc<dyn ReviewRepository>,
    chats: Arc<dyn ChatRepository>,
    notifications: Arc<dyn NotificationRepository>,
    badges: Arc<dyn BadgeRepository>,
    ai_log: Arc<dyn AiResponseRepository>,
    webhook_events: Arc<dyn WebhookEventRepository>,
}

impl Repositories {
    pub(crate) fn diesel(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            sessions: Arc::new(DieselAuthSessionRepository::new(pool.clone())),
            two_factor: Arc::new(DieselTwoFactorRepository::new(pool.clone())),
            skills: Arc::new(DieselSkillRepository::new(pool.clone())),
            availability: Arc::new(DieselAvailabilityRepository::new(pool.clone())),
            bookings: Arc::new(DieselBookingRepository::new(pool.clone())),
            reviews: Arc::new(DieselReviewRepository::new(pool.clone())),
            chats: Arc::new(DieselChatRepository::new(pool.clone())),
            notifications: Arc::new(DieselNotificationRepository::new(pool.clone())),
            badges: Arc::new(DieselBadgeRepository::new(pool.clone())),
            ai_log: Arc::new(DieselAiResponseRepository::new(pool.clone())),
            webhook_events: Arc::new(DieselWebhookEventRepository::new(pool.clone())),
        }
    }

    pub(crate) fn in_memory(store: &MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            sessions: Arc::new(store.clone()),
            two_factor: Arc::new(store.clone()),
            skills: Arc::new(store.clone()),
            availability: Arc::new(store.clone()),
            bookings: Arc::new(store.clone()),
            reviews: Arc::new(store.clone()),
            chats: Arc::new(store.clone()),
            notifications: Arc::new(store.clone()),
            badges: Arc::new(store.clone()),
            ai_log: Arc::new(store.clone()),
            webhook_events: Arc::new(store.clone()),
        }
    }
}

/// Adapter state handed to the Actix app factory.
pub(crate) struct AdapterStates {
    pub http: web::Data<HttpState>,
    pub ws: web::Data<WsState>,
}

fn language_model(options: &ServiceOptions) -> std::io::Result<Arc<dyn LanguageModel>> {
    if options.ai.api_key.is_none() {
        warn!("no AI API key configured; assistant requests will record failures");
    }
    let model = ChatCompletionsModel::new(options.ai.clone())
        .map_err(|err| std::io::Error::other(format!("AI client setup failed: {err}")))?;
    Ok(Arc::new(model))
}

/// Build the driving services over `repos` and bundle them for the adapters.
pub(crate) fn build_states(
    repos: Repositories,
    options: &ServiceOptions,
    clock: Arc<dyn Clock>,
) -> std::io::Result<AdapterStates> {
    let hub = Arc::new(ChatHub::new());
    let notifier = Notifier::new(Arc::clone(&repos.notifications), Arc::clone(&clock));
    let badges = BadgeAwards::new(
        Arc::clone(&repos.badges),
        Arc::clone(&repos.bookings),
        Arc::clone(&repos.reviews),
        notifier.clone(),
        Arc::clone(&clock),
    );
    let availability: Arc<dyn AvailabilityService> = Arc::new(AvailabilityPlanner::new(
        Arc::clone(&repos.availability),
        Arc::clone(&repos.users),
        Arc::clone(&clock),
    ));
    let accounts = Arc::new(Accounts::new(
        Arc::clone(&repos.users),
        Arc::clone(&repos.sessions),
        Arc::clone(&repos.two_factor),
        Arc::clone(&repos.reviews),
        Arc::clone(&repos.skills),
        Arc::clone(&clock),
        options.token_ttl,
    ));
    let two_factor = Arc::new(TwoFactor::new(
        Arc::clone(&repos.users),
        Arc::clone(&repos.sessions),
        Arc::clone(&repos.two_factor),
        Arc::clone(&clock),
        options.token_ttl,
    ));
    let analytics = Arc::new(Analytics::new(
        Arc::clone(&repos.users),
        Arc::clone(&repos.bookings),
        Arc::clone(&repos.skills),
        Arc::clone(&clock),
    ));
    let chat = Arc::new(ChatRooms::new(
        Arc::clone(&repos.chats),
        Arc::clone(&repos.users),
        hub.clone(),
        Arc::clone(&clock),
    ));

    let http = HttpState {
        accounts: accounts.clone(),
        two_factor,
        analytics,
        skills: Arc::new(SkillCatalogue::new(Arc::clone(&repos.skills))),
        availability: Arc::clone(&availability),
        bookings: Arc::new(BookingWorkflow::new(BookingWorkflowPorts {
            users: Arc::clone(&repos.users),
            bookings: Arc::clone(&repos.bookings),
            availability: Arc::clone(&repos.availability),
            notifier: notifier.clone(),
            badges: badges.clone(),
            clock: Arc::clone(&clock),
            calendar_domain: options.calendar_domain.clone(),
        })),
        reviews: Arc::new(Reviews::new(
            Arc::clone(&repos.reviews),
            Arc::clone(&repos.bookings),
            notifier,
            badges.clone(),
            Arc::clone(&clock),
        )),
        chat: chat.clone(),
        notifications: Arc::new(NotificationInbox::new(Arc::clone(&repos.notifications))),
        search: Arc::new(MentorSearch::new(
            Arc::clone(&repos.users),
            Arc::clone(&repos.reviews),
            Arc::clone(&repos.skills),
            availability,
            Arc::clone(&clock),
        )),
        dashboard: Arc::new(Dashboards::new(
            Arc::clone(&repos.users),
            Arc::clone(&repos.bookings),
            Arc::clone(&repos.reviews),
            Arc::clone(&repos.badges),
            Arc::clone(&clock),
        )),
        ai: Arc::new(Assistant::new(
            language_model(options)?,
            Arc::clone(&repos.ai_log),
            Arc::clone(&repos.users),
            Arc::clone(&repos.bookings),
            Arc::clone(&repos.reviews),
            Arc::clone(&repos.skills),
            Arc::clone(&clock),
        )),
        webhooks: Arc::new(WebhookReceiver::new(
            options.webhook_secrets.clone(),
            Arc::clone(&repos.webhook_events),
            Arc::clone(&clock),
        )),
        badges: Arc::new(badges),
    };
    let ws = WsState::new(accounts, chat, hub, options.origins.clone());
    Ok(AdapterStates {
        http: web::Data::new(http),
        ws: web::Data::new(ws),
    })
}

/// Pick Diesel adapters when a pool is configured, in-memory ones otherwise.
pub(crate) fn build_adapter_states(config: &ServerConfig) -> std::io::Result<AdapterStates> {
    let repos = match &config.db_pool {
        Some(pool) => Repositories::diesel(pool),
        None => {
            info!("no database configured; using in-memory adapters");
            Repositories::in_memory(&MemoryStore::new())
        }
    };
    build_states(repos, &config.options, Arc::new(DefaultClock))
}
