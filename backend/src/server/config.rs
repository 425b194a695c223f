//! HTTP server configuration: layered settings and the resolved builder.

use std::net::SocketAddr;

use chrono::Duration;
use ortho_config::OrthoConfig;
use serde::Deserialize;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;
use mentorship::domain::WebhookSecrets;
use mentorship::inbound::ws::OriginPolicy;
use mentorship::outbound::ai::ChatCompletionsConfig;
use mentorship::outbound::persistence::DbPool;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TOKEN_TTL_HOURS: u32 = 24;
const DEFAULT_CALENDAR_DOMAIN: &str = "mentorship.local";
const DEFAULT_PUBLIC_DOMAIN: &str = "mentorship.example";

/// Settings read from CLI flags and `MENTORSHIP_*` environment variables.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MENTORSHIP")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; absent selects the in-memory adapters.
    pub database_url: Option<String>,
    /// Bearer token lifetime.
    pub token_ttl_hours: Option<u32>,
    pub ai_api_key: Option<String>,
    pub ai_base_url: Option<String>,
    pub ai_model: Option<String>,
    /// Comma-separated `provider=secret` pairs.
    pub webhook_secrets: Option<String>,
    /// Domain used in calendar event UIDs.
    pub calendar_domain: Option<String>,
    /// Domain whose HTTPS origins may open chat sockets.
    pub public_domain: Option<String>,
}

impl ServerSettings {
    /// Resolve the listen address.
    ///
    /// # Errors
    /// Returns [`std::io::Error`] when the address does not parse.
    pub fn bind_addr(&self) -> std::io::Result<SocketAddr> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err| {
            std::io::Error::other(format!("invalid bind address `{raw}`: {err}"))
        })
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::hours(i64::from(
            self.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS),
        ))
    }

    pub fn calendar_domain(&self) -> &str {
        self.calendar_domain
            .as_deref()
            .unwrap_or(DEFAULT_CALENDAR_DOMAIN)
    }

    pub fn origin_policy(&self) -> OriginPolicy {
        OriginPolicy::new(self.public_domain.as_deref().unwrap_or(DEFAULT_PUBLIC_DOMAIN))
    }

    /// Language-model provider settings.
    ///
    /// # Errors
    /// Returns [`std::io::Error`] when the base URL is malformed.
    pub fn ai_config(&self) -> std::io::Result<ChatCompletionsConfig> {
        ChatCompletionsConfig::new(
            self.ai_api_key.clone(),
            self.ai_base_url.as_deref(),
            self.ai_model.clone(),
        )
        .map_err(|err| std::io::Error::other(format!("invalid AI base URL: {err}")))
    }

    /// Parsed webhook secrets; empty when unset.
    ///
    /// # Errors
    /// Returns [`std::io::Error`] for entries not shaped `provider=secret`.
    pub fn webhook_secrets(&self) -> std::io::Result<WebhookSecrets> {
        WebhookSecrets::parse(self.webhook_secrets.as_deref().unwrap_or_default())
            .map_err(|err| std::io::Error::other(err.to_string()))
    }
}

/// Options the service graph is built from.
#[derive(Clone)]
pub struct ServiceOptions {
    pub token_ttl: Duration,
    pub calendar_domain: String,
    pub ai: ChatCompletionsConfig,
    pub webhook_secrets: WebhookSecrets,
    pub origins: OriginPolicy,
}

impl ServiceOptions {
    /// Resolve every service option from `settings`.
    ///
    /// # Errors
    /// Returns [`std::io::Error`] for malformed AI or webhook settings.
    pub fn from_settings(settings: &ServerSettings) -> std::io::Result<Self> {
        Ok(Self {
            token_ttl: settings.token_ttl(),
            calendar_domain: settings.calendar_domain().to_owned(),
            ai: settings.ai_config()?,
            webhook_secrets: settings.webhook_secrets()?,
            origins: settings.origin_policy(),
        })
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) options: ServiceOptions,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a server configuration backed by in-memory adapters.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, options: ServiceOptions) -> Self {
        Self {
            bind_addr,
            db_pool: None,
            options,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool for the Diesel adapters.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
