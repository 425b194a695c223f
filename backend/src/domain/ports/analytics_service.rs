//! Driving port for platform and per-skill analytics.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Actor, AnalyticsPeriod, Error, PlatformAnalytics, SkillAnalytics};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsService: Send + Sync {
    /// Platform activity. Administrators only.
    async fn platform(&self, actor: &Actor, period: AnalyticsPeriod)
    -> Result<PlatformAnalytics, Error>;

    /// Demand and mentor supply for one skill.
    async fn skill(&self, skill_id: &Uuid, period: AnalyticsPeriod)
    -> Result<SkillAnalytics, Error>;
}
