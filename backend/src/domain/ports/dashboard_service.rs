//! Driving port for role-specific dashboards.

use async_trait::async_trait;

use crate::domain::{Actor, Dashboard, Error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardService: Send + Sync {
    async fn dashboard(&self, actor: &Actor) -> Result<Dashboard, Error>;
}
