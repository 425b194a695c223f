//! Driving port for language-model assisted features.
//!
//! Provider failures do not fail these calls: the logged [`AiResponse`]
//! carries the error instead.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Actor, AiResponse, Error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiService: Send + Sync {
    async fn session_summary(&self, actor: &Actor, booking_id: &Uuid) -> Result<AiResponse, Error>;

    async fn recommendations(&self, actor: &Actor, goals: Option<String>)
    -> Result<AiResponse, Error>;

    async fn ask(&self, actor: &Actor, question: &str) -> Result<AiResponse, Error>;

    async fn history(&self, actor: &Actor) -> Result<Vec<AiResponse>, Error>;
}
