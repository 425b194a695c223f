//! Port for the language-model call log.
use async_trait::async_trait;

use crate::domain::{AiResponse, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by AI response log adapters.
    pub enum AiResponseRepositoryError {
        Connection { message: String } => "AI response log connection failed: {message}",
        Query { message: String } => "AI response log query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AiResponseRepository: Send + Sync {
    async fn insert(&self, response: &AiResponse) -> Result<(), AiResponseRepositoryError>;

    /// A user's log, newest first.
    async fn for_user(&self, user_id: &UserId) -> Result<Vec<AiResponse>, AiResponseRepositoryError>;
}
