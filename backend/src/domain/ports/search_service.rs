//! Driving port for mentor discovery.

use async_trait::async_trait;

use crate::domain::{Error, MentorCard, MentorSearchQuery};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchService: Send + Sync {
    async fn search_mentors(&self, query: MentorSearchQuery) -> Result<Vec<MentorCard>, Error>;
}
