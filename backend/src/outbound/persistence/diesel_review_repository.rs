//! PostgreSQL-backed `ReviewRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{ReviewRepository, ReviewRepositoryError};
use crate::domain::{Review, ReviewRatings, UserId};

use super::diesel_basic_error_mapping::{
    ConstraintViolation, map_basic_diesel_error, map_basic_pool_error, violated_constraint,
};
use super::diesel_helpers::count;
use super::models::{NewReviewRow, ReviewRow};
use super::pool::{DbPool, PoolError};
use super::schema::{review_helpful_votes, reviews};

#[derive(Clone)]
pub struct DieselReviewRepository {
    pool: DbPool,
}

impl DieselReviewRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ReviewRepositoryError {
    map_basic_pool_error(error, |message| ReviewRepositoryError::connection(message))
}

fn map_diesel_error(error: diesel::result::Error) -> ReviewRepositoryError {
    map_basic_diesel_error(
        error,
        ReviewRepositoryError::query,
        ReviewRepositoryError::connection,
    )
}

fn row_to_review(row: ReviewRow) -> Review {
    Review {
        id: row.id,
        booking_id: row.booking_id,
        reviewer_id: UserId::from_uuid(row.reviewer_id),
        mentor_id: UserId::from_uuid(row.mentor_id),
        ratings: ReviewRatings {
            overall: row.overall,
            communication: row.communication,
            knowledge: row.knowledge,
            punctuality: row.punctuality,
        },
        text: row.body,
        would_recommend: row.would_recommend,
        helpful_count: row.helpful_count,
        created_at: row.created_at,
    }
}

#[async_trait]
impl ReviewRepository for DieselReviewRepository {
    async fn insert(&self, review: &Review) -> Result<(), ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewReviewRow {
            id: review.id,
            booking_id: review.booking_id,
            reviewer_id: *review.reviewer_id.as_uuid(),
            mentor_id: *review.mentor_id.as_uuid(),
            overall: review.ratings.overall,
            communication: review.ratings.communication,
            knowledge: review.ratings.knowledge,
            punctuality: review.ratings.punctuality,
            body: &review.text,
            would_recommend: review.would_recommend,
            helpful_count: review.helpful_count,
            created_at: review.created_at,
        };
        diesel::insert_into(reviews::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| match violated_constraint(&err) {
                Some(ConstraintViolation::Unique(_)) => ReviewRepositoryError::duplicate_review(),
                _ => map_diesel_error(err),
            })
    }

    async fn find(&self, review_id: &Uuid) -> Result<Option<Review>, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ReviewRow> = reviews::table
            .filter(reviews::id.eq(review_id))
            .select(ReviewRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_review))
    }

    async fn for_mentor(&self, mentor_id: &UserId) -> Result<Vec<Review>, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ReviewRow> = reviews::table
            .filter(reviews::mentor_id.eq(mentor_id.as_uuid()))
            .select(ReviewRow::as_select())
            .order_by((reviews::created_at.desc(), reviews::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_review).collect())
    }

    async fn count_by_reviewer(&self, reviewer_id: &UserId) -> Result<u64, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total: i64 = reviews::table
            .filter(reviews::reviewer_id.eq(reviewer_id.as_uuid()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count(total))
    }

    async fn record_helpful(
        &self,
        review_id: &Uuid,
        voter_id: &UserId,
    ) -> Result<i32, ReviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let review = *review_id;
        let voter = *voter_id.as_uuid();
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(review_helpful_votes::table)
                    .values((
                        review_helpful_votes::review_id.eq(review),
                        review_helpful_votes::voter_id.eq(voter),
                    ))
                    .execute(conn)
                    .await?;
                diesel::update(reviews::table.filter(reviews::id.eq(review)))
                    .set(reviews::helpful_count.eq(reviews::helpful_count + 1))
                    .returning(reviews::helpful_count)
                    .get_result::<i32>(conn)
                    .await
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| match violated_constraint(&err) {
            Some(ConstraintViolation::Unique(_)) => ReviewRepositoryError::duplicate_vote(),
            _ => map_diesel_error(err),
        })
    }
}
