//! Film reviews and their usefulness score.
//!
//! The score is never stored: every read recomputes it from the like and dislike
//! rows attached to the review.

use std::sync::Arc;

use super::{event_feed::EventFeed, films::require_film, users::require_user};
use crate::{
    db::{FilmStore, ReviewStore, UserStore},
    error::{AppError, AppResult},
    models::{
        useful_score, EventType, FilmId, Operation, Review, ReviewId, ReviewPayload,
        ReviewRecord, UserId,
    },
    validation::validate_review,
};

/// Reviews returned for a single film when no count is given
pub const DEFAULT_REVIEW_COUNT: usize = 10;

#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewStore>,
    users: Arc<dyn UserStore>,
    films: Arc<dyn FilmStore>,
    feed: EventFeed,
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewStore>,
        users: Arc<dyn UserStore>,
        films: Arc<dyn FilmStore>,
        feed: EventFeed,
    ) -> Self {
        Self {
            reviews,
            users,
            films,
            feed,
        }
    }

    pub async fn add_review(&self, payload: ReviewPayload) -> AppResult<Review> {
        let record = self.checked_record(payload).await?;

        let record = self.reviews.insert_review(record).await?;
        self.feed
            .record_event(
                record.user_id,
                EventType::Review,
                Operation::Add,
                record.review_id,
            )
            .await?;

        tracing::info!(
            review_id = record.review_id,
            film_id = record.film_id,
            user_id = record.user_id,
            "Review created"
        );
        self.score(record).await
    }

    /// Replaces the content and polarity of a review; film and author stay as stored
    pub async fn update_review(&self, payload: ReviewPayload) -> AppResult<Review> {
        let review_id = payload
            .review_id
            .ok_or_else(|| AppError::validation("review id is required"))?;
        let stored = self.get_record(review_id).await?;
        let incoming = self.checked_record(payload).await?;

        let record = ReviewRecord {
            review_id,
            film_id: stored.film_id,
            user_id: stored.user_id,
            content: incoming.content,
            is_positive: incoming.is_positive,
        };
        if !self.reviews.update_review(record.clone()).await? {
            return Err(AppError::storage(format!(
                "update of review {} matched no rows",
                review_id
            )));
        }

        self.feed
            .record_event(
                record.user_id,
                EventType::Review,
                Operation::Update,
                review_id,
            )
            .await?;

        tracing::info!(review_id, "Review updated");
        self.score(record).await
    }

    pub async fn get_review(&self, id: ReviewId) -> AppResult<Review> {
        let record = self.get_record(id).await?;
        self.score(record).await
    }

    pub async fn delete_review(&self, id: ReviewId) -> AppResult<()> {
        let stored = self.get_record(id).await?;
        if !self.reviews.delete_review(id).await? {
            return Err(AppError::storage(format!(
                "delete of review {} matched no rows",
                id
            )));
        }

        self.feed
            .record_event(stored.user_id, EventType::Review, Operation::Remove, id)
            .await?;

        tracing::info!(review_id = id, "Review deleted");
        Ok(())
    }

    /// Reviews by descending usefulness, ties by ascending id
    ///
    /// Without a film every review is returned. With a film the list is cut to
    /// `count`, [`DEFAULT_REVIEW_COUNT`] if not given.
    pub async fn get_reviews(
        &self,
        film_id: Option<FilmId>,
        count: Option<usize>,
    ) -> AppResult<Vec<Review>> {
        let records: Vec<ReviewRecord> = self
            .reviews
            .list_reviews()
            .await?
            .into_iter()
            .filter(|r| film_id.map_or(true, |f| r.film_id == f))
            .collect();

        let mut reviews = Vec::with_capacity(records.len());
        for record in records {
            reviews.push(self.score(record).await?);
        }
        reviews.sort_by(|a, b| {
            b.useful
                .cmp(&a.useful)
                .then_with(|| a.review_id.cmp(&b.review_id))
        });

        if film_id.is_some() {
            reviews.truncate(count.unwrap_or(DEFAULT_REVIEW_COUNT));
        }
        Ok(reviews)
    }

    pub async fn add_like(&self, review_id: ReviewId, user_id: UserId) -> AppResult<()> {
        self.react(review_id, user_id, true).await
    }

    pub async fn add_dislike(&self, review_id: ReviewId, user_id: UserId) -> AppResult<()> {
        self.react(review_id, user_id, false).await
    }

    /// Drops the user's reaction to the review, whichever polarity it has
    pub async fn remove_like(&self, review_id: ReviewId, user_id: UserId) -> AppResult<()> {
        self.unreact(review_id, user_id).await
    }

    /// Drops the user's reaction to the review, whichever polarity it has
    pub async fn remove_dislike(&self, review_id: ReviewId, user_id: UserId) -> AppResult<()> {
        self.unreact(review_id, user_id).await
    }

    async fn react(&self, review_id: ReviewId, user_id: UserId, is_like: bool) -> AppResult<()> {
        self.get_record(review_id).await?;
        require_user(self.users.as_ref(), user_id).await?;

        self.reviews
            .upsert_review_reaction(review_id, user_id, is_like)
            .await?;
        tracing::info!(review_id, user_id, is_like, "Review reaction stored");
        Ok(())
    }

    async fn unreact(&self, review_id: ReviewId, user_id: UserId) -> AppResult<()> {
        self.get_record(review_id).await?;
        require_user(self.users.as_ref(), user_id).await?;

        let removed = self
            .reviews
            .delete_review_reaction(review_id, user_id)
            .await?;
        tracing::info!(review_id, user_id, removed, "Review reaction removed");
        Ok(())
    }

    async fn get_record(&self, id: ReviewId) -> AppResult<ReviewRecord> {
        self.reviews
            .get_review(id)
            .await?
            .ok_or_else(|| AppError::not_found("Review", id))
    }

    /// Validates a payload and checks that its film and author exist
    async fn checked_record(&self, payload: ReviewPayload) -> AppResult<ReviewRecord> {
        if let Err(e) = validate_review(&payload).into_result() {
            tracing::warn!(error = %e, "Rejected review");
            return Err(e);
        }
        require_user(self.users.as_ref(), payload.user_id).await?;
        require_film(self.films.as_ref(), payload.film_id).await?;

        Ok(ReviewRecord {
            review_id: payload.review_id.unwrap_or_default(),
            film_id: payload.film_id,
            user_id: payload.user_id,
            content: payload.content.unwrap_or_default(),
            is_positive: payload.is_positive.unwrap_or_default(),
        })
    }

    async fn score(&self, record: ReviewRecord) -> AppResult<Review> {
        let reactions = self.reviews.review_reactions(record.review_id).await?;
        Ok(Review::from_record(record, useful_score(&reactions)))
    }
}
