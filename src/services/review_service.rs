// src/services/review_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ProductRepository, ReviewRepository},
    models::review::{CreateReviewPayload, ProductReviews, RatingSummary, Review, UpdateReviewPayload},
};

#[derive(Clone)]
pub struct ReviewService {
    review_repo: ReviewRepository,
    product_repo: ProductRepository,
}

impl ReviewService {
    pub fn new(review_repo: ReviewRepository, product_repo: ProductRepository) -> Self {
        Self { review_repo, product_repo }
    }

    pub async fn for_product(&self, product_id: Uuid) -> Result<ProductReviews, AppError> {
        if self.product_repo.find_by_id(product_id).await?.is_none() {
            return Err(AppError::ResourceNotFound("product".into()));
        }
        let reviews = self.review_repo.list_for_product(product_id).await?;
        let ratings: Vec<i16> = reviews.iter().map(|r| r.rating).collect();
        Ok(ProductReviews { summary: RatingSummary::from_ratings(&ratings), reviews })
    }

    pub async fn mine(&self, user_id: Uuid) -> Result<Vec<Review>, AppError> {
        self.review_repo.list_for_user(user_id).await
    }

    pub async fn create(&self, user_id: Uuid, payload: &CreateReviewPayload) -> Result<Review, AppError> {
        if self.product_repo.find_by_id(payload.product_id).await?.is_none() {
            return Err(AppError::ResourceNotFound("product".into()));
        }
        self.review_repo
            .create(payload.product_id, user_id, payload.rating, payload.comment.trim())
            .await
    }

    pub async fn update(&self, user_id: Uuid, review_id: Uuid, payload: &UpdateReviewPayload) -> Result<Review, AppError> {
        self.owned(user_id, review_id).await?;
        self.review_repo
            .update(review_id, payload.rating, payload.comment.as_deref().map(str::trim))
            .await
    }

    pub async fn delete_own(&self, user_id: Uuid, review_id: Uuid) -> Result<(), AppError> {
        self.owned(user_id, review_id).await?;
        self.review_repo.delete(review_id).await
    }

    // Moderação pelo back-office
    pub async fn delete_any(&self, review_id: Uuid) -> Result<(), AppError> {
        self.review_repo.delete(review_id).await
    }

    async fn owned(&self, user_id: Uuid, review_id: Uuid) -> Result<Review, AppError> {
        let review = self
            .review_repo
            .find_by_id(review_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("review".into()))?;
        if review.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(review)
    }
}
