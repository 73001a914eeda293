// src/models/review.rs

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Uma avaliação por par (produto, usuário)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    // Vem do JOIN com users
    pub author_name: String,
    #[schema(example = 5)]
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    #[schema(example = "4.3")]
    pub average: Decimal,
    pub count: i64,
}

impl RatingSummary {
    /// Média com uma casa decimal; zero quando não há avaliações.
    pub fn from_ratings(ratings: &[i16]) -> Self {
        if ratings.is_empty() {
            return Self { average: Decimal::ZERO, count: 0 };
        }
        let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
        let count = ratings.len() as i64;
        let average = (Decimal::from(sum) / Decimal::from(count))
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
        Self { average, count }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductReviews {
    pub reviews: Vec<Review>,
    pub summary: RatingSummary,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewPayload {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "rating_range"))]
    pub rating: i16,
    #[validate(length(max = 2000, message = "too_long"))]
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateReviewPayload {
    #[validate(range(min = 1, max = 5, message = "rating_range"))]
    pub rating: Option<i16>,
    #[validate(length(max = 2000, message = "too_long"))]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_rounds_to_one_decimal() {
        let summary = RatingSummary::from_ratings(&[5, 4, 4]);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, "4.3".parse::<Decimal>().unwrap());

        let summary = RatingSummary::from_ratings(&[5, 4]);
        assert_eq!(summary.average, "4.5".parse::<Decimal>().unwrap());
    }

    #[test]
    fn empty_summary_is_zero() {
        let summary = RatingSummary::from_ratings(&[]);
        assert_eq!(summary, RatingSummary { average: Decimal::ZERO, count: 0 });
    }

    #[test]
    fn rating_outside_one_to_five_is_rejected() {
        let payload = CreateReviewPayload { product_id: Uuid::new_v4(), rating: 6, comment: "ok".into() };
        assert!(payload.validate().is_err());
        let payload = CreateReviewPayload { product_id: Uuid::new_v4(), rating: 0, comment: String::new() };
        assert!(payload.validate().is_err());
        let payload = CreateReviewPayload { product_id: Uuid::new_v4(), rating: 3, comment: String::new() };
        assert!(payload.validate().is_ok());
    }
}
