// src/models/promotion.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: Uuid,
    #[schema(example = "Black Friday")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "20")]
    pub discount_percent: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub image_url: Option<String>,
    // Cache recalculado por `PromotionService::refresh_activation`
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// Janela semiaberta: [starts_at, ends_at)
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        window_contains(self.starts_at, self.ends_at, now)
    }
}

pub fn window_contains(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    starts_at <= now && now < ends_at
}

fn validate_discount(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO || *val > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("range");
        err.message = Some("discount_range".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromotionPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom(function = "validate_discount"))]
    pub discount_percent: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub product_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePromotionPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_discount"))]
    pub discount_percent: Option<Decimal>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachProductsPayload {
    #[validate(length(min = 1, message = "required"))]
    pub product_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub promotions_changed: u64,
    pub products_updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn window_is_half_open() {
        let start = Utc::now();
        let end = start + Duration::days(2);
        assert!(window_contains(start, end, start));
        assert!(window_contains(start, end, start + Duration::days(1)));
        assert!(!window_contains(start, end, end));
        assert!(!window_contains(start, end, start - Duration::seconds(1)));
    }

    #[test]
    fn discount_must_be_within_zero_and_hundred() {
        let mut payload = CreatePromotionPayload {
            name: "Verão".into(),
            description: None,
            discount_percent: "0".parse().unwrap(),
            starts_at: Utc::now(),
            ends_at: Utc::now() + Duration::days(1),
            image_url: None,
            product_ids: vec![],
        };
        assert!(payload.validate().is_err());
        payload.discount_percent = "100".parse().unwrap();
        assert!(payload.validate().is_ok());
        payload.discount_percent = "100.01".parse().unwrap();
        assert!(payload.validate().is_err());
    }
}
