// src/models/tag.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductTag {
    pub id: Uuid,
    #[schema(example = "verao")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TagPayload {
    #[validate(length(min = 1, max = 40, message = "tag_length"))]
    pub name: String,
}

// Tags são gravadas normalizadas (minúsculas, sem espaços nas pontas)
pub fn normalize_tag(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_lowercased() {
        assert_eq!(normalize_tag("  Verão "), "verão");
    }
}
