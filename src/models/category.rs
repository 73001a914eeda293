// src/models/category.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Árvore: categoria -> grupo de subcategoria -> itens ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubcategoryGroup {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Roupas")]
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[schema(example = "Moda")]
    pub name: String,
    #[schema(value_type = Vec<SubcategoryGroup>)]
    pub subcategories: Json<Vec<SubcategoryGroup>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Um produto pode usar tanto o nome de um grupo quanto um item de grupo
    /// como subcategoria.
    pub fn contains_subcategory(&self, subcategory: &str) -> bool {
        self.subcategories
            .iter()
            .any(|g| g.name == subcategory || g.items.iter().any(|i| i == subcategory))
    }
}

fn validate_unique_groups(groups: &Vec<SubcategoryGroup>) -> Result<(), ValidationError> {
    let mut seen = std::collections::HashSet::new();
    for group in groups {
        if !seen.insert(group.name.to_lowercase()) {
            let mut err = ValidationError::new("unique");
            err.message = Some("duplicate_subcategory".into());
            return Err(err);
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[serde(default)]
    #[validate(nested, custom(function = "validate_unique_groups"))]
    pub subcategories: Vec<SubcategoryGroup>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    #[validate(nested, custom(function = "validate_unique_groups"))]
    pub subcategories: Option<Vec<SubcategoryGroup>>,
}

/// Acrescenta um grupo; `false` se já existir um com o mesmo nome.
pub fn add_group(groups: &mut Vec<SubcategoryGroup>, group: SubcategoryGroup) -> bool {
    if groups.iter().any(|g| g.name.eq_ignore_ascii_case(&group.name)) {
        return false;
    }
    groups.push(group);
    true
}

pub fn remove_group(groups: &mut Vec<SubcategoryGroup>, name: &str) -> bool {
    let before = groups.len();
    groups.retain(|g| !g.name.eq_ignore_ascii_case(name));
    groups.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fashion() -> Category {
        Category {
            id: Uuid::new_v4(),
            name: "Moda".into(),
            subcategories: Json(vec![SubcategoryGroup {
                name: "Roupas".into(),
                items: vec!["Camisetas".into(), "Calças".into()],
            }]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn subcategory_matches_group_or_item() {
        let cat = fashion();
        assert!(cat.contains_subcategory("Roupas"));
        assert!(cat.contains_subcategory("Calças"));
        assert!(!cat.contains_subcategory("Sapatos"));
    }

    #[test]
    fn groups_are_unique_case_insensitively() {
        let mut groups = fashion().subcategories.0;
        assert!(!add_group(&mut groups, SubcategoryGroup { name: "roupas".into(), items: vec![] }));
        assert!(add_group(&mut groups, SubcategoryGroup { name: "Calçados".into(), items: vec![] }));
        assert!(remove_group(&mut groups, "ROUPAS"));
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn payload_with_duplicate_groups_fails_validation() {
        let payload = CreateCategoryPayload {
            name: "Casa".into(),
            subcategories: vec![
                SubcategoryGroup { name: "Cozinha".into(), items: vec![] },
                SubcategoryGroup { name: "cozinha".into(), items: vec![] },
            ],
        };
        assert!(payload.validate().is_err());
    }
}
