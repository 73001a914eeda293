// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Produto do catálogo ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "TSH-001-BLK")]
    pub reference: String,
    pub name: String,
    pub description: String,
    #[schema(example = "29.90")]
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
    pub subcategory: String,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub promotion_id: Option<Uuid>,
    pub active_promotion_id: Option<Uuid>,

    // Vem do LEFT JOIN com promotions (somente quando a promoção está ativa)
    pub promotion_discount: Option<Decimal>,

    // Calculado em Rust depois da leitura (ver `Product::priced`)
    #[sqlx(skip)]
    #[schema(example = "23.92")]
    pub final_price: Decimal,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductFilter {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Product {
    /// Preenche `final_price` a partir do desconto da promoção ativa.
    pub fn priced(mut self) -> Self {
        self.final_price = apply_discount(self.price, self.promotion_discount);
        self
    }

    pub fn primary_image(&self) -> Option<String> {
        self.images.first().cloned()
    }
}

/// Aplica um desconto percentual e arredonda para centavos.
pub fn apply_discount(price: Decimal, discount_percent: Option<Decimal>) -> Decimal {
    let discounted = match discount_percent {
        Some(pct) if pct > Decimal::ZERO => {
            let pct = pct.min(Decimal::ONE_HUNDRED);
            price * (Decimal::ONE_HUNDRED - pct) / Decimal::ONE_HUNDRED
        }
        _ => price,
    };
    discounted.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ---
// Validação Customizada
// ---
pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("not_negative".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "required"))]
    pub reference: String,

    #[validate(length(min = 1, message = "required"))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,

    #[validate(range(min = 0, message = "not_negative"))]
    #[serde(default)]
    pub stock: i32,

    #[validate(length(min = 1, message = "required"))]
    pub category: String,

    #[validate(length(min = 1, message = "required"))]
    pub subcategory: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub images: Vec<String>,
}

// PUT parcial: só os campos enviados são alterados
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, message = "required"))]
    pub reference: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_not_negative"))]
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "not_negative"))]
    pub stock: Option<i32>,
    #[validate(length(min = 1, message = "required"))]
    pub category: Option<String>,
    #[validate(length(min = 1, message = "required"))]
    pub subcategory: Option<String>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ImageUrlPayload {
    #[validate(length(min = 1, message = "required"))]
    pub url: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStockPayload {
    #[validate(range(min = 0, message = "not_negative"))]
    pub stock: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    pub fn order_by(self) -> &'static str {
        match self {
            ProductSort::Newest => " ORDER BY p.created_at DESC",
            ProductSort::PriceAsc => " ORDER BY p.price ASC, p.name ASC",
            ProductSort::PriceDesc => " ORDER BY p.price DESC, p.name ASC",
            ProductSort::Name => " ORDER BY p.name ASC",
        }
    }
}

// Filtros da busca de catálogo (query string)
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    // Lista separada por vírgulas: "verao,promo"
    pub tags: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
    pub on_sale: Option<bool>,
    #[param(inline)]
    pub sort: Option<ProductSort>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// Paginação simples (listas sem outros filtros)
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;

// Paginação normalizada: página começa em 1, limite entre 1 e MAX_PAGE_SIZE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        // Páginas absurdas viram um OFFSET enorme (lista vazia), nunca overflow
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn pages(&self, total: i64) -> i64 {
        if total <= 0 { 0 } else { (total + self.limit - 1) / self.limit }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            limit: request.limit,
            pages: request.pages(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn discount_is_applied_and_rounded_to_cents() {
        assert_eq!(apply_discount(dec("29.90"), Some(dec("20"))), dec("23.92"));
        assert_eq!(apply_discount(dec("10.00"), Some(dec("33"))), dec("6.70"));
        assert_eq!(apply_discount(dec("0.05"), Some(dec("50"))), dec("0.03"));
    }

    #[test]
    fn zero_discount_keeps_price_and_excess_is_capped() {
        assert_eq!(apply_discount(dec("19.99"), None), dec("19.99"));
        assert_eq!(apply_discount(dec("19.99"), Some(dec("0"))), dec("19.99"));
        assert_eq!(apply_discount(dec("19.99"), Some(dec("150"))), dec("0.00"));
    }

    #[test]
    fn page_request_is_clamped() {
        let req = PageRequest::new(Some(0), Some(1000));
        assert_eq!(req, PageRequest { page: 1, limit: MAX_PAGE_SIZE });
        let req = PageRequest::new(Some(3), None);
        assert_eq!(req.offset(), 24);
        assert_eq!(req.pages(25), 3);
        assert_eq!(req.pages(0), 0);
    }

    #[test]
    fn huge_page_saturates_offset() {
        let req = PageRequest::new(Some(i64::MAX), Some(100));
        assert_eq!(req.offset(), i64::MAX);
        assert_eq!(req.pages(10), 1);
    }

    #[test]
    fn tag_filter_splits_and_trims() {
        let filter = ProductFilter { tags: Some(" verao, ,promo ".into()), ..Default::default() };
        assert_eq!(filter.tag_list(), vec!["verao".to_string(), "promo".to_string()]);
        assert!(ProductFilter::default().tag_list().is_empty());
    }

    #[test]
    fn create_payload_rejects_negative_price() {
        let payload = CreateProductPayload {
            reference: "REF-1".into(),
            name: "Caneca".into(),
            description: String::new(),
            price: dec("-1"),
            stock: 3,
            category: "Casa".into(),
            subcategory: "Cozinha".into(),
            tags: vec![],
            images: vec![],
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
    }
}
