// src/services/catalog_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CategoryRepository, ProductRepository, TagRepository},
    models::{
        category::{add_group, remove_group, Category, CreateCategoryPayload, SubcategoryGroup, UpdateCategoryPayload},
        product::{CreateProductPayload, Page, PageRequest, Product, ProductFilter, UpdateProductPayload},
        tag::{normalize_tag, ProductTag},
    },
};

#[derive(Clone)]
pub struct CatalogService {
    product_repo: ProductRepository,
    category_repo: CategoryRepository,
    tag_repo: TagRepository,
    pool: PgPool,
}

// Normaliza e remove duplicatas mantendo a ordem
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| normalize_tag(t)).filter(|t| !t.is_empty()) {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

impl CatalogService {
    pub fn new(
        product_repo: ProductRepository,
        category_repo: CategoryRepository,
        tag_repo: TagRepository,
        pool: PgPool,
    ) -> Self {
        Self { product_repo, category_repo, tag_repo, pool }
    }

    // ---
    // Produtos
    // ---

    pub async fn search_products(&self, filter: &ProductFilter) -> Result<Page<Product>, AppError> {
        let page = PageRequest::new(filter.page, filter.limit);
        let (items, total) = self.product_repo.search(filter, page).await?;
        Ok(Page::new(items, total, page))
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.product_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("product".into()))
    }

    pub async fn get_product_by_reference(&self, reference: &str) -> Result<Product, AppError> {
        self.product_repo
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("product".into()))
    }

    pub async fn create_product(&self, payload: &CreateProductPayload) -> Result<Product, AppError> {
        self.ensure_category_pair(&payload.category, &payload.subcategory).await?;
        let tags = normalize_tags(&payload.tags);
        self.ensure_known_tags(&tags).await?;

        let product = self.product_repo.create(payload, &tags).await?;
        tracing::info!("📦 Produto criado: {} ({})", product.reference, product.id);
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, payload: &UpdateProductPayload) -> Result<Product, AppError> {
        if payload.category.is_some() || payload.subcategory.is_some() {
            let current = self.get_product(id).await?;
            let category = payload.category.as_deref().unwrap_or(&current.category);
            let subcategory = payload.subcategory.as_deref().unwrap_or(&current.subcategory);
            self.ensure_category_pair(category, subcategory).await?;
        }

        let tags = payload.tags.as_deref().map(normalize_tags);
        if let Some(tags) = &tags {
            self.ensure_known_tags(tags).await?;
        }

        self.product_repo.update(id, payload, tags.as_deref()).await
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<(), AppError> {
        self.product_repo.delete(id).await?;
        tracing::info!("🗑️ Produto removido: {}", id);
        Ok(())
    }

    pub async fn set_stock(&self, id: Uuid, stock: i32) -> Result<Product, AppError> {
        if stock < 0 {
            return Err(AppError::InvalidQuantity);
        }
        self.product_repo.set_stock(id, stock).await
    }

    pub async fn add_image(&self, id: Uuid, url: &str) -> Result<Product, AppError> {
        self.product_repo.append_image(id, url).await
    }

    pub async fn remove_image(&self, id: Uuid, url: &str) -> Result<Product, AppError> {
        self.product_repo.remove_image(id, url).await
    }

    async fn ensure_category_pair(&self, category: &str, subcategory: &str) -> Result<(), AppError> {
        let found = self.category_repo.find_by_name(category).await?;
        match found {
            Some(cat) if cat.contains_subcategory(subcategory) => Ok(()),
            _ => Err(AppError::InvalidCategory(format!("{category} / {subcategory}"))),
        }
    }

    async fn ensure_known_tags(&self, tags: &[String]) -> Result<(), AppError> {
        let missing = self.tag_repo.missing(tags).await?;
        match missing.into_iter().next() {
            Some(tag) => Err(AppError::UnknownTag(tag)),
            None => Ok(()),
        }
    }

    // ---
    // Categorias
    // ---

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.category_repo.list().await
    }

    pub async fn get_category(&self, id: Uuid) -> Result<Category, AppError> {
        self.category_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("category".into()))
    }

    pub async fn create_category(&self, payload: &CreateCategoryPayload) -> Result<Category, AppError> {
        self.category_repo.create(payload.name.trim(), &payload.subcategories).await
    }

    /// Renomear a categoria também atualiza os produtos que a usam.
    pub async fn update_category(&self, id: Uuid, payload: &UpdateCategoryPayload) -> Result<Category, AppError> {
        let current = self.get_category(id).await?;
        let name = payload.name.as_deref().map(str::trim).unwrap_or(&current.name).to_string();
        let groups = payload.subcategories.clone().unwrap_or_else(|| current.subcategories.0.clone());

        let mut tx = self.pool.begin().await?;
        let updated = self.category_repo.update(&mut *tx, id, &name, &groups).await?;
        if name != current.name {
            let moved = self.product_repo.rename_category(&mut *tx, &current.name, &name).await?;
            tracing::info!("🏷️ Categoria renomeada: {} produtos atualizados", moved);
        }
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<(), AppError> {
        let category = self.get_category(id).await?;
        let in_use = self.product_repo.count_in_category(&category.name).await?;
        if in_use > 0 {
            tracing::warn!("Categoria {} removida com {} produtos associados", category.name, in_use);
        }
        self.category_repo.delete(id).await
    }

    pub async fn add_subcategory(&self, id: Uuid, group: SubcategoryGroup) -> Result<Category, AppError> {
        let category = self.get_category(id).await?;
        let mut groups = category.subcategories.0;
        let name = group.name.clone();
        if !add_group(&mut groups, group) {
            return Err(AppError::NameAlreadyExists(name));
        }
        self.category_repo.update(&self.pool, id, &category.name, &groups).await
    }

    pub async fn remove_subcategory(&self, id: Uuid, group_name: &str) -> Result<Category, AppError> {
        let category = self.get_category(id).await?;
        let mut groups = category.subcategories.0;
        if !remove_group(&mut groups, group_name) {
            return Err(AppError::ResourceNotFound("subcategory".into()));
        }
        self.category_repo.update(&self.pool, id, &category.name, &groups).await
    }

    // ---
    // Tags
    // ---

    pub async fn list_tags(&self) -> Result<Vec<ProductTag>, AppError> {
        self.tag_repo.list().await
    }

    pub async fn create_tag(&self, name: &str) -> Result<ProductTag, AppError> {
        self.tag_repo.create(&normalize_tag(name)).await
    }

    pub async fn rename_tag(&self, id: Uuid, name: &str) -> Result<ProductTag, AppError> {
        let current = self
            .tag_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("tag".into()))?;
        let name = normalize_tag(name);

        let mut tx = self.pool.begin().await?;
        let renamed = self.tag_repo.rename(&mut *tx, id, &name).await?;
        self.product_repo.rename_tag(&mut *tx, &current.name, &name).await?;
        tx.commit().await?;
        Ok(renamed)
    }

    pub async fn delete_tag(&self, id: Uuid) -> Result<(), AppError> {
        let current = self
            .tag_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("tag".into()))?;

        let mut tx = self.pool.begin().await?;
        self.tag_repo.delete(&mut *tx, id).await?;
        let touched = self.product_repo.remove_tag(&mut *tx, &current.name).await?;
        tx.commit().await?;
        tracing::info!("🏷️ Tag '{}' removida de {} produtos", current.name, touched);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_normalized_and_deduplicated() {
        let tags = vec!["Verão".to_string(), " verão ".to_string(), "".to_string(), "Promo".to_string()];
        assert_eq!(normalize_tags(&tags), vec!["verão".to_string(), "promo".to_string()]);
    }
}
