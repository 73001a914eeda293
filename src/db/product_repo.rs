// src/db/product_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::cart::LineItem,
    models::product::{CreateProductPayload, PageRequest, Product, ProductFilter, UpdateProductPayload},
};

// A promoção só entra no JOIN através do cache `active_promotion_id`
const SELECT_PRODUCT: &str = "SELECT p.*, pr.discount_percent AS promotion_discount \
     FROM products p LEFT JOIN promotions pr ON pr.id = p.active_promotion_id";

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

fn map_unique(e: sqlx::Error, reference: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() && db_err.constraint() == Some("products_reference_key") {
            return AppError::ReferenceAlreadyExists(reference.to_string());
        }
    }
    e.into()
}

// Filtros compartilhados entre a contagem e a listagem
fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a ProductFilter, tags: &'a [String]) {
    qb.push(" WHERE TRUE");

    if let Some(keyword) = filter.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        let pattern = format!("%{keyword}%");
        qb.push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.reference ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        qb.push(" AND p.category = ").push_bind(category);
    }
    if let Some(subcategory) = filter.subcategory.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND p.subcategory = ").push_bind(subcategory);
    }
    if !tags.is_empty() {
        qb.push(" AND p.tags && ").push_bind(tags);
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND p.price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND p.price <= ").push_bind(max);
    }
    if filter.in_stock == Some(true) {
        qb.push(" AND p.stock > 0");
    }
    if filter.on_sale == Some(true) {
        qb.push(" AND p.active_promotion_id IS NOT NULL");
    }
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ---
    // Leitura
    // ---

    pub async fn search(&self, filter: &ProductFilter, page: PageRequest) -> Result<(Vec<Product>, i64), AppError> {
        let tags = filter.tag_list();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products p");
        push_filters(&mut count, filter, &tags);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut list = QueryBuilder::<Postgres>::new(SELECT_PRODUCT);
        push_filters(&mut list, filter, &tags);
        list.push(filter.sort.unwrap_or_default().order_by());
        list.push(" LIMIT ").push_bind(page.limit);
        list.push(" OFFSET ").push_bind(page.offset());

        let products = list
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Product::priced)
            .collect();

        Ok((products, total))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product.map(Product::priced))
    }

    pub async fn find_by_reference(&self, reference: &str) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE p.reference = $1"))
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product.map(Product::priced))
    }

    pub async fn find_many<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let products = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE p.id = ANY($1)"))
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(products.into_iter().map(Product::priced).collect())
    }

    /// Trava as linhas dos produtos até o fim da transação.
    pub async fn find_for_update<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE p.id = ANY($1) ORDER BY p.id FOR UPDATE OF p"
        ))
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(products.into_iter().map(Product::priced).collect())
    }

    // ---
    // Escrita
    // ---

    pub async fn create(&self, payload: &CreateProductPayload, tags: &[String]) -> Result<Product, AppError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO products (reference, name, description, price, stock, category, subcategory, tags, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&payload.reference)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(payload.stock)
        .bind(&payload.category)
        .bind(&payload.subcategory)
        .bind(tags)
        .bind(&payload.images)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, &payload.reference))?;

        self.get(id).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: &UpdateProductPayload,
        tags: Option<&[String]>,
    ) -> Result<Product, AppError> {
        let reference = payload.reference.clone().unwrap_or_default();
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE products SET
                reference = COALESCE($2, reference),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                stock = COALESCE($6, stock),
                category = COALESCE($7, category),
                subcategory = COALESCE($8, subcategory),
                tags = COALESCE($9, tags),
                images = COALESCE($10, images),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(payload.reference.as_deref())
        .bind(payload.name.as_deref())
        .bind(payload.description.as_deref())
        .bind(payload.price)
        .bind(payload.stock)
        .bind(payload.category.as_deref())
        .bind(payload.subcategory.as_deref())
        .bind(tags)
        .bind(payload.images.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique(e, &reference))?;

        match updated {
            Some(id) => self.get(id).await,
            None => Err(AppError::ResourceNotFound("product".into())),
        }
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("product".into()));
        }
        Ok(())
    }

    pub async fn set_stock(&self, id: Uuid, stock: i32) -> Result<Product, AppError> {
        let result = sqlx::query("UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(stock)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("product".into()));
        }
        self.get(id).await
    }

    /// Chamado com a linha já travada (FOR UPDATE) e o estoque conferido.
    pub async fn decrement_stock<'e, E>(&self, executor: E, line: &LineItem) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result =
            sqlx::query("UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1 AND stock >= $2")
                .bind(line.product_id)
                .bind(line.quantity)
                .execute(executor)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InsufficientStock {
                product: line.name.clone(),
                available: line.stock,
            });
        }
        Ok(())
    }

    // Produtos apagados depois do pedido simplesmente não recebem o estoque de volta
    pub async fn restore_stock<'e, E>(&self, executor: E, id: Uuid, quantity: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn append_image(&self, id: Uuid, url: &str) -> Result<Product, AppError> {
        let result = sqlx::query(
            "UPDATE products SET images = array_append(images, $2), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(url)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("product".into()));
        }
        self.get(id).await
    }

    pub async fn remove_image(&self, id: Uuid, url: &str) -> Result<Product, AppError> {
        let result = sqlx::query(
            "UPDATE products SET images = array_remove(images, $2), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(url)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("product".into()));
        }
        self.get(id).await
    }

    // ---
    // Tags e categorias (manutenção em massa)
    // ---

    pub async fn rename_tag<'e, E>(&self, executor: E, old: &str, new: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE products SET tags = array_replace(tags, $1, $2), updated_at = NOW() WHERE $1 = ANY(tags)",
        )
        .bind(old)
        .bind(new)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn remove_tag<'e, E>(&self, executor: E, tag: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE products SET tags = array_remove(tags, $1), updated_at = NOW() WHERE $1 = ANY(tags)",
        )
        .bind(tag)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn rename_category<'e, E>(&self, executor: E, old: &str, new: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE products SET category = $2, updated_at = NOW() WHERE category = $1")
            .bind(old)
            .bind(new)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_in_category(&self, category: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category = $1")
            .bind(category)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // ---
    // Promoções
    // ---

    pub async fn attach_promotion<'e, E>(
        &self,
        executor: E,
        promotion_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE products SET promotion_id = $1, updated_at = NOW() WHERE id = ANY($2)",
        )
        .bind(promotion_id)
        .bind(product_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn detach_promotion<'e, E>(
        &self,
        executor: E,
        promotion_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE products SET promotion_id = NULL, active_promotion_id = NULL, updated_at = NOW()
            WHERE promotion_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(promotion_id)
        .bind(product_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Reconstrói o cache `active_promotion_id` a partir de `promotions.is_active`.
    pub async fn sync_active_promotions<'e, E>(&self, executor: E) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE products p SET
                active_promotion_id = CASE WHEN pr.is_active THEN pr.id ELSE NULL END,
                updated_at = NOW()
            FROM (
                SELECT p2.id AS product_id, pr2.id, COALESCE(pr2.is_active, FALSE) AS is_active
                FROM products p2 LEFT JOIN promotions pr2 ON pr2.id = p2.promotion_id
            ) pr
            WHERE p.id = pr.product_id
              AND p.active_promotion_id IS DISTINCT FROM (CASE WHEN pr.is_active THEN pr.id ELSE NULL END)
            "#,
        )
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_by_promotion(&self, promotion_id: Uuid) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE p.promotion_id = $1 ORDER BY p.name"
        ))
        .bind(promotion_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products.into_iter().map(Product::priced).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Product, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("product".into()))
    }
}
