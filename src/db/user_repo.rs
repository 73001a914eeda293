// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{UpdateProfilePayload, User, UserRole},
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

// Converte violação de chave única em um erro mais amigável
fn map_unique(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
            return AppError::EmailAlreadyExists;
        }
    }
    e.into()
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // Busca um usuário pelo seu e-mail (comparação sem diferenciar maiúsculas)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE google_id = $1")
            .bind(google_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Cria um novo usuário no banco de dados
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        role: UserRole,
        email: &str,
        password_hash: Option<&str>,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (role, email, password_hash, first_name, last_name)
            VALUES ($1, lower($2), $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(role)
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(executor)
        .await
        .map_err(map_unique)
    }

    // Conta criada a partir do provedor OAuth (sem senha)
    pub async fn create_oauth_user(
        &self,
        email: &str,
        google_id: &str,
        first_name: &str,
        last_name: &str,
        avatar_url: Option<&str>,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (role, email, google_id, first_name, last_name, avatar_url)
            VALUES ('BUYER', lower($1), $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(google_id)
        .bind(first_name)
        .bind(last_name)
        .bind(avatar_url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique)
    }

    pub async fn link_google_id(&self, user_id: Uuid, google_id: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET google_id = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(google_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    // Atualização parcial: COALESCE mantém o valor atual quando o campo não veio
    pub async fn update_profile(&self, user_id: Uuid, payload: &UpdateProfilePayload) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                city = COALESCE($6, city),
                postal_code = COALESCE($7, postal_code),
                country = COALESCE($8, country),
                avatar_url = COALESCE($9, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(payload.first_name.as_deref())
        .bind(payload.last_name.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.address.as_deref())
        .bind(payload.city.as_deref())
        .bind(payload.postal_code.as_deref())
        .bind(payload.country.as_deref())
        .bind(payload.avatar_url.as_deref())
        .fetch_optional(&self.pool)
        .await?;
        user.ok_or(AppError::UserNotFound)
    }

    pub async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_active(&self, user_id: Uuid, active: bool) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?;
        user.ok_or(AppError::UserNotFound)
    }

    pub async fn delete(&self, user_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    pub async fn list(
        &self,
        role: Option<UserRole>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(role)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE ($1::user_role IS NULL OR role = $1)",
        )
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok((users, total))
    }
}
