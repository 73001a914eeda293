// src/services/user_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{
        auth::{CreateAdminPayload, UpdateProfilePayload, User, UserRole},
        product::{Page, PageRequest},
    },
    services::auth::{hash_password, verify_password},
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    pub fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    pub async fn update_profile(&self, user_id: Uuid, payload: &UpdateProfilePayload) -> Result<User, AppError> {
        self.user_repo.update_profile(user_id, payload).await
    }

    pub async fn change_password(&self, user: &User, current: &str, new: &str) -> Result<(), AppError> {
        let Some(password_hash) = user.password_hash.as_deref() else {
            return Err(AppError::InvalidCredentials);
        };
        if !verify_password(current, password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let hashed = hash_password(new).await?;
        self.user_repo.update_password(user.id, &hashed).await
    }

    // ---
    // Back-office
    // ---

    pub async fn list_users(&self, role: Option<UserRole>, page: PageRequest) -> Result<Page<User>, AppError> {
        let (users, total) = self.user_repo.list(role, page.limit, page.offset()).await?;
        Ok(Page::new(users, total, page))
    }

    pub async fn create_admin(&self, payload: &CreateAdminPayload) -> Result<User, AppError> {
        let hashed = hash_password(&payload.password).await?;
        let admin = self
            .user_repo
            .create_user(
                self.user_repo.pool(),
                UserRole::Admin,
                &payload.email,
                Some(&hashed),
                payload.first_name.trim(),
                payload.last_name.trim(),
            )
            .await?;
        tracing::info!("🔑 Administrador criado: {}", admin.id);
        Ok(admin)
    }

    pub async fn set_active(&self, acting: &User, target_id: Uuid, active: bool) -> Result<User, AppError> {
        ensure_not_self(acting, target_id)?;
        self.user_repo.set_active(target_id, active).await
    }

    pub async fn delete_user(&self, acting: &User, target_id: Uuid) -> Result<(), AppError> {
        ensure_not_self(acting, target_id)?;
        self.user_repo.delete(target_id).await?;
        tracing::info!("🗑️ Usuário {} removido por {}", target_id, acting.id);
        Ok(())
    }
}

// Um administrador não pode desativar nem apagar a própria conta
fn ensure_not_self(acting: &User, target_id: Uuid) -> Result<(), AppError> {
    if acting.id == target_id {
        return Err(AppError::SelfModification);
    }
    Ok(())
}
