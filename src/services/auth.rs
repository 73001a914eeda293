// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User, UserRole},
    services::oauth_service::GoogleProfile,
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    ttl_days: i64,
}

// Hashing e verificação são caros: rodam fora do executor assíncrono
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

pub fn create_token(user: &User, secret: &str, ttl_days: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::days(ttl_days);

    let claims = Claims {
        sub: user.id,
        role: user.role,
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))?)
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &Validation::default())
        .map_err(|_| AppError::InvalidToken)?;
    Ok(token_data.claims)
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, ttl_days: i64) -> Self {
        Self { user_repo, jwt_secret, ttl_days }
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        create_token(user, &self.jwt_secret, self.ttl_days)
    }

    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<(String, User), AppError> {
        let hashed_password = hash_password(password).await?;

        let user = self
            .user_repo
            .create_user(
                self.user_repo.pool(),
                UserRole::Buyer,
                email,
                Some(&hashed_password),
                first_name.trim(),
                last_name.trim(),
            )
            .await?;

        tracing::info!("👤 Novo comprador registrado: {}", user.id);
        let token = self.issue_token(&user)?;
        Ok((token, user))
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<(String, User), AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Contas criadas só pelo Google não têm senha
        let Some(password_hash) = user.password_hash.as_deref() else {
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AppError::AccountDisabled);
        }

        let token = self.issue_token(&user)?;
        Ok((token, user))
    }

    /// Entra (ou cria a conta) a partir do perfil já verificado no provedor.
    pub async fn google_login(&self, profile: &GoogleProfile) -> Result<(String, User), AppError> {
        let user = match self.user_repo.find_by_google_id(&profile.sub).await? {
            Some(user) => user,
            None => match self.user_repo.find_by_email(&profile.email).await? {
                Some(existing) => self.user_repo.link_google_id(existing.id, &profile.sub).await?,
                None => {
                    let user = self
                        .user_repo
                        .create_oauth_user(
                            &profile.email,
                            &profile.sub,
                            profile.given_name.as_deref().unwrap_or_default(),
                            profile.family_name.as_deref().unwrap_or_default(),
                            profile.picture.as_deref(),
                        )
                        .await?;
                    tracing::info!("👤 Conta criada via Google: {}", user.id);
                    user
                }
            },
        };

        if !user.is_active {
            return Err(AppError::AccountDisabled);
        }

        let token = self.issue_token(&user)?;
        Ok((token, user))
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = decode_token(token, &self.jwt_secret)?;

        // Usuário apagado depois da emissão: o token deixa de valer
        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    /// Cria o administrador inicial quando configurado e ainda inexistente.
    pub async fn ensure_admin_account(&self, email: &str, password: &str) -> Result<bool, AppError> {
        if self.user_repo.find_by_email(email).await?.is_some() {
            return Ok(false);
        }

        let hashed_password = hash_password(password).await?;
        let admin = self
            .user_repo
            .create_user(self.user_repo.pool(), UserRole::Admin, email, Some(&hashed_password), "Admin", "")
            .await?;
        tracing::info!("🔑 Administrador inicial criado: {}", admin.email);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            role,
            email: "ana@example.com".into(),
            password_hash: None,
            google_id: None,
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            phone: None,
            address: None,
            city: None,
            postal_code: None,
            country: None,
            avatar_url: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trip_keeps_subject_and_role() {
        let admin = user(UserRole::Admin);
        let token = create_token(&admin, "segredo", 1).unwrap();
        let claims = decode_token(&token, "segredo").unwrap();
        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_token(&user(UserRole::Buyer), "segredo", 1).unwrap();
        assert!(matches!(decode_token(&token, "outro"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token(&user(UserRole::Buyer), "segredo", -2).unwrap();
        assert!(matches!(decode_token(&token, "segredo"), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hashed = hash_password("hunter22").await.unwrap();
        assert!(verify_password("hunter22", &hashed).await.unwrap());
        assert!(!verify_password("hunter23", &hashed).await.unwrap());
    }
}
