// src/services/oauth_service.rs

use serde::Deserialize;

use crate::common::error::AppError;

// Perfil devolvido pelo endpoint "userinfo" do Google (OpenID Connect)
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

// Resposta do endpoint "tokeninfo": para quem o token foi emitido
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub aud: Option<String>,
    pub azp: Option<String>,
}

/// Só aceita tokens emitidos para o nosso client id.
pub fn ensure_audience(info: &TokenInfo, client_id: &str) -> Result<(), AppError> {
    let issued_to = info.aud.as_deref().or(info.azp.as_deref());
    if issued_to != Some(client_id) {
        return Err(AppError::OAuthError("token emitido para outro cliente".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct OAuthService {
    http: reqwest::Client,
    userinfo_url: String,
    tokeninfo_url: String,
    client_id: Option<String>,
}

impl OAuthService {
    pub fn new(http: reqwest::Client, userinfo_url: String, tokeninfo_url: String, client_id: Option<String>) -> Self {
        if client_id.is_none() {
            tracing::warn!("⚠️ GOOGLE_CLIENT_ID ausente: a audiência dos tokens Google não será conferida");
        }
        Self { http, userinfo_url, tokeninfo_url, client_id }
    }

    async fn check_audience(&self, access_token: &str, client_id: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(&self.tokeninfo_url)
            .form(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|e| AppError::OAuthError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::OAuthError(format!("tokeninfo respondeu {}", response.status())));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| AppError::OAuthError(e.to_string()))?;
        ensure_audience(&info, client_id)
    }

    /// Troca o access token do cliente pelo perfil verificado no provedor.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, AppError> {
        if let Some(client_id) = self.client_id.as_deref() {
            self.check_audience(access_token, client_id).await?;
        }

        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::OAuthError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::OAuthError(format!("userinfo respondeu {}", response.status())));
        }

        let profile: GoogleProfile = response
            .json()
            .await
            .map_err(|e| AppError::OAuthError(e.to_string()))?;

        if !profile.email_verified {
            return Err(AppError::OAuthError("e-mail não verificado".into()));
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_parses_userinfo_payload() {
        let raw = r#"{"sub":"1098","email":"ana@example.com","email_verified":true,"given_name":"Ana","picture":"https://x/p.png"}"#;
        let profile: GoogleProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.sub, "1098");
        assert!(profile.email_verified);
        assert_eq!(profile.family_name, None);
    }

    #[test]
    fn token_for_another_client_is_rejected() {
        let ours = "123.apps.googleusercontent.com";
        let info: TokenInfo =
            serde_json::from_str(r#"{"aud":"999.apps.googleusercontent.com","scope":"email","expires_in":"3599"}"#)
                .unwrap();
        assert!(matches!(ensure_audience(&info, ours), Err(AppError::OAuthError(_))));

        let missing = TokenInfo { aud: None, azp: None };
        assert!(ensure_audience(&missing, ours).is_err());
    }

    #[test]
    fn token_for_our_client_is_accepted() {
        let ours = "123.apps.googleusercontent.com";
        let by_aud = TokenInfo { aud: Some(ours.into()), azp: None };
        let by_azp = TokenInfo { aud: None, azp: Some(ours.into()) };
        assert!(ensure_audience(&by_aud, ours).is_ok());
        assert!(ensure_audience(&by_azp, ours).is_ok());
    }

    #[tokio::test]
    async fn configured_client_id_checks_audience_before_userinfo() {
        let service = OAuthService::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/userinfo".into(),
            "http://127.0.0.1:9/tokeninfo".into(),
            Some("123.apps.googleusercontent.com".into()),
        );
        let err = service.fetch_profile("ya29.token").await.unwrap_err();
        match err {
            AppError::OAuthError(msg) => assert!(!msg.contains("userinfo")),
            other => panic!("erro inesperado: {other:?}"),
        }
    }
}
