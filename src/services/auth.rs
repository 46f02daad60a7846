//! Registration, login and profile operations.
//!
//! Orchestrates the [`CredentialStore`] and [`TokenService`]. Login failures
//! never reveal whether the email or the password was wrong.

use validator::Validate;

use crate::auth::{
    CredentialStore, LoginRequest, ProfileChanges, RegisterRequest, TokenService,
    UpdateProfileRequest,
};
use crate::error::AppError;
use crate::models::User;

/// The single message used for every failed login.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Clone)]
pub struct AuthService {
    credentials: CredentialStore,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(credentials: CredentialStore, tokens: TokenService) -> Self {
        Self {
            credentials,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Creates the account and returns a fresh token for it.
    pub async fn register(&self, request: RegisterRequest) -> Result<(String, User), AppError> {
        request.validate()?;

        let user = self
            .credentials
            .create(&request.name, &request.email, &request.password)
            .await?;
        let token = self.tokens.issue(user.id)?;

        log::info!("User registered: {}", user.email);
        Ok((token, user))
    }

    pub async fn login(&self, request: LoginRequest) -> Result<(String, User), AppError> {
        request.validate()?;

        let verified = self
            .credentials
            .verify_login(&request.email, &request.password)
            .await?;
        let user = match verified {
            Some(user) => user,
            None => {
                log::debug!("Rejected login attempt");
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
            }
        };

        let token = self.tokens.issue(user.id)?;
        log::info!("User logged in: {}", user.email);
        Ok((token, user))
    }

    /// Resolves a token to an existing user.
    ///
    /// A valid token whose subject no longer exists is still `Unauthorized`.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.tokens.verify(token)?;
        self.credentials
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Not authorized, user not found".into()))
    }

    /// Like [`authenticate`](Self::authenticate), but a vanished subject is `NotFound`.
    pub async fn profile(&self, token: &str) -> Result<User, AppError> {
        let claims = self.tokens.verify(token)?;
        self.credentials
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Applies name/bio/avatar changes and, when requested, a password change.
    pub async fn update_profile(
        &self,
        user: &User,
        request: UpdateProfileRequest,
    ) -> Result<User, AppError> {
        request.validate()?;

        if let Some(password) = &request.password {
            let current = request.current_password.as_deref().ok_or_else(|| {
                AppError::invalid_field(
                    "currentPassword",
                    "Current password is required to set a new password",
                )
            })?;
            if !self.credentials.matches(user, current).await? {
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
            }
            self.credentials.set_password(user.id, password).await?;
            log::info!("Password changed for user {}", user.id);
        }

        let changes = ProfileChanges {
            name: request.name,
            bio: request.bio,
            avatar: request.avatar,
        };
        self.credentials
            .update_profile(user.id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryUserStore, UserStore};
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn service_with(users: Arc<dyn UserStore>) -> AuthService {
        AuthService::new(
            CredentialStore::new(users, 4),
            TokenService::new("auth-service-test-secret", Duration::days(30)),
        )
    }

    fn service() -> AuthService {
        service_with(Arc::new(MemoryUserStore::new()))
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Ada".into(),
            email: email.into(),
            password: "secret123".into(),
        }
    }

    #[actix_rt::test]
    async fn test_register_then_login_resolves_same_user() {
        let auth = service();
        let (_, registered) = auth
            .register(register_request("ada@example.com"))
            .await
            .unwrap();

        let (token, logged_in) = auth
            .login(LoginRequest {
                email: "ada@example.com".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap();

        assert_eq!(logged_in.id, registered.id);
        let resolved = auth.authenticate(&token).await.unwrap();
        assert_eq!(resolved.id, registered.id);
    }

    #[actix_rt::test]
    async fn test_duplicate_registration_creates_no_second_user() {
        let users = Arc::new(MemoryUserStore::new());
        let auth = service_with(users.clone());
        let (_, first) = auth
            .register(register_request("ada@example.com"))
            .await
            .unwrap();

        let result = auth.register(register_request("Ada@Example.com")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let stored = users.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
    }

    #[actix_rt::test]
    async fn test_wrong_password_and_unknown_email_look_identical() {
        let auth = service();
        auth.register(register_request("ada@example.com"))
            .await
            .unwrap();

        let wrong_password = auth
            .login(LoginRequest {
                email: "ada@example.com".into(),
                password: "not-it".into(),
            })
            .await
            .unwrap_err();
        let unknown_email = auth
            .login(LoginRequest {
                email: "nobody@example.com".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AppError::Unauthorized(ref m) if m == INVALID_CREDENTIALS));
    }

    #[actix_rt::test]
    async fn test_token_for_missing_user() {
        let auth = service();
        let token = auth.tokens().issue(uuid::Uuid::new_v4()).unwrap();

        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(auth.profile(&token).await, Err(AppError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn test_password_change_requires_current_password() {
        let auth = service();
        let (_, user) = auth
            .register(register_request("ada@example.com"))
            .await
            .unwrap();

        let missing_current = auth
            .update_profile(
                &user,
                UpdateProfileRequest {
                    password: Some("brand-new".into()),
                    ..Default::default()
                },
            )
            .await;
        match missing_current {
            Err(AppError::ValidationError(errors)) => assert_eq!(errors[0].field, "currentPassword"),
            other => panic!("expected a validation error, got {:?}", other),
        }

        let wrong_current = auth
            .update_profile(
                &user,
                UpdateProfileRequest {
                    password: Some("brand-new".into()),
                    current_password: Some("guess".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(wrong_current, Err(AppError::Unauthorized(_))));

        auth.update_profile(
            &user,
            UpdateProfileRequest {
                password: Some("brand-new".into()),
                current_password: Some("secret123".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(auth
            .login(LoginRequest {
                email: "ada@example.com".into(),
                password: "brand-new".into(),
            })
            .await
            .is_ok());
    }
}
