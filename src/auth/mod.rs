pub mod credentials;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{validate_not_blank, User};

// Re-export necessary items
pub use credentials::{CredentialStore, ProfileChanges};
pub use extractors::{AuthenticatedUser, BearerToken};
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenError, TokenService};

/// Represents the payload for a new user registration request.
///
/// Absent fields deserialize as empty so they are reported per field by validation.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(
        custom(function = "validate_not_blank", message = "Name is required"),
        length(max = 255, message = "Name must be at most 255 characters")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of `PUT /api/users/profile`. Email is deliberately absent.
///
/// A new `password` is only accepted together with the correct `currentPassword`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(
        custom(function = "validate_not_blank", message = "Name is required"),
        length(max = 255, message = "Name must be at most 255 characters")
    )]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 2048, message = "Avatar must be at most 2048 characters"))]
    pub avatar: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    pub current_password: Option<String>,
}

/// Response after successful registration or login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_login_request_validation() {
        let valid_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_login.validate().is_ok());

        let invalid_email_login = LoginRequest {
            email: "testexample.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(invalid_email_login.validate().is_err());

        let empty_password_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "".to_string(),
        };
        assert!(empty_password_login.validate().is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let valid_register = RegisterRequest {
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_register.validate().is_ok());

        let blank_name_register = RegisterRequest {
            name: "   ".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(blank_name_register.validate().is_err());

        let long_name_register = RegisterRequest {
            name: "n".repeat(256),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        let errors = long_name_register.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));

        let short_password_register = RegisterRequest {
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password: "12345".to_string(),
        };
        let errors = short_password_register.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_update_profile_request_validation() {
        assert!(UpdateProfileRequest::default().validate().is_ok());

        let blank_name = UpdateProfileRequest {
            name: Some("".into()),
            ..Default::default()
        };
        assert!(blank_name.validate().is_err());

        let long_name = UpdateProfileRequest {
            name: Some("n".repeat(256)),
            ..Default::default()
        };
        assert!(long_name.validate().is_err());

        let short_password = UpdateProfileRequest {
            password: Some("abc".into()),
            current_password: Some("secret123".into()),
            ..Default::default()
        };
        assert!(short_password.validate().is_err());
    }
}
