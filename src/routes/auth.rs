use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;

use crate::{
    auth::{AuthResponse, BearerToken, LoginRequest, RegisterRequest},
    error::AppError,
    state::AppState,
};

/// Register a new user
///
/// Creates a new user account and returns an authentication token.
///
/// ## Responses:
/// - `201 Created`: `AuthResponse` with the token and the new user.
/// - `400 Bad Request`: Validation failure or the email is already registered.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let (token, user) = state.auth.register(register_data.into_inner()).await?;

    Ok(HttpResponse::Created().json(AuthResponse {
        success: true,
        message: "User registered successfully!".into(),
        token,
        user,
    }))
}

/// Login user
///
/// Authenticates a user and returns an authentication token. Unknown emails
/// and wrong passwords are answered identically with 401.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let (token, user) = state.auth.login(login_data.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        success: true,
        message: "Login successful!".into(),
        token,
        user,
    }))
}

/// Current user's profile.
///
/// Verifies the bearer token itself rather than relying on `AuthMiddleware`,
/// so a token whose user has been removed yields 404.
#[get("/profile")]
pub async fn profile(
    state: web::Data<AppState>,
    token: BearerToken,
) -> Result<impl Responder, AppError> {
    let user = state.auth.profile(&token.0).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": user
    })))
}
