use actix_web::{put, web, HttpResponse, Responder};
use serde_json::json;

use crate::{
    auth::{AuthenticatedUser, UpdateProfileRequest},
    error::AppError,
    state::AppState,
};

/// Updates the authenticated user's name, bio, avatar or password.
#[put("/profile")]
pub async fn update_profile(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    profile_data: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, AppError> {
    let updated = state
        .auth
        .update_profile(&user.0, profile_data.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Profile updated successfully!",
        "user": updated
    })))
}
