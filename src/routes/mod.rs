pub mod auth;
pub mod health;
pub mod index;
pub mod tasks;
pub mod users;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::auth::AuthMiddleware;
use crate::error::AppError;

/// Registers every route of the API.
///
/// Expects `web::Data<AppState>` to be registered on the `App`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(index::index)
        .service(
            web::scope("/api")
                .service(health::health)
                .service(
                    web::scope("/auth")
                        .service(auth::register)
                        .service(auth::login)
                        .service(auth::profile),
                )
                .service(
                    web::scope("/tasks")
                        .wrap(AuthMiddleware)
                        .service(tasks::get_tasks)
                        .service(tasks::create_task)
                        .service(tasks::update_task)
                        .service(tasks::delete_task),
                )
                .service(
                    web::scope("/users")
                        .wrap(AuthMiddleware)
                        .service(users::update_profile),
                ),
        )
        .default_service(web::route().to(not_found));
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({
        "success": false,
        "message": "API endpoint not found"
    }))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        log::debug!("Rejected body for {} {}: {}", req.method(), req.path(), err);
        AppError::BadRequest("Invalid request body".into()).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| {
        log::debug!("Rejected query for {} {}: {}", req.method(), req.path(), err);
        AppError::BadRequest("Invalid query string".into()).into()
    })
}

// Ids that do not parse cannot name an existing resource.
fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::NotFound("Task not found".into()).into())
}
