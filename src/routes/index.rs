use actix_web::{get, HttpResponse, Responder};
use serde_json::json;

/// Describes the API surface.
#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "TaskFlow Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": {
                "register": "POST /api/auth/register",
                "login": "POST /api/auth/login",
                "profile": "GET /api/auth/profile"
            },
            "tasks": {
                "get": "GET /api/tasks",
                "create": "POST /api/tasks",
                "update": "PUT /api/tasks/:id",
                "delete": "DELETE /api/tasks/:id"
            },
            "users": {
                "update": "PUT /api/users/profile"
            },
            "health": "GET /api/health"
        }
    }))
}
