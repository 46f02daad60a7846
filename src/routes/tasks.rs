use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{TaskInput, TaskQuery, TaskUpdate},
    state::AppState,
};

/// Lists the authenticated user's tasks, newest first.
///
/// ## Query Parameters:
/// - `status`: `pending`, `in-progress`, `completed` or `all`.
/// - `priority`: `low`, `medium`, `high` or `all`.
/// - `search`: case-insensitive substring of title or description.
///
/// ## Responses:
/// - `200 OK`: JSON array of tasks.
/// - `400 Bad Request`: Unknown status or priority value.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = state.tasks.list(user.0.id, query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
///
/// Any owner sent by the client is ignored.
///
/// ## Responses:
/// - `201 Created`: The created task.
/// - `400 Bad Request`: Validation failure, e.g. a blank title.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .create(user.0.id, task_data.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(task))
}

/// Partially updates a task.
///
/// ## Responses:
/// - `200 OK`: The updated task.
/// - `403 Forbidden`: The task belongs to another user.
/// - `404 Not Found`: No task with that id.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .update(user.0.id, task_id.into_inner(), task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task.
///
/// ## Responses:
/// - `200 OK`: `{ "message": "Task removed successfully" }`.
/// - `403 Forbidden`: The task belongs to another user.
/// - `404 Not Found`: No task with that id.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    state.tasks.delete(user.0.id, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Task removed successfully" })))
}
