//! Task operations on behalf of an authenticated owner.
//!
//! The store has no notion of ownership; every rule about who may see or
//! change a task lives here.

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    NewTask, Task, TaskChanges, TaskFilter, TaskInput, TaskPriority, TaskQuery, TaskStatus,
    TaskUpdate,
};
use crate::store::TaskStore;

const ALL: &str = "all";

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// The owner's tasks, newest first, narrowed by the optional query.
    ///
    /// A status or priority that names no known value matches nothing.
    pub async fn list(&self, owner_id: Uuid, query: TaskQuery) -> Result<Vec<Task>, AppError> {
        let (Some(status), Some(priority)) = (
            parse_filter::<TaskStatus>(query.status),
            parse_filter::<TaskPriority>(query.priority),
        ) else {
            return Ok(Vec::new());
        };

        let filter = TaskFilter {
            owner_id: Some(owner_id),
            status,
            priority,
            search: query
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        };
        Ok(self.store.find(&filter).await?)
    }

    /// Creates a task owned by `owner_id`, whatever the input claims.
    pub async fn create(&self, owner_id: Uuid, input: TaskInput) -> Result<Task, AppError> {
        input.validate()?;
        let task = self.store.create(NewTask::from_input(input, owner_id)).await?;
        log::debug!("Task {} created by {}", task.id, owner_id);
        Ok(task)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        task_id: Uuid,
        update: TaskUpdate,
    ) -> Result<Task, AppError> {
        self.owned_task(owner_id, task_id).await?;
        update.validate()?;

        self.store
            .update(task_id, TaskChanges::from(update))
            .await?
            .ok_or_else(task_not_found)
    }

    pub async fn delete(&self, owner_id: Uuid, task_id: Uuid) -> Result<(), AppError> {
        self.owned_task(owner_id, task_id).await?;

        if !self.store.delete(task_id).await? {
            return Err(task_not_found());
        }
        log::debug!("Task {} deleted by {}", task_id, owner_id);
        Ok(())
    }

    /// Loads `task_id`, failing with `NotFound` if it does not exist and
    /// `Forbidden` if it belongs to someone else.
    async fn owned_task(&self, owner_id: Uuid, task_id: Uuid) -> Result<Task, AppError> {
        let task = self
            .store
            .find_by_id(task_id)
            .await?
            .ok_or_else(task_not_found)?;

        if task.owner_id != owner_id {
            log::warn!("User {} attempted to modify task {} they do not own", owner_id, task_id);
            return Err(AppError::Forbidden("Not authorized".into()));
        }
        Ok(task)
    }
}

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// `None`, empty and `all` mean "no filter" (`Some(None)`). A value naming no
/// variant yields `None`.
fn parse_filter<T: std::str::FromStr>(raw: Option<String>) -> Option<Option<T>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some(ALL) => Some(None),
        Some(value) => value.parse::<T>().ok().map(Some),
    }
}
