pub mod task;
pub mod user;

use std::borrow::Cow;
use validator::ValidationError;

pub use task::{
    NewTask, Task, TaskChanges, TaskFilter, TaskInput, TaskPriority, TaskQuery, TaskStatus,
    TaskUpdate,
};
pub use user::{normalize_email, NewUser, Profile, User, UserChanges};

/// Rejects strings that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::from("must not be empty"));
        return Err(error);
    }
    Ok(())
}
