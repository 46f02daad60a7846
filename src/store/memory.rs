use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, TaskStore, UserStore};
use crate::models::{NewTask, NewUser, Profile, Task, TaskChanges, TaskFilter, User, UserChanges};

/// Process-local user store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            profile: Profile::default(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(user.clone()));
        }

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(bio) = changes.bio {
            user.profile.bio = bio;
        }
        if let Some(avatar) = changes.avatar {
            user.profile.avatar = avatar;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

/// Process-local task store.
///
/// Each record carries an insertion sequence so tasks created within the same
/// clock tick still list newest-first.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    inner: RwLock<TaskTable>,
}

#[derive(Debug, Default)]
struct TaskTable {
    next_seq: u64,
    rows: HashMap<Uuid, (u64, Task)>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn find(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let table = self.inner.read().await;
        let mut matching: Vec<&(u64, Task)> = table
            .rows
            .values()
            .filter(|(_, task)| filter.matches(task))
            .collect();
        matching.sort_by(|(seq_a, a), (seq_b, b)| {
            b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
        });
        Ok(matching.into_iter().map(|(_, task)| task.clone()).collect())
    }

    async fn create(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let mut table = self.inner.write().await;
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: new_task.title,
            description: new_task.description,
            status: new_task.status,
            priority: new_task.priority,
            due_date: new_task.due_date,
            owner_id: new_task.owner_id,
            created_at: now,
            updated_at: now,
        };
        let seq = table.next_seq;
        table.next_seq += 1;
        table.rows.insert(task.id, (seq, task.clone()));
        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let table = self.inner.read().await;
        Ok(table.rows.get(&id).map(|(_, task)| task.clone()))
    }

    async fn update(&self, id: Uuid, changes: TaskChanges) -> Result<Option<Task>, StoreError> {
        let mut table = self.inner.write().await;
        Ok(table.rows.get_mut(&id).map(|(_, task)| {
            changes.apply_to(task);
            task.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }
}
