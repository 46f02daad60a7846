use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::time::Duration;
use uuid::Uuid;

use super::{StoreError, TaskStore, UserStore};
use crate::models::{NewTask, NewUser, Task, TaskChanges, TaskFilter, User, UserChanges};

lazy_static! {
    // LIKE metacharacters that must match literally in a search term.
    static ref LIKE_META: Regex = Regex::new(r"([%_\\])").expect("static regex");
}

const USER_COLUMNS: &str = "id, name, email, password_hash, bio, avatar, created_at, updated_at";

const TASK_COLUMNS: &str =
    "id, title, description, status, priority, due_date, owner_id, created_at, updated_at";

/// Opens a connection pool and applies pending migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;

    log::info!("Connected to database, running migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Turns arbitrary user text into an `ILIKE` pattern that matches it as a substring.
pub fn like_pattern(search: &str) -> String {
    format!("%{}%", LIKE_META.replace_all(search, r"\$1"))
}

fn map_insert_error(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &error {
        if db.is_unique_violation() {
            return StoreError::DuplicateEmail;
        }
    }
    StoreError::Database(error)
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }
        let sql = format!(
            "UPDATE users SET \
                 name = COALESCE($2, name), \
                 bio = COALESCE($3, bio), \
                 avatar = COALESCE($4, avatar), \
                 password_hash = COALESCE($5, password_hash), \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.bio)
            .bind(changes.avatar)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn find(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM tasks WHERE TRUE", TASK_COLUMNS));

        if let Some(owner_id) = filter.owner_id {
            query.push(" AND owner_id = ").push_bind(owner_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(priority) = filter.priority {
            query.push(" AND priority = ").push_bind(priority);
        }
        if let Some(search) = &filter.search {
            let pattern = like_pattern(search);
            query
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        query.push(" ORDER BY created_at DESC");

        Ok(query
            .build_query_as::<Task>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create(&self, task: NewTask) -> Result<Task, StoreError> {
        let sql = format!(
            "INSERT INTO tasks (id, title, description, status, priority, due_date, owner_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(Uuid::new_v4())
            .bind(task.title)
            .bind(task.description)
            .bind(task.status)
            .bind(task.priority)
            .bind(task.due_date)
            .bind(task.owner_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update(&self, id: Uuid, changes: TaskChanges) -> Result<Option<Task>, StoreError> {
        // $6 distinguishes "leave due_date alone" from "set it, possibly to NULL".
        let sql = format!(
            "UPDATE tasks SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 status = COALESCE($4, status), \
                 priority = COALESCE($5, priority), \
                 due_date = CASE WHEN $6 THEN $7::timestamptz ELSE due_date END, \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.status)
            .bind(changes.priority)
            .bind(changes.due_date.is_some())
            .bind(changes.due_date.flatten())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskStatus};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::env;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("milk"), "%milk%");
        assert_eq!(like_pattern("100%"), r"%100\%%");
        assert_eq!(like_pattern("a_b"), r"%a\_b%");
        assert_eq!(like_pattern(r"c:\tmp"), r"%c:\\tmp%");
    }

    // The tests below need a disposable Postgres database in DATABASE_URL.
    // Run them with `cargo test -- --ignored`.

    async fn test_pool() -> PgPool {
        dotenv::dotenv().ok();
        let database_url =
            env::var("DATABASE_URL").expect("DATABASE_URL must be set for database tests");
        connect(&database_url, 5).await.unwrap()
    }

    fn unique_email(tag: &str) -> String {
        format!("{}-{}@example.com", tag, Uuid::new_v4())
    }

    async fn insert_user(users: &PgUserStore, tag: &str) -> User {
        users
            .insert(NewUser {
                name: "Pg Tester".into(),
                email: unique_email(tag),
                password_hash: "hash".into(),
            })
            .await
            .unwrap()
    }

    fn new_task(title: &str, status: TaskStatus, owner_id: Uuid) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            status,
            priority: TaskPriority::Medium,
            due_date: None,
            owner_id,
        }
    }

    #[ignore]
    #[actix_rt::test]
    async fn test_pg_user_round_trip_and_duplicates() {
        let users = PgUserStore::new(test_pool().await);
        let user = insert_user(&users, "pg-user").await;

        let by_email = users.find_by_email(&user.email).await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        let by_id = users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, user.email);

        // Same address in another case collides on the lower(email) index
        let duplicate = users
            .insert(NewUser {
                name: "Copy".into(),
                email: user.email.to_uppercase(),
                password_hash: "other".into(),
            })
            .await;
        assert!(matches!(duplicate, Err(StoreError::DuplicateEmail)));

        let updated = users
            .update(
                user.id,
                UserChanges {
                    bio: Some("Likes SQL".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Pg Tester");
        assert_eq!(updated.password_hash, "hash");
        assert_eq!(updated.profile.bio, "Likes SQL");

        assert!(users
            .update(Uuid::new_v4(), UserChanges::default())
            .await
            .unwrap()
            .is_none());
    }

    fn titles(found: &[Task]) -> Vec<String> {
        found.iter().map(|t| t.title.clone()).collect()
    }

    #[ignore]
    #[actix_rt::test]
    async fn test_pg_task_filters_and_ordering() {
        let pool = test_pool().await;
        let users = PgUserStore::new(pool.clone());
        let tasks = PgTaskStore::new(pool);
        let owner = insert_user(&users, "pg-owner").await;
        let other = insert_user(&users, "pg-other").await;

        for (title, status, owner_id) in [
            ("first", TaskStatus::Pending, owner.id),
            ("second 100% done", TaskStatus::Completed, owner.id),
            ("foreign", TaskStatus::Completed, other.id),
            ("third", TaskStatus::Completed, owner.id),
        ] {
            tasks.create(new_task(title, status, owner_id)).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let completed = tasks
            .find(&TaskFilter {
                owner_id: Some(owner.id),
                status: Some(TaskStatus::Completed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(titles(&completed), vec!["third", "second 100% done"]);

        // `%` in the search term matches literally
        let searched = tasks
            .find(&TaskFilter {
                owner_id: Some(owner.id),
                search: Some("100%".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(titles(&searched), vec!["second 100% done"]);

        let none = tasks
            .find(&TaskFilter {
                owner_id: Some(owner.id),
                search: Some("%".into()),
                priority: Some(TaskPriority::High),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[ignore]
    #[actix_rt::test]
    async fn test_pg_task_update_and_delete() {
        let pool = test_pool().await;
        let users = PgUserStore::new(pool.clone());
        let tasks = PgTaskStore::new(pool);
        let owner = insert_user(&users, "pg-update").await;

        let due = Utc.with_ymd_and_hms(2030, 1, 15, 0, 0, 0).unwrap();
        let task = tasks
            .create(NewTask {
                due_date: Some(due),
                ..new_task("Write report", TaskStatus::Pending, owner.id)
            })
            .await
            .unwrap();

        // Omitted fields keep their values, including the due date
        let updated = tasks
            .update(
                task.id,
                TaskChanges {
                    status: Some(TaskStatus::InProgress),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.title, "Write report");
        assert_eq!(updated.due_date, Some(due));
        assert_eq!(updated.owner_id, owner.id);

        // An explicit null clears it
        let cleared = tasks
            .update(
                task.id,
                TaskChanges {
                    due_date: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleared.due_date, None);
        assert_eq!(cleared.status, TaskStatus::InProgress);

        assert!(tasks
            .update(Uuid::new_v4(), TaskChanges::default())
            .await
            .unwrap()
            .is_none());

        assert!(tasks.delete(task.id).await.unwrap());
        assert!(!tasks.delete(task.id).await.unwrap());
        assert!(tasks.find_by_id(task.id).await.unwrap().is_none());
    }
}
