use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::error::AppError;
use crate::models::{normalize_email, NewUser, User, UserChanges};
use crate::store::UserStore;

const DECOY_PASSWORD: &str = "decoy-password-never-issued";

/// Name/profile fields a user may change about themselves.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// User records plus everything to do with their passwords.
///
/// Plaintext passwords enter here and only hashes leave. Hashing happens on
/// [`create`](Self::create) and [`set_password`](Self::set_password) and
/// nowhere else; profile edits never touch the stored hash.
///
/// bcrypt runs on the blocking thread pool so a slow hash never stalls the
/// worker serving other requests.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    cost: u32,
    // Checked against when no account matches, so unknown emails pay for a hash too.
    decoy_hash: Arc<OnceCell<String>>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>, cost: u32) -> Self {
        Self {
            users,
            cost,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Registers a new user. Fails with `Conflict` when the email is taken,
    /// regardless of case.
    pub async fn create(&self, name: &str, email: &str, password: &str) -> Result<User, AppError> {
        let email = normalize_email(email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".into()));
        }

        let password_hash = hash_blocking(password, self.cost).await?;
        let user = self
            .users
            .insert(NewUser {
                name: name.trim().to_string(),
                email,
                password_hash,
            })
            .await?;
        Ok(user)
    }

    /// The user owning `email` if `password` is theirs, `None` otherwise.
    ///
    /// Both failure cases perform one bcrypt verification.
    pub async fn verify_login(&self, email: &str, password: &str) -> Result<Option<User>, AppError> {
        match self.users.find_by_email(&normalize_email(email)).await? {
            Some(user) => {
                let matched = self.matches(&user, password).await?;
                Ok(matched.then_some(user))
            }
            None => {
                let decoy = self
                    .decoy_hash
                    .get_or_try_init(|| hash_blocking(DECOY_PASSWORD, self.cost))
                    .await?;
                verify_blocking(password, decoy).await?;
                Ok(None)
            }
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.find_by_id(id).await?)
    }

    /// Whether `candidate` is the user's password.
    pub async fn matches(&self, user: &User, candidate: &str) -> Result<bool, AppError> {
        verify_blocking(candidate, &user.password_hash).await
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, AppError> {
        let changes = UserChanges {
            name: changes.name.map(|n| n.trim().to_string()),
            bio: changes.bio,
            avatar: changes.avatar,
            password_hash: None,
        };
        Ok(self.users.update(id, changes).await?)
    }

    /// Replaces the user's password with a freshly salted hash of `password`.
    pub async fn set_password(&self, id: Uuid, password: &str) -> Result<Option<User>, AppError> {
        let changes = UserChanges {
            password_hash: Some(hash_blocking(password, self.cost).await?),
            ..Default::default()
        };
        Ok(self.users.update(id, changes).await?)
    }
}

async fn hash_blocking(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_string();
    task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Password hashing task failed: {}", e)))?
}

async fn verify_blocking(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();
    task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| {
            AppError::InternalServerError(format!("Password verification task failed: {}", e))
        })?
}
