use crate::error::AppError;
use bcrypt::{hash, verify};

/// Hashing rounds used when nothing else is configured.
pub const DEFAULT_COST: u32 = 10;

/// Hashes `password` with a freshly generated salt.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}
