use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::models::{LoginRequest, NewUser, PublicUser, RegisterRequest, DEFAULT_ROLE};
use crate::repo::{RepoError, UserRepo};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("Username already exists")]
    DuplicateUsername,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("internal: {0}")]
    Internal(String),
}

impl From<RepoError> for AuthError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AuthError::DuplicateUsername,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

/// Hash a password into an Argon2id PHC string on the blocking pool.
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
    })
    .await
    .map_err(|e| AuthError::Internal(format!("hash task: {e}")))?
    .map_err(|e| AuthError::Internal(format!("argon2: {e}")))
}

/// Constant-time check of `password` against a stored PHC string.
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || match PasswordHash::new(&stored_hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!("unparseable password hash in store: {e}");
            false
        }
    })
    .await
    .map_err(|e| AuthError::Internal(format!("verify task: {e}")))
}

// Verified against when the username is unknown so both failure paths do the same work.
static DUMMY_HASH: OnceCell<Option<String>> = OnceCell::new();

/// Compute the dummy hash on the blocking pool. `main` calls this once at
/// startup; later calls return the cached value.
pub async fn prepare_dummy_hash() -> Option<&'static str> {
    if let Some(cached) = DUMMY_HASH.get() {
        return cached.as_deref();
    }
    tokio::task::spawn_blocking(|| {
        DUMMY_HASH
            .get_or_init(|| {
                let salt = SaltString::generate(&mut OsRng);
                Argon2::default()
                    .hash_password(b"hostel-dummy-password", &salt)
                    .map(|h| h.to_string())
                    .ok()
            })
            .as_deref()
    })
    .await
    .ok()
    .flatten()
}

fn required(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

pub async fn register<R: UserRepo + ?Sized>(
    repo: &R,
    req: RegisterRequest,
) -> Result<PublicUser, AuthError> {
    let (Some(username), Some(password), Some(name)) =
        (required(req.username), required(req.password), required(req.name))
    else {
        return Err(AuthError::Validation("Missing required fields"));
    };
    let role = required(req.role).unwrap_or_else(|| DEFAULT_ROLE.to_string());

    let password_hash = hash_password(&password).await?;
    let user = repo
        .create_user(NewUser { username, password_hash, role, name })
        .await?;
    tracing::info!(user_id = user.id, username = %user.username, "registered user");
    Ok(user.into())
}

pub async fn login<R: UserRepo + ?Sized>(
    repo: &R,
    req: LoginRequest,
) -> Result<PublicUser, AuthError> {
    let (Some(username), Some(password)) = (required(req.username), required(req.password)) else {
        return Err(AuthError::Validation("Missing credentials"));
    };

    match repo.find_user_by_username(&username).await? {
        Some(user) => {
            if verify_password(&password, &user.password_hash).await? {
                tracing::info!(user_id = user.id, "login ok");
                Ok(user.into())
            } else {
                tracing::warn!(username = %username, "login rejected: bad password");
                Err(AuthError::InvalidCredentials)
            }
        }
        None => {
            if let Some(dummy) = prepare_dummy_hash().await {
                let _ = verify_password(&password, dummy).await?;
            }
            tracing::warn!(username = %username, "login rejected: unknown user");
            Err(AuthError::InvalidCredentials)
        }
    }
}
