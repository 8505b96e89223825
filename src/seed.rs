use crate::auth::hash_password;
use crate::config::WardenSeed;
use crate::models::NewUser;
use crate::repo::UserRepo;

pub const WARDEN_ROLE: &str = "warden";

/// Create the warden account unless the username already exists.
/// Safe to run on every start; returns whether a row was inserted.
pub async fn seed_warden<R: UserRepo + ?Sized>(
    repo: &R,
    seed: &WardenSeed,
) -> anyhow::Result<bool> {
    if repo.find_user_by_username(&seed.username).await?.is_some() {
        tracing::debug!(username = %seed.username, "warden account present, skipping seed");
        return Ok(false);
    }
    let password_hash = hash_password(&seed.password).await?;
    let inserted = repo
        .insert_user_if_absent(NewUser {
            username: seed.username.clone(),
            password_hash,
            role: WARDEN_ROLE.to_string(),
            name: seed.name.clone(),
        })
        .await?;
    if inserted {
        tracing::info!(username = %seed.username, "seeded warden account");
    }
    Ok(inserted)
}
