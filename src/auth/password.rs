use actix_web::web;
use bcrypt::{hash, verify};

use super::AuthError;

pub async fn hash_password(password: String, cost: u32) -> Result<String, AuthError> {
    Ok(web::block(move || hash(password, cost)).await??)
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, password_hash: String) -> bool {
    web::block(move || verify(password, &password_hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}
