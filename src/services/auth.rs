//! Librarian authentication and session management

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{Librarian, Session},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate a librarian and open a session.
    /// Returns the librarian and the bearer token; only its hash is stored.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(Librarian, String)> {
        let librarian = self
            .repository
            .librarians
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("invalid credentials".to_string()))?;

        if !verify_password(&librarian.password_hash, password)? {
            tracing::warn!("Failed login attempt for {}", librarian.username);
            return Err(AppError::Authentication("invalid credentials".to_string()));
        }

        let token = generate_token();
        let now = Utc::now();
        let session = Session {
            id: hash_token(&token),
            librarian_id: librarian.id,
            expires_at: now + Duration::hours(self.config.session_ttl_hours),
            created_at: now,
        };
        self.repository.sessions.create(&session).await?;

        tracing::info!("Librarian {} logged in", librarian.username);
        Ok((librarian, token))
    }

    /// Resolve a bearer token to its librarian
    pub async fn validate_session(&self, token: &str) -> AppResult<Librarian> {
        let session = self
            .repository
            .sessions
            .get(&hash_token(token))
            .await?
            .ok_or_else(|| AppError::Authentication("invalid session".to_string()))?;

        if session.is_expired(Utc::now()) {
            return Err(AppError::Authentication("session expired".to_string()));
        }

        self.repository
            .librarians
            .get_by_id(session.librarian_id)
            .await
            .map_err(|_| AppError::Authentication("invalid session".to_string()))
    }

    /// Delete the session of a token; unknown tokens are ignored
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        if self.repository.sessions.delete(&hash_token(token)).await? {
            tracing::info!("Session closed");
        }
        Ok(())
    }

    /// Create the librarian unless the username already exists.
    /// Returns whether an account was created.
    pub async fn ensure_librarian(&self, username: &str, password: &str) -> AppResult<bool> {
        if self.repository.librarians.get_by_username(username).await?.is_some() {
            return Ok(false);
        }

        let librarian = Librarian {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
        };
        self.repository.librarians.create(&librarian).await?;
        tracing::info!("Created librarian account {}", username);
        Ok(true)
    }

    /// Remove expired sessions, returning how many were deleted
    pub async fn cleanup_expired_sessions(&self) -> AppResult<u64> {
        self.repository.sessions.delete_expired(Utc::now()).await
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// 32 random bytes, hex encoded
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
