//! Authentication module.

use crate::db::{Database, Session, User, now_timestamp};
use crate::error::{AppError, Result};
use crate::validation::{self, FieldChecks};
use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Generate a secure random token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Authentication service.
pub struct AuthService {
    db: Database,
    session_duration_days: u32,
    registration_enabled: bool,
    min_password_length: usize,
}

impl AuthService {
    /// Create a new auth service.
    pub fn new(
        db: Database,
        session_duration_days: u32,
        registration_enabled: bool,
        min_password_length: usize,
    ) -> Self {
        Self {
            db,
            session_duration_days,
            registration_enabled,
            min_password_length,
        }
    }

    /// Register a new account and open a session for it.
    pub fn signup(&self, username: &str, email: &str, password: &str) -> Result<(User, String)> {
        if !self.registration_enabled {
            return Err(AppError::Forbidden("Registration is disabled".to_string()));
        }

        let user = self.create_user(username, email, password)?;
        let token = self.open_session(&user)?;
        Ok((user, token))
    }

    /// Create a new user. Every invalid field is reported.
    pub fn create_user(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let email = validation::normalize_email(email);

        let mut checks = FieldChecks::new();
        checks.check("username", validation::validate_username(username));
        checks.check("email", validation::validate_email(&email));
        checks.check(
            "password",
            validation::validate_password(password, self.min_password_length),
        );
        checks.finish()?;

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.trim().to_string(),
            email,
            password_hash: hash_password(password)?,
            created_at: now_timestamp(),
        };

        self.db.create_user(&user)?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Login and create a session.
    pub fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let email = validation::normalize_email(email);

        let mut checks = FieldChecks::new();
        checks.check("email", validation::validate_email(&email));
        if password.is_empty() {
            checks.check("password", Err("Password is required".to_string()));
        }
        checks.finish()?;

        let user = self
            .db
            .get_user_by_email(&email)?
            .ok_or_else(|| AppError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Rejected login");
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
        }

        let token = self.open_session(&user)?;
        Ok((user, token))
    }

    fn open_session(&self, user: &User) -> Result<String> {
        let token = generate_token();
        let expires_at =
            now_timestamp() + (self.session_duration_days as i64 * 24 * 60 * 60 * 1000);

        let session = Session {
            token: token.clone(),
            user_id: user.id.clone(),
            expires_at,
        };

        self.db.create_session(&session)?;
        Ok(token)
    }

    /// Validate a session token and return the user.
    pub fn validate_token(&self, token: &str) -> Result<Option<User>> {
        let session = match self.db.get_session(token)? {
            Some(s) => s,
            None => return Ok(None),
        };

        // Check expiration
        if session.expires_at < now_timestamp() {
            self.db.delete_session(token)?;
            return Ok(None);
        }

        self.db.get_user_by_id(&session.user_id)
    }

    /// Logout (delete session).
    pub fn logout(&self, token: &str) -> Result<()> {
        self.db.delete_session(token)
    }

    /// Remove every expired session.
    pub fn purge_expired_sessions(&self) -> Result<usize> {
        self.db.cleanup_expired_sessions()
    }

    /// List all users.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.db.list_users()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_generate_token() {
        let token1 = generate_token();
        let token2 = generate_token();

        assert_eq!(token1.len(), 43); // Base64 of 32 bytes
        assert_ne!(token1, token2);
    }
}
