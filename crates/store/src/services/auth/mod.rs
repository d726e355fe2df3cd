//! Authentication service.
//!
//! Email + argon2 password registration and login, and the single
//! capability-check function the request layer composes with — there is no
//! permission class hierarchy anywhere.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use blood_orange_core::{Email, Role};

use crate::db::{self, RepositoryError};
use crate::models::session::CurrentUser;
use crate::models::user::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    pool: &'a PgPool,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Register a new user with email and password.
    ///
    /// A customer profile is created in the same transaction (the account is
    /// not staff).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = db::users::create(self.pool, &email, &password_hash, false)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = db::users::get_with_password_hash(self.pool, &email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

/// Whether `user` may act in the given role.
///
/// Staff accounts pass every check; everyone passes the plain customer
/// check; otherwise the account's role must match.
#[must_use]
pub const fn has_role(user: &CurrentUser, required: Role) -> bool {
    if user.is_staff {
        return true;
    }

    match required {
        Role::Customer => true,
        Role::OrderManager => matches!(user.role, Role::OrderManager),
    }
}

/// Validate password strength requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2 and a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHash)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored argon2 hash.
fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthError::PasswordHash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use blood_orange_core::UserId;

    fn user(role: Role, is_staff: bool) -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            email: Email::parse("user@example.com").unwrap(),
            role,
            is_staff,
        }
    }

    #[test]
    fn test_customer_check_passes_everyone() {
        assert!(has_role(&user(Role::Customer, false), Role::Customer));
        assert!(has_role(&user(Role::OrderManager, false), Role::Customer));
    }

    #[test]
    fn test_manager_check_requires_role_or_staff() {
        assert!(!has_role(&user(Role::Customer, false), Role::OrderManager));
        assert!(has_role(&user(Role::OrderManager, false), Role::OrderManager));
        assert!(has_role(&user(Role::Customer, true), Role::OrderManager));
    }

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough password").is_ok());
    }
}
