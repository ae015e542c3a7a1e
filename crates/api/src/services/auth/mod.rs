//! Member authentication service.
//!
//! Password sign-up and sign-in. Successful sign-in returns a signed access
//! token that the authentication middleware verifies on later requests.

mod error;
mod tokens;

pub use error::AuthError;
pub use tokens::{AccessToken, TokenClaims, TokenService};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::instrument;

use bazaar_core::member::{Member, NewMember};
use bazaar_core::{Address, Username};

use crate::db::{Database, MemberRepository, RepositoryError, UnitOfWork};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Sign-up input.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub address: Option<Address>,
}

/// Authentication service.
///
/// Handles member registration, sign-in, and principal lookup.
pub struct MemberService<'a, D: Database> {
    db: &'a D,
    tokens: &'a TokenService,
}

impl<'a, D: Database> MemberService<'a, D> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(db: &'a D, tokens: &'a TokenService) -> Self {
        Self { db, tokens }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new member with the `STANDARD` grade.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UsernameTaken` if the username is already registered.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn join(&self, request: JoinRequest) -> Result<Member, AuthError> {
        let username = Username::parse(&request.username)?;
        validate_password(&request.password)?;

        let name = request.name.trim();
        if name.is_empty() {
            return Err(AuthError::BlankName);
        }

        let password_hash = hash_password(&request.password)?;

        let mut uow = self.db.begin().await?;
        let member = uow
            .insert_member(NewMember {
                username,
                name: name.to_owned(),
                address: request.address,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Repository(other),
            })?;
        uow.commit().await?;

        tracing::info!(member_id = %member.id, "Member joined");
        Ok(member)
    }

    /// Sign in with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(Member, AccessToken), AuthError> {
        // A malformed username can never have been registered.
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let mut uow = self.db.begin().await?;
        let (member, password_hash) = uow
            .find_member_credentials(username.as_str())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        drop(uow);

        verify_password(password, &password_hash)?;

        let token = self.tokens.issue(&member.username)?;
        Ok((member, token))
    }

    /// Look up the member behind an authenticated principal.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MemberNotFound` if the member no longer exists.
    pub async fn me(&self, username: &str) -> Result<Member, AuthError> {
        let mut uow = self.db.begin().await?;
        uow.find_member_by_username(username)
            .await?
            .ok_or(AuthError::MemberNotFound)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
