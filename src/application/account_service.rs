use chrono::Duration;
use uuid::Uuid;

use super::password::{hash_password, verify_password};
use crate::domain::account::{normalize_email, NewAccount, Role, Session, User};
use crate::domain::errors::DomainError;
use crate::domain::ports::AccountRepository;

pub struct AccountService<R> {
    repo: R,
    session_ttl: Duration,
}

impl<R: AccountRepository> AccountService<R> {
    pub fn new(repo: R, session_ttl: Duration) -> Self {
        Self { repo, session_ttl }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Registers a customer account and opens a session for it.
    pub fn register(&self, account: NewAccount) -> Result<(User, Session), DomainError> {
        let account = account.validated()?;
        let hash = hash_password(&account.password)?;
        let user = self.repo.create_user(&account, &hash, Role::Customer)?;
        let session = self.repo.create_session(user.id, self.session_ttl)?;
        log::info!("user {} registered", user.id);
        Ok((user, session))
    }

    pub fn login(&self, email: &str, password: &str) -> Result<(User, Session), DomainError> {
        let email = normalize_email(email);
        let credentials = self
            .repo
            .find_credentials(&email)?
            .ok_or(DomainError::InvalidCredentials)?;
        if !verify_password(password, &credentials.password_hash) {
            return Err(DomainError::InvalidCredentials);
        }
        let session = self
            .repo
            .create_session(credentials.user.id, self.session_ttl)?;
        log::info!("user {} logged in", credentials.user.id);
        Ok((credentials.user, session))
    }

    pub fn logout(&self, session_id: Uuid) -> Result<(), DomainError> {
        self.repo.delete_session(session_id)
    }

    pub fn authenticate(&self, session_id: Uuid) -> Result<User, DomainError> {
        self.repo
            .find_session_user(session_id)?
            .ok_or(DomainError::Unauthorized)
    }

    /// Creates the bootstrap admin if no account uses `email` yet. An existing
    /// account is left untouched. Returns whether an account was created.
    pub fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<bool, DomainError> {
        let account = NewAccount {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            phone: None,
            address: None,
        }
        .validated()?;

        if let Some(existing) = self.repo.find_credentials(&account.email)? {
            if !existing.user.is_admin() {
                log::warn!(
                    "bootstrap admin email {} belongs to a non-admin account",
                    account.email
                );
            }
            return Ok(false);
        }

        let hash = hash_password(&account.password)?;
        let user = self.repo.create_user(&account, &hash, Role::Admin)?;
        log::info!("bootstrap admin {} created", user.id);
        Ok(true)
    }
}
