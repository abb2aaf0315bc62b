use crate::{
    ServiceError, ServiceResult,
    account::{Account, ArcAccountRepository},
};

/// Store-backed checks for registration and login. The uniqueness check is
/// a fast-path UX improvement only; concurrent registrations can both pass
/// it, and the store's UNIQUE constraint remains the authoritative guard.
pub struct AccountValidator {
    repository: ArcAccountRepository,
}

impl AccountValidator {
    pub fn new(repository: ArcAccountRepository) -> Self {
        Self { repository }
    }

    /// Not filtered by is_active: a soft-deleted account still occupies
    /// its email.
    pub async fn validate_email_uniqueness(&self, email: &str) -> ServiceResult<()> {
        if self.repository.find_by_email(email).await?.is_some() {
            return ServiceError::conflict("Email already registered");
        }
        Ok(())
    }

    /// Returns the full row, hash included, for the caller to verify the
    /// password against. The error does not reveal whether the email is
    /// known.
    pub async fn validate_email_exists(&self, email: &str) -> ServiceResult<Account> {
        match self.repository.find_by_email(email).await? {
            Some(account) => Ok(account),
            None => ServiceError::unauthorized("Credentials are incorrect"),
        }
    }
}
