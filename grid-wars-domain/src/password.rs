use crate::{ServiceError, ServiceResult};

/// Bcrypt cost factor. Higher costs slow down brute-force attempts but
/// add latency to every register/login request.
const BCRYPT_COST: u32 = 12;

#[derive(Clone, Default)]
pub struct PasswordService;

impl PasswordService {
    pub fn new() -> Self {
        Self
    }

    pub fn hash_password(&self, plain: &str) -> ServiceResult<String> {
        bcrypt::hash(plain, BCRYPT_COST)
            .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Fails with `Unauthorized` on mismatch. The message deliberately
    /// matches the one used for unknown emails so callers cannot tell the
    /// two cases apart.
    pub fn compare_password(&self, plain: &str, hash: &str) -> ServiceResult<()> {
        let valid = bcrypt::verify(plain, hash)
            .map_err(|e| ServiceError::Internal(format!("Failed to verify password: {}", e)))?;
        if !valid {
            return ServiceError::unauthorized("Credentials are incorrect");
        }
        Ok(())
    }

    /// Rejects password changes that reproduce the current password.
    pub fn ensure_different_from_previous(
        &self,
        new_plain: &str,
        old_hash: &str,
    ) -> ServiceResult<()> {
        let same = bcrypt::verify(new_plain, old_hash)
            .map_err(|e| ServiceError::Internal(format!("Failed to verify password: {}", e)))?;
        if same {
            return ServiceError::bad_request(
                "New password must be different from current password",
            );
        }
        Ok(())
    }

    pub fn validate_confirmation(&self, new_plain: &str, confirm_plain: &str) -> ServiceResult<()> {
        if new_plain != confirm_plain {
            return ServiceError::bad_request("New password and confirmation do not match");
        }
        Ok(())
    }

    /// At least 8 characters with a lowercase letter, an uppercase letter
    /// and a digit.
    pub fn is_strong_password(password: &str) -> bool {
        password.len() >= 8
            && password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_uppercase())
            && password.chars().any(|c| c.is_ascii_digit())
    }
}
